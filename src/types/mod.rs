// src/types/mod.rs
pub mod job;
pub mod report;
pub mod site;

pub use job::{JobListing, JobRecord, SeenIdentitySet};
pub use report::{RunReport, SiteReport, StopReason};
pub use site::{LocationStrategy, PaginationConfig, SiteConfig};
