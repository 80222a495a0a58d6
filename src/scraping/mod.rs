// src/scraping/mod.rs
//! Per-site crawling: pagination, extraction, pacing and the crawl driver

pub mod crawler;
pub mod extractor;
pub mod pacing;
pub mod pagination;

pub use crawler::{crawl_site, SiteCrawl, SiteCrawler};
pub use extractor::{extract, ExtractError, Extractor};
pub use pagination::{PageCursor, Step};
