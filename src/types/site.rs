// src/types/site.rs
//! Static per-site configuration: selectors, location rule and pagination

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
    pub company_name: String,
    pub listing_selector: String,
    pub title_selector: String,
    pub link_selector: String,
    #[serde(default)]
    pub location_selector: Option<String>,
    #[serde(default)]
    pub location_strategy: LocationStrategy,
    /// Base used to resolve relative hrefs when it differs from `base_url`
    #[serde(default)]
    pub link_base: Option<String>,
    /// Listings live inside this iframe rather than the top document
    #[serde(default)]
    pub frame_selector: Option<String>,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl SiteConfig {
    pub fn link_base(&self) -> &str {
        self.link_base.as_deref().unwrap_or(&self.base_url)
    }
}

/// How the location column is read from a listing element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationStrategy {
    /// Text of the first `location_selector` match
    #[default]
    FirstText,
    /// Data attribute carried by the link element
    LinkAttribute { attribute: String },
    /// Text of every `location_selector` match, concatenated
    JoinedText,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    #[serde(rename = "url")]
    UrlPattern {
        url_pattern: String,
        #[serde(default = "default_first_page")]
        start_page: u32,
        #[serde(default = "default_first_page")]
        max_pages: u32,
        #[serde(default)]
        offset_step: Option<u32>,
    },
    #[serde(rename = "click")]
    ClickNext {
        next_page_selector: String,
        #[serde(default = "default_first_page")]
        max_pages: u32,
    },
    Scroll {
        #[serde(default = "default_first_page")]
        max_scrolls: u32,
        #[serde(default = "default_scroll_delay_secs")]
        scroll_delay_secs: f64,
    },
    #[default]
    None,
}

pub const PAGE_NUM_PLACEHOLDER: &str = "{page_num}";
pub const OFFSET_PLACEHOLDER: &str = "{offset_val}";

fn default_first_page() -> u32 {
    1
}

fn default_scroll_delay_secs() -> f64 {
    3.0
}

impl PaginationConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            PaginationConfig::UrlPattern { .. } => "url",
            PaginationConfig::ClickNext { .. } => "click",
            PaginationConfig::Scroll { .. } => "scroll",
            PaginationConfig::None => "none",
        }
    }

    pub fn scroll_delay(&self) -> Option<Duration> {
        match self {
            PaginationConfig::Scroll {
                scroll_delay_secs, ..
            } => Some(Duration::from_secs_f64(scroll_delay_secs.max(0.0))),
            _ => None,
        }
    }
}
