// src/scraping/pagination.rs
//! Turns a site's pagination config into one step per iteration

use std::time::Duration;

use crate::types::site::{PaginationConfig, SiteConfig, OFFSET_PLACEHOLDER, PAGE_NUM_PLACEHOLDER};

/// What the driver does to bring the next logical page on screen
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Fresh navigation; `preload` marks the first load of a scroll site
    Navigate { url: String, preload: bool },
    /// Click the "next" control on the page already loaded
    Activate { selector: String },
    /// Scroll to the bottom, wait, and require the page to grow
    Scroll { delay: Duration },
}

#[derive(Debug, Clone)]
pub struct PageCursor<'a> {
    site: &'a SiteConfig,
    iteration: u32,
    last: u32,
}

impl<'a> PageCursor<'a> {
    pub fn new(site: &'a SiteConfig) -> Self {
        let (first, last) = match &site.pagination {
            PaginationConfig::UrlPattern {
                start_page,
                max_pages,
                ..
            } => (*start_page, *max_pages),
            PaginationConfig::ClickNext { max_pages, .. } => (1, *max_pages),
            PaginationConfig::Scroll { max_scrolls, .. } => (1, *max_scrolls),
            PaginationConfig::None => (1, 1),
        };

        Self {
            site,
            iteration: first,
            last,
        }
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn is_exhausted(&self) -> bool {
        self.iteration > self.last
    }

    /// `None` once the configured range has been walked
    pub fn step(&self) -> Option<Step> {
        if self.is_exhausted() {
            return None;
        }

        let step = match &self.site.pagination {
            PaginationConfig::UrlPattern {
                url_pattern,
                offset_step,
                ..
            } => Step::Navigate {
                url: page_url(url_pattern, self.iteration, *offset_step),
                preload: false,
            },
            PaginationConfig::ClickNext {
                next_page_selector, ..
            } if self.iteration > 1 => Step::Activate {
                selector: next_page_selector.clone(),
            },
            PaginationConfig::Scroll { .. } if self.iteration > 1 => Step::Scroll {
                delay: self.site.pagination.scroll_delay().unwrap_or_default(),
            },
            PaginationConfig::Scroll { .. } => Step::Navigate {
                url: self.site.base_url.clone(),
                preload: true,
            },
            _ => Step::Navigate {
                url: self.site.base_url.clone(),
                preload: false,
            },
        };

        Some(step)
    }

    /// Move to the next iteration; `false` when there is none
    pub fn advance(&mut self) -> bool {
        self.iteration = self.iteration.saturating_add(1);
        !self.is_exhausted()
    }
}

/// Substitute the page number, or the computed offset, into the template
pub fn page_url(template: &str, iteration: u32, offset_step: Option<u32>) -> String {
    let url = template.replace(PAGE_NUM_PLACEHOLDER, &iteration.to_string());
    match offset_step {
        Some(step) => {
            let offset = u64::from(iteration.saturating_sub(1)) * u64::from(step);
            url.replace(OFFSET_PLACEHOLDER, &offset.to_string())
        }
        None => url,
    }
}
