// src/scraping/pacing.rs
//! Randomized pauses between navigations and interactions

use rand::Rng;
use std::time::Duration;

use crate::browser::Browser;
use crate::config::{DelayRange, PacingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Navigation,
    Click,
    BetweenPages,
    EmptyPage,
    ScrollPreload,
}

#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    fn range(&self, pause: Pause) -> DelayRange {
        match pause {
            Pause::Navigation => self.config.navigation,
            Pause::Click => self.config.click,
            Pause::BetweenPages => self.config.between_pages,
            Pause::EmptyPage => self.config.empty_page,
            Pause::ScrollPreload => self.config.scroll_preload,
        }
    }

    pub fn duration(&self, pause: Pause) -> Duration {
        let range = self.range(pause);
        if range.max_ms <= range.min_ms {
            return Duration::from_millis(range.min_ms);
        }
        let millis = rand::thread_rng().gen_range(range.min_ms..=range.max_ms);
        Duration::from_millis(millis)
    }

    pub async fn pause(&self, browser: &mut dyn Browser, pause: Pause) {
        let duration = self.duration(pause);
        if !duration.is_zero() {
            browser.sleep(duration).await;
        }
    }
}
