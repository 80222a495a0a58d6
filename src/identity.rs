// src/identity.rs
//! Record identity: the deduplication key shared by the crawler and the history store

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

const SEPARATOR: &str = "::";

/// Collapse whitespace runs to a single space and trim the edges
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve `href` against `base`; falls back to the cleaned href when neither parses
pub fn resolve_link(base: &str, href: &str) -> String {
    let href = normalize_text(href);

    if let Ok(base) = Url::parse(base.trim()) {
        if let Ok(joined) = base.join(&href) {
            return joined.to_string();
        }
    }

    match Url::parse(&href) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => href,
    }
}

fn normalize_link(link: &str) -> String {
    let cleaned = normalize_text(link);
    match Url::parse(&cleaned) {
        Ok(url) => url.to_string(),
        Err(_) => cleaned,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobIdentity(String);

impl JobIdentity {
    /// Identity of an already-absolute link
    pub fn new(company: &str, title: &str, link: &str) -> Self {
        Self(format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            normalize_text(company),
            normalize_text(title),
            normalize_link(link)
        ))
    }

    /// Identity of a scraped listing whose href may still be relative to the site
    pub fn for_listing(company: &str, title: &str, href: &str, base_url: &str) -> Self {
        Self::new(company, title, &resolve_link(base_url, href))
    }

    /// Wrap an identity read back from storage, trimmed but otherwise verbatim
    pub fn from_stored(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Senior \n\t Engineer  "), "Senior Engineer");
        assert_eq!(normalize_text("\u{a0}Remote\u{a0}"), "Remote");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_identity_ignores_whitespace_artifacts() {
        let clean = JobIdentity::new("ICON plc", "Clinical Research Associate", "https://careers.iconplc.com/job/1");
        let noisy = JobIdentity::new(
            "  ICON   plc ",
            "\n Clinical  Research\tAssociate ",
            " https://careers.iconplc.com/job/1 ",
        );
        assert_eq!(clean, noisy);
    }

    #[test]
    fn test_identity_relative_and_absolute_links_match() {
        let relative = JobIdentity::for_listing(
            "Medpace",
            "Data Manager",
            "/jobs/123?lang=en",
            "https://careers.medpace.com/jobs?page=1",
        );
        let absolute = JobIdentity::new(
            "Medpace",
            "Data Manager",
            "https://careers.medpace.com/jobs/123?lang=en",
        );
        assert_eq!(relative, absolute);
    }

    #[test]
    fn test_identity_collapses_host_casing() {
        let upper = JobIdentity::new("A", "B", "HTTPS://Jobs.Example.COM/x");
        let lower = JobIdentity::new("A", "B", "https://jobs.example.com/x");
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_identity_keeps_sentinel_links() {
        let id = JobIdentity::new("Acme", "Engineer", "Link Not Found");
        assert_eq!(id.as_str(), "Acme::Engineer::Link Not Found");
    }

    #[test]
    fn test_identity_is_stable_across_calls() {
        let a = JobIdentity::new("Fortrea", "CRA II", "https://fortrea.wd1.myworkdayjobs.com/job/7");
        let b = JobIdentity::new("Fortrea", "CRA II", "https://fortrea.wd1.myworkdayjobs.com/job/7");
        assert_eq!(a.as_str(), b.as_str());
        assert_eq!(
            a.as_str(),
            "Fortrea::CRA II::https://fortrea.wd1.myworkdayjobs.com/job/7"
        );
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("https://jobs.example.com/search?page=2", "/job/42"),
            "https://jobs.example.com/job/42"
        );
        assert_eq!(
            resolve_link("https://jobs.example.com/", "https://other.example.org/a"),
            "https://other.example.org/a"
        );
        assert_eq!(resolve_link("not a url", "relative/path"), "relative/path");
    }

    #[test]
    fn test_from_stored() {
        assert!(JobIdentity::from_stored("   ").is_none());
        assert_eq!(
            JobIdentity::from_stored(" a::b::c ").map(|id| id.to_string()),
            Some("a::b::c".to_string())
        );
    }
}
