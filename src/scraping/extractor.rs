// src/scraping/extractor.rs
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::identity::{normalize_text, resolve_link};
use crate::types::job::{JobListing, LINK_NOT_FOUND, LOCATION_NOT_FOUND, TITLE_NOT_FOUND};
use crate::types::site::{LocationStrategy, SiteConfig};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector '{selector}' for {company}: {reason}")]
    Selector {
        company: String,
        selector: String,
        reason: String,
    },
}

/// Compiled selectors for one site
pub struct Extractor<'a> {
    site: &'a SiteConfig,
    listing: Selector,
    title: Selector,
    link: Selector,
    location: Option<Selector>,
}

impl<'a> Extractor<'a> {
    pub fn new(site: &'a SiteConfig) -> Result<Self, ExtractError> {
        let location = site
            .location_selector
            .as_deref()
            .map(|selector| Self::compile(site, selector))
            .transpose()?;

        Ok(Self {
            site,
            listing: Self::compile(site, &site.listing_selector)?,
            title: Self::compile(site, &site.title_selector)?,
            link: Self::compile(site, &site.link_selector)?,
            location,
        })
    }

    fn compile(site: &SiteConfig, selector: &str) -> Result<Selector, ExtractError> {
        Selector::parse(selector).map_err(|e| ExtractError::Selector {
            company: site.company_name.clone(),
            selector: selector.to_string(),
            reason: format!("{:?}", e),
        })
    }

    /// Every listing element on the page, in document order
    pub fn extract(&self, markup: &str) -> Vec<JobListing> {
        let document = Html::parse_document(markup);
        document
            .select(&self.listing)
            .map(|element| self.extract_one(element))
            .collect()
    }

    pub fn extract_one(&self, element: ElementRef<'_>) -> JobListing {
        let title = element
            .select(&self.title)
            .next()
            .map(|tag| Self::clean_text(tag))
            .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());

        let link_tag = element.select(&self.link).next();
        let link = link_tag
            .and_then(|tag| tag.value().attr("href"))
            .map(|href| resolve_link(self.site.link_base(), href))
            .unwrap_or_else(|| LINK_NOT_FOUND.to_string());

        let location = self
            .location_for(element, link_tag)
            .unwrap_or_else(|| LOCATION_NOT_FOUND.to_string());

        JobListing {
            company: self.site.company_name.clone(),
            title,
            link,
            location,
        }
    }

    fn location_for(&self, element: ElementRef<'_>, link_tag: Option<ElementRef<'_>>) -> Option<String> {
        match &self.site.location_strategy {
            LocationStrategy::FirstText => self.first_location_text(element),
            LocationStrategy::LinkAttribute { attribute } => link_tag
                .and_then(|tag| tag.value().attr(attribute))
                .map(normalize_text)
                .or_else(|| self.first_location_text(element)),
            LocationStrategy::JoinedText => {
                let selector = self.location.as_ref()?;
                let parts: Vec<String> = element
                    .select(selector)
                    .map(|tag| tag.text().collect::<String>())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(normalize_text(&parts.concat()))
                }
            }
        }
    }

    fn first_location_text(&self, element: ElementRef<'_>) -> Option<String> {
        let selector = self.location.as_ref()?;
        element.select(selector).next().map(|tag| Self::clean_text(tag))
    }

    fn clean_text(element: ElementRef<'_>) -> String {
        normalize_text(&element.text().collect::<String>())
    }
}

/// One-shot extraction over a page
pub fn extract(site: &SiteConfig, markup: &str) -> Result<Vec<JobListing>, ExtractError> {
    Ok(Extractor::new(site)?.extract(markup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::site::PaginationConfig;

    fn site(strategy: LocationStrategy, location_selector: Option<&str>) -> SiteConfig {
        SiteConfig {
            base_url: "https://jobs.example.com/search?page=1".into(),
            company_name: "Example".into(),
            listing_selector: "li.job".into(),
            title_selector: "h2".into(),
            link_selector: "a.apply".into(),
            location_selector: location_selector.map(String::from),
            location_strategy: strategy,
            link_base: None,
            frame_selector: None,
            pagination: PaginationConfig::None,
        }
    }

    const PAGE: &str = r#"
        <html><body><ul>
          <li class="job">
            <h2>  Senior
               Data   Manager </h2>
            <a class="apply" href="/job/1" data-location="Buenos  Aires, AR">Apply</a>
            <p class="loc"><span>Remote</span><span>, Argentina</span></p>
          </li>
          <li class="job">
            <a class="apply">No href</a>
          </li>
        </ul></body></html>
    "#;

    #[test]
    fn test_extracts_fields_and_sentinels() {
        let site = site(LocationStrategy::FirstText, Some("p.loc span"));
        let listings = extract(&site, PAGE).unwrap();
        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].company, "Example");
        assert_eq!(listings[0].title, "Senior Data Manager");
        assert_eq!(listings[0].link, "https://jobs.example.com/job/1");
        assert_eq!(listings[0].location, "Remote");

        assert_eq!(listings[1].title, TITLE_NOT_FOUND);
        assert_eq!(listings[1].link, LINK_NOT_FOUND);
        assert_eq!(listings[1].location, LOCATION_NOT_FOUND);
    }

    #[test]
    fn test_missing_location_selector_yields_sentinel() {
        let site = site(LocationStrategy::FirstText, None);
        let listings = extract(&site, PAGE).unwrap();
        assert_eq!(listings[0].location, LOCATION_NOT_FOUND);
    }

    #[test]
    fn test_link_attribute_strategy() {
        let site = site(
            LocationStrategy::LinkAttribute {
                attribute: "data-location".into(),
            },
            None,
        );
        let listings = extract(&site, PAGE).unwrap();
        assert_eq!(listings[0].location, "Buenos Aires, AR");
        assert_eq!(listings[1].location, LOCATION_NOT_FOUND);
    }

    #[test]
    fn test_joined_text_strategy() {
        let site = site(LocationStrategy::JoinedText, Some("p.loc span"));
        let listings = extract(&site, PAGE).unwrap();
        assert_eq!(listings[0].location, "Remote, Argentina");
        assert_eq!(listings[1].location, LOCATION_NOT_FOUND);
    }

    #[test]
    fn test_link_base_override() {
        let mut site = site(LocationStrategy::FirstText, None);
        site.link_base = Some("https://recruiting.example.com/jobs/All/abc/Company".into());
        let listings = extract(&site, r#"<li class="job"><a class="apply" href="Details/99">x</a></li>"#).unwrap();
        assert_eq!(listings[0].link, "https://recruiting.example.com/jobs/All/abc/Details/99");
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let mut site = site(LocationStrategy::FirstText, None);
        site.title_selector = "h2[".into();
        let err = Extractor::new(&site).err().unwrap();
        assert!(matches!(err, ExtractError::Selector { ref selector, .. } if selector == "h2["));
    }

    #[test]
    fn test_page_without_listings() {
        let site = site(LocationStrategy::FirstText, None);
        assert!(extract(&site, "<html><body><p>No results</p></body></html>").unwrap().is_empty());
    }
}
