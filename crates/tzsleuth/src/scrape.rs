//! Profile-page enrichment.
//!
//! When the structured profile has no links in its bio, the public profile
//! page often still lists a website and social accounts. The page body is
//! fetched with a hard size bound and handed to a [`LinkExtractor`].

use crate::client::ApiClient;
use crate::error::Result;

/// Markers that mean a bio already carries link-like content.
const LINK_MARKERS: &[&str] = &["http://", "https://", "www.", "@"];

/// Social hosts recognized in a bio without a scheme.
const SOCIAL_HOSTS: &[&str] = &[
    "twitter.com",
    "x.com",
    "linkedin.com",
    "mastodon.",
    "bsky.app",
    "instagram.com",
    "youtube.com",
    "medium.com",
    "dev.to",
];

/// Extracts outbound links from an HTML document.
pub trait LinkExtractor: Send + Sync {
    /// Return absolute URLs, in document order, without duplicates.
    fn extract_links(&self, html: &str, base_url: &str) -> Vec<String>;
}

/// Extractor that finds nothing. Used when HTML parsing is compiled out.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLinkExtractor;

impl LinkExtractor for NoopLinkExtractor {
    fn extract_links(&self, _html: &str, _base_url: &str) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(feature = "scrape")]
pub use html::HtmlLinkExtractor;

#[cfg(feature = "scrape")]
mod html {
    use std::collections::HashSet;

    use scraper::{Html, Selector};
    use url::Url;

    use super::LinkExtractor;

    /// Selectors for profile links, most specific first.
    const PROFILE_LINK_SELECTORS: &[&str] = &[
        r#"[itemprop="url"] a[href]"#,
        r#"[itemprop="social"] a[href]"#,
        r#"a[rel~="me"][href]"#,
    ];

    /// `scraper`-based extractor for hosted profile pages.
    ///
    /// Returns only `http(s)` links that leave the hosting site.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct HtmlLinkExtractor;

    impl LinkExtractor for HtmlLinkExtractor {
        fn extract_links(&self, html: &str, base_url: &str) -> Vec<String> {
            let Ok(base) = Url::parse(base_url) else {
                return Vec::new();
            };
            let document = Html::parse_document(html);
            let mut seen = HashSet::new();
            let mut links = Vec::new();

            for raw in PROFILE_LINK_SELECTORS {
                let Ok(selector) = Selector::parse(raw) else {
                    continue;
                };
                for element in document.select(&selector) {
                    let Some(href) = element.value().attr("href") else {
                        continue;
                    };
                    let Ok(link) = base.join(href.trim()) else {
                        continue;
                    };
                    if !matches!(link.scheme(), "http" | "https")
                        || link.host_str() == base.host_str()
                    {
                        continue;
                    }
                    let link = link.to_string();
                    if seen.insert(link.clone()) {
                        links.push(link);
                    }
                }
            }

            links
        }
    }
}

/// Default extractor for the enabled feature set.
pub fn default_link_extractor() -> std::sync::Arc<dyn LinkExtractor> {
    #[cfg(feature = "scrape")]
    {
        std::sync::Arc::new(HtmlLinkExtractor)
    }
    #[cfg(not(feature = "scrape"))]
    {
        std::sync::Arc::new(NoopLinkExtractor)
    }
}

/// Whether a bio already contains links or handles.
pub fn has_link_markers(bio: &str) -> bool {
    let lower = bio.to_ascii_lowercase();
    LINK_MARKERS.iter().any(|m| lower.contains(m)) || SOCIAL_HOSTS.iter().any(|h| lower.contains(h))
}

/// Append links to a bio, one per line.
pub fn append_links(bio: Option<&str>, links: &[String]) -> Option<String> {
    if links.is_empty() {
        return bio.map(str::to_string);
    }
    let mut out = bio.map(str::trim_end).unwrap_or_default().to_string();
    for link in links {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(link);
    }
    Some(out)
}

/// Fetch a profile page and extract its outbound links.
pub async fn fetch_profile_links(
    client: &ApiClient,
    extractor: &dyn LinkExtractor,
    profile_url: &str,
    max_bytes: usize,
) -> Result<Vec<String>> {
    let html = client.get_text_bounded(profile_url, max_bytes).await?;
    let links = extractor.extract_links(&html, profile_url);
    tracing::debug!(url = profile_url, links = links.len(), "Extracted profile links");
    Ok(links)
}
