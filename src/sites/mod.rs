//! Per-site extraction
//!
//! Each supported catalog site implements [`SiteExtractor`]: URL building
//! for search and detail pages plus selector-based extraction of the
//! normalized record. Extractors are plain value structs holding only
//! configuration; all retry/delay/robots behavior lives in the fetch layer
//! and is composed in by the pipeline, not inherited.

mod dlsite;
mod twodfan;

pub use dlsite::DlSite;
pub use twodfan::{TwoDFan, TWODFAN_ASSET_HOST};

use scraper::{ElementRef, Selector};

use crate::fetch::FetchConfig;
use crate::model::{NormalizedRecord, SearchCandidate};
use crate::{ExtractError, GalinfoError};

/// Supported catalog sites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    TwoDFan,
    DlSite,
}

impl Site {
    /// Wire name used by the API's `site` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::TwoDFan => "2dfan",
            Site::DlSite => "dlsite",
        }
    }

    /// Builds the extractor for this site with its production configuration
    pub fn extractor(&self) -> Box<dyn SiteExtractor> {
        match self {
            Site::TwoDFan => Box::new(TwoDFan::new()),
            Site::DlSite => Box::new(DlSite::new()),
        }
    }
}

impl std::str::FromStr for Site {
    type Err = GalinfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2dfan" => Ok(Site::TwoDFan),
            "dlsite" => Ok(Site::DlSite),
            other => Err(GalinfoError::UnsupportedSite(other.to_string())),
        }
    }
}

/// Contract every site extractor implements
///
/// Field extraction is best-effort: a selector that matches nothing leaves
/// the field at its default and never fails the pass. Only an invalid
/// selector produces an [`ExtractError`].
pub trait SiteExtractor: Send + Sync {
    /// Fetch configuration for this site's crawler instances
    fn fetch_config(&self) -> FetchConfig;

    /// Builds the absolute search-page URL for a query
    fn build_search_url(&self, query: &str) -> String;

    /// Builds the detail-page URL to fetch for a search candidate
    ///
    /// May rewrite the candidate URL, e.g. to pin a locale query parameter.
    fn build_detail_url(&self, candidate_url: &str) -> String;

    /// Extracts search candidates from a search-results page
    fn parse_search_results(&self, html: &str) -> Result<Vec<SearchCandidate>, ExtractError>;

    /// Extracts the full normalized record from a detail page
    fn parse_detail_page(
        &self,
        html: &str,
        source_url: &str,
    ) -> Result<NormalizedRecord, ExtractError>;

    /// URL of the alternate-locale edition of this detail page, if the site
    /// supports a secondary-locale merge
    fn alternate_locale_url(&self, html: &str, detail_url: &str) -> Option<String> {
        let _ = (html, detail_url);
        None
    }

    /// Extracts only the canonical title from an alternate-locale page
    fn parse_alternate_title(&self, html: &str) -> String {
        let _ = html;
        String::new()
    }
}

/// Compiles a CSS selector, mapping failures into [`ExtractError`]
pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Concatenated, trimmed text content of an element
pub(crate) fn inline_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text content of an element with paragraphs joined by newline
///
/// Each text node is trimmed and empty nodes are dropped, matching the
/// newline-separated paragraph shape of the introduction field.
pub(crate) fn block_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Appends a label unless the sequence already contains it
pub(crate) fn push_unique(tags: &mut Vec<String>, label: &str) {
    if !tags.iter().any(|t| t == label) {
        tags.push(label.to_string());
    }
}
