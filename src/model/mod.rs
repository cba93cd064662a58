//! Normalized data model shared across site extractors
//!
//! Every site's detail extraction produces the same [`NormalizedRecord`]
//! shape, so the pipeline and the API layer never see site-specific types.

use serde::Serialize;

/// Canonical metadata record for one catalog entry
///
/// All fields default to empty; extraction fills in whatever the page
/// provides. Once returned from a pipeline the record is treated as
/// immutable — the alternate-locale merge builds a new value with struct
/// update syntax instead of mutating a shared one.
///
/// Invariants:
/// - `source_url` is the absolute detail URL that was resolved, never the query
/// - `lang_tags` contains no duplicate entries, insertion order preserved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    /// Canonical (usually original-language) title
    pub name: String,

    /// Localized/alternate title
    pub translated_name: String,

    /// Image URLs in page order
    pub images: Vec<String>,

    /// Publisher or circle name
    pub brand: String,

    /// Release date as `YYYY-MM-DD`, empty if unparsed
    pub release_date: String,

    /// Platforms, rarely populated
    pub platform: Vec<String>,

    /// Work-type/genre tags
    pub game_tags: Vec<String>,

    /// Thematic tags
    pub category_tags: Vec<String>,

    /// Supported-language labels, deduplicated
    pub lang_tags: Vec<String>,

    /// Absolute detail-page URL
    pub source_url: String,

    /// Free-text description, paragraphs joined by newline
    pub introduction: String,
}

/// Transient search hit: a name and the absolute detail URL it points to
///
/// Produced by search-page extraction and consumed immediately by the detail
/// stage; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub name: String,
    pub url: String,
}
