//! Two-stage fetch-and-extract pipeline
//!
//! One pipeline invocation handles one query, strictly sequentially:
//! build search URL → fetch → extract candidates → resolve the first
//! candidate's detail page → optionally fetch an alternate-locale edition
//! and merge its title. Each stage constructs and owns its own [`Fetcher`],
//! which is dropped (and its connections released) as soon as the stage
//! completes — including on error paths.

use reqwest::Method;

use crate::fetch::Fetcher;
use crate::model::NormalizedRecord;
use crate::sites::SiteExtractor;
use crate::{FetchError, GalinfoError};

/// Runs the full pipeline for one query against one site
///
/// An empty search-result set is a successful outcome with an empty record
/// list, not an error. Only the first candidate is resolved to a detail
/// record; batch resolution is deliberately out of scope. Search-stage and
/// primary-detail failures propagate; an alternate-locale failure is
/// absorbed and leaves the merged field at its default.
pub async fn run(
    extractor: &dyn SiteExtractor,
    query: &str,
    proxy: Option<&str>,
) -> Result<Vec<NormalizedRecord>, GalinfoError> {
    let proxy = proxy.map(str::to_string);

    // Search stage, with its own scoped client.
    let candidates = {
        let fetcher = Fetcher::new(extractor.fetch_config().proxy(proxy.clone())).await?;
        let search_url = extractor.build_search_url(query);
        tracing::debug!("Searching {}", search_url);

        let html = fetch_text(&fetcher, &search_url).await?;
        extractor.parse_search_results(&html)?
    };

    let Some(candidate) = candidates.into_iter().next() else {
        tracing::info!("No search results for {:?}", query);
        return Ok(Vec::new());
    };
    tracing::debug!("Resolving first candidate {:?} at {}", candidate.name, candidate.url);

    // Detail stage; the primary and alternate-locale fetches share this
    // stage's client.
    let fetcher = Fetcher::new(extractor.fetch_config().proxy(proxy)).await?;
    let detail_url = extractor.build_detail_url(&candidate.url);
    let html = fetch_text(&fetcher, &detail_url).await?;
    let record = extractor.parse_detail_page(&html, &candidate.url)?;

    let record = match extractor.alternate_locale_url(&html, &candidate.url) {
        Some(alternate_url) => merge_alternate_title(extractor, &fetcher, record, &alternate_url).await,
        None => record,
    };

    Ok(vec![record])
}

/// Fetches a URL and reads the body, folding body-read failures into the
/// fetch error type
async fn fetch_text(fetcher: &Fetcher, url: &str) -> Result<String, FetchError> {
    let response = fetcher.fetch(url, Method::GET).await?;
    response.text().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })
}

/// Fetches the alternate-locale page and substitutes its title as the
/// canonical name, keeping every other field from the primary record
///
/// Any failure here is non-fatal: the primary record is returned unchanged.
async fn merge_alternate_title(
    extractor: &dyn SiteExtractor,
    fetcher: &Fetcher,
    record: NormalizedRecord,
    alternate_url: &str,
) -> NormalizedRecord {
    match fetch_text(fetcher, alternate_url).await {
        Ok(html) => {
            let name = extractor.parse_alternate_title(&html);
            if name.is_empty() {
                record
            } else {
                NormalizedRecord { name, ..record }
            }
        }
        Err(e) => {
            tracing::warn!("Alternate-locale fetch failed for {}: {}", alternate_url, e);
            record
        }
    }
}
