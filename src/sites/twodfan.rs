//! 2DFan extractor
//!
//! Search results live under `#subjects li.media`; detail pages carry the
//! title in `<title>` (separated from the site name by `_`), labeled
//! `p.tags` paragraphs for alternate name / brand / release date, sidebar
//! labels for thematic tags, a single cover image, and a `blockquote`
//! introduction.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

use super::{block_text, inline_text, push_unique, selector, SiteExtractor};
use crate::fetch::FetchConfig;
use crate::model::{NormalizedRecord, SearchCandidate};
use crate::ExtractError;

const BASE_URL: &str = "https://2dfan.com";

/// Host serving 2DFan cover images; site-relative image paths are rewritten
/// onto it, and the image proxy only accepts URLs from it
pub const TWODFAN_ASSET_HOST: &str = "https://img.achost.top";

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date regex"))
}

/// 2DFan site extractor
#[derive(Debug, Clone)]
pub struct TwoDFan {
    config: FetchConfig,
}

impl TwoDFan {
    pub fn new() -> Self {
        Self::with_config(FetchConfig::new(BASE_URL))
    }

    /// Uses a custom fetch configuration (base URL, retries, delays)
    pub fn with_config(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Fetch configuration for the image proxy: same crawler settings plus
    /// the Referer the asset host expects
    pub fn image_fetch_config() -> FetchConfig {
        FetchConfig::new(BASE_URL).header("Referer", BASE_URL)
    }

    fn parse_name(&self, document: &Html) -> Result<String, ExtractError> {
        let title_sel = selector("title")?;
        if let Some(title) = document.select(&title_sel).next() {
            let text = inline_text(title);
            if let Some((name, _)) = text.split_once('_') {
                return Ok(name.trim().to_string());
            }
        }
        Ok(String::new())
    }

    /// Walks the labeled `p.tags` paragraphs for alternate name, brand, and
    /// release date
    fn parse_game_info(&self, document: &Html) -> Result<(String, String, String), ExtractError> {
        let tags_sel = selector("p.tags")?;
        let muted_sel = selector("span.muted")?;
        let link_sel = selector("a")?;

        let mut translated_name = String::new();
        let mut brand = String::new();
        let mut release_date = String::new();

        for paragraph in document.select(&tags_sel) {
            let text = paragraph.text().collect::<String>();

            if text.contains("又名：") {
                if let Some(span) = paragraph.select(&muted_sel).next() {
                    translated_name = inline_text(span);
                }
            } else if text.contains("品牌：") {
                if let Some(link) = paragraph.select(&link_sel).next() {
                    brand = inline_text(link);
                }
            } else if text.contains("发售日期：") {
                if let Some(found) = iso_date_re().find(&text) {
                    release_date = found.as_str().to_string();
                }
            }
        }

        Ok((translated_name, brand, release_date))
    }

    fn parse_category_tags(&self, document: &Html) -> Result<Vec<String>, ExtractError> {
        let section_sel = selector("#sidebar .block-content.tags")?;
        let label_sel = selector("a.label.label-info")?;

        let mut tags = Vec::new();
        if let Some(section) = document.select(&section_sel).next() {
            for link in section.select(&label_sel) {
                let tag = inline_text(link);
                if !tag.is_empty() {
                    push_unique(&mut tags, &tag);
                }
            }
        }
        Ok(tags)
    }

    fn parse_images(&self, document: &Html) -> Result<Vec<String>, ExtractError> {
        let image_sel = selector("img[src*='subjects'], img[src*='uploads/subjects']")?;

        let mut images = Vec::new();
        if let Some(image) = document.select(&image_sel).next() {
            if let Some(src) = image.value().attr("src") {
                images.push(normalize_image_url(src));
            }
        }
        Ok(images)
    }

    fn parse_introduction(&self, document: &Html) -> Result<String, ExtractError> {
        let quote_sel = selector("blockquote")?;
        Ok(document
            .select(&quote_sel)
            .next()
            .map(block_text)
            .unwrap_or_default())
    }
}

impl Default for TwoDFan {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrites protocol-relative and site-relative image URLs to absolute ones
fn normalize_image_url(src: &str) -> String {
    if let Some(rest) = src.strip_prefix("//") {
        format!("https://{}", rest)
    } else if src.starts_with('/') {
        format!("{}{}", TWODFAN_ASSET_HOST, src)
    } else {
        src.to_string()
    }
}

impl SiteExtractor for TwoDFan {
    fn fetch_config(&self) -> FetchConfig {
        self.config.clone()
    }

    fn build_search_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{}/subjects/search?keyword={}", self.config.base_url, encoded)
    }

    fn build_detail_url(&self, candidate_url: &str) -> String {
        candidate_url.to_string()
    }

    fn parse_search_results(&self, html: &str) -> Result<Vec<SearchCandidate>, ExtractError> {
        let document = Html::parse_document(html);
        let item_sel = selector("#subjects li.media")?;
        let link_sel = selector("h4.media-heading a")?;

        let mut results = Vec::new();
        for item in document.select(&item_sel) {
            let Some(link) = item.select(&link_sel).next() else {
                continue;
            };
            let href = link.value().attr("href").unwrap_or_default();
            results.push(SearchCandidate {
                name: inline_text(link),
                url: format!("{}{}", self.config.base_url, href),
            });
        }

        Ok(results)
    }

    fn parse_detail_page(
        &self,
        html: &str,
        source_url: &str,
    ) -> Result<NormalizedRecord, ExtractError> {
        let document = Html::parse_document(html);

        let name = self.parse_name(&document)?;
        let (translated_name, brand, release_date) = self.parse_game_info(&document)?;

        Ok(NormalizedRecord {
            name,
            translated_name,
            brand,
            release_date,
            category_tags: self.parse_category_tags(&document)?,
            images: self.parse_images(&document)?,
            introduction: self.parse_introduction(&document)?,
            source_url: source_url.to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_HTML: &str = include_str!("../../tests/fixtures/twodfan_detail.html");

    #[test]
    fn test_build_search_url_encodes_query() {
        let site = TwoDFan::new();
        assert_eq!(
            site.build_search_url("9-nine-"),
            "https://2dfan.com/subjects/search?keyword=9-nine-"
        );
        assert_eq!(
            site.build_search_url("水仙 ナルキッソス"),
            "https://2dfan.com/subjects/search?keyword=%E6%B0%B4%E4%BB%99+%E3%83%8A%E3%83%AB%E3%82%AD%E3%83%83%E3%82%BD%E3%82%B9"
        );
    }

    #[test]
    fn test_parse_search_results() {
        let html = r##"
            <div id="subjects"><ul>
            <li class="media">
              <h4 class="media-heading"><a href="/subjects/125">水仙 ナルキッソス</a></h4>
            </li>
            <li class="media">
              <h4 class="media-heading"><a href="/subjects/126">水仙2</a></h4>
            </li>
            <li class="media"><h4 class="media-heading">no link here</h4></li>
            </ul></div>
        "##;
        let site = TwoDFan::new();
        let results = site.parse_search_results(html).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "水仙 ナルキッソス");
        assert_eq!(results[0].url, "https://2dfan.com/subjects/125");
    }

    #[test]
    fn test_parse_search_results_empty_page() {
        let site = TwoDFan::new();
        let results = site.parse_search_results("<html><body></body></html>").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_detail_page() {
        let site = TwoDFan::new();
        let record = site
            .parse_detail_page(DETAIL_HTML, "https://2dfan.com/subjects/125")
            .unwrap();

        assert_eq!(record.name, "水仙 ナルキッソス");
        assert_eq!(record.translated_name, "Narcissus");
        assert_eq!(record.brand, "ステージななII");
        assert_eq!(record.release_date, "2005-09-15");
        assert_eq!(record.category_tags, vec!["悲剧", "治愈"]);
        assert_eq!(
            record.images,
            vec!["https://img.achost.top/uploads/subjects/125/cover.jpg"]
        );
        assert_eq!(record.introduction, "第一段。\n第二段。");
        assert_eq!(record.source_url, "https://2dfan.com/subjects/125");
        // Fields this site never provides stay at their defaults.
        assert!(record.lang_tags.is_empty());
        assert!(record.game_tags.is_empty());
    }

    #[test]
    fn test_parse_detail_is_idempotent() {
        let site = TwoDFan::new();
        let first = site
            .parse_detail_page(DETAIL_HTML, "https://2dfan.com/subjects/125")
            .unwrap();
        let second = site
            .parse_detail_page(DETAIL_HTML, "https://2dfan.com/subjects/125")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_fields_stay_default() {
        let html = "<html><head><title>NoSeparator</title></head><body></body></html>";
        let site = TwoDFan::new();
        let record = site.parse_detail_page(html, "https://2dfan.com/x").unwrap();
        // Title without the separator yields no name rather than an error.
        assert!(record.name.is_empty());
        assert!(record.brand.is_empty());
        assert!(record.release_date.is_empty());
        assert!(record.images.is_empty());
    }

    #[test]
    fn test_normalize_image_url() {
        assert_eq!(
            normalize_image_url("//img.achost.top/x.jpg"),
            "https://img.achost.top/x.jpg"
        );
        assert_eq!(
            normalize_image_url("/img/x.jpg"),
            "https://img.achost.top/img/x.jpg"
        );
        assert_eq!(
            normalize_image_url("https://elsewhere.example/x.jpg"),
            "https://elsewhere.example/x.jpg"
        );
    }

    #[test]
    fn test_malformed_date_left_empty() {
        let html = r#"
            <html><head><title>t_2DFan</title></head><body>
            <p class="tags">发售日期：someday soon</p>
            </body></html>
        "#;
        let site = TwoDFan::new();
        let record = site.parse_detail_page(html, "https://2dfan.com/x").unwrap();
        assert!(record.release_date.is_empty());
    }
}
