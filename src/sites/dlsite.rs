//! DLsite extractor
//!
//! DLsite listings are bilingual: the primary fetch uses the zh_CN locale
//! and fills everything except the canonical title, which comes from a
//! second ja_JP fetch (either a linked Japanese edition or the same URL with
//! the locale swapped). Release dates use CJK glyph separators, languages
//! are icon classes plus a free-text edition list, and images sit in a
//! slider container with protocol-relative `data-src` URLs.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use super::{block_text, inline_text, push_unique, selector, SiteExtractor};
use crate::fetch::FetchConfig;
use crate::model::{NormalizedRecord, SearchCandidate};
use crate::ExtractError;

const BASE_URL: &str = "https://www.dlsite.com";

const PRIMARY_LOCALE: &str = "zh_CN";
const ALTERNATE_LOCALE: &str = "ja_JP";

// Fixed search-filter path segments: all age ratings, game-capable work
// categories, trend ordering, and every supported language option.
const SEARCH_AGE_CATEGORY: &str = "age_category[0]/general/age_category[1]/r15/age_category[2]/adult/";
const SEARCH_WORK_CATEGORY: &str =
    "work_category[0]/doujin/work_category[1]/pc/work_category[2]/app/work_category[3]/ai/";
const SEARCH_ORDER: &str = "order/trend/";
const SEARCH_WORK_TYPE: &str = "work_type_category[0]/game/";
const SEARCH_OPTIONS: &str = "options_and_or/and/options[0]/JPN/options[1]/ENG/options[2]/CHI_HANS/options[3]/CHI_HANT/options[4]/KO_KR/options[5]/SPA/options[6]/OTL/options[7]/NM/";
const SEARCH_FROM: &str = "from/fsr.more/";

/// Icon-class token to human-readable language label
const LANG_ICONS: &[(&str, &str)] = &[
    ("icon_JPN", "日语"),
    ("icon_ENG", "英语"),
    ("icon_CHI_HANS", "简体中文"),
    ("icon_CHI_HANT", "繁体中文"),
    ("icon_KO_KR", "韩语"),
    ("icon_SPA", "西班牙语"),
    ("icon_OTL", "其他语言"),
    ("icon_NM", "无语言"),
];

/// Free-text edition label to canonical language label
const LANG_LABELS: &[(&str, &str)] = &[
    ("日文", "日语"),
    ("简体中文（官方翻译）", "简体中文"),
    ("简体中文", "简体中文"),
    ("繁体中文（官方翻译）", "繁体中文"),
    ("繁体中文", "繁体中文"),
    ("英语（官方翻译）", "英语"),
    ("英文", "英语"),
    ("韩语（官方翻译）", "韩语"),
    ("韩文", "韩语"),
    ("西班牙语（官方翻译）", "西班牙语"),
    ("西班牙文", "西班牙语"),
];

fn cjk_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}年\d{2}月\d{2}日").expect("valid date regex"))
}

/// DLsite site extractor
#[derive(Debug, Clone)]
pub struct DlSite {
    config: FetchConfig,
}

impl DlSite {
    pub fn new() -> Self {
        Self::with_config(FetchConfig::new(BASE_URL))
    }

    /// Uses a custom fetch configuration (base URL, retries, delays)
    pub fn with_config(config: FetchConfig) -> Self {
        Self { config }
    }

    fn parse_name(&self, document: &Html) -> Result<String, ExtractError> {
        let name_sel = selector("h1#work_name")?;
        Ok(document
            .select(&name_sel)
            .next()
            .map(inline_text)
            .unwrap_or_default())
    }

    fn parse_brand(&self, document: &Html) -> Result<String, ExtractError> {
        let brand_sel = selector("span.maker_name a")?;
        Ok(document
            .select(&brand_sel)
            .next()
            .map(inline_text)
            .unwrap_or_default())
    }

    /// Finds the release-date outline row by its zh/ja header label and
    /// normalizes the glyph-separated date to `YYYY-MM-DD`
    fn parse_release_date(&self, document: &Html) -> Result<String, ExtractError> {
        let row_sel = selector("table#work_outline tr")?;
        let th_sel = selector("th")?;
        let td_sel = selector("td")?;

        for row in document.select(&row_sel) {
            let (Some(th), Some(td)) = (
                row.select(&th_sel).next(),
                row.select(&td_sel).next(),
            ) else {
                continue;
            };

            let header = inline_text(th);
            if header.contains("販売日") || header.contains("发售日") {
                let text = td.text().collect::<String>();
                return Ok(normalize_cjk_date(&text));
            }
        }

        Ok(String::new())
    }

    fn parse_category_tags(&self, document: &Html) -> Result<Vec<String>, ExtractError> {
        let genre_sel = selector("div.main_genre")?;
        let link_sel = selector("a")?;

        let mut tags = Vec::new();
        if let Some(genre) = document.select(&genre_sel).next() {
            for link in genre.select(&link_sel) {
                let tag = inline_text(link);
                if !tag.is_empty() {
                    push_unique(&mut tags, &tag);
                }
            }
        }
        Ok(tags)
    }

    /// Language labels from the outline table's icon spans, merged with the
    /// edition list's free-text labels; duplicates are skipped throughout
    fn parse_language_tags(&self, document: &Html) -> Result<Vec<String>, ExtractError> {
        let row_sel = selector("table#work_outline tr")?;
        let th_sel = selector("th")?;
        let genre_sel = selector("div.work_genre")?;
        let icon_sel = selector("span[class*='icon_']")?;

        let mut tags = Vec::new();

        for row in document.select(&row_sel) {
            let Some(th) = row.select(&th_sel).next() else {
                continue;
            };
            if !inline_text(th).contains("支持的语言") {
                continue;
            }

            if let Some(genre) = row.select(&genre_sel).next() {
                for span in genre.select(&icon_sel) {
                    for class in span.value().classes() {
                        if let Some((_, label)) =
                            LANG_ICONS.iter().find(|(icon, _)| *icon == class)
                        {
                            push_unique(&mut tags, label);
                            break;
                        }
                    }
                }
            }
            break;
        }

        for link in self.edition_language_links(document)? {
            let label = inline_text(link);
            if let Some((_, canonical)) = LANG_LABELS.iter().find(|(raw, _)| *raw == label) {
                push_unique(&mut tags, canonical);
            }
        }

        Ok(tags)
    }

    /// Links of the 语言选择 entry in the edition list, empty when absent
    fn edition_language_links<'a>(
        &self,
        document: &'a Html,
    ) -> Result<Vec<ElementRef<'a>>, ExtractError> {
        let edition_sel = selector("ul.work_edition")?;
        let item_sel = selector("li")?;
        let label_sel = selector("p.work_label")?;
        let link_sel = selector("a.work_edition_linklist_item")?;

        if let Some(edition) = document.select(&edition_sel).next() {
            for item in edition.select(&item_sel) {
                let Some(label) = item.select(&label_sel).next() else {
                    continue;
                };
                if inline_text(label).contains("语言选择") {
                    return Ok(item.select(&link_sel).collect());
                }
            }
        }

        Ok(Vec::new())
    }

    fn parse_images(&self, document: &Html) -> Result<Vec<String>, ExtractError> {
        let slider_sel = selector("div.product-slider-data")?;
        let img_sel = selector("div[data-src]")?;

        let mut images = Vec::new();
        if let Some(slider) = document.select(&slider_sel).next() {
            for div in slider.select(&img_sel) {
                let src = div.value().attr("data-src").unwrap_or_default();
                if src.is_empty() {
                    continue;
                }
                if let Some(rest) = src.strip_prefix("//") {
                    images.push(format!("https://{}", rest));
                } else {
                    images.push(src.to_string());
                }
            }
        }
        Ok(images)
    }

    /// Work-type token from the category icon, e.g. `icon_ADV` → `ADV`
    fn parse_game_tags(&self, document: &Html) -> Result<Vec<String>, ExtractError> {
        let category_sel = selector("div#category_type")?;
        let genre_sel = selector("div.work_genre")?;
        let span_sel = selector("span")?;

        let container = document
            .select(&category_sel)
            .next()
            .or_else(|| document.select(&genre_sel).next());

        let mut tags = Vec::new();
        if let Some(container) = container {
            if let Some(span) = container.select(&span_sel).next() {
                if let Some(class) = span.value().classes().next() {
                    tags.push(class.strip_prefix("icon_").unwrap_or(class).to_string());
                }
            }
        }
        Ok(tags)
    }

    fn parse_introduction(&self, document: &Html) -> Result<String, ExtractError> {
        let description_sel = selector("div[itemprop='description']")?;
        let parts_sel = selector("div.work_parts_area")?;

        let Some(description) = document.select(&description_sel).next() else {
            return Ok(String::new());
        };

        let parts: Vec<String> = description
            .select(&parts_sel)
            .map(block_text)
            .filter(|t| !t.is_empty())
            .collect();

        Ok(parts.join("\n"))
    }
}

impl Default for DlSite {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends a locale query parameter unless the URL already carries one
fn with_locale(url: &str, locale: &str) -> String {
    if url.contains("locale") {
        return url.to_string();
    }
    let trimmed = url.strip_suffix('/').unwrap_or(url);
    format!("{}/?locale={}", trimmed, locale)
}

/// Rewrites a `YYYY年MM月DD日` date to `YYYY-MM-DD`; anything else is empty
fn normalize_cjk_date(text: &str) -> String {
    match cjk_date_re().find(text) {
        Some(found) => found
            .as_str()
            .replace('年', "-")
            .replace('月', "-")
            .replace('日', ""),
        None => String::new(),
    }
}

impl SiteExtractor for DlSite {
    fn fetch_config(&self) -> FetchConfig {
        self.config.clone()
    }

    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/maniax/fsr/=/keyword/{}/{}{}{}{}{}{}?locale={}",
            self.config.base_url,
            query.replace(' ', "+"),
            SEARCH_AGE_CATEGORY,
            SEARCH_WORK_CATEGORY,
            SEARCH_ORDER,
            SEARCH_WORK_TYPE,
            SEARCH_OPTIONS,
            SEARCH_FROM,
            PRIMARY_LOCALE,
        )
    }

    fn build_detail_url(&self, candidate_url: &str) -> String {
        with_locale(candidate_url, PRIMARY_LOCALE)
    }

    fn parse_search_results(&self, html: &str) -> Result<Vec<SearchCandidate>, ExtractError> {
        let document = Html::parse_document(html);
        let item_sel = selector("dd.work_name")?;
        let link_sel = selector("a")?;

        let mut results = Vec::new();
        for item in document.select(&item_sel) {
            let Some(link) = item.select(&link_sel).next() else {
                continue;
            };
            // DLsite search hrefs are already absolute.
            let url = link.value().attr("href").unwrap_or_default().to_string();
            results.push(SearchCandidate {
                name: inline_text(link),
                url,
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

        // The primary locale page fills everything except the canonical
        // title, which the alternate-locale merge supplies afterwards.
        Ok(NormalizedRecord {
            translated_name: self.parse_name(&document)?,
            brand: self.parse_brand(&document)?,
            release_date: self.parse_release_date(&document)?,
            category_tags: self.parse_category_tags(&document)?,
            lang_tags: self.parse_language_tags(&document)?,
            images: self.parse_images(&document)?,
            game_tags: self.parse_game_tags(&document)?,
            introduction: self.parse_introduction(&document)?,
            source_url: source_url.to_string(),
            ..Default::default()
        })
    }

    /// Prefers the linked Japanese edition; falls back to re-fetching the
    /// same detail URL in the alternate locale
    fn alternate_locale_url(&self, html: &str, detail_url: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let link_sel = selector("a.work_edition_linklist_item").ok()?;

        for link in document.select(&link_sel) {
            let text = inline_text(link);
            if text != "日本語" && text != "日文" {
                continue;
            }
            let href = link.value().attr("href").unwrap_or_default();
            if !href.is_empty() && !href.starts_with('#') {
                tracing::debug!("Japanese edition link found: {}", href);
                return Some(with_locale(href, ALTERNATE_LOCALE));
            }
        }

        Some(with_locale(detail_url, ALTERNATE_LOCALE))
    }

    fn parse_alternate_title(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        self.parse_name(&document).unwrap_or_default()
    }
}
