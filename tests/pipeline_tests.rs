//! Integration tests for the fetch-and-extract pipeline
//!
//! These tests use wiremock to stand in for the catalog sites and exercise
//! the full pipeline end-to-end: search, detail, alternate-locale merge,
//! retry, and robots gating.

use galinfo::fetch::{FetchConfig, Fetcher};
use galinfo::sites::{DlSite, TwoDFan};
use galinfo::{pipeline, FetchError};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DLSITE_DETAIL_CN: &str = include_str!("fixtures/dlsite_detail_cn.html");
const DLSITE_DETAIL_JP: &str = include_str!("fixtures/dlsite_detail_jp.html");
const TWODFAN_DETAIL: &str = include_str!("fixtures/twodfan_detail.html");

/// Fetch configuration pointed at the mock server, with delays short enough
/// for tests
fn test_config(base_url: &str) -> FetchConfig {
    FetchConfig::new(base_url).delay_range(0.0, 0.01).max_retries(0)
}

fn dlsite_search_body(base_url: &str) -> String {
    format!(
        r#"<html><body><dl>
        <dd class="work_name">
          <a href="{base_url}/maniax/work/=/product_id/VJ014408.html">9-nine-</a>
        </dd>
        </dl></body></html>"#
    )
}

#[tokio::test]
async fn test_dlsite_full_pipeline_with_locale_merge() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path_regex("^/maniax/fsr/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(dlsite_search_body(&base_url)))
        .mount(&mock_server)
        .await;

    // Primary locale detail page.
    Mock::given(method("GET"))
        .and(path("/maniax/work/=/product_id/VJ014408.html/"))
        .and(query_param("locale", "zh_CN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DLSITE_DETAIL_CN))
        .mount(&mock_server)
        .await;

    // The cn page carries no Japanese edition link, so the pipeline retries
    // the same URL in ja_JP.
    Mock::given(method("GET"))
        .and(path("/maniax/work/=/product_id/VJ014408.html/"))
        .and(query_param("locale", "ja_JP"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DLSITE_DETAIL_JP))
        .mount(&mock_server)
        .await;

    let site = DlSite::with_config(test_config(&base_url));
    let records = pipeline::run(&site, "9-nine-", None).await.expect("pipeline failed");

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "9-nine-");
    assert_eq!(record.translated_name, "【简体中文版】9-nine-");
    assert_eq!(record.brand, "ぱれっと");
    assert_eq!(record.release_date, "2021-04-23");
    assert!(record.lang_tags.contains(&"日语".to_string()));
    assert_eq!(record.game_tags, vec!["ADV"]);
    assert!(record
        .source_url
        .ends_with("/maniax/work/=/product_id/VJ014408.html"));
    assert_eq!(record.images.len(), 2);
    assert!(record.images[0].starts_with("https://img.dlsite.jp/"));
}

#[tokio::test]
async fn test_dlsite_alternate_locale_failure_is_absorbed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path_regex("^/maniax/fsr/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(dlsite_search_body(&base_url)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/maniax/work/=/product_id/VJ014408.html/"))
        .and(query_param("locale", "zh_CN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DLSITE_DETAIL_CN))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/maniax/work/=/product_id/VJ014408.html/"))
        .and(query_param("locale", "ja_JP"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let site = DlSite::with_config(test_config(&base_url));
    let records = pipeline::run(&site, "9-nine-", None).await.expect("pipeline failed");

    // The primary record survives; only the merged name stays empty.
    assert_eq!(records.len(), 1);
    assert!(records[0].name.is_empty());
    assert_eq!(records[0].translated_name, "【简体中文版】9-nine-");
    assert_eq!(records[0].release_date, "2021-04-23");
}

#[tokio::test]
async fn test_twodfan_full_pipeline() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/subjects/search"))
        .and(query_param("keyword", "水仙"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r##"<html><body><div id="subjects"><ul>
            <li class="media">
              <h4 class="media-heading"><a href="/subjects/125">水仙 ナルキッソス</a></h4>
            </li>
            </ul></div></body></html>"##,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/subjects/125"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TWODFAN_DETAIL))
        .mount(&mock_server)
        .await;

    let site = TwoDFan::with_config(test_config(&base_url));
    let records = pipeline::run(&site, "水仙", None).await.expect("pipeline failed");

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "水仙 ナルキッソス");
    assert_eq!(record.translated_name, "Narcissus");
    assert_eq!(record.brand, "ステージななII");
    assert_eq!(record.release_date, "2005-09-15");
    assert_eq!(record.source_url, format!("{}/subjects/125", base_url));
    assert_eq!(
        record.images,
        vec!["https://img.achost.top/uploads/subjects/125/cover.jpg".to_string()]
    );
}

#[tokio::test]
async fn test_empty_search_is_successful_and_empty() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/subjects/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><div id=\"subjects\"></div></body></html>"),
        )
        .mount(&mock_server)
        .await;

    let site = TwoDFan::with_config(test_config(&base_url));
    let records = pipeline::run(&site, "nonexistent", None)
        .await
        .expect("empty search must not be an error");
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_search_failure_propagates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/subjects/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let site = TwoDFan::with_config(test_config(&base_url));
    let result = pipeline::run(&site, "anything", None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // First attempt fails, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&mock_server)
        .await;

    let config = FetchConfig::new(&base_url).delay_range(0.0, 0.01).max_retries(1);
    let fetcher = Fetcher::new(config).await.expect("client build failed");

    let response = fetcher.get(&format!("{}/flaky", base_url)).await.expect("retry failed");
    assert_eq!(response.text().await.unwrap(), "recovered");
}

#[tokio::test]
async fn test_retries_exhausted_surfaces_transport_error() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2) // initial attempt + one retry, never more
        .mount(&mock_server)
        .await;

    let config = FetchConfig::new(&base_url).delay_range(0.0, 0.01).max_retries(1);
    let fetcher = Fetcher::new(config).await.expect("client build failed");

    let result = fetcher.get(&format!("{}/down", base_url)).await;
    assert!(matches!(result, Err(FetchError::Transport { .. })));
}

#[tokio::test]
async fn test_robots_disallow_blocks_without_network_call() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&mock_server)
        .await;

    // The blocked path must never be requested.
    Mock::given(method("GET"))
        .and(path("/private/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = FetchConfig::new(&base_url)
        .delay_range(0.0, 0.01)
        .max_retries(0)
        .respect_robots(true);
    let fetcher = Fetcher::new(config).await.expect("client build failed");

    let result = fetcher.get(&format!("{}/private/data", base_url)).await;
    assert!(matches!(result, Err(FetchError::RobotsDisallowed { .. })));
}

#[tokio::test]
async fn test_unloadable_robots_is_permissive() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // No robots.txt mock: the load fails and gating becomes a no-op.
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let config = FetchConfig::new(&base_url)
        .delay_range(0.0, 0.01)
        .max_retries(0)
        .respect_robots(true);
    let fetcher = Fetcher::new(config).await.expect("client build failed");

    let response = fetcher.get(&format!("{}/page", base_url)).await.expect("fetch failed");
    assert_eq!(response.text().await.unwrap(), "ok");
}
