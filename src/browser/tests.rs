//! Tests for the browser module

use super::*;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_page(body: &str) -> String {
    format!("<html><body>{body}</body></html>")
}

fn test_browser(base_url: &str) -> HttpBrowser {
    let config = HttpBrowserConfig::builder()
        .base_url(base_url)
        .no_rate_limit()
        .build();
    HttpBrowser::with_config(config).unwrap()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_http_browser_config_default() {
    let config = HttpBrowserConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("market-harvest/"));
}

#[test]
fn test_http_browser_config_builder() {
    let config = HttpBrowserConfig::builder()
        .base_url("https://market.example.com")
        .timeout(Duration::from_secs(60))
        .header("Accept-Language", "ko-KR")
        .user_agent("test-agent/1.0")
        .rate_limit(RateLimiterConfig::unthrottled())
        .build();

    assert_eq!(
        config.base_url,
        Some("https://market.example.com".to_string())
    );
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(
        config.default_headers.get("Accept-Language"),
        Some(&"ko-KR".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::unthrottled()));
}

#[test]
fn test_resolve_against_base_url() {
    let browser = test_browser("https://market.example.com/");
    assert_eq!(
        browser.resolve("/category/661").unwrap(),
        "https://market.example.com/category/661"
    );
    assert_eq!(
        browser.resolve("https://other.example.com/x").unwrap(),
        "https://other.example.com/x"
    );
}

#[test]
fn test_resolve_without_base_url_fails() {
    let config = HttpBrowserConfig::builder().no_rate_limit().build();
    let browser = HttpBrowser::with_config(config).unwrap();
    assert!(browser.resolve("/category/661").is_err());
}

// ============================================================================
// Control Inspecting
// ============================================================================

#[test]
fn test_inspect_missing_control() {
    let html = html_page("<div class='list'></div>");
    assert_eq!(inspect_control_in_html(&html, ".pager a.next").unwrap(), None);
}

#[test_case("<a class='next' href='?page=2' disabled>next</a>" ; "disabled attribute")]
#[test_case("<a class='next' href='?page=2' aria-disabled='true'>next</a>" ; "aria disabled")]
#[test_case("<a class='next' href='?page=2' tabindex='-1'>next</a>" ; "negative tabindex")]
#[test_case("<a class='next disabled' href='?page=2'>next</a>" ; "disabled class")]
fn test_inspect_disabled_control(control: &str) {
    let html = html_page(&format!("<nav class='pager'>{control}</nav>"));
    let found = inspect_control_in_html(&html, ".pager .next").unwrap().unwrap();
    assert!(!found.enabled);
}

#[test]
fn test_inspect_takes_last_match() {
    let html = html_page(
        "<div class='pager'>\
            <button><a href='?page=1'>prev</a></button>\
            <button><a href='?page=3'>next</a></button>\
         </div>",
    );
    let found = inspect_control_in_html(&html, ".pager button").unwrap().unwrap();
    assert_eq!(found, ControlState::enabled(Some("?page=3".to_string())));
}

#[test]
fn test_inspect_ignores_placeholder_href() {
    let html = html_page("<a class='next' href='#'>next</a>");
    let found = inspect_control_in_html(&html, "a.next").unwrap().unwrap();
    assert!(found.enabled);
    assert!(found.target.is_none());
}

#[test]
fn test_inspect_invalid_selector() {
    let html = html_page("");
    assert!(inspect_control_in_html(&html, "a[").is_err());
}

#[test]
fn test_marker_text() {
    let page = RenderedPage::new(
        "https://market.example.com",
        html_page("<ul class='pagination'><li class='active'> 3 </li></ul>"),
    );
    assert_eq!(
        page.marker_text(".pagination .active").unwrap(),
        Some("3".to_string())
    );
    assert_eq!(page.marker_text(".missing").unwrap(), None);
}

// ============================================================================
// HTTP Browser
// ============================================================================

#[tokio::test]
async fn test_navigate_and_read_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/category/661"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("<article class='card'>Logo design</article>")),
        )
        .mount(&mock_server)
        .await;

    let mut browser = test_browser(&mock_server.uri());
    browser.navigate("/category/661").await.unwrap();

    let page = browser.current_page().await.unwrap();
    assert_eq!(page.status, 200);
    assert!(page.url.ends_with("/category/661"));
    assert!(page.html.contains("Logo design"));
}

#[tokio::test]
async fn test_current_page_before_navigation() {
    let browser = test_browser("https://market.example.com");
    assert!(matches!(
        browser.current_page().await,
        Err(crate::error::Error::NoPage)
    ));
}

#[tokio::test]
async fn test_navigate_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut browser = test_browser(&mock_server.uri());
    let err = browser.navigate("/@missing").await.unwrap_err();
    assert!(err.is_navigation());
    assert!(browser.current_page().await.is_err());
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut browser = test_browser(&mock_server.uri());
    assert!(browser.navigate("/flaky").await.is_err());
}

#[tokio::test]
async fn test_trigger_follows_relative_link() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/category/661"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(html_page(
                "<article>second</article><nav class='pager'><a class='next' disabled>next</a></nav>",
            )),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/category/661"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(html_page(
                "<article>first</article><nav class='pager'><a class='next' href='?page=2'>next</a></nav>",
            )),
        )
        .mount(&mock_server)
        .await;

    let mut browser = test_browser(&mock_server.uri());
    browser.navigate("/category/661").await.unwrap();

    let found = browser.inspect_control(".pager .next").await.unwrap().unwrap();
    assert!(found.enabled);

    browser.trigger_control(".pager .next").await.unwrap();
    let page = browser.current_page().await.unwrap();
    assert!(page.html.contains("second"));

    let found = browser.inspect_control(".pager .next").await.unwrap().unwrap();
    assert!(!found.enabled);
    assert!(browser.trigger_control(".pager .next").await.is_err());
}

#[tokio::test]
async fn test_button_without_link_is_disabled_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("<div class='pager'><button>next</button></div>")),
        )
        .mount(&mock_server)
        .await;

    let mut browser = test_browser(&mock_server.uri());
    browser.navigate("/list").await.unwrap();

    let found = browser.inspect_control(".pager button").await.unwrap().unwrap();
    assert!(!found.enabled);
}

#[tokio::test]
async fn test_factory_launches_independent_sessions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("a")))
        .mount(&mock_server)
        .await;

    let factory = HttpBrowserFactory::new(
        HttpBrowserConfig::builder()
            .base_url(mock_server.uri())
            .no_rate_limit()
            .build(),
    );

    let mut first = factory.launch().await.unwrap();
    let second = factory.launch().await.unwrap();

    first.navigate("/a").await.unwrap();
    assert!(first.current_page().await.is_ok());
    assert!(second.current_page().await.is_err());

    first.close().await.unwrap();
    assert!(first.current_page().await.is_err());
}
