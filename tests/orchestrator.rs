mod support;

use support::{fast_config, list_page, FakeBrowser};
use webtag::error::BrowserErrorKind;
use webtag::{Error, ExtractionRequest, Mode, ModeUsed, Orchestrator};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(route: &str, status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn orchestrator(browser: &FakeBrowser) -> Orchestrator {
    Orchestrator::with_launcher(fast_config(), browser.launcher()).unwrap()
}

fn request(url: String, selector: &str, mode: Mode) -> ExtractionRequest {
    ExtractionRequest::builder(url, selector)
        .mode(mode)
        .max_scrolls(2)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_auto_falls_back_to_browser_when_static_is_empty() {
    let server = serve("/app", 200, "<html><body><div id=\"root\"></div></body></html>").await;
    let browser = FakeBrowser::with_pages([list_page(&["X"])]);

    let req = request(format!("{}/app", server.uri()), "li", Mode::Auto);
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["X"]);
    assert_eq!(report.result.mode_used, ModeUsed::Selenium);
    assert!(report.errors.is_empty());

    let state = browser.state();
    assert_eq!(state.launches, 1);
    assert_eq!(state.closes, 1);
}

#[tokio::test]
async fn test_auto_keeps_static_result_without_launching() {
    let server = serve("/list", 200, &list_page(&["Alpha", "Beta"])).await;
    let browser = FakeBrowser::with_pages([list_page(&["never"])]);

    let req = request(format!("{}/list", server.uri()), "li", Mode::Auto);
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["Alpha", "Beta"]);
    assert_eq!(report.result.mode_used, ModeUsed::Simple);
    assert_eq!(browser.state().launches, 0);
}

#[tokio::test]
async fn test_auto_static_error_still_falls_back() {
    let server = serve("/blocked", 403, "denied").await;
    let browser = FakeBrowser::with_pages([list_page(&["Y"])]);

    let req = request(format!("{}/blocked", server.uri()), "li", Mode::Auto);
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["Y"]);
    assert_eq!(report.result.mode_used, ModeUsed::Selenium);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], Error::HttpStatus { status: 403, .. }));
}

#[tokio::test]
async fn test_auto_both_failing_is_empty_selenium_with_errors() {
    let server = serve("/blocked", 503, "busy").await;
    let browser = FakeBrowser::with_pages([list_page(&["Z"])]).failing_launch();

    let req = request(format!("{}/blocked", server.uri()), "li", Mode::Auto);
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert!(report.result.is_empty());
    assert_eq!(report.result.mode_used, ModeUsed::Selenium);
    assert_eq!(report.errors.len(), 2);
    assert!(matches!(
        report.errors[1],
        Error::Browser {
            kind: BrowserErrorKind::Launch,
            ..
        }
    ));
}

#[tokio::test]
async fn test_explicit_simple_propagates_errors() {
    let server = serve("/gone", 404, "").await;
    let browser = FakeBrowser::default();

    let req = request(format!("{}/gone", server.uri()), "li", Mode::Simple);
    let err = orchestrator(&browser).extract(&req).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    assert_eq!(browser.state().launches, 0);
}

#[tokio::test]
async fn test_explicit_selenium_closes_session_on_error() {
    let browser = FakeBrowser::with_pages([list_page(&["A"])]);

    let req = request("https://unused.test".to_string(), ".missing", Mode::Selenium);
    let err = orchestrator(&browser).extract(&req).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Browser {
            kind: BrowserErrorKind::Timeout,
            ..
        }
    ));
    assert_eq!(browser.state().closes, 1);
}

#[tokio::test]
async fn test_selenium_paginate_enables_load_more() {
    let browser = FakeBrowser::with_pages([list_page(&["A"]), list_page(&["A", "B"])])
        .control(".load-more", false);

    let req = ExtractionRequest::builder("https://dyn.test", "li")
        .mode(Mode::Selenium)
        .paginate(true)
        .max_scrolls(0)
        .build()
        .unwrap();
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["A", "B"]);
    assert_eq!(browser.state().clicks, 1);
}

#[tokio::test]
async fn test_simple_paginate_walks_detected_pages() {
    let first = r#"<html><body>
        <ul class="results"><li>Alpha</li><li>Beta</li></ul>
        <nav class="pagination"><a href="?page=1">1</a><a href="?page=2">2</a>
        <a href="?page=3">3</a><a href="?page=2">Next</a></nav>
    </body></html>"#;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&["Gamma", "Alpha"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(first))
        .mount(&server)
        .await;

    let browser = FakeBrowser::default();
    let req = ExtractionRequest::builder(format!("{}/list", server.uri()), "ul.results li")
        .mode(Mode::Simple)
        .paginate(true)
        .build()
        .unwrap();
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["Alpha", "Beta", "Gamma"]);
    assert_eq!(report.result.mode_used, ModeUsed::SimpleMultiPage);
    assert_eq!(report.result.page_count, 3);
}

#[tokio::test]
async fn test_explicit_page_count_overrides_detection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("p", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&["Two"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&["One"])))
        .mount(&server)
        .await;

    let browser = FakeBrowser::default();
    let req = ExtractionRequest::builder(format!("{}/list", server.uri()), "li")
        .mode(Mode::Simple)
        .pages(Some(2))
        .page_param("p")
        .build()
        .unwrap();
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["One", "Two"]);
    assert_eq!(report.result.page_count, 2);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let browser = FakeBrowser::with_pages([list_page(&["A"])]);
    let orchestrator = orchestrator(&browser);
    orchestrator.cancel_flag().cancel();

    let req = request("https://unused.test".to_string(), "li", Mode::Auto);
    let err = orchestrator.extract(&req).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(browser.state().launches, 0);
}

#[tokio::test]
async fn test_cancel_only_stops_one_run() {
    let server = serve("/list", 200, &list_page(&["Alpha", "Beta"])).await;
    let browser = FakeBrowser::default();
    let orchestrator = orchestrator(&browser);
    let req = request(format!("{}/list", server.uri()), "li", Mode::Simple);

    orchestrator.cancel_flag().cancel();
    let err = orchestrator.extract(&req).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    let report = orchestrator.extract(&req).await.unwrap();
    assert_eq!(report.result.items, vec!["Alpha", "Beta"]);
    assert!(!orchestrator.cancel_flag().is_cancelled());
}

#[tokio::test]
async fn test_explicit_pages_survive_first_page_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&["Two"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&["Three"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let browser = FakeBrowser::default();
    let req = ExtractionRequest::builder(format!("{}/list", server.uri()), "li")
        .mode(Mode::Simple)
        .pages(Some(3))
        .build()
        .unwrap();
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["Two", "Three"]);
    assert_eq!(report.result.mode_used, ModeUsed::SimpleMultiPage);
    assert_eq!(report.result.page_count, 3);
}

#[tokio::test]
async fn test_detected_first_page_failure_is_fatal() {
    let server = serve("/list", 500, "").await;
    let browser = FakeBrowser::default();

    let req = ExtractionRequest::builder(format!("{}/list", server.uri()), "li")
        .mode(Mode::Simple)
        .paginate(true)
        .build()
        .unwrap();
    let err = orchestrator(&browser).extract(&req).await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_auto_paginate_falls_back_to_load_more() {
    let server = serve("/list", 200, "<html><body><div id=\"app\"></div></body></html>").await;
    let browser = FakeBrowser::with_pages([list_page(&["A"]), list_page(&["A", "B"])])
        .control(".load-more", false);

    let req = ExtractionRequest::builder(format!("{}/list", server.uri()), "li")
        .mode(Mode::Auto)
        .paginate(true)
        .max_scrolls(0)
        .build()
        .unwrap();
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["A", "B"]);
    assert_eq!(report.result.mode_used, ModeUsed::Selenium);
    assert!(report.errors.is_empty());

    let state = browser.state();
    assert_eq!(state.launches, 1);
    assert_eq!(state.clicks, 1);
    assert_eq!(state.closes, 1);
}

#[tokio::test]
async fn test_detected_page_count_is_capped() {
    let links: String = (1..=50)
        .map(|n| format!("<a href=\"?page={n}\">{n}</a>"))
        .collect();
    let first = format!(
        "<html><body><ul class=\"results\"><li>One</li></ul>\
         <nav class=\"pagination\">{links}</nav></body></html>"
    );

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&["Two"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(&["Three"])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(first))
        .expect(1)
        .mount(&server)
        .await;

    let browser = FakeBrowser::default();
    let req = ExtractionRequest::builder(format!("{}/list", server.uri()), "ul.results li")
        .mode(Mode::Simple)
        .paginate(true)
        .max_pages(2)
        .build()
        .unwrap();
    let report = orchestrator(&browser).extract(&req).await.unwrap();

    assert_eq!(report.result.items, vec!["One", "Two"]);
    assert_eq!(report.result.page_count, 2);
}
