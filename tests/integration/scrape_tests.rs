//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers and run whole
//! scrapes through the real gateway, cache and rate limiter.

use std::path::Path;
use tempfile::TempDir;
use upton::config::IndexOptions;
use upton::{extract, MaxPages, Scraper, ScraperConfig, UptonError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no delay and a private cache folder
fn create_test_config(cache_dir: &Path) -> ScraperConfig {
    let mut config = ScraperConfig::default();
    config.scraper.request_delay_seconds = 0.0;
    config.cache.folder = Some(cache_dir.to_path_buf());
    config.http.user_agent = "upton-test".to_string();
    config.http.timeout_seconds = 1;
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn article(title: &str) -> ResponseTemplate {
    html(&format!(
        "<html><body><h1 class='title'>{}</h1><p>text</p></body></html>",
        title
    ))
}

async fn mount_article(server: &MockServer, route: &str, title: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(article(title))
        .expect(expected)
        .mount(server)
        .await;
}

fn title(page: &upton::Page) -> String {
    page.select_text("h1.title").unwrap().join("")
}

#[tokio::test]
async fn test_index_discovers_and_scrapes_instances_in_order() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body><section id="river">
                 <h1><a href="/one">1</a></h1>
                 <h1><a href="two">2</a></h1>
                 <h1><a href="/three">3</a></h1>
                 <h1><a>no link</a></h1>
                 <h1><a href="/four">4</a></h1>
               </section></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_article(&server, "/one", "One", 1).await;
    mount_article(&server, "/two", "Two", 1).await;
    mount_article(&server, "/three", "Three", 1).await;
    mount_article(&server, "/four", "Four", 1).await;

    let mut scraper = Scraper::new(create_test_config(cache.path()))
        .unwrap()
        .index(
            &format!("{}/", server.uri()),
            "section#river h1 a",
            IndexOptions::default(),
        )
        .unwrap();

    let titles = scraper.scrape(title).await.unwrap();
    assert_eq!(titles, vec!["One", "Two", "Three", "Four"]);

    let stats = scraper.source().stats();
    assert_eq!(stats.live_fetches, 5);
    assert_eq!(stats.waits, 5);
    assert_eq!(stats.cache_hits, 0);
}

#[tokio::test]
async fn test_cached_instances_skip_the_network() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    mount_article(&server, "/story", "Story", 1).await;
    let url = format!("{}/story", server.uri());

    let mut first = Scraper::new(create_test_config(cache.path()))
        .unwrap()
        .instances([url.clone()])
        .unwrap();
    assert_eq!(first.scrape(title).await.unwrap(), vec!["Story"]);
    assert_eq!(first.source().stats().cache_writes, 1);

    let mut second = Scraper::new(create_test_config(cache.path()))
        .unwrap()
        .instances([url])
        .unwrap();
    assert_eq!(second.scrape(title).await.unwrap(), vec!["Story"]);

    let stats = second.source().stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.live_fetches, 0);
    assert_eq!(stats.waits, 0);
}

#[tokio::test]
async fn test_indexes_are_not_cached_by_default() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(html(r#"<a href="/story">story</a>"#))
        .expect(2)
        .mount(&server)
        .await;
    mount_article(&server, "/story", "Story", 1).await;

    for _ in 0..2 {
        let mut scraper = Scraper::new(create_test_config(cache.path()))
            .unwrap()
            .index(&format!("{}/index", server.uri()), "a", IndexOptions::default())
            .unwrap();
        assert_eq!(scraper.scrape(title).await.unwrap(), vec!["Story"]);
    }
}

#[tokio::test]
async fn test_http_errors_become_empty_pages() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;
    mount_article(&server, "/fine", "Fine", 1).await;

    let mut scraper = Scraper::new(create_test_config(cache.path()))
        .unwrap()
        .instances([
            format!("{}/missing", server.uri()),
            format!("{}/broken", server.uri()),
            format!("{}/fine", server.uri()),
        ])
        .unwrap();

    let bodies = scraper
        .scrape(|page| page.raw().to_string())
        .await
        .unwrap();
    assert_eq!(bodies.len(), 3);
    assert_eq!(bodies[0], "");
    assert_eq!(bodies[1], "");
    assert!(bodies[2].contains("Fine"));

    let stats = scraper.source().stats();
    assert_eq!(stats.transient_failures, 2);
    assert_eq!(stats.waits, 3);
}

#[tokio::test]
async fn test_paginated_index_follows_query_param() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "1"))
        .respond_with(html(r#"<a href="/a">a</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(html(r#"<a href="/b">b</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    mount_article(&server, "/a", "A", 1).await;
    mount_article(&server, "/b", "B", 1).await;

    let mut scraper = Scraper::new(create_test_config(cache.path()))
        .unwrap()
        .index(
            &format!("{}/list?page=1", server.uri()),
            "a",
            IndexOptions::paginated(MaxPages::Unbounded),
        )
        .unwrap();

    let urls = scraper.instance_urls().await.unwrap();
    assert_eq!(
        urls,
        vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())]
    );
    assert_eq!(scraper.scrape(title).await.unwrap(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_configured_user_agent_is_sent() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "upton-test"))
        .respond_with(article("Agent"))
        .expect(1)
        .mount(&server)
        .await;

    let mut scraper = Scraper::new(create_test_config(cache.path()))
        .unwrap()
        .instances([format!("{}/ua", server.uri())])
        .unwrap();
    assert_eq!(scraper.scrape(title).await.unwrap(), vec!["Agent"]);
}

#[tokio::test]
async fn test_timeouts_retry_then_give_up() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(article("Slow").set_delay(std::time::Duration::from_secs(3)))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(cache.path());
    config.http.timeout_retries = Some(1);
    let mut scraper = Scraper::new(config)
        .unwrap()
        .instances([format!("{}/slow", server.uri())])
        .unwrap();

    let empties = scraper.scrape(|page| page.is_empty()).await.unwrap();
    assert_eq!(empties, vec![true]);
    assert_eq!(scraper.source().stats().transient_failures, 1);
}

#[tokio::test]
async fn test_connection_failure_propagates() {
    let cache = TempDir::new().unwrap();
    let mut scraper = Scraper::new(create_test_config(cache.path()))
        .unwrap()
        .instances(["http://127.0.0.1:1/unreachable"])
        .unwrap();

    let result = scraper.scrape(|page| page.is_empty()).await;
    assert!(matches!(result, Err(UptonError::Http { .. })));
}

#[tokio::test]
async fn test_scrape_to_csv_writes_tables() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/scores"))
        .respond_with(html(
            r#"<table id="scores">
                 <tr><th>Name</th><th>Note</th></tr>
                 <tr><td>Ada</td><td>first, and best</td></tr>
                 <tr><td>Bo</td><td>says "hi"</td></tr>
               </table>"#,
        ))
        .mount(&server)
        .await;

    let mut scraper = Scraper::new(create_test_config(cache.path()))
        .unwrap()
        .instances([format!("{}/scores", server.uri())])
        .unwrap();

    let csv_path = out.path().join("scores.csv");
    let rows = scraper
        .scrape_to_csv(&csv_path, extract::table("table#scores").unwrap())
        .await
        .unwrap();
    assert_eq!(rows, 3);

    let written = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(
        written,
        "Name,Note\nAda,\"first, and best\"\nBo,\"says \"\"hi\"\"\"\n"
    );

    let tsv_path = out.path().join("scores.tsv");
    scraper
        .scrape_to_tsv(&tsv_path, extract::list("td").unwrap())
        .await
        .unwrap();
    let written = std::fs::read_to_string(&tsv_path).unwrap();
    assert_eq!(written, "Ada\tfirst, and best\tBo\t\"says \"\"hi\"\"\"\n");
}
