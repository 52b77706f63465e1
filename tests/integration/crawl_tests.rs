//! Crawl aggregation against a mock listing site

use crate::common::{crawler, listing};
use neagent_watch::crawler::FetchError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts the three-page listing: base, ?page=2, ?page=3
///
/// Page-specific mocks are mounted before the base page mock so they win for
/// requests carrying a `page` parameter. Every page must be fetched exactly once.
async fn mount_three_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/1", "/item/2"])),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/3"])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing(&["?page=2", "?page=3"], &["/item/1"])),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_unions_all_pages() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;

    let links = crawler()
        .crawl(&format!("{}/board/", server.uri()))
        .await
        .expect("Crawl failed");

    let links: Vec<String> = links.into_iter().collect();
    assert_eq!(links, vec!["/item/1", "/item/2", "/item/3"]);
}

#[tokio::test]
async fn test_base_page_listed_in_pagination_is_scanned_once() {
    let server = MockServer::start().await;
    let source = format!("{}/board/", server.uri());

    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/2"])))
        .expect(1)
        .mount(&server)
        .await;

    // Pagination names page 2 twice and the base page itself once
    Mock::given(method("GET"))
        .and(path("/board/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &[source.as_str(), "?page=2", "/board/?page=2"],
            &["/item/1"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let links = crawler().crawl(&source).await.expect("Crawl failed");

    let links: Vec<String> = links.into_iter().collect();
    assert_eq!(links, vec!["/item/1", "/item/2"]);
}

#[tokio::test]
async fn test_crawl_order_is_deterministic() {
    let server = MockServer::start().await;
    let source = format!("{}/board/", server.uri());

    Mock::given(method("GET"))
        .and(path("/board/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &[],
            &["/item/b", "/item/a", "https://neagent.by/item/a", "/item/a", "/item/10", "/item/9"],
        )))
        .mount(&server)
        .await;

    let first: Vec<String> = crawler().crawl(&source).await.unwrap().into_iter().collect();
    let second: Vec<String> = crawler().crawl(&source).await.unwrap().into_iter().collect();

    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            "/item/10",
            "/item/9",
            "/item/a",
            "/item/b",
            "https://neagent.by/item/a"
        ]
    );
}

#[tokio::test]
async fn test_base_page_failure_aborts_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/2"])))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let err = crawler()
        .crawl(&format!("{}/board/", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 502, .. }));
}

#[tokio::test]
async fn test_page_without_items_contributes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>empty</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing(&["?page=2"], &["/item/1"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let links = crawler()
        .crawl(&format!("{}/board/", server.uri()))
        .await
        .unwrap();

    assert_eq!(links.into_iter().collect::<Vec<_>>(), vec!["/item/1"]);
}

#[tokio::test]
async fn test_fragment_links_do_not_refetch_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/2"])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &["#", "?page=2#top", "?page=2"],
            &["/item/1"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let links = crawler()
        .crawl(&format!("{}/board/", server.uri()))
        .await
        .expect("Crawl failed");

    assert_eq!(links.into_iter().collect::<Vec<_>>(), vec!["/item/1", "/item/2"]);
}

#[tokio::test]
async fn test_non_http_pagination_links_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[], &["/item/2"])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/board/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &["javascript:void(0)", "mailto:rent@neagent.by", "?page=2"],
            &["/item/1"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let links = crawler()
        .crawl(&format!("{}/board/", server.uri()))
        .await
        .expect("Crawl should not fail on unfetchable pagination links");

    assert_eq!(links.into_iter().collect::<Vec<_>>(), vec!["/item/1", "/item/2"]);
}
