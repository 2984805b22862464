//! Gateway behaviour against a mocked upstream over real HTTP.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::{page_body, TestHarness, API_KEY};
use reelgate::catalog::{ListCategory, MediaKind, SearchKind};
use reelgate_core::Error;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn upstream_hits(harness: &TestHarness) -> usize {
    harness
        .upstream
        .received_requests()
        .await
        .map(|r| r.len())
        .unwrap_or(0)
}

#[tokio::test]
async fn sends_credentials_and_params() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("api_key", API_KEY))
        .and(query_param("language", "en-US"))
        .and(query_param("query", "dune"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, 3)))
        .expect(1)
        .mount(&h.upstream)
        .await;

    let page = h
        .catalog()
        .search(" dune ", 2, SearchKind::Movie)
        .await
        .unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.results.len(), 3);
}

#[tokio::test]
async fn repeated_list_is_served_from_cache() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path("/trending/movie/week"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 20)))
        .expect(1)
        .mount(&h.upstream)
        .await;

    let first = h
        .catalog()
        .fetch_list(ListCategory::TrendingMovies, 1)
        .await
        .unwrap();
    let second = h
        .catalog()
        .fetch_list(ListCategory::TrendingMovies, 1)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(upstream_hits(&h).await, 1);
}

#[tokio::test]
async fn persistent_429_gives_up_after_three_attempts() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .mount(&h.upstream)
        .await;

    let err = h
        .catalog()
        .fetch_list(ListCategory::PopularMovies, 1)
        .await
        .unwrap_err();

    assert_matches!(err, Error::RateLimited { attempts: 3 });
    assert_eq!(upstream_hits(&h).await, 3);
    assert_eq!(h.catalog().gateway().stats().throttled_retries, 2);
}

#[tokio::test]
async fn transient_429_recovers() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path("/tv/top_rated"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&h.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/tv/top_rated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 5)))
        .mount(&h.upstream)
        .await;

    let page = h
        .catalog()
        .fetch_list(ListCategory::TopRatedTv, 1)
        .await
        .unwrap();
    assert_eq!(page.results.len(), 5);
    assert_eq!(upstream_hits(&h).await, 2);
}

#[tokio::test]
async fn slow_upstream_times_out_without_retry() {
    let h = TestHarness::with_config(|c| c.upstream.timeout_ms = 100).await;
    Mock::given(method("GET"))
        .and(path("/movie/upcoming"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(1, 1))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&h.upstream)
        .await;

    let err = h
        .catalog()
        .fetch_list(ListCategory::Upcoming, 1)
        .await
        .unwrap_err();

    assert_matches!(err, Error::Timeout(_));
    assert_eq!(err.http_status(), 504);
    assert_eq!(upstream_hits(&h).await, 1);
}

#[tokio::test]
async fn missing_title_is_not_found() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path("/movie/999"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status_message": "not found"})),
        )
        .mount(&h.upstream)
        .await;

    let err = h
        .catalog()
        .fetch_details(MediaKind::Movie, 999)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn server_error_is_upstream_and_not_cached() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path("/tv/on_the_air"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&h.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/tv/on_the_air"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 1)))
        .mount(&h.upstream)
        .await;

    let err = h
        .catalog()
        .fetch_list(ListCategory::OnTheAir, 1)
        .await
        .unwrap_err();
    assert_matches!(err, Error::Upstream { status: Some(503), .. });

    h.catalog()
        .fetch_list(ListCategory::OnTheAir, 1)
        .await
        .unwrap();
    assert_eq!(upstream_hits(&h).await, 2);
}

#[tokio::test]
async fn invalid_json_is_upstream_error() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path("/search/multi"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&h.upstream)
        .await;

    let err = h.catalog().suggest("star").await.unwrap_err();
    assert_matches!(err, Error::Upstream { status: None, .. });
}

#[tokio::test]
async fn details_fan_out_to_three_endpoints() {
    let h = TestHarness::new().await;
    for (p, body) in [
        ("/tv/1399", json!({"id": 1399, "name": "Game of Thrones"})),
        ("/tv/1399/credits", json!({"cast": [{"id": 1}]})),
        ("/tv/1399/videos", json!({"results": []})),
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&h.upstream)
            .await;
    }

    let detail = h
        .catalog()
        .fetch_details(MediaKind::Tv, 1399)
        .await
        .unwrap();
    assert_eq!(detail.details["name"], "Game of Thrones");
    assert_eq!(detail.credits["cast"][0]["id"], 1);

    h.catalog()
        .fetch_details(MediaKind::Tv, 1399)
        .await
        .unwrap();
}

#[tokio::test]
async fn burst_of_distinct_requests_all_complete() {
    let h = TestHarness::new().await;
    Mock::given(method("GET"))
        .and(path("/movie/now_playing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 1)))
        .mount(&h.upstream)
        .await;

    let catalog = h.ctx.catalog.clone();
    let mut handles = Vec::new();
    for page in 1..=12 {
        let catalog = catalog.clone();
        handles.push(tokio::spawn(async move {
            catalog.fetch_list(ListCategory::NowPlaying, page).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(upstream_hits(&h).await, 12);
    let stats = h.catalog().gateway().stats();
    assert_eq!(stats.queue_pending, 0);
    assert_eq!(stats.upstream_dispatches, 12);
}

#[tokio::test]
async fn connection_failure_does_not_expose_api_key() {
    let h = TestHarness::with_config(|c| c.upstream.base_url = "http://127.0.0.1:1".into()).await;

    let err = h
        .catalog()
        .fetch_list(ListCategory::PopularMovies, 1)
        .await
        .unwrap_err();

    assert_matches!(err, Error::Upstream { status: None, .. });
    let message = err.to_string();
    assert!(message.contains("/movie/popular"), "{message}");
    assert!(!message.contains(API_KEY), "{message}");
    assert!(!message.contains("api_key="), "{message}");
}
