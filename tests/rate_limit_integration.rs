//! Rate limiting behavior through the full HTTP surface.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::json;

mod common;

#[tokio::test]
async fn requests_beyond_max_get_429_with_retry_after() {
    let hits = Arc::new(AtomicU32::new(0));
    let hits_counter = hits.clone();
    let backend = common::start_json_backend(move || {
        let hits_counter = hits_counter.clone();
        async move {
            hits_counter.fetch_add(1, Ordering::SeqCst);
            (
                200,
                r#"{"success": true, "score": 0.9, "action": "submit_waitlist"}"#.to_string(),
            )
        }
    })
    .await;

    let mut config = common::test_config();
    config.captcha.verify_url = format!("http://{backend}/siteverify");
    config.captcha.rate_limit.max = 2;
    config.captcha.rate_limit.window_secs = 60;
    let (addr, _shutdown) = common::spawn_gateway(config).await;
    let client = common::http_client();

    let post = |client: reqwest::Client, addr: std::net::SocketAddr| async move {
        client
            .post(format!("http://{addr}/api/recaptcha-proxy"))
            .json(&json!({"token": "t1", "action": "submit_waitlist"}))
            .send()
            .await
            .unwrap()
    };

    // Every request within the budget is allowed.
    for _ in 0..2 {
        let res = post(client.clone(), addr).await;
        assert_eq!(res.status(), 200);
    }

    // The max+1-th is throttled and never reaches the downstream.
    let res = post(client.clone(), addr).await;
    assert_eq!(res.status(), 429);
    let retry_after: u64 = res
        .headers()
        .get("retry-after")
        .expect("throttled response must hint when to retry")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "rate_limited");

    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // Replaying the throttled request neither resets the window nor
    // double-counts: still throttled, downstream still untouched.
    for _ in 0..3 {
        let res = post(client.clone(), addr).await;
        assert_eq!(res.status(), 429);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn routes_are_throttled_independently() {
    let backend = common::start_json_backend(|| async {
        (
            200,
            r#"{"success": true, "score": 0.9, "action": "submit_waitlist"}"#.to_string(),
        )
    })
    .await;

    let mut config = common::test_config();
    config.captcha.verify_url = format!("http://{backend}/siteverify");
    config.captcha.rate_limit.max = 1;
    config.subscribe.base_url = format!("http://{backend}");
    config.subscribe.rate_limit.max = 5;
    let (addr, _shutdown) = common::spawn_gateway(config).await;
    let client = common::http_client();

    let res = client
        .post(format!("http://{addr}/api/recaptcha-proxy"))
        .json(&json!({"token": "t1", "action": "submit_waitlist"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .post(format!("http://{addr}/api/recaptcha-proxy"))
        .json(&json!({"token": "t1", "action": "submit_waitlist"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);

    // Exhausting the captcha budget leaves the subscribe route untouched.
    let res = client
        .post(format!("http://{addr}/api/resend-proxy"))
        .json(&json!({"email": "ada@example.com", "audienceId": "aud_test"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}
