//! End-to-end tests for health, lead capture, content relay and the
//! cross-cutting middleware.

use serde_json::{json, Value};

mod common;

use common::{
    client, closed_addr, start_fixed_upstream, start_gateway, start_programmable_upstream, test_config, MockResponse,
    BOARD_ID, CONTENT_KEY,
};

async fn get_json(url: String) -> (u16, Value, reqwest::header::HeaderMap) {
    let res = client().get(url).send().await.expect("gateway unreachable");
    let status = res.status().as_u16();
    let headers = res.headers().clone();
    (status, res.json().await.unwrap_or(Value::Null), headers)
}

#[tokio::test]
async fn test_health_reports_liveness() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({}))).await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let (status, body, _) = get_json(gateway.url("/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "development");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime"].as_f64().is_some());
    assert!(body["timestamp"].as_str().is_some());
    assert_eq!(upstream.calls(), 0);
    gateway.stop();
}

#[tokio::test]
async fn test_status_probes_upstream() {
    let upstream = start_programmable_upstream(|_, req| async move {
        let query = req.body["query"].as_str().unwrap_or_default().to_string();
        if query.contains("boards") {
            MockResponse::json(
                200,
                json!({ "data": { "boards": [{ "id": BOARD_ID, "name": "Leads", "columns": [{ "id": "email" }] }] } }),
            )
        } else {
            MockResponse::json(200, json!({ "data": { "me": { "id": "1", "name": "Bot" } } }))
        }
    })
    .await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let (status, body, _) = get_json(gateway.url("/api/status")).await;
    assert_eq!(status, 200);
    assert_eq!(body["monday"]["status"], "healthy");
    assert!(body["monday"]["responseTime"].as_u64().is_some());
    assert_eq!(body["proxy"]["status"], "healthy");

    let board = &body["monday"]["board"];
    assert_eq!(board["status"], "healthy");
    assert_eq!(board["boardAccess"], true);
    assert_eq!(board["columnsLoaded"], true);
    assert!(board["responseTime"].as_u64().is_some());

    let seen = upstream.requests();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].body["query"], "query { me { id name } }");
    assert_eq!(seen[1].body["variables"]["boardId"], BOARD_ID);
    gateway.stop();
}

#[tokio::test]
async fn test_status_reports_missing_board() {
    let upstream = start_programmable_upstream(|n, _| async move {
        if n == 0 {
            MockResponse::json(200, json!({ "data": { "me": { "id": "1", "name": "Bot" } } }))
        } else {
            MockResponse::json(200, json!({ "data": { "boards": [] } }))
        }
    })
    .await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let (status, body, _) = get_json(gateway.url("/api/status")).await;
    assert_eq!(status, 200);
    assert_eq!(body["monday"]["status"], "healthy");
    let board = &body["monday"]["board"];
    assert_eq!(board["status"], "unhealthy");
    assert_eq!(board["boardAccess"], false);
    assert_eq!(board["error"], format!("Board not found: {BOARD_ID}"));
    gateway.stop();
}

#[tokio::test]
async fn test_status_is_503_when_upstream_unreachable() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({}))).await;
    let mut config = test_config(&upstream);
    config.upstream.url = format!("http://{}/v2", closed_addr().await);
    let gateway = start_gateway(config).await;

    let (status, body, _) = get_json(gateway.url("/api/status")).await;
    assert_eq!(status, 503);
    assert_eq!(body["monday"]["status"], "unhealthy");
    assert_eq!(body["monday"]["error"], "NETWORK_ERROR");
    assert_eq!(body["monday"]["board"]["status"], "unhealthy");
    assert_eq!(body["monday"]["board"]["boardAccess"], false);
    gateway.stop();
}

#[tokio::test]
async fn test_probe_does_not_spend_crm_budget() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({ "data": {} }))).await;
    let mut config = test_config(&upstream);
    config.rate_limit.crm_limit = 1;
    let gateway = start_gateway(config).await;

    for _ in 0..3 {
        let (status, _, _) = get_json(gateway.url("/api/status")).await;
        assert_eq!(status, 200);
    }
    let res = client()
        .post(gateway.url("/monday"))
        .json(&json!({ "query": "query { me { id } }" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    gateway.stop();
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({}))).await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let (status, body, _) = get_json(gateway.url("/wp-admin")).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({ "error": "Endpoint not found", "code": "NOT_FOUND", "path": "/wp-admin" }));
    gateway.stop();
}

#[tokio::test]
async fn test_security_and_cors_headers() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({}))).await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let res = client()
        .get(gateway.url("/health"))
        .header("origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    let headers = res.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert!(headers["content-security-policy"].to_str().unwrap().contains("connect-src 'self'"));
    assert!(!headers.contains_key("strict-transport-security"));
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:5173");
    assert_eq!(headers["access-control-allow-credentials"], "true");

    let foreign = client()
        .get(gateway.url("/health"))
        .header("origin", "https://evil.example")
        .send()
        .await
        .unwrap();
    assert!(!foreign.headers().contains_key("access-control-allow-origin"));
    gateway.stop();
}

#[tokio::test]
async fn test_oversized_body_is_json_413() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({ "data": {} }))).await;
    let mut config = test_config(&upstream);
    config.security.max_body_size = 64;
    let gateway = start_gateway(config).await;

    let query = format!("query {{ me {{ id }} }} # {}", "x".repeat(200));
    for path in ["/monday", "/api/contact"] {
        let res = client()
            .post(gateway.url(path))
            .json(&json!({ "query": query, "name": query }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 413, "path: {path}");
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Request body too large", "code": "PAYLOAD_TOO_LARGE" }));
    }

    let res = client()
        .post(gateway.url("/monday"))
        .json(&json!({ "query": "query { me { id } }" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(upstream.calls(), 1);
    gateway.stop();
}

#[tokio::test]
async fn test_per_client_limit() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({}))).await;
    let mut config = test_config(&upstream);
    config.client_rate_limit.max_requests = 2;
    let gateway = start_gateway(config).await;

    for _ in 0..2 {
        let (status, _, _) = get_json(gateway.url("/health")).await;
        assert_eq!(status, 200);
    }
    let (status, body, headers) = get_json(gateway.url("/health")).await;
    assert_eq!(status, 429);
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["error"], "Too many requests from this IP, please try again later.");
    assert!(headers.contains_key("retry-after"));
    gateway.stop();
}

#[tokio::test]
async fn test_contact_validation_never_reaches_upstream() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({}))).await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let cases = [
        (json!({ "email": "jane@example.com", "message": "hi" }), "Name is required"),
        (json!({ "name": "Jane", "email": "not-an-email", "message": "hi" }), "Invalid email format provided"),
        (
            json!({ "name": "Jane", "email": "jane@example.com", "message": "hi", "phone": "12" }),
            "Invalid phone number format provided",
        ),
    ];
    for (form, expected) in cases {
        let res = client().post(gateway.url("/api/contact")).json(&form).send().await.unwrap();
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], expected);
    }

    assert_eq!(upstream.calls(), 0);
    gateway.stop();
}

#[tokio::test]
async fn test_contact_creates_item() {
    let upstream = start_fixed_upstream(MockResponse::json(
        200,
        json!({ "data": { "create_item": { "id": "5551", "name": "Jane Wanjiku" } } }),
    ))
    .await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let res = client()
        .post(gateway.url("/api/contact"))
        .json(&json!({
            "name": "Jane Wanjiku",
            "email": "jane@example.com",
            "phone": "+254 712 345 678",
            "message": "I need advice on a <b>land</b> dispute"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": "5551", "name": "Jane Wanjiku" }));

    let sent = &upstream.requests()[0].body;
    assert!(sent["query"].as_str().unwrap().contains("create_item"));
    assert_eq!(sent["variables"]["boardId"], BOARD_ID);
    assert_eq!(sent["variables"]["itemName"], "Jane Wanjiku");
    let columns: Value = serde_json::from_str(sent["variables"]["columnValues"].as_str().unwrap()).unwrap();
    assert_eq!(columns["long_text"]["text"], "I need advice on a bland/b dispute");
    assert_eq!(columns["email"]["email"], "jane@example.com");
    gateway.stop();
}

#[tokio::test]
async fn test_contact_without_item_id_is_server_error() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({ "data": { "create_item": null } }))).await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let res = client()
        .post(gateway.url("/api/contact"))
        .json(&json!({ "name": "Jane", "email": "jane@example.com", "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "SERVER_ERROR");
    gateway.stop();
}

#[tokio::test]
async fn test_board_columns() {
    let upstream = start_programmable_upstream(|n, _| async move {
        if n == 0 {
            MockResponse::json(200, json!({ "data": { "boards": [{ "columns": [{ "id": "email", "title": "Email" }] }] } }))
        } else {
            MockResponse::json(200, json!({ "data": { "boards": [] } }))
        }
    })
    .await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let (status, body, _) = get_json(gateway.url("/api/board/columns")).await;
    assert_eq!(status, 200);
    assert_eq!(body["columns"][0]["id"], "email");

    let (status, body, _) = get_json(gateway.url("/api/board/columns")).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "INVALID_RESOURCE");
    assert_eq!(body["error"], format!("Board not found: {BOARD_ID}"));
    gateway.stop();
}

#[tokio::test]
async fn test_posts_disabled_without_key() {
    let upstream = start_fixed_upstream(MockResponse::json(200, json!({ "posts": [] }))).await;
    let gateway = start_gateway(test_config(&upstream)).await;

    let (status, body, _) = get_json(gateway.url("/api/posts")).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(upstream.calls(), 0);
    gateway.stop();
}

#[tokio::test]
async fn test_posts_are_relayed_with_key() {
    let posts = json!({ "posts": [{ "slug": "land-law-101", "title": "Land Law 101" }], "meta": { "pagination": { "page": 2 } } });
    let upstream = start_fixed_upstream(MockResponse::json(200, posts.clone())).await;
    let mut config = test_config(&upstream);
    config.content.api_key = Some(crm_gateway::config::Secret::new(CONTENT_KEY));
    let gateway = start_gateway(config).await;

    let (status, body, _) = get_json(gateway.url("/api/posts?limit=500&page=2")).await;
    assert_eq!(status, 200);
    assert_eq!(body, posts);

    let (status, _, _) = get_json(gateway.url("/api/posts/land-law-101")).await;
    assert_eq!(status, 200);

    let (status, body, _) = get_json(gateway.url("/api/posts/Bad_Slug")).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let seen = upstream.requests();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].path, "/ghost/api/v3/content/posts/");
    let query = seen[0].query.clone().unwrap();
    assert!(query.contains(&format!("key={CONTENT_KEY}")));
    assert!(query.contains("limit=50"));
    assert!(query.contains("page=2"));
    assert_eq!(seen[1].path, "/ghost/api/v3/content/posts/slug/land-law-101/");
    assert!(seen.iter().all(|r| r.authorization.is_none()));
    gateway.stop();
}
