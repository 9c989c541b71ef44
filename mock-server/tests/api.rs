use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, Thing};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- list ---

#[tokio::test]
async fn list_things_empty() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/things"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let things: Vec<Thing> = body_json(resp).await;
    assert!(things.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_thing_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/things", r#"{"name":"Lamp"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let thing: Thing = body_json(resp).await;
    assert_eq!(thing.name, "Lamp");
    assert_eq!(thing.owner, None);
}

#[tokio::test]
async fn create_thing_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/things", r#"{"not_name":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get ---

#[tokio::test]
async fn get_thing_not_found() {
    let resp = app()
        .oneshot(empty_request(
            "GET",
            "/api/v1/thing/00000000-0000-0000-0000-000000000000",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_thing_bad_uuid_returns_400() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/thing/not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- claim ---

#[tokio::test]
async fn claim_thing_not_found() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/thing/00000000-0000-0000-0000-000000000000",
            r#"{"login":"a","password":"b"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn claim_thing_empty_password_returns_401() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/thing/00000000-0000-0000-0000-000000000000",
            r#"{"login":"a","password":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_method_headers_and_body() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/echo")
                .header("X-Trace", "abc")
                .header(http::header::CONTENT_TYPE, "text/plain")
                .body("raw text".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.headers["x-trace"], "abc");
    assert_eq!(echo.headers["content-type"], "text/plain");
    assert_eq!(echo.body, "raw text");
}

// --- full lifecycle ---

#[tokio::test]
async fn thing_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/v1/things", r#"{"name":"Desk"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Thing = body_json(resp).await;
    let id = created.id;

    // claim
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/api/v1/thing/{id}"),
            r#"{"login":"user@x.com","password":"secret"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let claimed: Thing = body_json(resp).await;
    assert_eq!(claimed.owner.as_deref(), Some("user@x.com"));

    // get reflects the claim
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/api/v1/thing/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Thing = body_json(resp).await;
    assert_eq!(fetched, claimed);

    // list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/api/v1/things"))
        .await
        .unwrap();
    let things: Vec<Thing> = body_json(resp).await;
    assert_eq!(things.len(), 1);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/api/v1/thing/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/api/v1/thing/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
