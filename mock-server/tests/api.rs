use axum::http::{self, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use mock_geoserver::app;
use serde_json::Value;
use tower::ServiceExt;

fn auth() -> String {
    format!("Basic {}", STANDARD.encode("admin:geoserver"))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .header(http::header::ACCEPT, "application/json")
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn seed_datastore(app: &Router) {
    let resp = send(
        app,
        json_request("POST", "/rest/workspaces.json", r#"{"workspace":{"name":"ws"}}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = send(
        app,
        json_request(
            "POST",
            "/rest/workspaces/ws/datastores",
            r#"{"dataStore":{"name":"pg","type":"postgres","enabled":true,
                "connectionParameters":{"entry":[{"@key":"host","$":"db"}]}}}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_return_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/rest/about/status")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_credentials_return_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/rest/about/status")
                .header(http::header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("admin:nope")))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_returns_200() {
    let resp = app().oneshot(request("GET", "/rest/about/status")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- workspaces ---

#[tokio::test]
async fn empty_workspace_list_is_an_empty_string() {
    let resp = app().oneshot(request("GET", "/rest/workspaces")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body, serde_json::json!({"workspaces": ""}));
}

#[tokio::test]
async fn duplicate_workspace_returns_409() {
    let app = app();
    let body = r#"{"workspace":{"name":"roads"}}"#;
    let resp = send(&app, json_request("POST", "/rest/workspaces.json", body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_bytes(resp).await, "roads");

    let resp = send(&app, json_request("POST", "/rest/workspaces.json", body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_workspace_returns_404() {
    let app = app();
    let resp = send(&app, request("GET", "/rest/workspaces/missing")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send(&app, request("DELETE", "/rest/workspaces/missing?recurse=true")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_empty_workspace_needs_recurse() {
    let app = app();
    seed_datastore(&app).await;

    let resp = send(&app, request("DELETE", "/rest/workspaces/ws")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&app, request("DELETE", "/rest/workspaces/ws?recurse=true")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, request("GET", "/rest/workspaces/ws")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- datastores ---

#[tokio::test]
async fn datastore_in_missing_workspace_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/rest/workspaces/nope/datastores",
            r#"{"dataStore":{"name":"pg"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn datastore_is_listed_with_connection_parameters() {
    let app = app();
    seed_datastore(&app).await;

    let resp = send(&app, request("GET", "/rest/workspaces/ws/datastores.json")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let store = &body["dataStores"]["dataStore"][0];
    assert_eq!(store["name"], "pg");
    assert_eq!(store["workspace"]["name"], "ws");
    assert_eq!(store["connectionParameters"]["entry"][0]["@key"], "host");

    let resp = send(&app, request("GET", "/rest/workspaces/ws/datastores/pg.json")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["dataStore"]["type"], "postgres");
}

#[tokio::test]
async fn empty_datastore_list_is_an_empty_string() {
    let app = app();
    let resp = send(
        &app,
        json_request("POST", "/rest/workspaces.json", r#"{"workspace":{"name":"ws"}}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(&app, request("GET", "/rest/workspaces/ws/datastores.json")).await;
    let body = body_json(resp).await;
    assert_eq!(body, serde_json::json!({"dataStores": ""}));
}

#[tokio::test]
async fn datastore_delete_uses_short_path() {
    let app = app();
    seed_datastore(&app).await;

    let resp = send(&app, request("DELETE", "/rest/workspaces/ws/pg?recurse=true")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, request("GET", "/rest/workspaces/ws/datastores/pg.json")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- feature types ---

#[tokio::test]
async fn feature_type_lifecycle() {
    let app = app();
    seed_datastore(&app).await;
    let base = "/rest/workspaces/ws/datastores/pg/featuretypes";

    let resp = send(&app, request("GET", &format!("{base}.json"))).await;
    assert_eq!(body_json(resp).await, serde_json::json!({"featureTypes": ""}));

    let resp = send(
        &app,
        json_request(
            "POST",
            &format!("{base}.json"),
            r#"{"featureType":{"name":"roads","nativeName":"roads","srs":"EPSG:4326"}}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(&app, request("GET", &format!("{base}/roads.json"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["featureType"]["store"]["name"], "ws:pg");

    let resp = send(&app, request("GET", &format!("{base}.json"))).await;
    let body = body_json(resp).await;
    assert_eq!(body["featureTypes"]["featureType"][0]["name"], "roads");

    let resp = send(&app, request("DELETE", &format!("{base}/roads.json?recurse=true"))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, request("DELETE", &format!("{base}/roads.json?recurse=true"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feature_type_in_missing_datastore_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/rest/workspaces/ws/datastores/pg/featuretypes.json",
            r#"{"featureType":{"name":"roads"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
