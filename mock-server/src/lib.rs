//! In-memory stand-in for GeoServer's administrative REST API.
//!
//! Serves the workspace, datastore and feature type endpoints with the same
//! status codes and JSON shapes GeoServer uses, including its habit of
//! answering an empty collection with `""` instead of an empty array.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "geoserver";

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceEnvelope {
    pub workspace: NamedRef,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "$")]
    pub value: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConnectionParameters {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataStore {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub store_type: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "connectionParameters", default)]
    pub connection_parameters: ConnectionParameters,
}

#[derive(Debug, Deserialize)]
pub struct DataStoreEnvelope {
    #[serde(rename = "dataStore")]
    pub data_store: DataStore,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FeatureType {
    pub name: String,
    #[serde(rename = "nativeName", default)]
    pub native_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub srs: String,
}

#[derive(Debug, Deserialize)]
pub struct FeatureTypeEnvelope {
    #[serde(rename = "featureType")]
    pub feature_type: FeatureType,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub recurse: bool,
}

#[derive(Debug)]
struct StoreEntry {
    store: DataStore,
    feature_types: BTreeMap<String, FeatureType>,
}

#[derive(Debug, Default)]
pub struct Catalog {
    workspaces: BTreeMap<String, BTreeMap<String, StoreEntry>>,
}

pub type Db = Arc<RwLock<Catalog>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    authorization: Arc<str>,
}

/// Router guarded by GeoServer's stock `admin` / `geoserver` credentials.
pub fn app() -> Router {
    app_with_credentials(DEFAULT_USERNAME, DEFAULT_PASSWORD)
}

pub fn app_with_credentials(username: &str, password: &str) -> Router {
    let credentials = STANDARD.encode(format!("{username}:{password}"));
    let state = AppState {
        db: Db::default(),
        authorization: format!("Basic {credentials}").into(),
    };

    Router::new()
        .route("/rest/about/status", get(status))
        .route("/rest/workspaces", get(list_workspaces))
        .route("/rest/workspaces.json", post(create_workspace))
        .route("/rest/workspaces/{ws}", get(get_workspace).delete(delete_workspace))
        .route("/rest/workspaces/{ws}/{ds}", delete(delete_datastore))
        .route("/rest/workspaces/{ws}/datastores", post(create_datastore))
        .route("/rest/workspaces/{ws}/datastores.json", get(list_datastores))
        .route("/rest/workspaces/{ws}/datastores/{ds}", get(get_datastore))
        .route(
            "/rest/workspaces/{ws}/datastores/{ds}/featuretypes.json",
            get(list_feature_types).post(create_feature_type),
        )
        .route(
            "/rest/workspaces/{ws}/datastores/{ds}/featuretypes/{ft}",
            get(get_feature_type).delete(delete_feature_type),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn require_basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if supplied != Some(&*state.authorization) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

/// GeoServer addresses single entities both with and without a `.json`
/// suffix.
fn strip_json(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

fn not_found(what: String) -> Response {
    (StatusCode::NOT_FOUND, what).into_response()
}

async fn status() -> Json<Value> {
    Json(json!({"statuss": {"status": [{"module": "gs-main", "isEnabled": true, "isAvailable": true}]}}))
}

async fn list_workspaces(State(state): State<AppState>) -> Json<Value> {
    let catalog = state.db.read().await;
    if catalog.workspaces.is_empty() {
        return Json(json!({"workspaces": ""}));
    }
    let workspace: Vec<Value> = catalog
        .workspaces
        .keys()
        .map(|name| json!({"name": name, "href": format!("/rest/workspaces/{name}.json")}))
        .collect();
    Json(json!({"workspaces": {"workspace": workspace}}))
}

async fn create_workspace(State(state): State<AppState>, Json(input): Json<WorkspaceEnvelope>) -> Response {
    let name = input.workspace.name;
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Workspace name must not be empty").into_response();
    }
    let mut catalog = state.db.write().await;
    if catalog.workspaces.contains_key(&name) {
        return (StatusCode::CONFLICT, format!("Workspace '{name}' already exists")).into_response();
    }
    catalog.workspaces.insert(name.clone(), BTreeMap::new());
    debug!(workspace = %name, "created workspace");
    (StatusCode::CREATED, name).into_response()
}

async fn get_workspace(State(state): State<AppState>, Path(ws): Path<String>) -> Response {
    let ws = strip_json(&ws);
    let catalog = state.db.read().await;
    if !catalog.workspaces.contains_key(ws) {
        return not_found(format!("No such workspace: '{ws}' found"));
    }
    Json(json!({"workspace": {
        "name": ws,
        "isolated": false,
        "dataStores": format!("/rest/workspaces/{ws}/datastores.json"),
    }}))
    .into_response()
}

async fn delete_workspace(
    State(state): State<AppState>,
    Path(ws): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Response {
    let ws = strip_json(&ws);
    let mut catalog = state.db.write().await;
    let Some(stores) = catalog.workspaces.get(ws) else {
        return not_found(format!("Workspace '{ws}' not found"));
    };
    if !stores.is_empty() && !params.recurse {
        return (StatusCode::FORBIDDEN, "Workspace is not empty").into_response();
    }
    catalog.workspaces.remove(ws);
    debug!(workspace = %ws, "deleted workspace");
    StatusCode::OK.into_response()
}

fn datastore_json(ws: &str, store: &DataStore) -> Value {
    json!({
        "name": store.name,
        "description": store.description,
        "type": store.store_type,
        "enabled": store.enabled,
        "workspace": {"name": ws, "href": format!("/rest/workspaces/{ws}.json")},
        "connectionParameters": store.connection_parameters,
    })
}

async fn list_datastores(State(state): State<AppState>, Path(ws): Path<String>) -> Response {
    let catalog = state.db.read().await;
    let Some(stores) = catalog.workspaces.get(&ws) else {
        return not_found(format!("No such workspace: '{ws}' found"));
    };
    if stores.is_empty() {
        return Json(json!({"dataStores": ""})).into_response();
    }
    let data_store: Vec<Value> = stores.values().map(|entry| datastore_json(&ws, &entry.store)).collect();
    Json(json!({"dataStores": {"dataStore": data_store}})).into_response()
}

async fn create_datastore(
    State(state): State<AppState>,
    Path(ws): Path<String>,
    Json(input): Json<DataStoreEnvelope>,
) -> Response {
    let store = input.data_store;
    if store.name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Datastore name must not be empty").into_response();
    }
    let mut catalog = state.db.write().await;
    let Some(stores) = catalog.workspaces.get_mut(&ws) else {
        return not_found(format!("No such workspace: '{ws}' found"));
    };
    if stores.contains_key(&store.name) {
        return (StatusCode::CONFLICT, format!("Store '{}' already exists", store.name)).into_response();
    }
    let name = store.name.clone();
    stores.insert(
        name.clone(),
        StoreEntry {
            store,
            feature_types: BTreeMap::new(),
        },
    );
    debug!(workspace = %ws, datastore = %name, "created datastore");
    (StatusCode::CREATED, name).into_response()
}

async fn get_datastore(State(state): State<AppState>, Path((ws, ds)): Path<(String, String)>) -> Response {
    let ds = strip_json(&ds);
    let catalog = state.db.read().await;
    match catalog.workspaces.get(&ws).and_then(|stores| stores.get(ds)) {
        Some(entry) => Json(json!({"dataStore": datastore_json(&ws, &entry.store)})).into_response(),
        None => not_found(format!("No such datastore: {ws},{ds}")),
    }
}

async fn delete_datastore(
    State(state): State<AppState>,
    Path((ws, ds)): Path<(String, String)>,
    Query(params): Query<DeleteParams>,
) -> Response {
    let ds = strip_json(&ds);
    let mut catalog = state.db.write().await;
    let Some(stores) = catalog.workspaces.get_mut(&ws) else {
        return not_found(format!("No such workspace: '{ws}' found"));
    };
    let Some(entry) = stores.get(ds) else {
        return not_found(format!("No such datastore: {ws},{ds}"));
    };
    if !entry.feature_types.is_empty() && !params.recurse {
        return (StatusCode::FORBIDDEN, "Datastore is not empty").into_response();
    }
    stores.remove(ds);
    debug!(workspace = %ws, datastore = %ds, "deleted datastore");
    StatusCode::OK.into_response()
}

fn feature_type_json(ws: &str, ds: &str, feature_type: &FeatureType) -> Value {
    json!({
        "name": feature_type.name,
        "nativeName": feature_type.native_name,
        "title": feature_type.title,
        "srs": feature_type.srs,
        "enabled": true,
        "namespace": {"name": ws},
        "store": {"@class": "dataStore", "name": format!("{ws}:{ds}")},
    })
}

async fn list_feature_types(
    State(state): State<AppState>,
    Path((ws, ds)): Path<(String, String)>,
) -> Response {
    let catalog = state.db.read().await;
    let Some(entry) = catalog.workspaces.get(&ws).and_then(|stores| stores.get(&ds)) else {
        return not_found(format!("No such datastore: {ws},{ds}"));
    };
    if entry.feature_types.is_empty() {
        return Json(json!({"featureTypes": ""})).into_response();
    }
    let feature_type: Vec<Value> = entry
        .feature_types
        .keys()
        .map(|name| {
            json!({
                "name": name,
                "href": format!("/rest/workspaces/{ws}/datastores/{ds}/featuretypes/{name}.json"),
            })
        })
        .collect();
    Json(json!({"featureTypes": {"featureType": feature_type}})).into_response()
}

async fn create_feature_type(
    State(state): State<AppState>,
    Path((ws, ds)): Path<(String, String)>,
    Json(input): Json<FeatureTypeEnvelope>,
) -> Response {
    let feature_type = input.feature_type;
    if feature_type.name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Feature type name must not be empty").into_response();
    }
    let mut catalog = state.db.write().await;
    let Some(entry) = catalog.workspaces.get_mut(&ws).and_then(|stores| stores.get_mut(&ds)) else {
        return not_found(format!("No such datastore: {ws},{ds}"));
    };
    if entry.feature_types.contains_key(&feature_type.name) {
        return (
            StatusCode::CONFLICT,
            format!("Resource named '{}' already exists in store: '{ds}'", feature_type.name),
        )
            .into_response();
    }
    let name = feature_type.name.clone();
    entry.feature_types.insert(name.clone(), feature_type);
    debug!(workspace = %ws, datastore = %ds, feature_type = %name, "created feature type");
    (StatusCode::CREATED, name).into_response()
}

async fn get_feature_type(
    State(state): State<AppState>,
    Path((ws, ds, ft)): Path<(String, String, String)>,
) -> Response {
    let ft = strip_json(&ft);
    let catalog = state.db.read().await;
    match catalog
        .workspaces
        .get(&ws)
        .and_then(|stores| stores.get(&ds))
        .and_then(|entry| entry.feature_types.get(ft))
    {
        Some(feature_type) => {
            Json(json!({"featureType": feature_type_json(&ws, &ds, feature_type)})).into_response()
        }
        None => not_found(format!("No such feature type: {ws},{ds},{ft}")),
    }
}

async fn delete_feature_type(
    State(state): State<AppState>,
    Path((ws, ds, ft)): Path<(String, String, String)>,
) -> Response {
    let ft = strip_json(&ft);
    let mut catalog = state.db.write().await;
    let removed = catalog
        .workspaces
        .get_mut(&ws)
        .and_then(|stores| stores.get_mut(&ds))
        .and_then(|entry| entry.feature_types.remove(ft));
    match removed {
        Some(_) => {
            debug!(workspace = %ws, datastore = %ds, feature_type = %ft, "deleted feature type");
            StatusCode::OK.into_response()
        }
        None => not_found(format!("No such feature type: {ws},{ds},{ft}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_json_removes_only_the_suffix() {
        assert_eq!(strip_json("roads.json"), "roads");
        assert_eq!(strip_json("roads"), "roads");
        assert_eq!(strip_json("json"), "json");
    }

    #[test]
    fn datastore_body_accepts_geoserver_shape() {
        let input: DataStoreEnvelope = serde_json::from_str(
            r#"{"dataStore":{"name":"pg","type":"postgres","enabled":true,
                "workspace":{"name":"ws"},
                "connectionParameters":{"entry":[{"@key":"host","$":"db"}]}}}"#,
        )
        .unwrap();
        assert_eq!(input.data_store.name, "pg");
        assert_eq!(input.data_store.store_type, "postgres");
        assert_eq!(
            input.data_store.connection_parameters.entry,
            vec![Entry {
                key: "host".to_string(),
                value: "db".to_string()
            }]
        );
    }

    #[test]
    fn datastore_json_echoes_connection_parameters() {
        let store = DataStore {
            name: "pg".to_string(),
            description: String::new(),
            store_type: "postgres".to_string(),
            enabled: true,
            connection_parameters: ConnectionParameters {
                entry: vec![Entry {
                    key: "port".to_string(),
                    value: "5432".to_string(),
                }],
            },
        };
        let json = datastore_json("ws", &store);
        assert_eq!(json["workspace"]["name"], "ws");
        assert_eq!(json["connectionParameters"]["entry"][0]["@key"], "port");
        assert_eq!(json["connectionParameters"]["entry"][0]["$"], "5432");
    }

    #[test]
    fn feature_type_body_requires_name() {
        let result: Result<FeatureTypeEnvelope, _> =
            serde_json::from_str(r#"{"featureType":{"srs":"EPSG:4326"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn delete_params_default_to_non_recursive() {
        let params: DeleteParams = serde_json::from_str("{}").unwrap();
        assert!(!params.recurse);
    }
}
