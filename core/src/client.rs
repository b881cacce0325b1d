//! Blocking client for the GeoServer administrative REST API.
//!
//! # Design
//! `GeoserverClient` holds the base URL, a precomputed Basic `Authorization`
//! value and a `Transport`. Nothing changes after construction, so a client
//! can be shared freely between threads when its transport allows it.
//!
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Both halves are pure. The operation methods (`create_workspace`,
//! `get_datastores`, ...) run `build_*`, hand the request to the transport,
//! and run `parse_*` on whatever comes back. Nothing is retried.
//!
//! Status handling follows GeoServer's habits:
//! - existence checks answer `true` only for 200 and never fail on status;
//! - creates expect 201, deletes expect 200;
//! - deleting a feature type also accepts 404, since "already gone" is
//!   as good as deleted;
//! - list bodies that fail to decode become an empty list, because GeoServer
//!   sends `{"workspaces": ""}` instead of an empty array.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, debug_span, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{
    CreateDatastoreRequest, CreateFeatureTypeRequest, CreateWorkspaceRequest, Datastore, FeatureType,
    Workspace,
};
use crate::wire::{
    DatastoreEnvelope, DatastoresResponse, FeatureTypeEnvelope, FeatureTypesResponse, WorkspaceEnvelope,
    WorkspacesResponse,
};

const APPLICATION_JSON: &str = "application/json";
const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;
const STATUS_NOT_FOUND: u16 = 404;

/// Client for workspace, datastore and feature type administration.
#[derive(Clone)]
pub struct GeoserverClient<T = UreqTransport> {
    base_url: String,
    authorization: String,
    transport: T,
}

impl GeoserverClient<UreqTransport> {
    /// Create a client that talks to GeoServer through a `ureq` agent using
    /// the configured timeout.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new(config.timeout))
    }
}

impl<T> GeoserverClient<T> {
    /// Create a client that sends its requests through `transport`.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Self {
        let credentials = STANDARD.encode(format!("{}:{}", config.username, config.password));
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {credentials}"),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_health(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/rest/about/status", None)
    }

    pub fn build_get_workspace(&self, workspace: &str) -> Result<HttpRequest, ApiError> {
        require(workspace, "workspace")?;
        Ok(self.request(HttpMethod::Get, &format!("/rest/workspaces/{workspace}"), None))
    }

    pub fn build_list_workspaces(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/rest/workspaces", None)
    }

    pub fn build_create_workspace(&self, request: &CreateWorkspaceRequest) -> Result<HttpRequest, ApiError> {
        require(&request.name, "workspace")?;
        let body = encode(&WorkspaceEnvelope::from(request))?;
        Ok(self.request(HttpMethod::Post, "/rest/workspaces.json", Some(body)))
    }

    pub fn build_delete_workspace(&self, workspace: &str) -> Result<HttpRequest, ApiError> {
        require(workspace, "workspace")?;
        Ok(self.request(
            HttpMethod::Delete,
            &format!("/rest/workspaces/{workspace}?recurse=true"),
            None,
        ))
    }

    pub fn build_get_datastore(&self, workspace: &str, datastore: &str) -> Result<HttpRequest, ApiError> {
        require(workspace, "workspace")?;
        require(datastore, "datastore")?;
        Ok(self.request(
            HttpMethod::Get,
            &format!("/rest/workspaces/{workspace}/datastores/{datastore}.json"),
            None,
        ))
    }

    pub fn build_list_datastores(&self, workspace: &str) -> Result<HttpRequest, ApiError> {
        require(workspace, "workspace")?;
        Ok(self.request(
            HttpMethod::Get,
            &format!("/rest/workspaces/{workspace}/datastores.json"),
            None,
        ))
    }

    pub fn build_create_datastore(&self, request: &CreateDatastoreRequest) -> Result<HttpRequest, ApiError> {
        require(&request.name, "datastore")?;
        require(&request.datastore_type, "datastore type")?;
        require(&request.workspace, "workspace")?;
        let body = encode(&DatastoreEnvelope::from(request))?;
        Ok(self.request(
            HttpMethod::Post,
            &format!("/rest/workspaces/{}/datastores", request.workspace),
            Some(body),
        ))
    }

    pub fn build_delete_datastore(&self, workspace: &str, datastore: &str) -> Result<HttpRequest, ApiError> {
        require(workspace, "workspace")?;
        require(datastore, "datastore")?;
        Ok(self.request(
            HttpMethod::Delete,
            &format!("/rest/workspaces/{workspace}/{datastore}?recurse=true"),
            None,
        ))
    }

    pub fn build_get_feature_type(
        &self,
        workspace: &str,
        datastore: &str,
        feature_type: &str,
    ) -> Result<HttpRequest, ApiError> {
        require(workspace, "workspace")?;
        require(datastore, "datastore")?;
        require(feature_type, "feature type")?;
        Ok(self.request(
            HttpMethod::Get,
            &format!("/rest/workspaces/{workspace}/datastores/{datastore}/featuretypes/{feature_type}.json"),
            None,
        ))
    }

    pub fn build_list_feature_types(&self, workspace: &str, datastore: &str) -> Result<HttpRequest, ApiError> {
        require(workspace, "workspace")?;
        require(datastore, "datastore")?;
        Ok(self.request(
            HttpMethod::Get,
            &format!("/rest/workspaces/{workspace}/datastores/{datastore}/featuretypes.json"),
            None,
        ))
    }

    pub fn build_create_feature_type(
        &self,
        request: &CreateFeatureTypeRequest,
    ) -> Result<HttpRequest, ApiError> {
        require(&request.name, "feature type")?;
        require(&request.native_name, "native name")?;
        require(&request.datastore, "datastore")?;
        require(&request.workspace, "workspace")?;
        require(&request.srs, "srs")?;
        let body = encode(&FeatureTypeEnvelope::from(request))?;
        Ok(self.request(
            HttpMethod::Post,
            &format!(
                "/rest/workspaces/{}/datastores/{}/featuretypes.json",
                request.workspace, request.datastore
            ),
            Some(body),
        ))
    }

    pub fn build_delete_feature_type(
        &self,
        workspace: &str,
        datastore: &str,
        feature_type: &str,
    ) -> Result<HttpRequest, ApiError> {
        require(workspace, "workspace")?;
        require(datastore, "datastore")?;
        require(feature_type, "feature type")?;
        Ok(self.request(
            HttpMethod::Delete,
            &format!(
                "/rest/workspaces/{workspace}/datastores/{datastore}/featuretypes/{feature_type}.json?recurse=true"
            ),
            None,
        ))
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_health(&self, response: HttpResponse) -> bool {
        if response.status == STATUS_OK {
            return true;
        }
        debug!(status = response.status, "GeoServer responded with a non-200 status");
        false
    }

    /// Shared by every existence check: only 200 counts as present.
    pub fn parse_exists(&self, response: HttpResponse) -> bool {
        if response.status == STATUS_OK {
            return true;
        }
        debug!(status = response.status, "GeoServer reports the entity as absent");
        false
    }

    pub fn parse_get_workspace(&self, response: HttpResponse) -> Result<Option<Workspace>, ApiError> {
        parse_single::<WorkspaceEnvelope, _>(response, |envelope| Workspace::from(envelope.workspace))
    }

    pub fn parse_list_workspaces(&self, response: HttpResponse) -> Result<Vec<Workspace>, ApiError> {
        parse_collection::<WorkspacesResponse, _>(response, "list workspaces")
    }

    pub fn parse_create_workspace(&self, workspace: &str, response: HttpResponse) -> Result<(), ApiError> {
        expect_status(response, &[STATUS_CREATED], || format!("create workspace '{workspace}'"))
    }

    pub fn parse_delete_workspace(&self, workspace: &str, response: HttpResponse) -> Result<(), ApiError> {
        expect_status(response, &[STATUS_OK], || format!("delete workspace '{workspace}'"))
    }

    pub fn parse_get_datastore(&self, response: HttpResponse) -> Result<Option<Datastore>, ApiError> {
        parse_single::<DatastoreEnvelope, _>(response, |envelope| Datastore::from(envelope.datastore))
    }

    pub fn parse_list_datastores(&self, workspace: &str, response: HttpResponse) -> Result<Vec<Datastore>, ApiError> {
        parse_collection::<DatastoresResponse, _>(response, &format!("list datastores in workspace '{workspace}'"))
    }

    pub fn parse_create_datastore(&self, datastore: &str, response: HttpResponse) -> Result<(), ApiError> {
        expect_status(response, &[STATUS_CREATED], || format!("create datastore '{datastore}'"))
    }

    pub fn parse_delete_datastore(&self, datastore: &str, response: HttpResponse) -> Result<(), ApiError> {
        expect_status(response, &[STATUS_OK], || format!("delete datastore '{datastore}'"))
    }

    pub fn parse_get_feature_type(&self, response: HttpResponse) -> Result<Option<FeatureType>, ApiError> {
        parse_single::<FeatureTypeEnvelope, _>(response, |envelope| FeatureType::from(envelope.feature_type))
    }

    pub fn parse_list_feature_types(
        &self,
        workspace: &str,
        datastore: &str,
        response: HttpResponse,
    ) -> Result<Vec<FeatureType>, ApiError> {
        parse_collection::<FeatureTypesResponse, _>(
            response,
            &format!("list feature types in datastore '{datastore}' and workspace '{workspace}'"),
        )
    }

    pub fn parse_create_feature_type(&self, feature_type: &str, response: HttpResponse) -> Result<(), ApiError> {
        expect_status(response, &[STATUS_CREATED], || format!("create feature type '{feature_type}'"))
    }

    pub fn parse_delete_feature_type(
        &self,
        workspace: &str,
        datastore: &str,
        feature_type: &str,
        response: HttpResponse,
    ) -> Result<(), ApiError> {
        expect_status(response, &[STATUS_OK, STATUS_NOT_FOUND], || {
            format!("delete feature type '{feature_type}' in datastore '{datastore}' and workspace '{workspace}'")
        })
    }

    /// Every request carries JSON content negotiation and Basic auth.
    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers: vec![
                ("Content-Type".to_string(), APPLICATION_JSON.to_string()),
                ("Accept".to_string(), APPLICATION_JSON.to_string()),
                ("Authorization".to_string(), self.authorization.clone()),
            ],
            body,
        }
    }
}

impl<T: Transport> GeoserverClient<T> {
    /// Returns `true` when GeoServer answers its status endpoint with 200.
    pub fn is_health_ok(&self) -> Result<bool, ApiError> {
        let request = self.build_health();
        debug!(url = %request.url, "Querying GeoServer to see if healthy");
        let response = self.send(&request)?;
        Ok(self.parse_health(response))
    }

    pub fn workspace_exists(&self, workspace: &str) -> Result<bool, ApiError> {
        let request = self.build_get_workspace(workspace)?;
        debug!(url = %request.url, workspace, "Querying GeoServer for specific workspace");
        let response = self.send(&request)?;
        Ok(self.parse_exists(response))
    }

    pub fn get_workspace(&self, workspace: &str) -> Result<Option<Workspace>, ApiError> {
        let request = self.build_get_workspace(workspace)?;
        debug!(url = %request.url, workspace, "Fetching GeoServer workspace");
        let response = self.send(&request)?;
        self.parse_get_workspace(response)
    }

    pub fn get_workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
        let request = self.build_list_workspaces();
        debug!(url = %request.url, "Querying GeoServer for workspaces");
        let response = self.send(&request)?;
        let workspaces = self.parse_list_workspaces(response)?;
        debug!(url = %request.url, count = workspaces.len(), "GeoServer returned workspaces");
        Ok(workspaces)
    }

    pub fn create_workspace(&self, request: &CreateWorkspaceRequest) -> Result<(), ApiError> {
        let http_request = self.build_create_workspace(request)?;
        debug!(
            url = %http_request.url,
            request = http_request.body.as_deref().unwrap_or_default(),
            "Creating a GeoServer workspace"
        );
        let response = self.send(&http_request)?;
        let status = response.status;
        self.parse_create_workspace(&request.name, response)?;
        debug!(
            url = %http_request.url,
            workspace = %request.name,
            status,
            "Workspace created successfully"
        );
        Ok(())
    }

    /// Deletes the workspace together with everything inside it.
    pub fn delete_workspace(&self, workspace: &str) -> Result<(), ApiError> {
        let request = self.build_delete_workspace(workspace)?;
        debug!(url = %request.url, workspace, "Deleting GeoServer workspace");
        let response = self.send(&request)?;
        self.parse_delete_workspace(workspace, response)?;
        debug!(url = %request.url, workspace, "Workspace deleted successfully");
        Ok(())
    }

    pub fn datastore_exists(&self, workspace: &str, datastore: &str) -> Result<bool, ApiError> {
        let request = self.build_get_datastore(workspace, datastore)?;
        debug!(url = %request.url, workspace, datastore, "Querying GeoServer for specific datastore");
        let response = self.send(&request)?;
        Ok(self.parse_exists(response))
    }

    pub fn get_datastore(&self, workspace: &str, datastore: &str) -> Result<Option<Datastore>, ApiError> {
        let request = self.build_get_datastore(workspace, datastore)?;
        debug!(url = %request.url, workspace, datastore, "Fetching GeoServer datastore");
        let response = self.send(&request)?;
        self.parse_get_datastore(response)
    }

    /// Lists the datastores of `workspace`. A workspace that does not exist
    /// is an `UnexpectedStatus` error rather than an empty list.
    pub fn get_datastores(&self, workspace: &str) -> Result<Vec<Datastore>, ApiError> {
        let request = self.build_list_datastores(workspace)?;
        debug!(url = %request.url, workspace, "Querying GeoServer for datastores");
        let response = self.send(&request)?;
        let datastores = self.parse_list_datastores(workspace, response)?;
        debug!(url = %request.url, workspace, count = datastores.len(), "GeoServer returned datastores");
        Ok(datastores)
    }

    pub fn create_datastore(&self, request: &CreateDatastoreRequest) -> Result<(), ApiError> {
        let http_request = self.build_create_datastore(request)?;
        // The body carries database credentials, so only its size is logged.
        debug!(
            url = %http_request.url,
            workspace = %request.workspace,
            datastore = %request.name,
            request_bytes = http_request.body.as_ref().map_or(0, String::len),
            "Creating a GeoServer datastore"
        );
        let response = self.send(&http_request)?;
        let status = response.status;
        self.parse_create_datastore(&request.name, response)?;
        debug!(
            url = %http_request.url,
            workspace = %request.workspace,
            datastore = %request.name,
            status,
            "Datastore created successfully"
        );
        Ok(())
    }

    /// Deletes the datastore together with its feature types.
    pub fn delete_datastore(&self, workspace: &str, datastore: &str) -> Result<(), ApiError> {
        let request = self.build_delete_datastore(workspace, datastore)?;
        debug!(url = %request.url, workspace, datastore, "Deleting GeoServer datastore");
        let response = self.send(&request)?;
        self.parse_delete_datastore(datastore, response)?;
        debug!(url = %request.url, workspace, datastore, "Datastore deleted successfully");
        Ok(())
    }

    pub fn feature_type_exists(
        &self,
        workspace: &str,
        datastore: &str,
        feature_type: &str,
    ) -> Result<bool, ApiError> {
        let request = self.build_get_feature_type(workspace, datastore, feature_type)?;
        debug!(
            url = %request.url,
            workspace,
            datastore,
            feature_type,
            "Querying GeoServer for specific feature type"
        );
        let response = self.send(&request)?;
        Ok(self.parse_exists(response))
    }

    pub fn get_feature_type(
        &self,
        workspace: &str,
        datastore: &str,
        feature_type: &str,
    ) -> Result<Option<FeatureType>, ApiError> {
        let request = self.build_get_feature_type(workspace, datastore, feature_type)?;
        debug!(url = %request.url, workspace, datastore, feature_type, "Fetching GeoServer feature type");
        let response = self.send(&request)?;
        self.parse_get_feature_type(response)
    }

    /// Lists the feature types published from `datastore`. A missing
    /// workspace or datastore is an `UnexpectedStatus` error rather than an
    /// empty list.
    pub fn get_feature_types(&self, workspace: &str, datastore: &str) -> Result<Vec<FeatureType>, ApiError> {
        let request = self.build_list_feature_types(workspace, datastore)?;
        debug!(url = %request.url, workspace, datastore, "Querying GeoServer for feature types");
        let response = self.send(&request)?;
        let feature_types = self.parse_list_feature_types(workspace, datastore, response)?;
        debug!(
            url = %request.url,
            workspace,
            datastore,
            count = feature_types.len(),
            "GeoServer returned feature types"
        );
        Ok(feature_types)
    }

    /// Publishes a layer from a table or view in an existing datastore.
    pub fn create_feature_type(&self, request: &CreateFeatureTypeRequest) -> Result<(), ApiError> {
        let http_request = self.build_create_feature_type(request)?;
        debug!(
            url = %http_request.url,
            request = http_request.body.as_deref().unwrap_or_default(),
            "Creating a GeoServer feature type"
        );
        let response = self.send(&http_request)?;
        let status = response.status;
        self.parse_create_feature_type(&request.name, response)?;
        debug!(
            url = %http_request.url,
            workspace = %request.workspace,
            datastore = %request.datastore,
            feature_type = %request.name,
            status,
            "Feature type created successfully"
        );
        Ok(())
    }

    /// Succeeds when the feature type is gone afterwards, including when it
    /// never existed.
    pub fn delete_feature_type(&self, workspace: &str, datastore: &str, feature_type: &str) -> Result<(), ApiError> {
        let request = self.build_delete_feature_type(workspace, datastore, feature_type)?;
        debug!(url = %request.url, workspace, datastore, feature_type, "Deleting a GeoServer feature type");
        let response = self.send(&request)?;
        self.parse_delete_feature_type(workspace, datastore, feature_type, response)?;
        debug!(url = %request.url, workspace, datastore, feature_type, "Feature type deleted successfully");
        Ok(())
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let span = debug_span!("geoserver", method = %request.method, url = %request.url);
        let _guard = span.enter();
        self.transport.execute(request).inspect_err(|e| {
            debug!(error = %e, "Could not communicate with GeoServer");
        })
    }
}

impl<T> fmt::Debug for GeoserverClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoserverClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn require(value: &str, what: &'static str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::EmptyIdentifier(what));
    }
    Ok(())
}

fn encode<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Accept any of `accepted`; otherwise log the body and fail naming the
/// operation.
fn expect_status(
    response: HttpResponse,
    accepted: &[u16],
    operation: impl FnOnce() -> String,
) -> Result<(), ApiError> {
    if accepted.contains(&response.status) {
        return Ok(());
    }
    let operation = operation();
    debug!(
        status = response.status,
        body = %response.body,
        "Unable to {operation}"
    );
    Err(ApiError::unexpected_status(operation, response.status))
}

/// Decode a list body in two stages: strict decode first, and if that fails
/// an empty list with a warning.
fn parse_collection<W, D>(response: HttpResponse, operation: &str) -> Result<Vec<D>, ApiError>
where
    W: DeserializeOwned,
    Vec<D>: From<W>,
{
    if response.status != STATUS_OK {
        debug!(status = response.status, body = %response.body, "Unable to {operation}");
        return Err(ApiError::unexpected_status(operation, response.status));
    }

    match serde_json::from_str::<W>(&response.body) {
        Ok(wire) => Ok(Vec::from(wire)),
        Err(e) => {
            warn!(
                status = response.status,
                body = %response.body,
                error = %e,
                "GeoServer returned an invalid collection, treating it as empty"
            );
            Ok(Vec::new())
        }
    }
}

/// 200 decodes into `Some`, any other status means absent.
fn parse_single<W, D>(response: HttpResponse, convert: impl FnOnce(W) -> D) -> Result<Option<D>, ApiError>
where
    W: DeserializeOwned,
{
    if response.status != STATUS_OK {
        debug!(status = response.status, "GeoServer reports the entity as absent");
        return Ok(None);
    }
    serde_json::from_str::<W>(&response.body)
        .map(|wire| Some(convert(wire)))
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}
