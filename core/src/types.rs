//! Public domain types for the GeoServer client.
//!
//! # Design
//! These are the shapes callers work with. They carry no serde attributes:
//! the JSON GeoServer expects lives in `wire`, and conversions between the
//! two are plain `From` impls there.

use std::collections::HashMap;

use crate::connection::ConnectionDetails;

/// A GeoServer workspace: a namespace grouping datastores and layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    pub name: String,
    pub href: String,
}

/// A registered data source inside a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Datastore {
    pub name: String,
    pub description: String,
    pub datastore_type: String,
    pub enabled: bool,
    pub workspace: Workspace,
    pub connection_parameters: HashMap<String, String>,
}

/// A published layer backed by a datastore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureType {
    pub name: String,
    pub href: String,
}

/// A rectangular extent in the coordinate reference system `crs`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub crs: String,
}

/// Input for `GeoserverClient::create_workspace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

impl CreateWorkspaceRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Input for `GeoserverClient::create_datastore`.
///
/// The datastore is always created enabled.
#[derive(Debug)]
pub struct CreateDatastoreRequest {
    pub name: String,
    pub description: String,
    /// GeoServer store type, e.g. "postgres".
    pub datastore_type: String,
    /// Name of the owning workspace.
    pub workspace: String,
    pub connection_details: Box<dyn ConnectionDetails>,
}

/// Input for `GeoserverClient::create_feature_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateFeatureTypeRequest {
    /// Published layer name. May contain any case and spaces.
    pub name: String,
    /// Name of the backing table or view.
    pub native_name: String,
    pub title: String,
    pub abstract_text: String,
    pub native_crs: Option<String>,
    /// Declared SRS, e.g. "EPSG:4326".
    pub srs: String,
    pub native_bounding_box: BoundingBox,
    /// Defaults to `native_bounding_box` when absent.
    pub lat_long_bounding_box: Option<BoundingBox>,
    /// Name of the owning datastore.
    pub datastore: String,
    /// Name of the owning workspace.
    pub workspace: String,
}
