//! JSON shapes of the GeoServer REST API and their mapping to domain types.
//!
//! # Design
//! GeoServer wraps every entity in a singular key, nests collections one
//! level deeper than necessary and encodes connection parameters as
//! `{"@key": .., "$": ..}` entry objects. Those details stay in this module.
//! Every conversion is a pure `From` impl.
//!
//! Response structs default every field so that trimmed payloads (list
//! entries only carry `name` and `href`) still decode. Collection wrappers
//! do not default their inner value: `{"workspaces": ""}` is a decode error
//! here, and the client maps that to an empty list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    BoundingBox, CreateDatastoreRequest, CreateFeatureTypeRequest, CreateWorkspaceRequest, Datastore,
    FeatureType, Workspace,
};

pub(crate) const STORE_CLASS: &str = "dataStore";
pub(crate) const PROJECTION_POLICY: &str = "REPROJECT_TO_DECLARED";
pub(crate) const GEOMETRY_ATTRIBUTE: &str = "Geometry";
pub(crate) const POINT_BINDING: &str = "com.vividsolutions.jts.geom.Point";

// ---------------------------------------------------------------------------
// Workspaces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RestWorkspace {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub href: String,
}

/// `{"workspace": {...}}`, used both to create and to read one workspace.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WorkspaceEnvelope {
    pub workspace: RestWorkspace,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkspacesResponse {
    pub workspaces: RestWorkspaces,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RestWorkspaces {
    pub workspace: Vec<RestWorkspace>,
}

impl From<&CreateWorkspaceRequest> for WorkspaceEnvelope {
    fn from(request: &CreateWorkspaceRequest) -> Self {
        Self {
            workspace: RestWorkspace {
                name: request.name.clone(),
                href: String::new(),
            },
        }
    }
}

impl From<RestWorkspace> for Workspace {
    fn from(rest: RestWorkspace) -> Self {
        Self {
            name: rest.name,
            href: rest.href,
        }
    }
}

impl From<&Workspace> for RestWorkspace {
    fn from(workspace: &Workspace) -> Self {
        Self {
            name: workspace.name.clone(),
            href: workspace.href.clone(),
        }
    }
}

impl From<WorkspacesResponse> for Vec<Workspace> {
    fn from(response: WorkspacesResponse) -> Self {
        response.workspaces.workspace.into_iter().map(Workspace::from).collect()
    }
}

// ---------------------------------------------------------------------------
// Datastores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RestDatastore {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub datastore_type: String,
    pub enabled: bool,
    pub workspace: RestWorkspace,
    #[serde(rename = "connectionParameters")]
    pub connection_parameters: RestConnectionParameters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RestConnectionParameters {
    pub entry: Vec<RestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RestEntry {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "$")]
    pub value: String,
}

/// `{"dataStore": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DatastoreEnvelope {
    #[serde(rename = "dataStore")]
    pub datastore: RestDatastore,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DatastoresResponse {
    #[serde(rename = "dataStores")]
    pub datastores: RestDatastores,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RestDatastores {
    #[serde(rename = "dataStore")]
    pub datastore: Vec<RestDatastore>,
}

impl From<&HashMap<String, String>> for RestConnectionParameters {
    /// Entries are sorted by key so request bodies are stable.
    fn from(map: &HashMap<String, String>) -> Self {
        let mut entry: Vec<RestEntry> = map
            .iter()
            .map(|(key, value)| RestEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        entry.sort_by(|a, b| a.key.cmp(&b.key));
        Self { entry }
    }
}

impl From<RestConnectionParameters> for HashMap<String, String> {
    fn from(parameters: RestConnectionParameters) -> Self {
        parameters
            .entry
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect()
    }
}

impl From<&CreateDatastoreRequest> for DatastoreEnvelope {
    fn from(request: &CreateDatastoreRequest) -> Self {
        Self {
            datastore: RestDatastore {
                name: request.name.clone(),
                description: request.description.clone(),
                datastore_type: request.datastore_type.clone(),
                enabled: true,
                workspace: RestWorkspace {
                    name: request.workspace.clone(),
                    href: String::new(),
                },
                connection_parameters: RestConnectionParameters::from(
                    &request.connection_details.entries(),
                ),
            },
        }
    }
}

impl From<RestDatastore> for Datastore {
    fn from(rest: RestDatastore) -> Self {
        Self {
            name: rest.name,
            description: rest.description,
            datastore_type: rest.datastore_type,
            enabled: rest.enabled,
            workspace: Workspace::from(rest.workspace),
            connection_parameters: HashMap::from(rest.connection_parameters),
        }
    }
}

impl From<&Datastore> for RestDatastore {
    fn from(datastore: &Datastore) -> Self {
        Self {
            name: datastore.name.clone(),
            description: datastore.description.clone(),
            datastore_type: datastore.datastore_type.clone(),
            enabled: datastore.enabled,
            workspace: RestWorkspace::from(&datastore.workspace),
            connection_parameters: RestConnectionParameters::from(&datastore.connection_parameters),
        }
    }
}

impl From<DatastoresResponse> for Vec<Datastore> {
    fn from(response: DatastoresResponse) -> Self {
        response.datastores.datastore.into_iter().map(Datastore::from).collect()
    }
}

// ---------------------------------------------------------------------------
// Feature types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RestFeatureType {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub href: String,
    #[serde(rename = "nativeName", skip_serializing_if = "String::is_empty")]
    pub native_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<RestNamespace>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(rename = "abstract", skip_serializing_if = "String::is_empty")]
    pub abstract_text: String,
    #[serde(rename = "nativeCRS", skip_serializing_if = "Option::is_none")]
    pub native_crs: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub srs: String,
    #[serde(rename = "nativeBoundingBox", skip_serializing_if = "Option::is_none")]
    pub native_bounding_box: Option<RestBoundingBox>,
    #[serde(rename = "latLonBoundingBox", skip_serializing_if = "Option::is_none")]
    pub lat_lon_bounding_box: Option<RestBoundingBox>,
    #[serde(rename = "projectionPolicy", skip_serializing_if = "String::is_empty")]
    pub projection_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<RestAttributes>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<RestStore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RestNamespace {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RestStore {
    #[serde(rename = "@class")]
    pub class: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RestBoundingBox {
    pub minx: f64,
    pub maxx: f64,
    pub miny: f64,
    pub maxy: f64,
    pub crs: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RestAttributes {
    pub attribute: Vec<RestAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RestAttribute {
    pub name: String,
    #[serde(rename = "minOccurs")]
    pub min_occurs: u32,
    #[serde(rename = "maxOccurs")]
    pub max_occurs: u32,
    pub nillable: bool,
    pub binding: String,
}

/// `{"featureType": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FeatureTypeEnvelope {
    #[serde(rename = "featureType")]
    pub feature_type: RestFeatureType,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureTypesResponse {
    #[serde(rename = "featureTypes")]
    pub feature_types: RestFeatureTypes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RestFeatureTypes {
    #[serde(rename = "featureType")]
    pub feature_type: Vec<RestFeatureType>,
}

impl From<&BoundingBox> for RestBoundingBox {
    fn from(bbox: &BoundingBox) -> Self {
        Self {
            minx: bbox.min_x,
            maxx: bbox.max_x,
            miny: bbox.min_y,
            maxy: bbox.max_y,
            crs: bbox.crs.clone(),
        }
    }
}

impl From<RestBoundingBox> for BoundingBox {
    fn from(rest: RestBoundingBox) -> Self {
        Self {
            min_x: rest.minx,
            max_x: rest.maxx,
            min_y: rest.miny,
            max_y: rest.maxy,
            crs: rest.crs,
        }
    }
}

/// Store reference GeoServer expects on a feature type: `"<workspace>:<datastore>"`.
pub(crate) fn store_ref(workspace: &str, datastore: &str) -> RestStore {
    RestStore {
        class: STORE_CLASS.to_string(),
        name: format!("{workspace}:{datastore}"),
    }
}

impl From<&CreateFeatureTypeRequest> for FeatureTypeEnvelope {
    fn from(request: &CreateFeatureTypeRequest) -> Self {
        let native_bbox = RestBoundingBox::from(&request.native_bounding_box);
        let lat_lon_bbox = request
            .lat_long_bounding_box
            .as_ref()
            .map(RestBoundingBox::from)
            .unwrap_or_else(|| native_bbox.clone());

        Self {
            feature_type: RestFeatureType {
                name: request.name.clone(),
                href: String::new(),
                native_name: request.native_name.clone(),
                namespace: Some(RestNamespace {
                    name: request.workspace.clone(),
                }),
                title: request.title.clone(),
                abstract_text: request.abstract_text.clone(),
                native_crs: request.native_crs.clone(),
                srs: request.srs.clone(),
                native_bounding_box: Some(native_bbox),
                lat_lon_bounding_box: Some(lat_lon_bbox),
                projection_policy: PROJECTION_POLICY.to_string(),
                attributes: Some(RestAttributes {
                    attribute: vec![RestAttribute {
                        name: GEOMETRY_ATTRIBUTE.to_string(),
                        min_occurs: 0,
                        max_occurs: 1,
                        nillable: true,
                        binding: POINT_BINDING.to_string(),
                    }],
                }),
                enabled: true,
                store: Some(store_ref(&request.workspace, &request.datastore)),
            },
        }
    }
}

impl From<RestFeatureType> for FeatureType {
    fn from(rest: RestFeatureType) -> Self {
        Self {
            name: rest.name,
            href: rest.href,
        }
    }
}

impl From<&FeatureType> for RestFeatureType {
    fn from(feature_type: &FeatureType) -> Self {
        Self {
            name: feature_type.name.clone(),
            href: feature_type.href.clone(),
            ..Default::default()
        }
    }
}

impl From<FeatureTypesResponse> for Vec<FeatureType> {
    fn from(response: FeatureTypesResponse) -> Self {
        response
            .feature_types
            .feature_type
            .into_iter()
            .map(FeatureType::from)
            .collect()
    }
}
