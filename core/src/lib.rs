//! Blocking client for GeoServer's administrative REST API.
//!
//! # Overview
//! Manages the lifecycle of workspaces, datastores and feature types (published
//! layers) and checks server health. Every call is a single synchronous HTTP
//! exchange; nothing is cached or retried.
//!
//! # Design
//! - `GeoserverClient` is immutable after construction and holds only the base
//!   URL, the Basic auth header and a `Transport`.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`), so the I/O boundary is explicit
//!   and both halves are testable without a server.
//! - Public domain types (`types`) are kept apart from GeoServer's JSON shapes
//!   (`wire`); conversions between them are pure `From` impls.
//! - Events are emitted through `tracing`; installing a subscriber is up to
//!   the application.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod http;
pub mod types;
mod wire;

pub use client::GeoserverClient;
pub use config::ClientConfig;
pub use connection::{ConnectionDetails, PostgisConnectionDetails};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{
    BoundingBox, CreateDatastoreRequest, CreateFeatureTypeRequest, CreateWorkspaceRequest, Datastore,
    FeatureType, Workspace,
};
