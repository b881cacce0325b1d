//! Connection parameters for datastore creation.
//!
//! GeoServer configures every store type through a flat list of string
//! key/value pairs. `ConnectionDetails` lets each backing store describe its
//! own keys while the client treats them uniformly.

use std::collections::HashMap;
use std::fmt;

/// Anything that can describe how GeoServer should connect to a data source.
pub trait ConnectionDetails: fmt::Debug + Send + Sync {
    /// Connection parameters as GeoServer expects them.
    fn entries(&self) -> HashMap<String, String>;
}

impl ConnectionDetails for HashMap<String, String> {
    fn entries(&self) -> HashMap<String, String> {
        self.clone()
    }
}

/// Tuning parameters GeoServer applies to every PostGIS store we create.
pub const POSTGIS_DEFAULTS: &[(&str, &str)] = &[
    ("max connections", "10"),
    ("min connections", "1"),
    ("fetch size", "1000"),
    ("Connection timeout", "20"),
    ("validate connections", "true"),
    ("Loose bbox", "true"),
    ("Estimated extends", "true"),
    ("encode functions", "false"),
    ("Expose primary keys", "false"),
    ("preparedStatements", "false"),
];

/// Connection details for a PostGIS-backed datastore.
///
/// `host` and `port` are as seen from the GeoServer process, which is not
/// necessarily how the caller reaches the database.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgisConnectionDetails {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub schema: String,
    pub database: String,
}

impl PostgisConnectionDetails {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        schema: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            schema: schema.into(),
            database: database.into(),
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for PostgisConnectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgisConnectionDetails")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("schema", &self.schema)
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionDetails for PostgisConnectionDetails {
    fn entries(&self) -> HashMap<String, String> {
        let mut entries: HashMap<String, String> = POSTGIS_DEFAULTS
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        entries.insert("dbtype".to_string(), "postgis".to_string());
        entries.insert("host".to_string(), self.host.clone());
        entries.insert("port".to_string(), self.port.to_string());
        entries.insert("database".to_string(), self.database.clone());
        entries.insert("schema".to_string(), self.schema.clone());
        entries.insert("user".to_string(), self.username.clone());
        entries.insert("passwd".to_string(), self.password.clone());
        entries
    }
}
