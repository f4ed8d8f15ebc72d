//! Defines the configuration of a triplestore endpoint: which server flavor it is, where
//! it lives, how to authenticate, and the defaults applied to its query results.

use crate::prefix::PrefixMap;
use crate::transform::Transform;
use anyhow::Result;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufReader, Write};
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// The supported triplestore servers. They differ in where the SPARQL query and update
/// services are mounted.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Triplestore {
    #[default]
    GraphDb,
    Fuseki,
    Stardog,
    Qlever,
}

impl Triplestore {
    pub fn query_path(&self, repository: &str) -> String {
        match self {
            Triplestore::Fuseki => format!("/{}/sparql", repository),
            Triplestore::GraphDb => format!("/repositories/{}", repository),
            Triplestore::Stardog => format!("/{}/query", repository),
            Triplestore::Qlever => "/".to_string(),
        }
    }

    pub fn update_path(&self, repository: &str) -> String {
        match self {
            Triplestore::Fuseki => format!("/{}/update", repository),
            Triplestore::GraphDb => format!("/repositories/{}/statements", repository),
            Triplestore::Stardog => format!("/{}/update", repository),
            Triplestore::Qlever => "/".to_string(),
        }
    }

    /// QLever serves a single dataset at its root.
    pub fn requires_repository(&self) -> bool {
        !matches!(self, Triplestore::Qlever)
    }
}

impl fmt::Display for Triplestore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Triplestore::GraphDb => "graphdb",
            Triplestore::Fuseki => "fuseki",
            Triplestore::Stardog => "stardog",
            Triplestore::Qlever => "qlever",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Triplestore {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "graphdb" => Ok(Triplestore::GraphDb),
            "fuseki" => Ok(Triplestore::Fuseki),
            "stardog" => Ok(Triplestore::Stardog),
            "qlever" => Ok(Triplestore::Qlever),
            _ => Err(anyhow::anyhow!("Unknown triplestore: {}", s)),
        }
    }
}

fn default_version() -> f64 {
    10.2
}

fn default_api_type() -> String {
    "workbench".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[builder(pattern = "owned", setter(into), build_fn(validate = "Self::validate"))]
pub struct EndpointConfig {
    pub base_url: String,
    #[builder(setter(into, strip_option), default)]
    #[serde(default)]
    pub repository: Option<String>,
    #[builder(default)]
    #[serde(default)]
    pub triplestore: Triplestore,
    #[builder(default)]
    #[serde(default)]
    pub prefixes: PrefixMap,
    // transform applied when a query does not ask for one
    #[builder(default)]
    #[serde(default)]
    pub transform: Transform,
    #[builder(setter(into, strip_option), default)]
    #[serde(default)]
    pub default_context: Option<String>,
    #[builder(default = "default_version()")]
    #[serde(default = "default_version")]
    pub version: f64,
    #[builder(default = "default_api_type()")]
    #[serde(default = "default_api_type")]
    pub api_type: String,
    #[builder(setter(into, strip_option), default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[builder(setter(into, strip_option), default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[builder(default = "default_timeout_secs()")]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    // ask QLever for its columnar result format
    #[builder(default)]
    #[serde(default)]
    pub use_qlever_bindings: bool,
}

impl EndpointConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|e| format!("Invalid base URL {}: {}", base_url, e))?;
        }
        let triplestore = self.triplestore.unwrap_or_default();
        let has_repository = matches!(&self.repository, Some(Some(r)) if !r.is_empty());
        if triplestore.requires_repository() && !has_repository {
            return Err(format!("A repository is required for {}", triplestore));
        }
        Ok(())
    }
}

impl EndpointConfig {
    pub fn builder() -> EndpointConfigBuilder {
        EndpointConfigBuilder::default()
    }

    fn repository_or_empty(&self) -> &str {
        self.repository.as_deref().unwrap_or("")
    }

    pub fn query_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.triplestore.query_path(self.repository_or_empty())
        )
    }

    pub fn update_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.triplestore.update_path(self.repository_or_empty())
        )
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: EndpointConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Prints out the current EndpointConfig in a clear and readable way for command line output.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  Triplestore: {}", self.triplestore);
        println!("  Base URL: {}", self.base_url);
        if let Some(repository) = &self.repository {
            println!("  Repository: {}", repository);
        }
        println!("  Query URL: {}", self.query_url());
        println!("  Update URL: {}", self.update_url());
        println!("  Transform: {}", self.transform);
        if let Some(context) = &self.default_context {
            println!("  Default Context: {}", context);
        }
        println!("  Version: {}", self.version);
        println!("  API Type: {}", self.api_type);
        if let Some(username) = &self.username {
            println!("  Username: {}", username);
        }
        println!("  Timeout: {}s", self.timeout_secs);
        if self.triplestore == Triplestore::Qlever {
            println!("  QLever Bindings: {}", self.use_qlever_bindings);
        }
        if !self.prefixes.is_empty() {
            println!("  Prefixes:");
            for p in &self.prefixes {
                println!("    - {}: {}", p.prefix, p.iri);
            }
        }
    }
}
