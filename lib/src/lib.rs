//! Client library for SPARQL triplestores (GraphDB, Fuseki, Stardog and QLever).
//!
//! Query responses in the SPARQL 1.1 JSON results format, or QLever's columnar format,
//! can be normalized into a [`ResultSet`] of typed values or rendered as CSV/TSV text.
//! All transformations are pure functions and can be used without an [`Endpoint`].

extern crate derive_builder;

pub mod bindings;
pub mod config;
pub mod consts;
pub mod datatype;
pub mod delimited;
pub mod endpoint;
pub mod errors;
pub mod normalize;
pub mod prefix;
pub mod resultset;
pub mod transform;

pub use bindings::{BindingsDocument, ResponseShape, Term, TermType};
pub use config::{EndpointConfig, Triplestore};
pub use delimited::{format_csv, format_tsv, DelimitedOptions, DelimitedTable};
pub use endpoint::{Endpoint, QueryOptions, UpdateResponse};
pub use errors::{RequestError, ShapeError};
pub use normalize::{normalize, NormalizeOptions};
pub use prefix::{parse_prefixes, replace_prefix, Prefix, PrefixMap};
pub use resultset::{group_result_set, map_keys, Record, ResultSet, Scalar};
pub use transform::{QueryOutput, Transform, TransformOptions};

/// Initializes logging for the triplestore client.
///
/// If the `TRIPLESTORE_LOG` environment variable is set, `RUST_LOG` is set to its value,
/// so `TRIPLESTORE_LOG` takes precedence over `RUST_LOG`. The logger itself (e.g.
/// `env_logger::init()`) must be initialized after this call.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("TRIPLESTORE_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
