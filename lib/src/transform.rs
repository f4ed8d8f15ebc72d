//! Selects and applies the output transformation requested for a query response.

use crate::bindings::{BindingsDocument, ResponseShape};
use crate::delimited::{self, DelimitedOptions, DelimitedTable};
use crate::errors::ShapeError;
use crate::normalize::{self, NormalizeOptions};
use crate::prefix::PrefixMap;
use crate::resultset::ResultSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The output requested for a query.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Transform {
    /// The payload as returned by the triplestore
    #[default]
    #[serde(rename = "default")]
    Default,
    /// A [`ResultSet`] of typed values
    #[serde(rename = "toJSON")]
    ToJson,
    /// A comma separated [`DelimitedTable`]
    #[serde(rename = "toCSV")]
    ToCsv,
    /// A tab separated [`DelimitedTable`]
    #[serde(rename = "toTSV")]
    ToTsv,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Transform::Default => "default",
            Transform::ToJson => "toJSON",
            Transform::ToCsv => "toCSV",
            Transform::ToTsv => "toTSV",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Transform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "raw" => Ok(Transform::Default),
            "tojson" | "json" => Ok(Transform::ToJson),
            "tocsv" | "csv" => Ok(Transform::ToCsv),
            "totsv" | "tsv" => Ok(Transform::ToTsv),
            _ => Err(anyhow::anyhow!("Unknown transform: {}", s)),
        }
    }
}

/// Per-call options for [`apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub transform: Transform,
    pub drop_prefixes: bool,
    pub replace_prefixes: bool,
    /// Escaping grammar for CSV/TSV output; the preset matching the transform when unset
    pub delimited: Option<DelimitedOptions>,
}

impl TransformOptions {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            ..Default::default()
        }
    }

    fn delimited_options(&self, preset: fn() -> DelimitedOptions) -> DelimitedOptions {
        let mut options = self.delimited.clone().unwrap_or_else(preset);
        options.drop_prefixes |= self.drop_prefixes;
        options.replace_prefixes |= self.replace_prefixes;
        options
    }
}

/// A non-JSON response, e.g. N-Triples from a CONSTRUCT query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TriplesOutput {
    pub data: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub success: bool,
    pub status: u16,
}

impl TriplesOutput {
    pub fn new(data: String, status: u16) -> Self {
        Self {
            data,
            kind: "triples".to_string(),
            success: true,
            status,
        }
    }
}

/// The result of a query after transformation.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum QueryOutput {
    Raw(Value),
    ResultSet(ResultSet),
    Table(DelimitedTable),
    Triples(TriplesOutput),
}

impl QueryOutput {
    /// Text form for display: delimited tables as lines, triples verbatim, everything
    /// else as pretty-printed JSON.
    pub fn to_text(&self) -> serde_json::Result<String> {
        match self {
            QueryOutput::Table(table) => Ok(table.to_text()),
            QueryOutput::Triples(triples) => Ok(triples.data.clone()),
            other => serde_json::to_string_pretty(other),
        }
    }
}

/// Applies `options.transform` to a JSON payload of the given `shape`.
///
/// A QLever payload is always converted to the SPARQL results layout first, so even
/// [`Transform::Default`] returns the standard shape for it. A SPARQL payload is passed
/// through untouched under [`Transform::Default`].
pub fn apply(
    payload: Value,
    shape: ResponseShape,
    options: &TransformOptions,
    prefixes: &PrefixMap,
) -> Result<QueryOutput, ShapeError> {
    if options.transform == Transform::Default && shape == ResponseShape::Sparql {
        return Ok(QueryOutput::Raw(payload));
    }
    let doc = BindingsDocument::from_value(&payload, shape)?;
    let output = match options.transform {
        Transform::Default => QueryOutput::Raw(
            serde_json::to_value(&doc).map_err(|e| ShapeError::Malformed(e.to_string()))?,
        ),
        Transform::ToJson => {
            let normalize_options = NormalizeOptions {
                drop_prefixes: options.drop_prefixes,
                replace_prefixes: options.replace_prefixes,
            };
            QueryOutput::ResultSet(normalize::normalize(&doc, &normalize_options, prefixes))
        }
        Transform::ToCsv => QueryOutput::Table(delimited::format(
            &doc,
            &options.delimited_options(DelimitedOptions::csv),
            prefixes,
        )),
        Transform::ToTsv => QueryOutput::Table(delimited::format(
            &doc,
            &options.delimited_options(DelimitedOptions::tsv),
            prefixes,
        )),
    };
    Ok(output)
}
