//! Turns a [`BindingsDocument`] into a [`ResultSet`] of typed values.

use crate::bindings::BindingsDocument;
use crate::datatype::{CoercionWarning, TargetType};
use crate::prefix::{PrefixMap, PrefixMode};
use crate::resultset::{Record, ResultSet, Scalar};
use log::warn;
use serde::{Deserialize, Serialize};

// an empty RDF collection, treated as an unbound variable
const EMPTY_COLLECTION: &str = "[]";

/// Options for [`normalize`].
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Keep only the part after the last `#` of string values. Takes precedence over
    /// `replace_prefixes`.
    pub drop_prefixes: bool,
    /// Compact IRIs with the endpoint's prefix map.
    pub replace_prefixes: bool,
}

impl NormalizeOptions {
    pub fn prefix_mode(&self) -> PrefixMode {
        PrefixMode::from_flags(self.drop_prefixes, self.replace_prefixes)
    }
}

/// Converts every solution row of `doc` into a record of typed values, preserving row
/// order. Literals with a recognized XSD datatype are coerced; values that fail to
/// parse stay strings. Never fails on a well-formed document.
pub fn normalize(doc: &BindingsDocument, options: &NormalizeOptions, prefixes: &PrefixMap) -> ResultSet {
    normalize_with_diagnostics(doc, options, prefixes).0
}

/// Like [`normalize`], also returning every literal that could not be coerced.
pub fn normalize_with_diagnostics(
    doc: &BindingsDocument,
    options: &NormalizeOptions,
    prefixes: &PrefixMap,
) -> (ResultSet, Vec<CoercionWarning>) {
    let mode = options.prefix_mode();
    let mut warnings = Vec::new();
    let mut records = Vec::with_capacity(doc.len());

    for (row, binding) in doc.bindings().iter().enumerate() {
        let mut record = Record::new();
        for (variable, term) in binding {
            let target = term
                .datatype
                .as_deref()
                .and_then(|dt| TargetType::for_datatype(dt).map(|t| (dt, t)));
            let value = match target {
                Some((datatype, target)) => match target.coerce(&term.value) {
                    Some(scalar) => scalar,
                    None => {
                        let warning = CoercionWarning {
                            row,
                            variable: variable.clone(),
                            datatype: datatype.to_string(),
                            value: term.value.clone(),
                            target,
                        };
                        warn!("{}", warning);
                        warnings.push(warning);
                        Scalar::String(term.value.clone())
                    }
                },
                None => Scalar::String(term.value.clone()),
            };
            let value = match value {
                Scalar::String(s) => {
                    let s = mode.apply(&s, prefixes).into_owned();
                    if s == EMPTY_COLLECTION {
                        continue;
                    }
                    Scalar::String(s)
                }
                typed => typed,
            };
            record.insert(variable.clone(), value);
        }
        records.push(record);
    }

    let result_set = ResultSet {
        total: doc.total.unwrap_or(records.len()),
        success: true,
        records,
    };
    (result_set, warnings)
}
