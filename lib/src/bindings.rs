//! Raw query results as returned by a triplestore.
//!
//! [`BindingsDocument`] mirrors the W3C SPARQL 1.1 Query Results JSON format. QLever can
//! additionally answer in a columnar `selected`/`res` layout; [`BindingsDocument::from_value`]
//! adapts that layout into the standard one so the normalizer and the formatter only ever
//! see a single shape.

use crate::errors::ShapeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The kind of RDF term bound to a variable.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TermType {
    Uri,
    // older Sesame-based servers still answer with "typed-literal"
    #[serde(alias = "typed-literal")]
    Literal,
    Bnode,
}

/// A single RDF term inside a solution row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Term {
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermType::Uri,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermType::Literal,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::literal(value)
        }
    }

    pub fn bnode(value: impl Into<String>) -> Self {
        Self {
            kind: TermType::Bnode,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }
}

/// One solution row: variable name to bound term. Unbound variables are absent.
pub type Binding = BTreeMap<String, Term>;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Results {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// A complete SELECT result.
///
/// `head.vars` fixes the column order. `total` is only present when the backend reports
/// the size of the full (unpaginated) result.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingsDocument {
    pub head: Head,
    pub results: Results,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl BindingsDocument {
    pub fn new(vars: Vec<String>, bindings: Vec<Binding>) -> Self {
        Self {
            head: Head { vars },
            results: Results { bindings },
            total: None,
        }
    }

    pub fn vars(&self) -> &[String] {
        &self.head.vars
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.results.bindings
    }

    pub fn len(&self) -> usize {
        self.results.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }

    /// Reads a payload of the given `shape`. The shape is never guessed from the payload.
    pub fn from_value(value: &Value, shape: ResponseShape) -> Result<Self, ShapeError> {
        match shape {
            ResponseShape::Sparql => Self::from_sparql_value(value),
            ResponseShape::Qlever => Self::from_qlever_value(value),
        }
    }

    fn from_sparql_value(value: &Value) -> Result<Self, ShapeError> {
        let object = value
            .as_object()
            .ok_or_else(|| ShapeError::Malformed("expected a JSON object".to_string()))?;
        if !object.contains_key("head") {
            return Err(ShapeError::Malformed("missing 'head'".to_string()));
        }
        if !object.contains_key("results") {
            return Err(ShapeError::Malformed("missing 'results'".to_string()));
        }
        Self::deserialize(value).map_err(|e| ShapeError::Malformed(e.to_string()))
    }

    fn from_qlever_value(value: &Value) -> Result<Self, ShapeError> {
        let selected = value
            .get("selected")
            .and_then(Value::as_array)
            .ok_or(ShapeError::SelectedNotArray)?;
        let vars = selected
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.strip_prefix('?').unwrap_or(s).to_string())
                    .ok_or_else(|| {
                        ShapeError::Malformed("'selected' entries must be strings".to_string())
                    })
            })
            .collect::<Result<Vec<String>, ShapeError>>()?;

        let rows: &[Value] = match value.get("res") {
            None | Some(Value::Null) => &[],
            Some(Value::Array(rows)) => rows,
            Some(_) => return Err(ShapeError::RowsNotArray),
        };

        let mut bindings = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let cells = row.as_array().ok_or(ShapeError::RowNotArray { row: idx })?;
            if cells.len() != vars.len() {
                return Err(ShapeError::ArityMismatch {
                    row: idx,
                    expected: vars.len(),
                    found: cells.len(),
                });
            }
            let mut binding = Binding::new();
            for (var, cell) in vars.iter().zip(cells) {
                let term = match cell {
                    Value::Null => continue,
                    Value::String(s) => qlever_term(s),
                    other => Term::literal(other.to_string()),
                };
                binding.insert(var.clone(), term);
            }
            bindings.push(binding);
        }

        let total = value
            .pointer("/runtimeInformation/query_execution_tree/children/0/result_rows")
            .and_then(Value::as_u64)
            .map(|n| n as usize);
        Ok(Self {
            total,
            ..Self::new(vars, bindings)
        })
    }
}

/// Converts one QLever cell into a term: `<iri>` is a URI, anything else a literal.
/// Literals written as `"lex"`, `"lex"@lang` or `"lex"^^<datatype>` are unwrapped.
fn qlever_term(cell: &str) -> Term {
    if cell.len() >= 2 && cell.starts_with('<') && cell.ends_with('>') {
        return Term::uri(&cell[1..cell.len() - 1]);
    }
    if let Some(rest) = cell.strip_prefix('"') {
        if let Some(end) = rest.rfind('"') {
            let (lexical, suffix) = (&rest[..end], &rest[end + 1..]);
            if suffix.is_empty() {
                return Term::literal(lexical);
            }
            if let Some(dt) = suffix
                .strip_prefix("^^<")
                .and_then(|dt| dt.strip_suffix('>'))
            {
                return Term::typed_literal(lexical, dt);
            }
            if let Some(lang) = suffix.strip_prefix('@') {
                return Term {
                    lang: Some(lang.to_string()),
                    ..Term::literal(lexical)
                };
            }
        }
    }
    Term::literal(cell)
}

/// Which payload layout a response uses.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// `head.vars` + `results.bindings`
    #[default]
    Sparql,
    /// `selected` + `res`, requested with `application/qlever-results+json`
    Qlever,
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResponseShape::Sparql => write!(f, "sparql"),
            ResponseShape::Qlever => write!(f, "qlever"),
        }
    }
}

impl FromStr for ResponseShape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sparql" | "json" => Ok(ResponseShape::Sparql),
            "qlever" => Ok(ResponseShape::Qlever),
            _ => Err(anyhow::anyhow!("Unknown response shape: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparql_document() {
        let value = json!({
            "head": {"vars": ["s", "label"]},
            "results": {"bindings": [
                {"s": {"type": "uri", "value": "http://example.org/a"},
                 "label": {"type": "literal", "value": "A", "xml:lang": "en"}},
                {"s": {"type": "bnode", "value": "b0"}}
            ]}
        });
        let doc = BindingsDocument::from_value(&value, ResponseShape::Sparql).unwrap();
        assert_eq!(doc.vars(), &["s".to_string(), "label".to_string()]);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.bindings()[0]["label"].lang.as_deref(), Some("en"));
        assert_eq!(doc.bindings()[1]["s"].kind, TermType::Bnode);
        assert!(!doc.bindings()[1].contains_key("label"));
        assert_eq!(doc.total, None);
    }

    #[test]
    fn test_sparql_document_missing_parts() {
        let err = BindingsDocument::from_value(&json!({"head": {"vars": []}}), ResponseShape::Sparql)
            .unwrap_err();
        assert_eq!(err, ShapeError::Malformed("missing 'results'".to_string()));
        // ASK results have no bindings
        let err = BindingsDocument::from_value(
            &json!({"head": {}, "boolean": true}),
            ResponseShape::Sparql,
        )
        .unwrap_err();
        assert!(matches!(err, ShapeError::Malformed(_)));
        assert!(BindingsDocument::from_value(&json!([1, 2]), ResponseShape::Sparql).is_err());
    }

    #[test]
    fn test_typed_literal_alias() {
        let value = json!({
            "head": {"vars": ["n"]},
            "results": {"bindings": [
                {"n": {"type": "typed-literal", "value": "1",
                       "datatype": "http://www.w3.org/2001/XMLSchema#int"}}
            ]}
        });
        let doc = BindingsDocument::from_value(&value, ResponseShape::Sparql).unwrap();
        assert_eq!(doc.bindings()[0]["n"].kind, TermType::Literal);
    }

    #[test]
    fn test_qlever_document() {
        let value = json!({
            "selected": ["?s", "?label", "?n"],
            "res": [
                ["<http://example.org/a>", "\"Alpha\"", "\"42\"^^<http://www.w3.org/2001/XMLSchema#int>"],
                ["<http://example.org/b>", null, "\"Beta\"@en"]
            ],
            "runtimeInformation": {"query_execution_tree": {"children": [{"result_rows": 1200}]}}
        });
        let doc = BindingsDocument::from_value(&value, ResponseShape::Qlever).unwrap();
        assert_eq!(doc.vars(), &["s", "label", "n"]);
        assert_eq!(doc.total, Some(1200));
        let first = &doc.bindings()[0];
        assert_eq!(first["s"], Term::uri("http://example.org/a"));
        assert_eq!(first["label"], Term::literal("Alpha"));
        assert_eq!(
            first["n"],
            Term::typed_literal("42", "http://www.w3.org/2001/XMLSchema#int")
        );
        let second = &doc.bindings()[1];
        assert!(!second.contains_key("label"));
        assert_eq!(second["n"].value, "Beta");
        assert_eq!(second["n"].lang.as_deref(), Some("en"));
    }

    #[test]
    fn test_qlever_plain_values() {
        let value = json!({"selected": ["?x"], "res": [["plain"], [7]]});
        let doc = BindingsDocument::from_value(&value, ResponseShape::Qlever).unwrap();
        assert_eq!(doc.bindings()[0]["x"], Term::literal("plain"));
        assert_eq!(doc.bindings()[1]["x"], Term::literal("7"));
        assert_eq!(doc.total, None);
    }

    #[test]
    fn test_qlever_empty_rows() {
        let doc = BindingsDocument::from_value(&json!({"selected": ["?a"]}), ResponseShape::Qlever)
            .unwrap();
        assert_eq!(doc.vars(), &["a"]);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_qlever_shape_errors() {
        let err = BindingsDocument::from_value(&json!({"selected": "?a", "res": []}), ResponseShape::Qlever)
            .unwrap_err();
        assert_eq!(err, ShapeError::SelectedNotArray);

        let err = BindingsDocument::from_value(
            &json!({"selected": ["?a", "?b"], "res": [["<x>", "y"], ["<z>"]]}),
            ResponseShape::Qlever,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ShapeError::ArityMismatch {
                row: 1,
                expected: 2,
                found: 1
            }
        );

        let err = BindingsDocument::from_value(
            &json!({"selected": ["?a"], "res": ["<x>"]}),
            ResponseShape::Qlever,
        )
        .unwrap_err();
        assert_eq!(err, ShapeError::RowNotArray { row: 0 });

        let err = BindingsDocument::from_value(
            &json!({"selected": ["?a"], "res": {"0": ["<x>"]}}),
            ResponseShape::Qlever,
        )
        .unwrap_err();
        assert_eq!(err, ShapeError::RowsNotArray);
    }

    #[test]
    fn test_response_shape_from_str() {
        assert_eq!("qlever".parse::<ResponseShape>().unwrap(), ResponseShape::Qlever);
        assert_eq!("SPARQL".parse::<ResponseShape>().unwrap(), ResponseShape::Sparql);
        assert!("xml".parse::<ResponseShape>().is_err());
    }
}
