//! Coercion of XSD-typed literals into [`Scalar`] values.

use crate::consts::{
    xsd, XSD_DATE_TIME_UPPER, XSD_UNSIGNED_INT_LOWER, XSD_UNSIGNED_LONG_LOWER,
    XSD_UNSIGNED_SHORT_LOWER,
};
use crate::resultset::Scalar;
use chrono::{DateTime, NaiveDateTime};
use oxigraph::model::NamedNodeRef;
use serde::Serialize;
use std::fmt;

const FLOAT_TYPES: [NamedNodeRef<'_>; 5] = [
    xsd::FLOAT,
    xsd::DOUBLE,
    xsd::DECIMAL,
    xsd::NEGATIVE_INTEGER,
    xsd::NON_POSITIVE_INTEGER,
];

const INTEGER_TYPES: [NamedNodeRef<'_>; 6] = [
    xsd::INT,
    xsd::INTEGER,
    xsd::NON_NEGATIVE_INTEGER,
    xsd::POSITIVE_INTEGER,
    xsd::UNSIGNED_INT,
    XSD_UNSIGNED_INT_LOWER,
];

const NUMBER_TYPES: [NamedNodeRef<'_>; 8] = [
    xsd::LONG,
    xsd::SHORT,
    xsd::BYTE,
    xsd::UNSIGNED_BYTE,
    xsd::UNSIGNED_LONG,
    XSD_UNSIGNED_LONG_LOWER,
    xsd::UNSIGNED_SHORT,
    XSD_UNSIGNED_SHORT_LOWER,
];

/// The scalar type a datatype IRI is coerced into.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Float,
    Integer,
    Number,
    DateTime,
    DateTimeStamp,
    Boolean,
}

impl TargetType {
    /// Looks up the coercion target for a datatype IRI. Matching is exact and
    /// case-sensitive; unknown datatypes stay strings and yield `None`.
    pub fn for_datatype(datatype: &str) -> Option<Self> {
        let is_one_of = |types: &[NamedNodeRef<'_>]| types.iter().any(|t| t.as_str() == datatype);
        if is_one_of(&FLOAT_TYPES) {
            Some(TargetType::Float)
        } else if is_one_of(&INTEGER_TYPES) {
            Some(TargetType::Integer)
        } else if is_one_of(&NUMBER_TYPES) {
            Some(TargetType::Number)
        } else if datatype == xsd::DATE_TIME.as_str() || datatype == XSD_DATE_TIME_UPPER.as_str() {
            Some(TargetType::DateTime)
        } else if datatype == xsd::DATE_TIME_STAMP.as_str() {
            Some(TargetType::DateTimeStamp)
        } else if datatype == xsd::BOOLEAN.as_str() {
            Some(TargetType::Boolean)
        } else {
            None
        }
    }

    /// Parses `lexical` into this target type.
    pub fn coerce(self, lexical: &str) -> Option<Scalar> {
        let lexical = lexical.trim();
        match self {
            TargetType::Float => lexical.parse::<f64>().ok().map(Scalar::Float),
            TargetType::Integer => lexical.parse::<i64>().ok().map(Scalar::Integer),
            TargetType::Number => parse_number(lexical).map(Scalar::Number),
            TargetType::DateTime => parse_datetime(lexical, true).map(Scalar::DateTime),
            TargetType::DateTimeStamp => parse_datetime(lexical, false).map(Scalar::DateTime),
            TargetType::Boolean => match lexical {
                "true" | "1" => Some(Scalar::Boolean(true)),
                "false" | "0" => Some(Scalar::Boolean(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TargetType::Float => "float",
            TargetType::Integer => "integer",
            TargetType::Number => "number",
            TargetType::DateTime => "dateTime",
            TargetType::DateTimeStamp => "dateTimeStamp",
            TargetType::Boolean => "boolean",
        };
        write!(f, "{}", name)
    }
}

fn parse_number(lexical: &str) -> Option<serde_json::Number> {
    if let Ok(i) = lexical.parse::<i64>() {
        return Some(i.into());
    }
    if let Ok(u) = lexical.parse::<u64>() {
        return Some(u.into());
    }
    lexical
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
}

// xsd:dateTime allows a missing timezone, which is read as UTC
fn parse_datetime(lexical: &str, allow_naive: bool) -> Option<DateTime<chrono::FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(lexical) {
        return Some(dt);
    }
    if !allow_naive {
        return None;
    }
    NaiveDateTime::parse_from_str(lexical, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

/// A typed literal whose lexical form could not be coerced. The value is kept as a
/// string; these are collected so callers can inspect what was left untyped.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CoercionWarning {
    pub row: usize,
    pub variable: String,
    pub datatype: String,
    pub value: String,
    pub target: TargetType,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "row {}: cannot read {:?} of ?{} as {} (datatype <{}>)",
            self.row, self.value, self.variable, self.target, self.datatype
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

    fn target(suffix: &str) -> Option<TargetType> {
        TargetType::for_datatype(&format!("{XSD}{suffix}"))
    }

    #[test]
    fn test_datatype_table() {
        for s in ["float", "double", "decimal", "negativeInteger", "nonPositiveInteger"] {
            assert_eq!(target(s), Some(TargetType::Float), "{s}");
        }
        for s in [
            "int",
            "integer",
            "nonNegativeInteger",
            "positiveInteger",
            "unsignedint",
            "unsignedInt",
        ] {
            assert_eq!(target(s), Some(TargetType::Integer), "{s}");
        }
        for s in [
            "long",
            "short",
            "byte",
            "unsignedByte",
            "unsignedlong",
            "unsignedshort",
        ] {
            assert_eq!(target(s), Some(TargetType::Number), "{s}");
        }
        assert_eq!(target("dateTime"), Some(TargetType::DateTime));
        assert_eq!(target("DateTime"), Some(TargetType::DateTime));
        assert_eq!(target("dateTimeStamp"), Some(TargetType::DateTimeStamp));
        assert_eq!(target("boolean"), Some(TargetType::Boolean));
        assert_eq!(target("string"), None);
        // case-sensitive
        assert_eq!(target("Boolean"), None);
        assert_eq!(TargetType::for_datatype("http://example.org/int"), None);
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(TargetType::Integer.coerce("42"), Some(Scalar::Integer(42)));
        assert_eq!(TargetType::Integer.coerce("-7"), Some(Scalar::Integer(-7)));
        assert_eq!(TargetType::Integer.coerce("4.2"), None);
        assert_eq!(TargetType::Float.coerce("4.5"), Some(Scalar::Float(4.5)));
        assert_eq!(TargetType::Float.coerce("abc"), None);
        assert_eq!(
            TargetType::Number.coerce("18446744073709551615"),
            Some(Scalar::Number(u64::MAX.into()))
        );
        assert_eq!(TargetType::Number.coerce("-3"), Some(Scalar::Number((-3i64).into())));
        assert_eq!(TargetType::Number.coerce("x"), None);
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(TargetType::Boolean.coerce("true"), Some(Scalar::Boolean(true)));
        assert_eq!(TargetType::Boolean.coerce("0"), Some(Scalar::Boolean(false)));
        assert_eq!(TargetType::Boolean.coerce("yes"), None);
    }

    #[test]
    fn test_coerce_datetime() {
        let dt = TargetType::DateTime.coerce("2021-05-04T10:11:12Z").unwrap();
        assert_eq!(dt.to_string(), "2021-05-04T10:11:12+00:00");
        let naive = TargetType::DateTime.coerce("2021-05-04T10:11:12.5").unwrap();
        assert_eq!(naive.as_datetime().unwrap().timestamp(), 1620123072);
        assert_eq!(TargetType::DateTimeStamp.coerce("2021-05-04T10:11:12"), None);
        assert!(TargetType::DateTimeStamp
            .coerce("2021-05-04T10:11:12-05:00")
            .is_some());
        assert_eq!(TargetType::DateTime.coerce("yesterday"), None);
    }
}
