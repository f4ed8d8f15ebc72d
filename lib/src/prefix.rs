//! Namespace prefixes: the prefix map registered with an endpoint, IRI compaction,
//! and a heuristic extractor for `PREFIX` lines in SPARQL text.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^A-Za-z0-9_]").unwrap();
    static ref ANGLE_BRACKETS: Regex = Regex::new(r"[<>]").unwrap();
}

/// A single `prefix` -> namespace `iri` association, e.g. `owl` ->
/// `http://www.w3.org/2002/07/owl#`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    pub prefix: String,
    pub iri: String,
}

impl Prefix {
    pub fn new(prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            iri: iri.into(),
        }
    }

    pub fn as_prefix_ref(&self) -> PrefixRef<'_> {
        PrefixRef::new(&self.prefix, &self.iri)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.as_prefix_ref().fmt(f)
    }
}

/// Borrowed form of [`Prefix`], usable in `const` items.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PrefixRef<'a> {
    pub prefix: &'a str,
    pub iri: &'a str,
}

impl<'a> PrefixRef<'a> {
    pub const fn new(prefix: &'a str, iri: &'a str) -> Self {
        Self { prefix, iri }
    }

    pub fn into_owned(self) -> Prefix {
        Prefix::new(self.prefix, self.iri)
    }
}

impl fmt::Display for PrefixRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PREFIX {}: <{}>", self.prefix, self.iri)
    }
}

impl From<PrefixRef<'_>> for Prefix {
    fn from(value: PrefixRef<'_>) -> Self {
        value.into_owned()
    }
}

/// The prefixes registered with an endpoint. Entries are kept in registration
/// order; lookups scan linearly since maps hold at most a few dozen entries.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PrefixMap(Vec<Prefix>);

impl PrefixMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Map containing every prefix in [`crate::consts::WELL_KNOWN_PREFIXES`].
    pub fn well_known() -> Self {
        crate::consts::WELL_KNOWN_PREFIXES.into_iter().collect()
    }

    pub fn push(&mut self, prefix: impl Into<Prefix>) {
        self.0.push(prefix.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prefix> {
        self.0.iter()
    }

    /// Returns the prefix registered for exactly this namespace IRI.
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.iri == namespace)
            .map(|p| p.prefix.as_str())
    }

    /// Compacts `iri` using this map, see [`replace_prefix`].
    pub fn compact(&self, iri: &str) -> String {
        replace_prefix(iri, self)
    }

    /// Renders the map as a block of SPARQL `PREFIX` declarations, one per line.
    pub fn to_sparql(&self) -> String {
        let mut out = String::new();
        for p in &self.0 {
            out.push_str(&p.to_string());
            out.push('\n');
        }
        out
    }
}

impl<P: Into<Prefix>> FromIterator<P> for PrefixMap {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<Prefix>> for PrefixMap {
    fn from(value: Vec<Prefix>) -> Self {
        Self(value)
    }
}

impl<'a> IntoIterator for &'a PrefixMap {
    type Item = &'a Prefix;
    type IntoIter = std::slice::Iter<'a, Prefix>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Rewrites `namespace#local` into `prefix:local` when `namespace#` is registered in
/// `prefixes`. IRIs without a `#`, or with an unknown namespace, are returned unchanged.
pub fn replace_prefix(iri: &str, prefixes: &PrefixMap) -> String {
    let Some(pos) = iri.rfind('#') else {
        return iri.to_string();
    };
    let (namespace, local) = (&iri[..=pos], &iri[pos + 1..]);
    match prefixes.prefix_for(namespace) {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => iri.to_string(),
    }
}

/// Returns the part of `value` after its last `#`, or `value` itself if it has none.
pub fn drop_prefix(value: &str) -> &str {
    match value.rfind('#') {
        Some(pos) => &value[pos + 1..],
        None => value,
    }
}

/// How IRI-like string values are rewritten on output.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PrefixMode {
    /// Leave values untouched.
    #[default]
    Keep,
    /// Keep only the local part after the last `#`.
    Drop,
    /// Compact registered namespaces to `prefix:local`.
    Replace,
}

impl PrefixMode {
    /// Dropping wins when both flags are set.
    pub fn from_flags(drop_prefixes: bool, replace_prefixes: bool) -> Self {
        if drop_prefixes {
            PrefixMode::Drop
        } else if replace_prefixes {
            PrefixMode::Replace
        } else {
            PrefixMode::Keep
        }
    }

    pub fn apply<'a>(self, value: &'a str, prefixes: &PrefixMap) -> Cow<'a, str> {
        match self {
            PrefixMode::Keep => Cow::Borrowed(value),
            PrefixMode::Drop => Cow::Borrowed(drop_prefix(value)),
            PrefixMode::Replace => Cow::Owned(replace_prefix(value, prefixes)),
        }
    }
}

/// Collects the `PREFIX name: <iri>` declarations found in `sparql`.
///
/// This is a line-oriented text scan, not a parser: a line qualifies when its first
/// whitespace-separated token is `prefix` (any casing) and it has at least three tokens.
/// The prefix name keeps only `[A-Za-z0-9_]` characters of the second token, the IRI is
/// the third token without angle brackets. Anything else is skipped.
pub fn parse_prefixes(sparql: &str) -> Vec<Prefix> {
    let mut prefixes = Vec::new();
    for line in sparql.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 || !tokens[0].eq_ignore_ascii_case("prefix") {
            continue;
        }
        let prefix = NON_WORD.replace_all(tokens[1], "").into_owned();
        let iri = ANGLE_BRACKETS.replace_all(tokens[2], "").into_owned();
        debug!("Found prefix declaration {} -> {}", prefix, iri);
        prefixes.push(Prefix { prefix, iri });
    }
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{PREFIX_OWL, PREFIX_RDFS};

    #[test]
    fn test_replace_prefix() {
        let prefixes: PrefixMap = [PREFIX_OWL].into_iter().collect();
        assert_eq!(
            replace_prefix("http://www.w3.org/2002/07/owl#Class", &prefixes),
            "owl:Class"
        );
        // unregistered namespace
        assert_eq!(
            replace_prefix("http://example.org/onto#Thing", &prefixes),
            "http://example.org/onto#Thing"
        );
        // no hash at all
        assert_eq!(
            replace_prefix("http://example.org/thing", &prefixes),
            "http://example.org/thing"
        );
    }

    #[test]
    fn test_replace_prefix_splits_on_last_hash() {
        let mut prefixes = PrefixMap::new();
        prefixes.push(Prefix::new("ex", "http://example.org/a#b#"));
        assert_eq!(replace_prefix("http://example.org/a#b#c", &prefixes), "ex:c");
        assert_eq!(
            replace_prefix("http://example.org/a#c", &prefixes),
            "http://example.org/a#c"
        );
    }

    #[test]
    fn test_drop_prefix() {
        assert_eq!(drop_prefix("http://www.w3.org/2002/07/owl#Class"), "Class");
        assert_eq!(drop_prefix("a#b#c"), "c");
        assert_eq!(drop_prefix("no-hash"), "no-hash");
        assert_eq!(drop_prefix("trailing#"), "");
    }

    #[test]
    fn test_parse_prefixes() {
        let sparql = "PREFIX owl: <http://www.w3.org/2002/07/owl#>\r\n\
                      prefix  rdfs:   <http://www.w3.org/2000/01/rdf-schema#>\n\
                      PREFIX broken:\n\
                      SELECT ?s WHERE { ?s a owl:Class }\n";
        let prefixes = parse_prefixes(sparql);
        assert_eq!(
            prefixes,
            vec![PREFIX_OWL.into_owned(), PREFIX_RDFS.into_owned()]
        );
    }

    #[test]
    fn test_parse_prefixes_strips_punctuation() {
        let prefixes = parse_prefixes("Prefix en-test: <http://ont.enapso.com/test#> .");
        assert_eq!(prefixes.len(), 1);
        assert_eq!(prefixes[0].prefix, "entest");
        assert_eq!(prefixes[0].iri, "http://ont.enapso.com/test#");
    }

    #[test]
    fn test_to_sparql() {
        let prefixes: PrefixMap = [PREFIX_OWL, PREFIX_RDFS].into_iter().collect();
        assert_eq!(
            prefixes.to_sparql(),
            "PREFIX owl: <http://www.w3.org/2002/07/owl#>\n\
             PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n"
        );
        // round trip through the extractor
        assert_eq!(
            parse_prefixes(&prefixes.to_sparql()),
            prefixes.iter().cloned().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_prefix_mode() {
        let prefixes: PrefixMap = [PREFIX_OWL].into_iter().collect();
        let iri = "http://www.w3.org/2002/07/owl#Thing";
        assert_eq!(PrefixMode::from_flags(true, true), PrefixMode::Drop);
        assert_eq!(PrefixMode::from_flags(false, true), PrefixMode::Replace);
        assert_eq!(PrefixMode::from_flags(false, false), PrefixMode::Keep);
        assert_eq!(PrefixMode::Keep.apply(iri, &prefixes), iri);
        assert_eq!(PrefixMode::Drop.apply(iri, &prefixes), "Thing");
        assert_eq!(PrefixMode::Replace.apply(iri, &prefixes), "owl:Thing");
    }
}
