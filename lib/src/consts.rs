//! Defines constants shared by the normalizer and the endpoint: XML Schema datatype
//! IRIs recognized during coercion, well-known namespace prefixes, and the media types
//! negotiated with triplestores.

use crate::prefix::PrefixRef;
use oxigraph::model::NamedNodeRef;

pub use oxigraph::model::vocab::xsd;

// lower-case spellings emitted by some backends instead of the XSD names
pub const XSD_UNSIGNED_INT_LOWER: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#unsignedint");
pub const XSD_UNSIGNED_LONG_LOWER: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#unsignedlong");
pub const XSD_UNSIGNED_SHORT_LOWER: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#unsignedshort");
// GraphDB has emitted this casing for xsd:dateTime
pub const XSD_DATE_TIME_UPPER: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#DateTime");

// a valuable list of popular prefixes is at http://prefix.cc/popular/all.n3
pub const PREFIX_OWL: PrefixRef<'_> = PrefixRef::new("owl", "http://www.w3.org/2002/07/owl#");
pub const PREFIX_RDF: PrefixRef<'_> =
    PrefixRef::new("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
pub const PREFIX_RDFS: PrefixRef<'_> =
    PrefixRef::new("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
pub const PREFIX_SESAME: PrefixRef<'_> =
    PrefixRef::new("sesame", "http://www.openrdf.org/schema/sesame#");
pub const PREFIX_XSD: PrefixRef<'_> = PrefixRef::new("xsd", "http://www.w3.org/2001/XMLSchema#");
pub const PREFIX_FN: PrefixRef<'_> = PrefixRef::new("fn", "http://www.w3.org/2005/xpath-functions#");
pub const PREFIX_SFN: PrefixRef<'_> = PrefixRef::new("sfn", "http://www.w3.org/ns/sparql#");
pub const PREFIX_PROTONS: PrefixRef<'_> =
    PrefixRef::new("protons", "http://proton.semanticweb.org/protonsys#");
pub const PREFIX_ONTOFN: PrefixRef<'_> =
    PrefixRef::new("ontofn", "http://www.ontotext.com/sparql/functions/#");
pub const PREFIX_SPIF: PrefixRef<'_> = PrefixRef::new("spif", "http://spinrdf.org/spif#");
pub const PREFIX_APROPF: PrefixRef<'_> =
    PrefixRef::new("aprof", "http://jena.hpl.hp.com/ARQ/property#");
pub const PREFIX_ALIST: PrefixRef<'_> = PrefixRef::new("alist", "http://jena.apache.org/ARQ/list#");

pub const WELL_KNOWN_PREFIXES: [PrefixRef<'_>; 12] = [
    PREFIX_OWL,
    PREFIX_RDF,
    PREFIX_RDFS,
    PREFIX_SESAME,
    PREFIX_XSD,
    PREFIX_FN,
    PREFIX_SFN,
    PREFIX_PROTONS,
    PREFIX_ONTOFN,
    PREFIX_SPIF,
    PREFIX_APROPF,
    PREFIX_ALIST,
];

// media types
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";
pub const SPARQL_RESULTS_ACCEPT: &str =
    "application/sparql-results+json,application/json,application/n-triples";
pub const QLEVER_RESULTS_ACCEPT: &str = "application/qlever-results+json";
