//! Delimited-text formatter (CSV and TSV).
//!
//! Every cell passes through the same escaping steps, in this order:
//!
//! 1. the value is stringified and prefix-dropped or prefix-compacted,
//! 2. occurrences of the delimiter are replaced by `delimiter_escape`,
//! 3. the value is wrapped in the delimiter (always, or only when it contains the
//!    separator if `delimiter_optional` is set),
//! 4. occurrences of the separator, including inside the wrapped value, are replaced by
//!    `separator_escape`.
//!
//! Empty tokens disable the corresponding step.

use crate::bindings::BindingsDocument;
use crate::prefix::{PrefixMap, PrefixMode};
use serde::{Deserialize, Serialize};

/// The escaping grammar used by [`format`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DelimitedOptions {
    pub separator: String,
    pub separator_escape: String,
    pub delimiter: String,
    pub delimiter_optional: bool,
    pub delimiter_escape: String,
    /// Written for variables a row does not bind.
    pub blank: String,
    pub drop_prefixes: bool,
    pub replace_prefixes: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self::csv()
    }
}

impl DelimitedOptions {
    /// Comma separated, separators inside values escaped as `\,`, no quoting.
    pub fn csv() -> Self {
        Self {
            separator: ",".to_string(),
            separator_escape: "\\,".to_string(),
            delimiter: String::new(),
            delimiter_optional: true,
            delimiter_escape: String::new(),
            blank: String::new(),
            drop_prefixes: false,
            replace_prefixes: false,
        }
    }

    /// Tab separated, tabs inside values escaped as the two characters `\t`.
    pub fn tsv() -> Self {
        Self {
            separator: "\t".to_string(),
            separator_escape: "\\t".to_string(),
            ..Self::csv()
        }
    }

    /// Uses a single space for unbound variables, as older releases did.
    pub fn legacy_blank(self) -> Self {
        Self {
            blank: " ".to_string(),
            ..self
        }
    }

    pub fn with_prefixes(self, drop_prefixes: bool, replace_prefixes: bool) -> Self {
        Self {
            drop_prefixes,
            replace_prefixes,
            ..self
        }
    }

    pub fn prefix_mode(&self) -> PrefixMode {
        PrefixMode::from_flags(self.drop_prefixes, self.replace_prefixes)
    }

    fn escape(&self, value: &str, mode: PrefixMode, prefixes: &PrefixMap) -> String {
        let mut value = mode.apply(value, prefixes).into_owned();

        if !self.delimiter.is_empty() && !self.delimiter_escape.is_empty() {
            value = value.replace(&self.delimiter, &self.delimiter_escape);
        }

        if !self.delimiter.is_empty()
            && (!self.delimiter_optional || value.contains(self.separator.as_str()))
        {
            value = format!("{}{}{}", self.delimiter, value, self.delimiter);
        }

        if !self.separator.is_empty() && !self.separator_escape.is_empty() {
            value = value.replace(&self.separator, &self.separator_escape);
        }
        value
    }
}

/// Output of [`format`]: one pre-joined header line and one pre-joined line per row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DelimitedTable {
    pub total: usize,
    pub success: bool,
    pub headers: Vec<String>,
    pub records: Vec<String>,
}

impl DelimitedTable {
    /// Header and rows joined with `\n`, ready to be written to a file.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in self.headers.iter().chain(self.records.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Renders `doc` as delimited text. Every row has one cell per variable in `head.vars`,
/// in that order, regardless of which variables the row binds.
pub fn format(doc: &BindingsDocument, options: &DelimitedOptions, prefixes: &PrefixMap) -> DelimitedTable {
    let mode = options.prefix_mode();
    let vars = doc.vars();

    let header = vars
        .iter()
        .map(|v| options.escape(v, mode, prefixes))
        .collect::<Vec<_>>()
        .join(&options.separator);

    let records: Vec<String> = doc
        .bindings()
        .iter()
        .map(|binding| {
            vars.iter()
                .map(|var| match binding.get(var) {
                    Some(term) => options.escape(&term.value, mode, prefixes),
                    None => options.blank.clone(),
                })
                .collect::<Vec<_>>()
                .join(&options.separator)
        })
        .collect();

    DelimitedTable {
        total: records.len(),
        success: true,
        headers: vec![header],
        records,
    }
}

/// [`format`] with the CSV preset.
pub fn format_csv(doc: &BindingsDocument, prefixes: &PrefixMap) -> DelimitedTable {
    format(doc, &DelimitedOptions::csv(), prefixes)
}

/// [`format`] with the TSV preset.
pub fn format_tsv(doc: &BindingsDocument, prefixes: &PrefixMap) -> DelimitedTable {
    format(doc, &DelimitedOptions::tsv(), prefixes)
}
