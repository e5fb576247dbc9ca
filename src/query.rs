use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path fragment of the suggestion endpoint, shared by every deployment.
pub const SUGGEST_PATH: &str = "/search/suggest";

/// Snapshot field holding the lemma-search toggle. The toggle never travels
/// verbatim; [`build_query`] folds it into the `lemma_search` parameter.
const LEMMA_SEARCH_FIELD: &str = "lemma_search";

/// Characters left verbatim in query-string values. `+` stays literal because
/// it is the join character for checkbox groups.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'+')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.');

/// Returns true when the current input must not trigger a lookup: empty text,
/// or text containing a wildcard the suggester cannot expand.
pub fn suppresses_lookup(text: &str) -> bool {
    text.is_empty() || text.contains(['*', '?'])
}

/// Which input field a suggestion completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    /// The word-search box.
    #[default]
    Text,
    /// The regest-search box.
    Regest,
}

impl QuerySource {
    fn tag(self) -> &'static str {
        match self {
            QuerySource::Text => "text",
            QuerySource::Regest => "regest",
        }
    }
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The state of the sibling form fields captured at keystroke time.
///
/// Field names are unique within a snapshot: setting an existing name replaces
/// its value in place, keeping first-insertion order. Checkbox groups collapse
/// to a `+`-joined string; an empty group drops the field entirely. Snapshots
/// are built fresh per lookup and discarded after use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSnapshot {
    fields: Vec<(String, String)>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name.to_string(), value));
        }
    }

    /// Collapses a checkbox group to a `+`-joined value. An empty group is
    /// omitted from the snapshot rather than serialized as an empty string.
    pub fn set_multi<S: AsRef<str>>(&mut self, name: &str, values: &[S]) {
        if values.is_empty() {
            self.remove(name);
            return;
        }
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join("+");
        self.set(name, joined);
    }

    /// Booleans travel as `True`/`False`, matching the upstream form encoding.
    pub fn set_flag(&mut self, name: &str, value: bool) {
        self.set(name, if value { "True" } else { "False" });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when the lemma-search toggle is checked in this snapshot. The
    /// upstream form emits `y` for a checked box, templates emit `True`.
    pub fn lemma_search(&self) -> bool {
        matches!(
            self.get(LEMMA_SEARCH_FIELD),
            Some("True") | Some("true") | Some("y")
        )
    }
}

/// One suggestion lookup, built fresh per keystroke and discarded after use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionQuery {
    partial: String,
    source: QuerySource,
    query_string: String,
}

impl SuggestionQuery {
    pub fn new(snapshot: &FormSnapshot, partial: &str, source: QuerySource) -> Self {
        Self {
            partial: partial.to_string(),
            source,
            query_string: build_query(snapshot, source),
        }
    }

    pub fn partial(&self) -> &str {
        &self.partial
    }

    pub fn source(&self) -> QuerySource {
        self.source
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Renders `/search/suggest/{partial}?{query}` with the partial text
    /// percent-encoded for the path.
    pub fn path_and_query(&self) -> String {
        format!(
            "{SUGGEST_PATH}/{}?{}",
            utf8_percent_encode(&self.partial, NON_ALPHANUMERIC),
            self.query_string
        )
    }
}

/// Serializes a snapshot into the suggestion query string: the snapshot's
/// fields in insertion order, then the source-derived `lemma_search` value,
/// then the `qSource` discriminator.
pub fn build_query(snapshot: &FormSnapshot, source: QuerySource) -> String {
    let lemmas = snapshot.lemma_search();
    let mut parts: Vec<String> = Vec::with_capacity(snapshot.len() + 2);
    for (name, value) in snapshot.iter() {
        if name == LEMMA_SEARCH_FIELD {
            continue;
        }
        parts.push(format!("{name}={}", utf8_percent_encode(value, QUERY_VALUE)));
    }
    parts.push(format!(
        "lemma_search={}",
        lemma_search_value(source, lemmas)
    ));
    parts.push(format!("qSource={source}"));
    parts.join("&")
}

/// The word-search box completes against the autocomplete fields (the lemma
/// variant when the toggle is on); the regest box carries the toggle through
/// unchanged.
fn lemma_search_value(source: QuerySource, lemmas: bool) -> &'static str {
    match (source, lemmas) {
        (QuerySource::Text, false) => "autocomplete",
        (QuerySource::Text, true) => "autocomplete_lemmas",
        (QuerySource::Regest, false) => "False",
        (QuerySource::Regest, true) => "True",
    }
}
