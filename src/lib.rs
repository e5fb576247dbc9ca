//! Client-side autocomplete plumbing for the Formulae - Litterae - Chartae
//! text-search application.
//!
//! The crate turns rapid input changes into at most one suggestion lookup per
//! pause in typing. [`FormSnapshot`] captures the sibling form fields at
//! keystroke time, [`SuggestionQuery`] serializes them for the
//! `/search/suggest/{partial}` endpoint, [`SuggestClient`] issues the GET, and
//! [`SuggestionFetcher`] owns the per-field debounce timer and renders results
//! into a [`SuggestionView`].

mod client;
mod fetcher;
mod query;

pub use client::{
    SuggestClient, SuggestError, SuggestionLookup, WORKBENCH_HOST, path_prefix_for_host,
};
pub use fetcher::{
    FAILURE_PLACEHOLDER, LOADING_PLACEHOLDER, SuggestConfig, SuggestionFetcher, SuggestionView,
};
pub use query::{
    FormSnapshot, QuerySource, SUGGEST_PATH, SuggestionQuery, build_query, suppresses_lookup,
};
