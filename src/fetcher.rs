use crate::client::SuggestionLookup;
use crate::query::{FormSnapshot, QuerySource, SuggestionQuery, suppresses_lookup};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

/// Placeholder shown while a lookup is in flight.
pub const LOADING_PLACEHOLDER: &str = "Loading options...";
/// Placeholder shown after a failed lookup; the next keystroke re-attempts.
pub const FAILURE_PLACEHOLDER: &str = "Could not load suggestions";

/// The destination the fetcher renders into: an input's placeholder text and
/// a fully replaceable options container.
pub trait SuggestionView: Send + Sync {
    fn set_placeholder(&self, text: &str);
    /// Replaces every existing option, preserving the given order.
    fn replace_options(&self, options: &[String]);
}

#[derive(Debug, Clone)]
pub struct SuggestConfig {
    /// Quiet interval a keystroke must survive before its lookup dispatches.
    pub quiet_interval: Duration,
    /// Placeholder restored after a successful lookup.
    pub default_placeholder: String,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            quiet_interval: Duration::from_millis(500),
            default_placeholder: "Search".to_string(),
        }
    }
}

/// Debounced suggestion fetcher for one input field.
///
/// Each instance owns the single pending-timer handle for its field; there is
/// no shared state between fields. A keystroke cancels the pending timer and,
/// unless the text is guarded out, schedules one lookup after the quiet
/// interval. Once a lookup has been dispatched it runs to completion no matter
/// what is typed afterwards, so a slow earlier response can overwrite a faster
/// later one; completion order is not reconciled.
///
/// Timers and lookups run as Tokio tasks, so the fetcher must live inside a
/// runtime.
pub struct SuggestionFetcher<L, V> {
    lookup: Arc<L>,
    view: Arc<V>,
    source: QuerySource,
    config: SuggestConfig,
    pending: Option<JoinHandle<()>>,
}

impl<L, V> SuggestionFetcher<L, V>
where
    L: SuggestionLookup + 'static,
    V: SuggestionView + 'static,
{
    pub fn new(lookup: Arc<L>, view: Arc<V>, source: QuerySource, config: SuggestConfig) -> Self {
        Self {
            lookup,
            view,
            source,
            config,
            pending: None,
        }
    }

    /// Handles one value-change event. `text` is the input's value and
    /// `snapshot` the sibling form fields, both as of this keystroke.
    pub fn keystroke(&mut self, text: &str, snapshot: FormSnapshot) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        if suppresses_lookup(text) {
            return;
        }
        let query = SuggestionQuery::new(&snapshot, text, self.source);
        let lookup = Arc::clone(&self.lookup);
        let view = Arc::clone(&self.view);
        let quiet = self.config.quiet_interval;
        let placeholder = self.config.default_placeholder.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // Dispatch detached: a later keystroke aborts the timer above,
            // never a request that already went out.
            tokio::spawn(issue_lookup(lookup, view, query, placeholder));
        }));
    }

    /// True while a scheduled lookup is still waiting out its quiet interval.
    pub fn waiting(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<L, V> Drop for SuggestionFetcher<L, V> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

async fn issue_lookup<L, V>(
    lookup: Arc<L>,
    view: Arc<V>,
    query: SuggestionQuery,
    default_placeholder: String,
) where
    L: SuggestionLookup,
    V: SuggestionView,
{
    view.set_placeholder(LOADING_PLACEHOLDER);
    match lookup.lookup(&query).await {
        Ok(options) => {
            view.replace_options(&options);
            view.set_placeholder(&default_placeholder);
        }
        Err(err) => {
            warn!(partial = query.partial(), error = %err, "suggestion lookup failed");
            view.set_placeholder(FAILURE_PLACEHOLDER);
        }
    }
}
