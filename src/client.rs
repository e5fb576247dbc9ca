use crate::query::SuggestionQuery;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use std::fmt;
use tracing::debug;

/// Host of the shared development workbench, which serves the application
/// under a path prefix instead of at the site root.
pub const WORKBENCH_HOST: &str = "tools.formulae.uni-hamburg.de";

/// One connection pool for every client in the process.
static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Path prefix for a deployment host. Only the workbench host is special-cased.
pub fn path_prefix_for_host(host: &str) -> &'static str {
    if host == WORKBENCH_HOST { "/dev" } else { "" }
}

#[derive(Debug)]
pub enum SuggestError {
    /// The request never completed: connection, TLS, or timeout trouble.
    Transport(reqwest::Error),
    /// The endpoint answered with a non-success status.
    Status(StatusCode),
    /// A success response whose body was not a JSON array of strings.
    Malformed(serde_json::Error),
}

impl fmt::Display for SuggestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestError::Transport(err) => write!(f, "transport error: {err}"),
            SuggestError::Status(status) => {
                write!(f, "suggestion endpoint returned {status}")
            }
            SuggestError::Malformed(err) => write!(f, "malformed suggestion body: {err}"),
        }
    }
}

impl std::error::Error for SuggestError {}

impl From<reqwest::Error> for SuggestError {
    fn from(value: reqwest::Error) -> Self {
        SuggestError::Transport(value)
    }
}

impl From<serde_json::Error> for SuggestError {
    fn from(value: serde_json::Error) -> Self {
        SuggestError::Malformed(value)
    }
}

/// Asynchronous suggestion lookup. The debounce logic talks to this seam, so
/// it can be exercised without sockets.
#[async_trait]
pub trait SuggestionLookup: Send + Sync {
    async fn lookup(&self, query: &SuggestionQuery) -> Result<Vec<String>, SuggestError>;
}

/// Client for the `/search/suggest` endpoint of one deployment.
#[derive(Debug, Clone)]
pub struct SuggestClient {
    http: reqwest::Client,
    base: String,
}

impl SuggestClient {
    /// Builds a client for the deployment at `base_url`, appending the
    /// workbench path prefix when the URL names the workbench host.
    pub fn new(base_url: &str) -> Self {
        let mut base = base_url.trim_end_matches('/').to_string();
        if let Ok(url) = reqwest::Url::parse(&base)
            && let Some(host) = url.host_str()
        {
            base.push_str(path_prefix_for_host(host));
        }
        Self {
            http: HTTP.clone(),
            base,
        }
    }

    /// Full request URL for a query against this deployment.
    pub fn url_for(&self, query: &SuggestionQuery) -> String {
        format!("{}{}", self.base, query.path_and_query())
    }

    /// Issues a single GET for the query. A `200` with a JSON array of strings
    /// yields the array in server order; the server is trusted to deduplicate.
    pub async fn fetch(&self, query: &SuggestionQuery) -> Result<Vec<String>, SuggestError> {
        let url = self.url_for(query);
        debug!(%url, source = %query.source(), "issuing suggestion lookup");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::Status(status));
        }
        let body = response.text().await?;
        let options = serde_json::from_str::<Vec<String>>(&body)?;
        Ok(options)
    }
}

#[async_trait]
impl SuggestionLookup for SuggestClient {
    async fn lookup(&self, query: &SuggestionQuery) -> Result<Vec<String>, SuggestError> {
        self.fetch(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FormSnapshot, QuerySource};
    use axum::{Json, Router, extract::Path, routing::get};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn query(partial: &str) -> SuggestionQuery {
        let mut snapshot = FormSnapshot::new();
        snapshot.set_multi("corpus", &["buenden"]);
        SuggestionQuery::new(&snapshot, partial, QuerySource::Text)
    }

    #[tokio::test]
    async fn fetch_returns_options_in_server_order() {
        let router = Router::new().route(
            "/search/suggest/:partial",
            get(|Path(partial): Path<String>| async move {
                Json(vec![format!("{partial}a"), format!("{partial}e"), partial])
            }),
        );
        let addr = serve(router).await;
        let client = SuggestClient::new(&format!("http://{addr}"));
        let options = client.fetch(&query("ill")).await.unwrap();
        assert_eq!(options, ["illa", "ille", "ill"]);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        // no routes, so every path is a 404
        let addr = serve(Router::new()).await;
        let client = SuggestClient::new(&format!("http://{addr}"));
        match client.fetch(&query("ill")).await {
            Err(SuggestError::Status(status)) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let router = Router::new().route(
            "/search/suggest/:partial",
            get(|| async { "<html>definitely not json</html>" }),
        );
        let addr = serve(router).await;
        let client = SuggestClient::new(&format!("http://{addr}"));
        match client.fetch(&query("ill")).await {
            Err(SuggestError::Malformed(_)) => {}
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_failure_is_transport() {
        // port 1 is never listening
        let client = SuggestClient::new("http://127.0.0.1:1");
        match client.fetch(&query("ill")).await {
            Err(SuggestError::Transport(_)) => {}
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn workbench_host_routes_under_dev_prefix() {
        let workbench = SuggestClient::new("https://tools.formulae.uni-hamburg.de");
        assert!(
            workbench
                .url_for(&query("ill"))
                .starts_with("https://tools.formulae.uni-hamburg.de/dev/search/suggest/ill?")
        );
        let production = SuggestClient::new("https://formulae.uni-hamburg.de/");
        assert!(
            production
                .url_for(&query("ill"))
                .starts_with("https://formulae.uni-hamburg.de/search/suggest/ill?")
        );
    }
}
