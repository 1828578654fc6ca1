use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::cache_framework::Source;
use crate::domain::User;
use crate::error::FetchError;

/// Reads the user collection from a remote JSON endpoint.
///
/// The payload is trusted: it is decoded into [`User`] records and returned
/// as-is, with no further checks.
pub struct HttpUserSource {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpUserSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Source<User> for HttpUserSource {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Result<Vec<User>, FetchError> {
        debug!("Sending request");
        let response = self
            .http_client
            .get(&self.endpoint)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Collection request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let users: Vec<User> = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        info!(count = users.len(), "User collection received");
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/users", addr)
    }

    fn source(endpoint: String) -> HttpUserSource {
        HttpUserSource::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_decodes_collection() {
        let router = Router::new().route(
            "/users",
            get(|| async {
                Json(serde_json::json!([
                    { "id": 1, "name": "Ana", "email": "a@x.com", "address": { "city": "SP" } },
                    { "id": 2, "name": "Bob", "email": "b@x.com", "username": "bob" }
                ]))
            }),
        );
        let users = source(serve(router).await).fetch().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].informed_city(), Some("SP"));
        assert_eq!(users[1].address.city, None);
    }

    #[tokio::test]
    async fn test_fetch_empty_collection() {
        let router = Router::new().route("/users", get(|| async { Json(serde_json::json!([])) }));
        let users = source(serve(router).await).fetch().await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let router = Router::new().route("/users", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let err = source(serve(router).await).fetch().await.unwrap_err();
        assert_eq!(err, FetchError::Status { status: 500 });
        assert_eq!(err.to_string(), "Failed to fetch users (HTTP 500)");
    }

    #[tokio::test]
    async fn test_unexpected_body_is_decode_error() {
        let router = Router::new().route("/users", get(|| async { Json(serde_json::json!({ "users": [] })) }));
        let err = source(serve(router).await).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = source(format!("http://{}/users", addr)).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
