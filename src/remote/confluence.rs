//! Confluence REST client implementing the remote gateway.
//!
//! Talks to the `/rest/api/content` endpoints with basic auth derived from
//! the configured email and API token.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{CreatedPage, GatewayError, RemoteGateway, RemotePage};
use crate::config::Config;

/// REST API client for a Confluence instance.
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    base_url: String,
    auth_header: String,
    http: reqwest::Client,
}

impl ConfluenceClient {
    /// Creates a client from configuration.
    ///
    /// Returns [`GatewayError::NotConfigured`] when the base URL or
    /// credentials are missing.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        if config.base_url.is_empty() || config.user_email.is_empty() || config.api_token.is_empty()
        {
            return Err(GatewayError::NotConfigured);
        }

        Self::new(
            &config.base_url,
            &config.user_email,
            &config.api_token,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Creates a client with explicit parameters.
    ///
    /// Every request carries `timeout`; a request that exceeds it fails
    /// with [`GatewayError::Timeout`].
    pub fn new(
        base_url: &str,
        user_email: &str,
        api_token: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let credentials = format!("{}:{}", user_email, api_token);
        let auth_header = format!("Basic {}", STANDARD.encode(credentials));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
            http,
        })
    }

    /// Checks that the remote store answers authenticated requests.
    pub async fn probe(&self) -> Result<(), GatewayError> {
        let url = self.url("/space?limit=1");
        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header.as_str())
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(GatewayError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/rest/api{}", self.base_url, endpoint)
    }

    async fn read_api_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        GatewayError::ApiError { status, message }
    }
}

fn map_transport(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout(e.to_string())
    } else {
        GatewayError::HttpError(e.to_string())
    }
}

impl RemoteGateway for ConfluenceClient {
    async fn find_by_title(
        &self,
        title: &str,
        space: &str,
    ) -> Result<Option<RemotePage>, GatewayError> {
        let url = format!(
            "{}?title={}&spaceKey={}&expand=version,ancestors",
            self.url("/content"),
            urlencoding::encode(title),
            urlencoding::encode(space),
        );

        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header.as_str())
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }

        let payload: SearchPayload = response
            .json()
            .await
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        Ok(payload.results.into_iter().next().map(RemotePage::from))
    }

    async fn get_by_id(&self, id: &str) -> Result<RemotePage, GatewayError> {
        let url = format!("{}?expand=version,ancestors", self.url(&format!("/content/{}", id)));

        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header.as_str())
            .send()
            .await
            .map_err(map_transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }

        let payload: PagePayload = response
            .json()
            .await
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        Ok(payload.into())
    }

    async fn create(
        &self,
        space: &str,
        title: &str,
        body: &str,
        parent_id: Option<&str>,
    ) -> Result<CreatedPage, GatewayError> {
        let request = CreateRequest {
            content_type: "page",
            title,
            space: SpaceRef { key: space },
            body: BodyPayload {
                storage: StoragePayload {
                    value: body,
                    representation: "storage",
                },
            },
            ancestors: parent_id.map(|id| vec![AncestorRef { id }]),
        };

        let response = self
            .http
            .post(self.url("/content"))
            .header("Authorization", self.auth_header.as_str())
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }

        let payload: PagePayload = response
            .json()
            .await
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        Ok(CreatedPage {
            id: payload.id,
            version: payload.version.number,
        })
    }

    async fn update(
        &self,
        id: &str,
        title: &str,
        body: &str,
        expected_version: i64,
    ) -> Result<i64, GatewayError> {
        let request = UpdateRequest {
            content_type: "page",
            title,
            version: VersionRef {
                number: expected_version + 1,
            },
            body: BodyPayload {
                storage: StoragePayload {
                    value: body,
                    representation: "storage",
                },
            },
        };

        let response = self
            .http
            .put(self.url(&format!("/content/{}", id)))
            .header("Authorization", self.auth_header.as_str())
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(id.to_string()));
        }
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(GatewayError::VersionConflict {
                id: id.to_string(),
                expected_version,
            });
        }
        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }

        let payload: PagePayload = response
            .json()
            .await
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        Ok(payload.version.number)
    }
}

// Wire types for the content endpoints. Field names are the API's.

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    results: Vec<PagePayload>,
}

#[derive(Debug, Deserialize)]
struct PagePayload {
    id: String,
    title: String,
    version: VersionPayload,
    #[serde(default)]
    ancestors: Vec<AncestorPayload>,
}

#[derive(Debug, Deserialize)]
struct VersionPayload {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct AncestorPayload {
    id: String,
}

impl From<PagePayload> for RemotePage {
    fn from(payload: PagePayload) -> Self {
        // Ancestors are ordered root-first; the direct parent is last.
        let parent_id = payload.ancestors.last().map(|a| a.id.clone());
        RemotePage {
            id: payload.id,
            title: payload.title,
            version: payload.version.number,
            parent_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    title: &'a str,
    space: SpaceRef<'a>,
    body: BodyPayload<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ancestors: Option<Vec<AncestorRef<'a>>>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    title: &'a str,
    version: VersionRef,
    body: BodyPayload<'a>,
}

#[derive(Debug, Serialize)]
struct SpaceRef<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct AncestorRef<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct VersionRef {
    number: i64,
}

#[derive(Debug, Serialize)]
struct BodyPayload<'a> {
    storage: StoragePayload<'a>,
}

#[derive(Debug, Serialize)]
struct StoragePayload<'a> {
    value: &'a str,
    representation: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ConfluenceClient {
        ConfluenceClient::new(base_url, "dev@example.com", "token", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = Config::default();
        let result = ConfluenceClient::from_config(&config);
        assert!(matches!(result, Err(GatewayError::NotConfigured)));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = client("https://example.atlassian.net/wiki/");
        assert_eq!(
            client.url("/content/123"),
            "https://example.atlassian.net/wiki/rest/api/content/123"
        );
    }

    #[test]
    fn test_page_payload_parses_and_maps() {
        let json = r#"{
            "id": "12345",
            "title": "Runbook: Restarts",
            "version": {"number": 7},
            "ancestors": [{"id": "1"}, {"id": "42"}]
        }"#;

        let payload: PagePayload = serde_json::from_str(json).unwrap();
        let page = RemotePage::from(payload);

        assert_eq!(page.id, "12345");
        assert_eq!(page.title, "Runbook: Restarts");
        assert_eq!(page.version, 7);
        assert_eq!(page.parent_id, Some("42".to_string()));
    }

    #[test]
    fn test_page_payload_without_ancestors() {
        let json = r#"{"id": "9", "title": "Root", "version": {"number": 1}}"#;

        let payload: PagePayload = serde_json::from_str(json).unwrap();
        let page = RemotePage::from(payload);

        assert_eq!(page.parent_id, None);
    }

    #[test]
    fn test_create_request_shape() {
        let request = CreateRequest {
            content_type: "page",
            title: "A",
            space: SpaceRef { key: "ARCH" },
            body: BodyPayload {
                storage: StoragePayload {
                    value: "<p>hi</p>",
                    representation: "storage",
                },
            },
            ancestors: Some(vec![AncestorRef { id: "42" }]),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "page");
        assert_eq!(json["space"]["key"], "ARCH");
        assert_eq!(json["body"]["storage"]["representation"], "storage");
        assert_eq!(json["ancestors"][0]["id"], "42");
    }

    #[test]
    fn test_update_request_bumps_version() {
        let request = UpdateRequest {
            content_type: "page",
            title: "A",
            version: VersionRef { number: 4 },
            body: BodyPayload {
                storage: StoragePayload {
                    value: "<p>hi</p>",
                    representation: "storage",
                },
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["version"]["number"], 4);
        assert!(json.get("ancestors").is_none());
    }
}
