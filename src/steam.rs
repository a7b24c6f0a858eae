// src/steam.rs
use std::fmt;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use crate::config::Config;
use crate::models::server::ServerListEnvelope;

#[derive(Debug)]
pub enum UpstreamError {
    Request(reqwest::Error),
    Status(StatusCode),
    Decode(reqwest::Error),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(e) => write!(f, "Master server request failed: {}", e),
            Self::Status(status) => write!(f, "Master server returned HTTP {}", status),
            Self::Decode(e) => write!(f, "Malformed master server response: {}", e),
        }
    }
}

impl std::error::Error for UpstreamError {}

/// Client for the Steam master server listing (`IGameServersService/GetServerList`).
pub struct SteamClient {
    http: Client,
    endpoint: String,
    api_key: String,
    app_id: u32,
    tag: String,
    limit: u32,
}

impl SteamClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(config.upstream_timeout())
            .build()
            .map_err(UpstreamError::Request)?;

        Ok(Self {
            http,
            endpoint: config.steam_api_url.clone(),
            api_key: config.steam_api_key.clone().unwrap_or_default(),
            app_id: config.steam_app_id,
            tag: config.server_tag.clone(),
            limit: config.server_list_limit,
        })
    }

    /// Master server filter selecting servers of our app that advertise our tag.
    pub fn filter(&self) -> String {
        format!("\\appid\\{}\\gametagsand\\{}", self.app_id, self.tag)
    }

    /// Fetches the tagged servers. An empty list means the master server knows
    /// of none, which is not an error. Entries are decoded later, one at a time.
    pub async fn fetch_server_list(&self) -> Result<Vec<serde_json::Value>, UpstreamError> {
        let filter = self.filter();
        let limit = self.limit.to_string();

        info!("Querying master server for {}", filter);
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("filter", filter.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(UpstreamError::Request)?;

        let status = response.status();
        debug!("Master server response status: {}", status);
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let envelope: ServerListEnvelope = response.json().await.map_err(UpstreamError::Decode)?;
        info!("Master server listed {} servers", envelope.response.servers.len());
        Ok(envelope.response.servers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SteamClient {
        let config = Config {
            steam_api_key: Some("test-key".to_string()),
            steam_api_url: format!("{}/IGameServersService/GetServerList/v1/", server.uri()),
            ..Config::default()
        };
        SteamClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn sends_key_filter_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/IGameServersService/GetServerList/v1/"))
            .and(query_param("key", "test-key"))
            .and(query_param("filter", "\\appid\\440\\gametagsand\\truequickplay"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {
                    "servers": [
                        { "addr": "8.8.8.8:27015", "name": "One", "map": "cp_process_final", "players": 20, "max_players": 24 },
                        { "addr": "1.1.1.1:27016", "name": "Two", "map": "koth_harvest_final", "players": 4, "max_players": 24 }
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let servers = client_for(&server).fetch_server_list().await.unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0]["addr"], "8.8.8.8:27015");
        assert_eq!(servers[1]["map"], "koth_harvest_final");
    }

    #[tokio::test]
    async fn absent_server_list_is_empty_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": {} })))
            .mount(&server)
            .await;

        let servers = client_for(&server).fetch_server_list().await.unwrap();
        assert!(servers.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        match client_for(&server).fetch_server_list().await {
            Err(UpstreamError::Status(status)) => assert_eq!(status, StatusCode::FORBIDDEN),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn body_without_response_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).fetch_server_list().await,
            Err(UpstreamError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn wrong_typed_entry_does_not_fail_the_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {
                    "servers": [
                        { "addr": "8.8.8.8:27015", "players": 1, "max_players": 24 },
                        { "addr": 12345, "players": null, "max_players": "24" }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let servers = client_for(&server).fetch_server_list().await.unwrap();
        assert_eq!(servers.len(), 2);
    }

    #[tokio::test]
    async fn slow_master_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": { "servers": [] } }))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = Config {
            steam_api_url: server.uri(),
            upstream_timeout_secs: 1,
            ..Config::default()
        };
        let client = SteamClient::new(&config).unwrap();

        let started = std::time::Instant::now();
        let result = client.fetch_server_list().await;
        assert!(matches!(result, Err(UpstreamError::Request(ref e)) if e.is_timeout()));
        assert!(started.elapsed() < std::time::Duration::from_secs(3));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let config = Config {
            steam_api_url: "http://127.0.0.1:9/".to_string(),
            upstream_timeout_secs: 2,
            ..Config::default()
        };
        let client = SteamClient::new(&config).unwrap();
        assert!(matches!(client.fetch_server_list().await, Err(UpstreamError::Request(_))));
    }
}
