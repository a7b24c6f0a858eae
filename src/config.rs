use std::env;
use std::str::FromStr;
use std::time::Duration;
use std::num::NonZeroU32;
use governor::Quota;
use ipnetwork::IpNetwork;

pub const DEFAULT_STEAM_API_URL: &str =
    "https://api.steampowered.com/IGameServersService/GetServerList/v1/";

#[derive(Clone, Debug)]
pub struct Config {
    // Listener
    pub bind_address: String,
    pub port: u16,

    // Upstream master server
    pub steam_api_key: Option<String>,
    pub steam_api_url: String,
    pub steam_app_id: u32,
    pub server_tag: String,
    pub server_list_limit: u32,
    pub upstream_timeout_secs: u64,

    // CORS
    pub allowed_origins: Vec<String>,

    // Peers whose X-Forwarded-For is believed
    pub trusted_proxies: Vec<IpNetwork>,

    // Rate limiting configs
    pub server_list_period_secs: u64,
    pub server_list_burst_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            steam_api_key: None,
            steam_api_url: DEFAULT_STEAM_API_URL.to_string(),
            steam_app_id: 440, // TF2
            server_tag: "truequickplay".to_string(),
            server_list_limit: 100,
            upstream_timeout_secs: 10,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://Piscuss123.github.io".to_string(),
            ],
            trusted_proxies: Vec::new(),
            server_list_period_secs: 5,
            server_list_burst_limit: 120,
        }
    }
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),

            port: parsed_var("PORT").unwrap_or(defaults.port),

            steam_api_key: env::var("STEAM_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),

            steam_api_url: env::var("STEAM_API_URL").unwrap_or(defaults.steam_api_url),

            steam_app_id: parsed_var("STEAM_APP_ID").unwrap_or(defaults.steam_app_id),

            server_tag: env::var("SERVER_TAG").unwrap_or(defaults.server_tag),

            server_list_limit: parsed_var("SERVER_LIST_LIMIT")
                .unwrap_or(defaults.server_list_limit),

            upstream_timeout_secs: parsed_var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or(defaults.upstream_timeout_secs),

            allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|v| parse_origins(&v))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),

            trusted_proxies: env::var("TRUSTED_PROXIES")
                .map(|v| parse_networks(&v))
                .unwrap_or(defaults.trusted_proxies),

            server_list_period_secs: parsed_var("SERVER_LIST_PERIOD_SECS")
                .unwrap_or(defaults.server_list_period_secs),

            server_list_burst_limit: parsed_var("SERVER_LIST_BURST_LIMIT")
                .unwrap_or(defaults.server_list_burst_limit),
        }
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.max(1))
    }

    pub fn server_list_quota(&self) -> Quota {
        let burst = NonZeroU32::new(self.server_list_burst_limit).unwrap_or(NonZeroU32::MIN);
        Quota::with_period(Duration::from_secs(self.server_list_period_secs.max(1)))
            .map(|quota| quota.allow_burst(burst))
            .unwrap_or_else(|| Quota::per_second(burst))
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_networks(value: &str) -> Vec<IpNetwork> {
    value
        .split(',')
        .filter_map(|network| IpNetwork::from_str(network.trim()).ok())
        .collect()
}
