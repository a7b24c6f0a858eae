// src/handlers/servers.rs
use actix_web::{web, HttpResponse, HttpRequest};
use actix_web::http::header::USER_AGENT;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use crate::enrich::enrich;
use crate::models::server::{mock_servers, ServerRecord};
use crate::steam::SteamClient;
use crate::storage::memory::{CacheSnapshot, ServerCache};
use crate::utils::{extract_client_ip, IpRateLimiter, RequestError, TrustedProxies};

#[derive(Deserialize)]
pub struct ServersQuery {
    refresh: Option<String>,
}

#[derive(Default)]
pub struct RequestCounter(AtomicU64);

impl RequestCounter {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServersResponse {
    pub servers: Arc<Vec<ServerRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mock_data: Option<bool>,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error_fallback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

impl ServersResponse {
    fn cached(snapshot: &CacheSnapshot, now: Instant, request_id: u64) -> Self {
        Self {
            servers: snapshot.servers.clone(),
            is_mock_data: Some(snapshot.is_mock_data),
            from_cache: true,
            cache_age: Some(format!("{} seconds", snapshot.age(now).as_secs_f64().round() as u64)),
            is_error_fallback: None,
            request_id: Some(request_id),
        }
    }

    fn fetched(snapshot: &CacheSnapshot) -> Self {
        Self {
            servers: snapshot.servers.clone(),
            is_mock_data: snapshot.is_mock_data.then_some(true),
            from_cache: false,
            cache_age: None,
            is_error_fallback: None,
            request_id: None,
        }
    }

    fn error_fallback(snapshot: &CacheSnapshot) -> Self {
        Self {
            servers: snapshot.servers.clone(),
            is_mock_data: Some(snapshot.is_mock_data),
            from_cache: true,
            cache_age: None,
            is_error_fallback: Some(true),
            request_id: None,
        }
    }
}

pub async fn get_servers(
    req: HttpRequest,
    query: web::Query<ServersQuery>,
    cache: web::Data<ServerCache>,
    steam: web::Data<SteamClient>,
    counter: web::Data<RequestCounter>,
    rate_limiter: web::Data<IpRateLimiter>,
    proxies: web::Data<TrustedProxies>,
) -> Result<HttpResponse, RequestError> {
    let client_ip = extract_client_ip(&req, &proxies)?;

    // Rate Limiting
    if rate_limiter.check_key(&client_ip).is_err() {
        error!("Rate limit exceeded for server list for ip: {}", client_ip);
        return Err(RequestError::RateLimitExceeded);
    }

    let request_id = counter.next();
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    info!("[{}] Server request from {}", request_id, client_ip);
    debug!("[{}] User-Agent: {}", request_id, user_agent);

    let force_refresh = query.refresh.as_deref() == Some("true");
    let body = load_servers(&cache, &steam, force_refresh, request_id).await?;

    Ok(HttpResponse::Ok().json(body))
}

/// Serves from cache when fresh, otherwise refreshes from the master server,
/// falling back to mock data on an empty listing and to stale cache on failure.
pub async fn load_servers(
    cache: &ServerCache,
    steam: &SteamClient,
    force_refresh: bool,
    request_id: u64,
) -> Result<ServersResponse, RequestError> {
    let arrived = Instant::now();
    if !force_refresh {
        if let Some(snapshot) = cache.fresh_at(arrived) {
            return Ok(cache_hit(&snapshot, request_id));
        }
    }

    let _refresh = cache.refresh_gate().lock().await;

    // Another request may have refreshed the slot while we waited on the gate.
    let refreshed = match cache.read() {
        Some(snapshot) if snapshot.fetched_at >= arrived => Some(snapshot),
        _ if !force_refresh => cache.fresh_at(Instant::now()),
        _ => None,
    };
    if let Some(snapshot) = refreshed {
        return Ok(cache_hit(&snapshot, request_id));
    }

    // Likewise a refresh may have failed while we waited; don't repeat it.
    if let Some(failure) = cache.failure_since(arrived) {
        debug!("[{}] Refresh failed while waiting: {}", request_id, failure.message);
        return stale_or_error(cache, failure.message, request_id);
    }

    match steam.fetch_server_list().await {
        Ok(entries) if entries.is_empty() => {
            info!(
                "[{}] No servers found for {}, using mock data",
                request_id,
                steam.filter()
            );
            let snapshot = cache.write(mock_servers(), true);
            Ok(ServersResponse::fetched(&snapshot))
        }
        Ok(entries) => {
            let snapshot = cache.write(enrich(entries), false);
            debug!("[{}] Cached {} servers", request_id, snapshot.servers.len());
            Ok(ServersResponse::fetched(&snapshot))
        }
        Err(e) => {
            error!("[{}] Error fetching servers: {}", request_id, e);
            cache.record_failure(e.to_string());
            stale_or_error(cache, e.to_string(), request_id)
        }
    }
}

fn stale_or_error(
    cache: &ServerCache,
    message: String,
    request_id: u64,
) -> Result<ServersResponse, RequestError> {
    match cache.read() {
        Some(snapshot) => {
            warn!("[{}] Returning cached data as fallback after error", request_id);
            Ok(ServersResponse::error_fallback(&snapshot))
        }
        None => Err(RequestError::FetchFailed(message)),
    }
}

fn cache_hit(snapshot: &CacheSnapshot, request_id: u64) -> ServersResponse {
    let response = ServersResponse::cached(snapshot, Instant::now(), request_id);
    info!(
        "[{}] Returning cached server data (age: {})",
        request_id,
        response.cache_age.as_deref().unwrap_or_default()
    );
    response
}
