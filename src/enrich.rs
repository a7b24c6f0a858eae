// src/enrich.rs
use std::fmt;
use log::warn;
use serde_json::Value;
use crate::classify::{classify_game_mode, classify_region};
use crate::models::server::{RawServerEntry, ServerRecord};

pub const UNKNOWN_SERVER_NAME: &str = "Unknown Server";
pub const UNKNOWN_MAP: &str = "Unknown Map";

#[derive(Debug, PartialEq, Eq)]
pub enum MalformedEntry {
    MissingAddress,
    MissingPort(String),
    Invalid(String),
}

impl fmt::Display for MalformedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAddress => write!(f, "Server entry has no address"),
            Self::MissingPort(addr) => write!(f, "Invalid server address: {}", addr),
            Self::Invalid(e) => write!(f, "Unreadable server entry: {}", e),
        }
    }
}

/// Turns the master server's entries into records, dropping (and logging) malformed ones.
pub fn enrich(entries: Vec<Value>) -> Vec<ServerRecord> {
    let total = entries.len();
    let records: Vec<ServerRecord> = entries
        .into_iter()
        .filter_map(|entry| match enrich_entry(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping server entry: {}", e);
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!("Dropped {} of {} server entries", total - records.len(), total);
    }
    records
}

pub fn enrich_entry(entry: Value) -> Result<ServerRecord, MalformedEntry> {
    let entry: RawServerEntry =
        serde_json::from_value(entry).map_err(|e| MalformedEntry::Invalid(e.to_string()))?;
    build_record(entry)
}

fn build_record(entry: RawServerEntry) -> Result<ServerRecord, MalformedEntry> {
    let address = entry.addr.ok_or(MalformedEntry::MissingAddress)?;
    let host = match address.split_once(':') {
        Some((host, _port)) => host.to_string(),
        None => return Err(MalformedEntry::MissingPort(address)),
    };

    let map = entry
        .map
        .filter(|map| !map.is_empty())
        .unwrap_or_else(|| UNKNOWN_MAP.to_string());
    let gamemode = classify_game_mode(&map);

    Ok(ServerRecord {
        id: address.clone(),
        name: entry
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_SERVER_NAME.to_string()),
        map,
        gamemode: gamemode.to_string(),
        players: format!("{}/{}", entry.players, entry.max_players),
        region: classify_region(&host).to_string(),
        address,
    })
}
