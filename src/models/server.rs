// src/models/server.rs
use serde::{Deserialize, Serialize};

/// A server as served to the front end. `id` is the raw `ip:port` address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: String,
    pub name: String,
    pub map: String,
    pub gamemode: String,
    pub players: String,
    pub region: String,
    pub address: String,
}

/// One entry of the master server's `response.servers` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawServerEntry {
    pub addr: Option<String>,
    pub name: Option<String>,
    pub map: Option<String>,
    #[serde(default)]
    pub players: u32,
    #[serde(default)]
    pub max_players: u32,
}

#[derive(Debug, Deserialize)]
pub struct ServerListEnvelope {
    pub response: ServerListBody,
}

// Entries stay untyped here so one bad entry cannot fail the whole listing.
#[derive(Debug, Default, Deserialize)]
pub struct ServerListBody {
    #[serde(default)]
    pub servers: Vec<serde_json::Value>,
}

fn mock_server(id: &str, name: &str, map: &str, gamemode: &str, players: &str, region: &str, address: &str) -> ServerRecord {
    ServerRecord {
        id: id.to_string(),
        name: name.to_string(),
        map: map.to_string(),
        gamemode: gamemode.to_string(),
        players: players.to_string(),
        region: region.to_string(),
        address: address.to_string(),
    }
}

/// Served when the master server lists no tagged servers.
pub fn mock_servers() -> Vec<ServerRecord> {
    vec![
        mock_server(
            "mock1",
            "TrueQuickplay Test Server",
            "cp_dustbowl",
            "Control Points",
            "12/24",
            "North America East",
            "127.0.0.1:27015",
        ),
        mock_server(
            "mock2",
            "Community Server #1",
            "pl_upward",
            "Payload",
            "18/24",
            "Europe",
            "127.0.0.1:27016",
        ),
        mock_server(
            "mock3",
            "2Fort 24/7",
            "ctf_2fort",
            "Capture the Flag",
            "22/24",
            "Asia Pacific",
            "127.0.0.1:27017",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_without_servers_is_an_empty_list() {
        let envelope: ServerListEnvelope = serde_json::from_str(r#"{"response":{}}"#).unwrap();
        assert!(envelope.response.servers.is_empty());
    }

    #[test]
    fn envelope_without_response_is_rejected() {
        assert!(serde_json::from_str::<ServerListEnvelope>(r#"{"servers":[]}"#).is_err());
    }

    #[test]
    fn raw_entry_ignores_unknown_fields() {
        let entry: RawServerEntry = serde_json::from_str(
            r#"{"addr":"1.2.3.4:27015","gameport":27015,"name":"x","map":"koth_viaduct","players":3,"max_players":24,"secure":true}"#,
        )
        .unwrap();
        assert_eq!(entry.addr.as_deref(), Some("1.2.3.4:27015"));
        assert_eq!(entry.players, 3);
        assert_eq!(entry.max_players, 24);
    }

    #[test]
    fn mock_set_is_three_fixed_servers() {
        let mocks = mock_servers();
        let ids: Vec<&str> = mocks.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["mock1", "mock2", "mock3"]);
        assert_eq!(mocks[0].map, "cp_dustbowl");
        assert_eq!(mocks[0].gamemode, "Control Points");
        assert_eq!(mocks[0].players, "12/24");
    }
}
