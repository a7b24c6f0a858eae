// src/classify.rs
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use ipnetwork::IpNetwork;
use lazy_static::lazy_static;

pub const OTHER_GAMEMODE: &str = "Other";
pub const UNKNOWN_REGION: &str = "Unknown";
pub const LOCAL_REGION: &str = "Local Network";

lazy_static! {
    static ref GAMEMODES: HashMap<&'static str, &'static str> = HashMap::from([
        ("cp", "Control Points"),
        ("pl", "Payload"),
        ("plr", "Payload Race"),
        ("ctf", "Capture the Flag"),
        ("koth", "King of the Hill"),
        ("arena", "Arena"),
        ("mvm", "Mann vs Machine"),
        ("sd", "Special Delivery"),
        ("tc", "Territorial Control"),
        ("tr", "Training"),
        ("pd", "Player Destruction"),
        ("pass", "PASS Time"),
        ("rd", "Robot Destruction"),
        ("mge", "MGE"),
        ("jump", "Jump"),
        ("trade", "Trade"),
    ]);

    // Coarse IANA /8 delegations per regional registry. Good enough to sort a
    // server list, nowhere near a geo-IP database.
    static ref REGION_BLOCKS: Vec<(IpNetwork, &'static str)> = [
        ("North America", &[3, 4, 8, 9, 12, 13, 15, 16, 18, 20, 23, 24, 50, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 96, 97, 98, 99, 100, 104, 107, 108, 142, 173, 174, 184, 192, 198, 199, 204, 205, 206, 207, 208, 209, 216][..]),
        ("South America", &[177, 179, 181, 186, 187, 189, 190, 191, 200, 201][..]),
        ("Europe", &[2, 5, 31, 37, 46, 62, 77, 78, 79, 80, 81, 82, 83, 84, 85, 86, 87, 88, 89, 90, 91, 92, 93, 94, 95, 109, 141, 145, 151, 176, 178, 185, 188, 193, 194, 195, 212, 213, 217][..]),
        ("Asia Pacific", &[1, 14, 27, 36, 39, 42, 43, 49, 58, 59, 60, 61, 101, 103, 106, 110, 111, 112, 113, 114, 115, 116, 117, 118, 119, 120, 121, 122, 123, 124, 125, 126, 175, 180, 182, 183, 202, 203, 210, 211, 218, 219, 220, 221, 222, 223][..]),
        ("Africa", &[41, 102, 105, 154, 196, 197][..]),
    ]
    .iter()
    .flat_map(|(region, octets)| {
        octets.iter().filter_map(move |octet| {
            IpNetwork::from_str(&format!("{}.0.0.0/8", octet))
                .ok()
                .map(|network| (network, *region))
        })
    })
    .collect();
}

/// Maps a map name like `pl_upward` to its game mode via the prefix before the first underscore.
pub fn classify_game_mode(map_name: &str) -> &'static str {
    let prefix = map_name.split('_').next().unwrap_or_default();
    GAMEMODES.get(prefix).copied().unwrap_or(OTHER_GAMEMODE)
}

/// Best-effort region label for an IPv4 host. Never fails.
pub fn classify_region(ip: &str) -> &'static str {
    let ip = match Ipv4Addr::from_str(ip.trim()) {
        Ok(ip) => ip,
        Err(_) => return UNKNOWN_REGION,
    };

    if ip.is_loopback() || ip.is_private() || ip.is_link_local() {
        return LOCAL_REGION;
    }

    REGION_BLOCKS
        .iter()
        .find(|(network, _)| network.contains(IpAddr::V4(ip)))
        .map(|(_, region)| *region)
        .unwrap_or(UNKNOWN_REGION)
}
