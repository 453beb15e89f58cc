// lnd-config/src/model.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LndConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_tor_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_tor_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watchtower_tor_address: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub externalip: Option<String>,
    pub color: String,
    pub accept_keysend: bool,
    pub accept_amp: bool,
    pub reject_htlc: bool,
    #[serde(default)]
    pub min_chan_size: Option<u64>,
    #[serde(default)]
    pub max_chan_size: Option<u64>,
    pub bitcoind: Bitcoind,
    pub autopilot: Autopilot,
    pub watchtowers: Watchtowers,
    pub advanced: Advanced,
}

/// Chain backend, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Bitcoind {
    /// Built-in Neutrino light client.
    None,
    /// The Bitcoin Core package installed alongside; credentials are
    /// resolved by the host.
    Internal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Autopilot {
    pub enabled: bool,
    pub private: bool,
    pub maxchannels: u64,
    pub allocation: f64,       // %
    pub min_channel_size: u64, // sats
    pub max_channel_size: u64, // sats
    pub advanced: AutopilotAdvanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AutopilotAdvanced {
    pub min_confirmations: u64,
    pub confirmation_target: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Watchtowers {
    pub wt_server: bool,
    pub wt_client: WtClient,
}

/// Watchtower client, tagged by `enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "enabled", rename_all = "kebab-case")]
pub enum WtClient {
    Disabled,
    Enabled {
        #[serde(rename = "add-watchtowers")]
        add_watchtowers: Vec<String>,
    },
}

impl WtClient {
    /// Client variant for a list of tower URIs: enabled when there is at
    /// least one.
    pub fn from_towers(towers: Vec<String>) -> Self {
        if towers.is_empty() {
            WtClient::Disabled
        } else {
            WtClient::Enabled {
                add_watchtowers: towers,
            }
        }
    }

    pub fn towers(&self) -> &[String] {
        match self {
            WtClient::Disabled => &[],
            WtClient::Enabled { add_watchtowers } => add_watchtowers,
        }
    }
}

impl From<WtClient> for Value {
    fn from(client: WtClient) -> Self {
        match client {
            WtClient::Disabled => json!({ "enabled": "disabled" }),
            WtClient::Enabled { add_watchtowers } => json!({
                "enabled": "enabled",
                "add-watchtowers": add_watchtowers,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebugLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Advanced {
    pub debug_level: DebugLevel,
    pub db_bolt_no_freelist_sync: bool,
    pub db_bolt_auto_compact: bool,
    pub db_bolt_auto_compact_min_age: u64,
    pub db_bolt_db_timeout: u64,
    #[serde(default)]
    pub recovery_window: Option<u64>,
    pub payments_expiration_grace_period: u64,
    pub default_remote_max_htlcs: u64,
    pub max_channel_fee_allocation: f64,
    pub max_pending_channels: u64,
    pub max_commit_fee_rate_anchors: u64,
    pub protocol_wumbo_channels: bool,
    pub protocol_zero_conf: bool,
    pub protocol_option_scid_alias: bool,
    pub protocol_no_anchors: bool,
    pub protocol_disable_script_enforced_lease: bool,
    pub protocol_simple_taproot_chans: bool,
    pub gc_canceled_invoices_on_startup: bool,
    pub allow_circular_route: bool,
    pub bitcoin: BitcoinChannels,
    pub sweeper: Sweeper,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BitcoinChannels {
    pub default_channel_confirmations: u64,
    pub min_htlc: u64,
    pub min_htlc_out: u64,
    pub base_fee: u64,
    pub fee_rate: u64,
    pub time_lock_delta: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Sweeper {
    pub sweeper_maxfeerate: u64,
    pub sweeper_nodeadlineconftarget: u64,
    pub sweeper_budget_tolocalratio: f64,
    pub sweeper_budget_anchorcpfpratio: f64,
    pub sweeper_budget_deadlinehtlcratio: f64,
    pub sweeper_budget_nodeadlinehtlcratio: f64,
}

impl From<&Sweeper> for Value {
    fn from(s: &Sweeper) -> Self {
        json!({
            "sweeper-maxfeerate": s.sweeper_maxfeerate,
            "sweeper-nodeadlineconftarget": s.sweeper_nodeadlineconftarget,
            "sweeper-budget-tolocalratio": s.sweeper_budget_tolocalratio,
            "sweeper-budget-anchorcpfpratio": s.sweeper_budget_anchorcpfpratio,
            "sweeper-budget-deadlinehtlcratio": s.sweeper_budget_deadlinehtlcratio,
            "sweeper-budget-nodeadlinehtlcratio": s.sweeper_budget_nodeadlinehtlcratio,
        })
    }
}

impl Default for Sweeper {
    /// Values introduced with the sweeper section in 0.18.0.1.
    fn default() -> Self {
        Self {
            sweeper_maxfeerate: 1000,
            sweeper_nodeadlineconftarget: 1008,
            sweeper_budget_tolocalratio: 0.5,
            sweeper_budget_anchorcpfpratio: 0.5,
            sweeper_budget_deadlinehtlcratio: 0.5,
            sweeper_budget_nodeadlinehtlcratio: 0.5,
        }
    }
}

impl LndConfig {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Parses every configured watchtower URI, stopping at the first bad one.
    pub fn watchtower_uris(&self) -> Result<Vec<WatchtowerUri>, WatchtowerUriError> {
        self.watchtowers
            .wt_client
            .towers()
            .iter()
            .map(|s| s.parse())
            .collect()
    }
}

// ---------------------------------------------------------------------
// Watchtower URIs
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchtowerUriError {
    #[error("watchtower URI '{0}' must be of the form pubkey@host:port")]
    Malformed(String),
    #[error("watchtower pubkey '{0}' is not a 33-byte hex-encoded public key")]
    BadPubkey(String),
}

/// `pubkey@host:port` as accepted by `lncli wtclient add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchtowerUri {
    pub pubkey: String,
    pub address: String,
}

impl FromStr for WatchtowerUri {
    type Err = WatchtowerUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (pubkey, address) = s
            .split_once('@')
            .ok_or_else(|| WatchtowerUriError::Malformed(s.to_string()))?;
        if address.is_empty() || address.contains('@') {
            return Err(WatchtowerUriError::Malformed(s.to_string()));
        }
        match hex::decode(pubkey) {
            Ok(bytes) if bytes.len() == 33 && matches!(bytes[0], 0x02 | 0x03) => {}
            _ => return Err(WatchtowerUriError::BadPubkey(pubkey.to_string())),
        }
        Ok(WatchtowerUri {
            pubkey: pubkey.to_ascii_lowercase(),
            address: address.to_string(),
        })
    }
}

impl fmt::Display for WatchtowerUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.pubkey, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{seeded_rng, CATALOGUE};

    const PUBKEY: &str = "02a5c4c6d1d5e6b2f0f0c0d4e1a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0";

    #[test]
    fn default_record_deserializes() {
        let cfg = LndConfig::from_value(CATALOGUE.default_record(&mut seeded_rng(3))).unwrap();
        assert_eq!(
            cfg.bitcoind,
            Bitcoind::Internal {
                user: None,
                password: None
            }
        );
        assert_eq!(cfg.watchtowers.wt_client, WtClient::Disabled);
        assert_eq!(cfg.advanced.debug_level, DebugLevel::Info);
        assert_eq!(cfg.advanced.sweeper, Sweeper::default());
        assert_eq!(cfg.advanced.recovery_window, None);
        assert_eq!(cfg.autopilot.allocation, 60.0);
    }

    #[test]
    fn wt_client_is_tagged_by_enabled() {
        let enabled: WtClient =
            serde_json::from_value(json!({ "enabled": "enabled", "add-watchtowers": ["x@y:1"] }))
                .unwrap();
        assert_eq!(enabled.towers(), ["x@y:1".to_string()]);

        let disabled = serde_json::to_value(WtClient::Disabled).unwrap();
        assert_eq!(disabled, json!({ "enabled": "disabled" }));

        assert_eq!(WtClient::from_towers(vec![]), WtClient::Disabled);
        assert_eq!(Value::from(enabled.clone()), serde_json::to_value(&enabled).unwrap());
    }

    #[test]
    fn sweeper_value_matches_serde_form() {
        let sweeper = Sweeper::default();
        assert_eq!(Value::from(&sweeper), serde_json::to_value(&sweeper).unwrap());
    }

    #[test]
    fn bitcoind_rejects_legacy_variants() {
        let proxy = serde_json::from_value::<Bitcoind>(json!({ "type": "internal-proxy" }));
        assert!(proxy.is_err());
        let none: Bitcoind = serde_json::from_value(json!({ "type": "none" })).unwrap();
        assert_eq!(none, Bitcoind::None);
    }

    #[test]
    fn parses_watchtower_uri() {
        let uri: WatchtowerUri = format!("{PUBKEY}@tower.onion:9911").parse().unwrap();
        assert_eq!(uri.address, "tower.onion:9911");
        assert_eq!(uri.to_string(), format!("{PUBKEY}@tower.onion:9911"));
    }

    #[test]
    fn rejects_bad_watchtower_uris() {
        assert!(matches!(
            "no-at-sign".parse::<WatchtowerUri>(),
            Err(WatchtowerUriError::Malformed(_))
        ));
        assert!(matches!(
            format!("{PUBKEY}@").parse::<WatchtowerUri>(),
            Err(WatchtowerUriError::Malformed(_))
        ));
        assert!(matches!(
            "abc@1.2.3.4:9911".parse::<WatchtowerUri>(),
            Err(WatchtowerUriError::BadPubkey(_))
        ));
        let wrong_prefix = format!("05{}@h:1", &PUBKEY[2..]);
        assert!(matches!(
            wrong_prefix.parse::<WatchtowerUri>(),
            Err(WatchtowerUriError::BadPubkey(_))
        ));
    }

    #[test]
    fn collects_configured_uris() {
        let mut record = CATALOGUE.default_record(&mut seeded_rng(3));
        record["watchtowers"]["wt-client"] = json!({
            "enabled": "enabled",
            "add-watchtowers": [format!("{PUBKEY}@a:9911"), format!("{PUBKEY}@b:9911")]
        });
        let cfg = LndConfig::from_value(record).unwrap();
        let uris = cfg.watchtower_uris().unwrap();
        assert_eq!(uris.len(), 2);
        assert_eq!(uris[1].address, "b:9911");
    }
}
