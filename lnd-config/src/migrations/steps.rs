// lnd-config/src/migrations/steps.rs
use super::{Down, Migration, MigrationChain, CURRENT_VERSION};
use crate::model::{Sweeper, WtClient};
use crate::shape::Shape;
use crate::version::Version;
use serde_json::{Map, Value};

pub(super) fn lnd_chain() -> MigrationChain {
    let current = Version::new(parts(CURRENT_VERSION));
    MigrationChain::new(
        current,
        [
            step([0, 13, 3, 2], up_0_13_3_2, Down::Reversible(down_0_13_3_2), false),
            step([0, 14, 2], up_0_14_2, Down::Reversible(down_0_14_2), false),
            step([0, 14, 2, 1], up_0_14_2_1, Down::Reversible(identity), false),
            step([0, 15, 0], up_0_15_0, Down::Irreversible, false),
            step([0, 16, 4], up_0_16_4, Down::Irreversible, true),
            step([0, 17, 0], identity, Down::Irreversible, true),
            step([0, 17, 0, 2], up_0_17_0_2, Down::Irreversible, true),
            step([0, 17, 3], up_0_17_3, Down::Irreversible, true),
            step([0, 18, 0, 1], up_0_18_0_1, Down::Reversible(down_0_18_0_1), true),
            step([0, 19, 0], identity, Down::Irreversible, true),
            step([0, 19, 1], identity, Down::Irreversible, true),
            step([0, 19, 2], identity, Down::Irreversible, true),
            step([0, 19, 3], identity, Down::Irreversible, true),
        ],
    )
}

fn step<const N: usize>(
    version: [u64; N],
    up: fn(&mut Value),
    down: Down,
    configured: bool,
) -> Migration {
    Migration::new(Version::new(version), up, down, configured)
}

// CURRENT_VERSION is a literal of plain numbers; skip anything else rather
// than fail.
fn parts(version: &str) -> Vec<u64> {
    version.split('.').filter_map(|p| p.parse().ok()).collect()
}

/// Backend selector stored under `bitcoind.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendKind {
    None,
    Internal,
    InternalProxy,
    External,
}

impl BackendKind {
    fn as_str(self) -> &'static str {
        match self {
            BackendKind::None => "none",
            BackendKind::Internal => "internal",
            BackendKind::InternalProxy => "internal-proxy",
            BackendKind::External => "external",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(BackendKind::None),
            "internal" => Some(BackendKind::Internal),
            "internal-proxy" => Some(BackendKind::InternalProxy),
            "external" => Some(BackendKind::External),
            _ => None,
        }
    }
}

fn identity(_: &mut Value) {}

/// The object stored under `key`, if there is one.
fn field_mut<'a>(record: &'a mut Value, key: &str) -> Option<&'a mut Map<String, Value>> {
    record.get_mut(key).and_then(Value::as_object_mut)
}

/// Rewrites `bitcoind.type` from `from` to `to`. Any other backend is kept.
fn retag_backend(record: &mut Value, from: BackendKind, to: BackendKind) {
    let Some(bitcoind) = field_mut(record, "bitcoind") else {
        tracing::debug!("no bitcoind section, backend left alone");
        return;
    };
    let current = bitcoind
        .get("type")
        .and_then(Value::as_str)
        .and_then(BackendKind::parse);
    if current == Some(from) {
        bitcoind.insert("type".into(), to.as_str().into());
    }
}

fn remove_keys(map: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        map.remove(*key);
    }
}

fn present(keys: &[&'static str]) -> Shape {
    Shape::object(keys.iter().map(|k| (*k, Shape::Any)))
}

const TOR_FLAGS: [&str; 2] = ["use-tor-only", "stream-isolation"];

fn remove_tor_flags(record: &mut Value) {
    let shape = Shape::object([("tor", present(&TOR_FLAGS))]);
    if !shape.test(record) {
        tracing::debug!("tor flags already gone");
        return;
    }
    if let Some(tor) = field_mut(record, "tor") {
        remove_keys(tor, &TOR_FLAGS);
    }
}

fn up_0_13_3_2(record: &mut Value) {
    retag_backend(record, BackendKind::Internal, BackendKind::InternalProxy);
}

fn down_0_13_3_2(record: &mut Value) {
    if let Some(bitcoind) = field_mut(record, "bitcoind") {
        bitcoind.insert("type".into(), BackendKind::Internal.as_str().into());
    }
}

fn up_0_14_2(record: &mut Value) {
    retag_backend(record, BackendKind::External, BackendKind::InternalProxy);
    remove_tor_flags(record);
}

fn down_0_14_2(record: &mut Value) {
    remove_tor_flags(record);
}

const LEGACY_WATCHTOWER_FLAGS: [&str; 2] = ["watchtower-enabled", "watchtower-client-enabled"];

fn up_0_14_2_1(record: &mut Value) {
    retag_backend(record, BackendKind::None, BackendKind::InternalProxy);
    if !present(&LEGACY_WATCHTOWER_FLAGS).test(record) {
        tracing::debug!("legacy watchtower flags already gone");
        return;
    }
    if let Some(root) = record.as_object_mut() {
        remove_keys(root, &LEGACY_WATCHTOWER_FLAGS);
    }
}

const WATCHTOWER_FIELDS: [&str; 3] = ["wt-server", "wt-client", "add-watchtowers"];

fn up_0_15_0(record: &mut Value) {
    let shape = Shape::object([("watchtowers", present(&WATCHTOWER_FIELDS))]);
    if !shape.test(record) {
        tracing::debug!("watchtower fields incomplete, nothing to drop");
        return;
    }
    if let Some(watchtowers) = field_mut(record, "watchtowers") {
        remove_keys(watchtowers, &WATCHTOWER_FIELDS);
    }
}

fn up_0_16_4(record: &mut Value) {
    retag_backend(record, BackendKind::InternalProxy, BackendKind::Internal);
}

/// Folds the flat tower list into the `wt-client` union. Entries that are
/// not strings are dropped. `wt-server` is untouched.
fn up_0_17_0_2(record: &mut Value) {
    let shape = Shape::object([(
        "watchtowers",
        Shape::object([("add-watchtowers", Shape::list(Shape::Any))]),
    )]);
    if !shape.test(record) {
        tracing::debug!("no flat watchtower list to fold");
        return;
    }
    let Some(watchtowers) = field_mut(record, "watchtowers") else {
        return;
    };
    let towers = match watchtowers.remove("add-watchtowers") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                other => {
                    tracing::debug!(entry = %other, "dropping non-string watchtower entry");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };
    watchtowers.insert("wt-client".into(), WtClient::from_towers(towers).into());
}

fn up_0_17_3(record: &mut Value) {
    let Some(advanced) = field_mut(record, "advanced") else {
        tracing::debug!("no advanced section, fee limits left alone");
        return;
    };
    let anchors = advanced
        .get("max-commit-fee-rate-anchors")
        .and_then(Value::as_f64);
    if anchors == Some(10.0) {
        advanced.insert("max-commit-fee-rate-anchors".into(), 100.into());
    }
    advanced.insert("max-pending-channels".into(), 5.into());
}

const TAPROOT_ERA_PROTOCOLS: [&str; 3] = [
    "protocol-zero-conf",
    "protocol-option-scid-alias",
    "protocol-simple-taproot-chans",
];

fn up_0_18_0_1(record: &mut Value) {
    let Some(advanced) = field_mut(record, "advanced") else {
        tracing::debug!("no advanced section, sweeper not added");
        return;
    };
    for key in TAPROOT_ERA_PROTOCOLS {
        advanced.insert(key.into(), false.into());
    }
    advanced.insert("sweeper".into(), Value::from(&Sweeper::default()));
}

fn down_0_18_0_1(record: &mut Value) {
    let keys = [
        TAPROOT_ERA_PROTOCOLS[0],
        TAPROOT_ERA_PROTOCOLS[1],
        TAPROOT_ERA_PROTOCOLS[2],
        "sweeper",
    ];
    let shape = Shape::object([("advanced", present(&keys))]);
    if !shape.test(record) {
        tracing::debug!("sweeper fields incomplete, nothing to drop");
        return;
    }
    if let Some(advanced) = field_mut(record, "advanced") {
        remove_keys(advanced, &keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(f: fn(&mut Value), mut record: Value) -> Value {
        f(&mut record);
        record
    }

    #[test]
    fn backend_retag_only_touches_matching_type() {
        let r = apply(up_0_13_3_2, json!({ "bitcoind": { "type": "internal", "user": "u" } }));
        assert_eq!(r, json!({ "bitcoind": { "type": "internal-proxy", "user": "u" } }));

        let r = apply(up_0_13_3_2, json!({ "bitcoind": { "type": "none" } }));
        assert_eq!(r["bitcoind"]["type"], "none");

        let r = apply(up_0_13_3_2, json!({ "bitcoind": "internal" }));
        assert_eq!(r, json!({ "bitcoind": "internal" }));
    }

    #[test]
    fn down_0_13_3_2_resets_backend() {
        let r = apply(down_0_13_3_2, json!({ "bitcoind": { "type": "internal-proxy" } }));
        assert_eq!(r["bitcoind"]["type"], "internal");
        let r = apply(down_0_13_3_2, json!({ "bitcoind": {} }));
        assert_eq!(r["bitcoind"]["type"], "internal");
        assert_eq!(apply(down_0_13_3_2, json!({})), json!({}));
    }

    #[test]
    fn tor_flags_need_both_keys() {
        let r = apply(
            up_0_14_2,
            json!({ "tor": { "use-tor-only": true, "stream-isolation": false, "x": 1 } }),
        );
        assert_eq!(r, json!({ "tor": { "x": 1 } }));

        let partial = json!({ "tor": { "use-tor-only": true } });
        assert_eq!(apply(up_0_14_2, partial.clone()), partial);
    }

    #[test]
    fn external_backend_moves_to_proxy_and_tor_flags_go() {
        let r = apply(
            up_0_14_2,
            json!({
                "bitcoind": { "type": "external" },
                "tor": { "use-tor-only": true, "stream-isolation": true }
            }),
        );
        assert_eq!(
            r,
            json!({ "bitcoind": { "type": "internal-proxy" }, "tor": {} })
        );
    }

    #[test]
    fn down_0_14_2_drops_tor_flags_and_keeps_backend() {
        let r = apply(
            down_0_14_2,
            json!({
                "bitcoind": { "type": "internal-proxy" },
                "tor": { "use-tor-only": true, "stream-isolation": true }
            }),
        );
        assert_eq!(
            r,
            json!({ "bitcoind": { "type": "internal-proxy" }, "tor": {} })
        );

        let partial = json!({ "tor": { "stream-isolation": true } });
        assert_eq!(apply(down_0_14_2, partial.clone()), partial);
    }

    #[test]
    fn legacy_watchtower_flags_dropped_together() {
        let r = apply(
            up_0_14_2_1,
            json!({
                "bitcoind": { "type": "none" },
                "watchtower-enabled": true,
                "watchtower-client-enabled": false
            }),
        );
        assert_eq!(r, json!({ "bitcoind": { "type": "internal-proxy" } }));
    }

    #[test]
    fn watchtower_drop_needs_all_three_fields() {
        let full = json!({
            "watchtowers": { "wt-server": true, "wt-client": false, "add-watchtowers": [] }
        });
        assert_eq!(apply(up_0_15_0, full), json!({ "watchtowers": {} }));

        let partial = json!({ "watchtowers": { "wt-server": true, "add-watchtowers": [] } });
        assert_eq!(apply(up_0_15_0, partial.clone()), partial);
    }

    #[test]
    fn tower_list_keeps_only_string_entries() {
        let odd = json!({ "watchtowers": { "wt-server": false, "add-watchtowers": ["a@b:1", 7, null] } });
        assert_eq!(
            apply(up_0_17_0_2, odd),
            json!({
                "watchtowers": {
                    "wt-server": false,
                    "wt-client": { "enabled": "enabled", "add-watchtowers": ["a@b:1"] }
                }
            })
        );

        let only_junk = json!({ "watchtowers": { "add-watchtowers": [1, false] } });
        assert_eq!(
            apply(up_0_17_0_2, only_junk),
            json!({ "watchtowers": { "wt-client": { "enabled": "disabled" } } })
        );

        let not_a_list = json!({ "watchtowers": { "add-watchtowers": "a@b:1" } });
        assert_eq!(apply(up_0_17_0_2, not_a_list.clone()), not_a_list);
    }

    #[test]
    fn fee_and_sweeper_steps_skip_without_advanced() {
        assert_eq!(apply(up_0_17_3, json!({})), json!({}));
        assert_eq!(apply(up_0_18_0_1, json!({ "advanced": 3 })), json!({ "advanced": 3 }));
    }

    #[test]
    fn sweeper_down_needs_every_added_key() {
        let up = apply(up_0_18_0_1, json!({ "advanced": { "debug-level": "info" } }));
        assert_eq!(
            apply(down_0_18_0_1, up),
            json!({ "advanced": { "debug-level": "info" } })
        );

        let partial = json!({ "advanced": { "protocol-zero-conf": true } });
        assert_eq!(apply(down_0_18_0_1, partial.clone()), partial);
    }

    #[test]
    fn backend_kind_round_trips_names() {
        for kind in [
            BackendKind::None,
            BackendKind::Internal,
            BackendKind::InternalProxy,
            BackendKind::External,
        ] {
            assert_eq!(BackendKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(BackendKind::parse("electrs"), None);
    }
}
