// lnd-config/src/schema.rs
use crate::shape::Shape;
use std::sync::LazyLock;

static ROOT: LazyLock<Shape> = LazyLock::new(build_root);

/// Shape of a complete current-version record.
pub fn root() -> &'static Shape {
    &ROOT
}

pub fn bitcoind() -> Shape {
    Shape::object([
        ("type", Shape::String),
        ("user", Shape::String),
        ("password", Shape::String),
    ])
    .with_optional(["user", "password"])
}

pub fn autopilot_advanced() -> Shape {
    Shape::object([
        ("min-confirmations", Shape::Number),
        ("confirmation-target", Shape::Number),
    ])
}

pub fn autopilot() -> Shape {
    Shape::object([
        ("enabled", Shape::Boolean),
        ("private", Shape::Boolean),
        ("maxchannels", Shape::Number),
        ("allocation", Shape::Number),
        ("min-channel-size", Shape::Number),
        ("max-channel-size", Shape::Number),
        ("advanced", autopilot_advanced()),
    ])
}

pub fn watchtowers() -> Shape {
    Shape::object([
        ("wt-server", Shape::Boolean),
        (
            "wt-client",
            Shape::object([
                ("enabled", Shape::String),
                ("add-watchtowers", Shape::list(Shape::String)),
            ])
            .with_optional(["add-watchtowers"]),
        ),
    ])
}

pub fn bitcoin() -> Shape {
    Shape::object([
        ("default-channel-confirmations", Shape::Number),
        ("min-htlc", Shape::Number),
        ("min-htlc-out", Shape::Number),
        ("base-fee", Shape::Number),
        ("fee-rate", Shape::Number),
        ("time-lock-delta", Shape::Number),
    ])
}

pub fn sweeper() -> Shape {
    Shape::object([
        ("sweeper-maxfeerate", Shape::Number),
        ("sweeper-nodeadlineconftarget", Shape::Number),
        ("sweeper-budget-tolocalratio", Shape::Number),
        ("sweeper-budget-anchorcpfpratio", Shape::Number),
        ("sweeper-budget-deadlinehtlcratio", Shape::Number),
        ("sweeper-budget-nodeadlinehtlcratio", Shape::Number),
    ])
}

pub fn advanced() -> Shape {
    Shape::object([
        ("debug-level", Shape::String),
        ("db-bolt-no-freelist-sync", Shape::Boolean),
        ("db-bolt-auto-compact", Shape::Boolean),
        ("db-bolt-auto-compact-min-age", Shape::Number),
        ("db-bolt-db-timeout", Shape::Number),
        ("recovery-window", Shape::Number),
        ("payments-expiration-grace-period", Shape::Number),
        ("default-remote-max-htlcs", Shape::Number),
        ("max-channel-fee-allocation", Shape::Number),
        ("max-pending-channels", Shape::Number),
        ("max-commit-fee-rate-anchors", Shape::Number),
        ("protocol-wumbo-channels", Shape::Boolean),
        ("protocol-zero-conf", Shape::Boolean),
        ("protocol-option-scid-alias", Shape::Boolean),
        ("protocol-no-anchors", Shape::Boolean),
        ("protocol-disable-script-enforced-lease", Shape::Boolean),
        ("protocol-simple-taproot-chans", Shape::Boolean),
        ("gc-canceled-invoices-on-startup", Shape::Boolean),
        ("allow-circular-route", Shape::Boolean),
        ("bitcoin", bitcoin()),
        ("sweeper", sweeper()),
    ])
    .with_optional(["recovery-window"])
}

fn build_root() -> Shape {
    Shape::object([
        ("alias", Shape::String),
        ("externalip", Shape::String),
        ("color", Shape::String),
        ("accept-keysend", Shape::Boolean),
        ("accept-amp", Shape::Boolean),
        ("reject-htlc", Shape::Boolean),
        ("min-chan-size", Shape::Number),
        ("max-chan-size", Shape::Number),
        ("bitcoind", bitcoind()),
        ("autopilot", autopilot()),
        ("watchtowers", watchtowers()),
        ("advanced", advanced()),
        ("control-tor-address", Shape::String),
        ("peer-tor-address", Shape::String),
        ("watchtower-tor-address", Shape::String),
    ])
    .with_optional([
        "alias",
        "externalip",
        "min-chan-size",
        "max-chan-size",
        "control-tor-address",
        "peer-tor-address",
        "watchtower-tor-address",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recovery_window_is_optional() {
        let mut advanced = crate::catalogue::CATALOGUE
            .default_record(&mut crate::catalogue::seeded_rng(1))["advanced"]
            .clone();
        assert!(super::advanced().test(&advanced));

        advanced
            .as_object_mut()
            .unwrap()
            .remove("recovery-window");
        assert!(super::advanced().test(&advanced));

        advanced["recovery-window"] = json!("2500");
        assert!(!super::advanced().test(&advanced));
    }

    #[test]
    fn wt_client_variants_conform() {
        let disabled = json!({ "wt-server": false, "wt-client": { "enabled": "disabled" } });
        let enabled = json!({
            "wt-server": true,
            "wt-client": { "enabled": "enabled", "add-watchtowers": ["pk@host:9911"] }
        });
        let flat = json!({ "wt-server": true, "add-watchtowers": [] });
        assert!(watchtowers().test(&disabled));
        assert!(watchtowers().test(&enabled));
        assert!(!watchtowers().test(&flat));
    }
}
