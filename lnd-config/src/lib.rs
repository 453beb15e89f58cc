// lnd-config/src/lib.rs
pub mod catalogue;
pub mod logging;
pub mod migrations;
pub mod model;
pub mod record;
pub mod schema;
pub mod settings;
pub mod shape;
pub mod version;

pub use catalogue::{ConfigSpec, FieldError, ValueSpec, CATALOGUE};
pub use logging::init_logging;
pub use migrations::{
    Direction, Migrated, MigrationChain, MigrationError, MigrationInfo, CHAIN, CURRENT_VERSION,
};
pub use model::{LndConfig, WatchtowerUri};
pub use settings::Settings;
pub use shape::{Mismatch, Shape};
pub use version::{Version, VersionError};

use serde::Serialize;
use serde_json::Value;

/// Everything wrong with a record, from the catalogue's point of view and
/// from the typed model's.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub errors: Vec<FieldError>,
    /// Set when the record does not fit the current schema shape.
    pub shape: Option<String>,
    /// Set when the record does not deserialize into [`LndConfig`].
    pub model: Option<String>,
    pub watchtowers: Vec<String>,
}

impl Report {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
            && self.shape.is_none()
            && self.model.is_none()
            && self.watchtowers.is_empty()
    }
}

/// Checks `record` against the catalogue, the schema shape, and the typed
/// model.
pub fn validate(record: &Value) -> Report {
    let mut report = Report {
        errors: CATALOGUE.validate(record),
        shape: schema::root().check(record).err().map(|m| m.to_string()),
        ..Report::default()
    };
    match LndConfig::from_value(record.clone()) {
        Ok(config) => {
            if let Err(e) = config.watchtower_uris() {
                report.watchtowers.push(e.to_string());
            }
        }
        Err(e) => report.model = Some(e.to_string()),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_valid() {
        let record = CATALOGUE.default_record(&mut catalogue::seeded_rng(7));
        let report = validate(&record);
        assert!(report.is_valid(), "{report:?}");
    }

    #[test]
    fn bad_record_collects_every_kind_of_error() {
        let mut record = CATALOGUE.default_record(&mut catalogue::seeded_rng(7));
        record["watchtowers"]["wt-client"] =
            serde_json::json!({ "enabled": "enabled", "add-watchtowers": ["nope"] });
        record["advanced"]["max-pending-channels"] = serde_json::json!("five");

        let report = validate(&record);
        assert!(!report.is_valid());
        assert!(report
            .errors
            .iter()
            .any(|e| e.path == "advanced.max-pending-channels"));
        assert!(report.shape.is_some());
        assert!(report.model.is_some());
    }
}
