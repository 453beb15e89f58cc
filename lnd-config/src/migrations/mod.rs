// lnd-config/src/migrations/mod.rs
mod steps;

use crate::version::Version;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::LazyLock;
use thiserror::Error;

/// Version of the record the running build reads.
pub const CURRENT_VERSION: &str = "0.20.1";

pub static CHAIN: LazyLock<MigrationChain> = LazyLock::new(steps::lnd_chain);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("cannot downgrade past {version}: that migration discards configuration data")]
    CannotDowngrade { version: Version },
    #[error("target version {target} is newer than the current version {current}")]
    BeyondCurrent { target: Version, current: Version },
    #[error("configuration record must be a JSON object")]
    NotAnObject,
}

pub type Transform = fn(&mut Value);

#[derive(Clone, Copy)]
pub enum Down {
    Reversible(Transform),
    /// The forward step dropped data; going back always fails.
    Irreversible,
}

pub struct Migration {
    version: Version,
    up: Transform,
    down: Down,
    configured: bool,
}

impl Migration {
    pub fn new(version: Version, up: Transform, down: Down, configured: bool) -> Self {
        Self {
            version,
            up,
            down,
            configured,
        }
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn is_reversible(&self) -> bool {
        matches!(self.down, Down::Reversible(_))
    }

    /// Whether a record that went through this step still counts as
    /// configured, or needs the user to review it.
    pub fn configured(&self) -> bool {
        self.configured
    }

    pub fn up(&self, mut record: Value) -> Value {
        (self.up)(&mut record);
        record
    }

    pub fn down(&self, mut record: Value) -> Result<Value, MigrationError> {
        match self.down {
            Down::Reversible(f) => {
                f(&mut record);
                Ok(record)
            }
            Down::Irreversible => Err(MigrationError::CannotDowngrade {
                version: self.version.clone(),
            }),
        }
    }

    pub fn info(&self) -> MigrationInfo {
        MigrationInfo {
            version: self.version.clone(),
            reversible: self.is_reversible(),
            configured: self.configured,
        }
    }
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version.to_string())
            .field("reversible", &self.is_reversible())
            .field("configured", &self.configured)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationInfo {
    pub version: Version,
    pub reversible: bool,
    pub configured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// The entries a migration between two versions would run, in order.
#[derive(Debug)]
pub struct Plan<'a> {
    direction: Direction,
    steps: Vec<&'a Migration>,
}

impl<'a> Plan<'a> {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn steps(&self) -> &[&'a Migration] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn versions(&self) -> Vec<Version> {
        self.steps.iter().map(|m| m.version.clone()).collect()
    }

    /// First step a downgrade would fail on.
    pub fn blocked_by(&self) -> Option<&Version> {
        match self.direction {
            Direction::Up => None,
            Direction::Down => self
                .steps
                .iter()
                .find(|m| !m.is_reversible())
                .map(|m| &m.version),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Migrated {
    pub record: Value,
    pub direction: Direction,
    pub applied: Vec<Version>,
    /// False when at least one applied step asks for the user to review the
    /// configuration.
    pub configured: bool,
}

pub struct MigrationChain {
    current: Version,
    entries: BTreeMap<Version, Migration>,
}

impl MigrationChain {
    pub fn new(current: Version, migrations: impl IntoIterator<Item = Migration>) -> Self {
        let entries = migrations
            .into_iter()
            .map(|m| (m.version.clone(), m))
            .collect();
        Self { current, entries }
    }

    pub fn current(&self) -> &Version {
        &self.current
    }

    pub fn get(&self, version: &Version) -> Option<&Migration> {
        self.entries.get(version)
    }

    /// Entries in ascending version order.
    pub fn entries(&self) -> impl Iterator<Item = &Migration> {
        self.entries.values()
    }

    pub fn plan(&self, from: &Version, to: &Version) -> Result<Plan<'_>, MigrationError> {
        if *to > self.current {
            return Err(MigrationError::BeyondCurrent {
                target: to.clone(),
                current: self.current.clone(),
            });
        }
        let plan = match from.cmp(to) {
            std::cmp::Ordering::Equal => Plan {
                direction: Direction::Up,
                steps: Vec::new(),
            },
            std::cmp::Ordering::Less => Plan {
                direction: Direction::Up,
                steps: self
                    .entries
                    .range((Bound::Excluded(from), Bound::Included(to)))
                    .map(|(_, m)| m)
                    .collect(),
            },
            std::cmp::Ordering::Greater => Plan {
                direction: Direction::Down,
                steps: self
                    .entries
                    .range((Bound::Excluded(to), Bound::Included(from)))
                    .rev()
                    .map(|(_, m)| m)
                    .collect(),
            },
        };
        Ok(plan)
    }

    /// Carries `record` from version `from` to version `to`.
    ///
    /// Nothing is returned on failure; the caller still holds the record it
    /// passed in only if it kept a copy.
    pub fn migrate(
        &self,
        from: &Version,
        to: &Version,
        record: Value,
    ) -> Result<Migrated, MigrationError> {
        if !record.is_object() {
            return Err(MigrationError::NotAnObject);
        }
        let plan = self.plan(from, to)?;
        tracing::info!(
            %from,
            %to,
            direction = ?plan.direction,
            steps = plan.steps.len(),
            "migrating configuration"
        );

        let mut record = record;
        let mut applied = Vec::with_capacity(plan.steps.len());
        for step in plan.steps() {
            record = match plan.direction {
                Direction::Up => step.up(record),
                Direction::Down => step.down(record).inspect_err(|e| {
                    tracing::warn!(version = %step.version, "{e}");
                })?,
            };
            tracing::debug!(version = %step.version, direction = ?plan.direction, "applied migration");
            applied.push(step.version.clone());
        }

        Ok(Migrated {
            record,
            direction: plan.direction,
            configured: plan.steps.iter().all(|m| m.configured),
            applied,
        })
    }
}

impl std::fmt::Debug for MigrationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationChain")
            .field("current", &self.current.to_string())
            .field("entries", &self.entries.values().collect::<Vec<_>>())
            .finish()
    }
}
