// lnd-config/src/version.rs
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("version string is empty")]
    Empty,
    #[error("invalid version component '{component}' in '{input}'")]
    InvalidComponent { input: String, component: String },
}

/// Dotted numeric package version (`0.14.2`, `0.14.2.1`, ...).
///
/// Components compare left to right; a missing trailing component counts as
/// zero, so `0.19` and `0.19.0` are the same version. The original spelling is
/// kept for display.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
}

impl Version {
    pub fn new(parts: impl Into<Vec<u64>>) -> Self {
        Self {
            parts: parts.into(),
        }
    }

    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Components without trailing zeros; equal versions share this form.
    fn significant(&self) -> &[u64] {
        let len = self
            .parts
            .iter()
            .rposition(|p| *p != 0)
            .map_or(0, |i| i + 1);
        &self.parts[..len]
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionError::Empty);
        }
        let parts = s
            .split('.')
            .map(|c| {
                c.parse::<u64>().map_err(|_| VersionError::InvalidComponent {
                    input: s.to_string(),
                    component: c.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.parts {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn orders_by_numeric_components() {
        assert!(v("0.14.2") < v("0.14.2.1"));
        assert!(v("0.14.2.1") < v("0.15.0"));
        assert!(v("0.9.0") < v("0.10.0"));
        assert!(v("0.19.3") < v("0.20.1"));
    }

    #[test]
    fn trailing_zeros_are_insignificant() {
        assert_eq!(v("0.19"), v("0.19.0"));
        assert_eq!(v("0.19").cmp(&v("0.19.0.0")), Ordering::Equal);

        let mut set = std::collections::HashSet::new();
        set.insert(v("0.19"));
        assert!(set.contains(&v("0.19.0")));
    }

    #[test]
    fn display_keeps_original_spelling() {
        assert_eq!(v("0.13.3.2").to_string(), "0.13.3.2");
        assert_eq!(v(" 0.19.0 ").to_string(), "0.19.0");
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("".parse::<Version>(), Err(VersionError::Empty));
        assert!(matches!(
            "0.x.1".parse::<Version>(),
            Err(VersionError::InvalidComponent { component, .. }) if component == "x"
        ));
        assert!("0..1".parse::<Version>().is_err());
        assert!("v0.1".parse::<Version>().is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&v("0.17.0.2")).unwrap();
        assert_eq!(json, "\"0.17.0.2\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("0.17.0.2"));
        assert!(serde_json::from_str::<Version>("\"abc\"").is_err());
    }
}
