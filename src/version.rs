//! Technology version parsing and version gates
//!
//! Builders never compare version strings. They receive a parsed
//! [`TechnologyVersion`] and ask it one of the named gate questions below.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BuildError;

static VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v?(\d+)\.(\d+)(?:\.(\d+))?(?:[-+][0-9A-Za-z.-]+)?$").unwrap());

/// A `major.minor.patch` technology or data standard version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TechnologyVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl TechnologyVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string such as `7.1.0` or `v6.1`
    pub fn parse(input: &str) -> Result<Self, BuildError> {
        let trimmed = input.trim();
        let caps = VERSION_REGEX
            .captures(trimmed)
            .ok_or_else(|| BuildError::InvalidVersion(input.to_string()))?;

        let part = |idx: usize| -> Result<u32, BuildError> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| BuildError::InvalidVersion(input.to_string())),
                None => Ok(0),
            }
        };

        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }

    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// Sort table columns on completion: parent keys, other keys, then the rest
    pub fn primary_key_sort_applies(&self) -> bool {
        self.is_at_least(7, 0)
    }

    /// Common join tables list the parent primary keys before the common's own columns
    pub fn parent_primary_keys_first_in_common_tables(&self) -> bool {
        self.is_at_least(7, 0)
    }

    /// A merged duplicate column keeps its original position
    pub fn replace_merged_column_in_place(&self) -> bool {
        self.is_at_least(7, 0)
    }

    /// Data standards before 3.0 pair descriptors with map type enumeration tables
    pub fn has_descriptor_map_types(&self) -> bool {
        !self.is_at_least(3, 0)
    }
}

impl Default for TechnologyVersion {
    fn default() -> Self {
        Self::new(7, 1, 0)
    }
}

impl fmt::Display for TechnologyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for TechnologyVersion {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TechnologyVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TechnologyVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
