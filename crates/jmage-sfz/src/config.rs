//! Parse options
//!
//! Options can be built in code or loaded from a TOML file:
//!
//! ```toml
//! # abort (default) or skip
//! missing_required = "skip"
//!
//! # fail if a region's sample file does not exist
//! check_samples = true
//! ```

use crate::parser::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do with a region that closes without a required key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// Fail the whole parse with `MissingRequiredKey`
    #[default]
    Abort,
    /// Drop the region, record a `RegionSkipped` warning and keep going
    Skip,
}

/// Options controlling how patches are parsed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Handling of regions missing a required key
    pub missing_required: MissingKeyPolicy,
    /// Require every resolved sample path to be an existing regular file
    pub check_samples: bool,
}

impl ParseOptions {
    /// Parse options from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load options from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serialize the options back to TOML
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
