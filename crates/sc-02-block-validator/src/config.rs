//! Validator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for block validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// How far past local time a block timestamp may be (seconds).
    pub allowed_skew_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allowed_skew_secs: 15,
        }
    }
}

impl ValidatorConfig {
    /// Generous skew so fixtures with round timestamps validate.
    pub fn for_testing() -> Self {
        Self {
            allowed_skew_secs: 3_600,
        }
    }
}
