// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Numeric settings for quantum objects.
//!
//! Every [`Qobj`](crate::Qobj) carries a copy of the [`Settings`] it was
//! built with, and results of binary operations inherit the settings of the
//! left operand. Settings are loaded from multiple sources with the following
//! priority (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. qobj.yaml file
//! 3. Environment variables (QUBITOS_QOBJ_*)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{Error, Result};

/// Default absolute tolerance for equality and Hermiticity checks.
pub const DEFAULT_ATOL: f64 = 1e-12;

/// Numeric settings consulted by every operation that needs a default
/// tolerance or an auto-cleanup decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Absolute tolerance for equality, Hermiticity and unitarity checks
    #[serde(default = "default_atol")]
    pub atol: f64,

    /// Prune small entries after every arithmetic result
    #[serde(default = "default_true")]
    pub auto_tidyup: bool,

    /// Tolerance used by automatic and default tidy-up
    #[serde(default = "default_atol")]
    pub auto_tidyup_atol: f64,

    /// Drop matching unit factors from product dims
    #[serde(default = "default_true")]
    pub auto_tidyup_dims: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            atol: default_atol(),
            auto_tidyup: true,
            auto_tidyup_atol: default_atol(),
            auto_tidyup_dims: true,
        }
    }
}

impl Settings {
    /// Load settings from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                settings = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &["qobj.yaml", "qobj.yml", "/etc/qubitos/qobj.yaml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    settings = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        settings.apply_env_overrides();
        settings.validate()?;

        Ok(settings)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup (environment-shaped).
    ///
    /// Unparseable values are ignored and leave the current value in place.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("QUBITOS_QOBJ_ATOL") {
            if let Ok(atol) = val.trim().parse() {
                self.atol = atol;
            }
        }
        if let Some(val) = lookup("QUBITOS_QOBJ_AUTO_TIDYUP") {
            self.auto_tidyup = parse_flag(&val);
        }
        if let Some(val) = lookup("QUBITOS_QOBJ_AUTO_TIDYUP_ATOL") {
            if let Ok(atol) = val.trim().parse() {
                self.auto_tidyup_atol = atol;
            }
        }
        if let Some(val) = lookup("QUBITOS_QOBJ_AUTO_TIDYUP_DIMS") {
            self.auto_tidyup_dims = parse_flag(&val);
        }
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.atol.is_finite() || self.atol < 0.0 {
            return Err(Error::Config(format!(
                "atol must be a non-negative finite number, got {}",
                self.atol
            )));
        }
        if !self.auto_tidyup_atol.is_finite() || self.auto_tidyup_atol < 0.0 {
            return Err(Error::Config(format!(
                "auto_tidyup_atol must be a non-negative finite number, got {}",
                self.auto_tidyup_atol
            )));
        }
        if self.auto_tidyup_atol > 1e-3 {
            tracing::warn!(
                auto_tidyup_atol = self.auto_tidyup_atol,
                "Large tidy-up tolerance will prune physically meaningful amplitudes"
            );
        }
        Ok(())
    }

    /// Settings with automatic tidy-up disabled.
    pub fn without_auto_tidyup(mut self) -> Self {
        self.auto_tidyup = false;
        self
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

fn default_atol() -> f64 {
    DEFAULT_ATOL
}

fn default_true() -> bool {
    true
}
