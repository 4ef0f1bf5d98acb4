//! Configuration management for the verification harness.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Environment variable overrides
//! - Configuration file support
//! - Section-wise validation
mod action;
mod controller;
mod convergence;
mod roles;
mod upgrade;
mod workload;
pub use action::*;
pub use controller::*;
pub use convergence::*;
pub use roles::*;
pub use upgrade::*;
pub use workload::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable prefix, e.g. `FLEET__CONVERGENCE__TIMEOUT_SECS`
pub(crate) const ENV_PREFIX: &str = "FLEET";

/// Main configuration container for the harness
///
/// Combines all section configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct HarnessConfig {
    /// How the controller CLI is reached
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Role names as deployed
    #[serde(default)]
    pub roles: RoleNames,
    /// Status polling cadence and budget
    #[serde(default)]
    pub convergence: ConvergenceConfig,
    /// Action resolution budgets
    #[serde(default)]
    pub actions: ActionConfig,
    /// Version pair and worker hold-back for the rolling upgrade
    #[serde(default)]
    pub upgrade: UpgradeConfig,
    /// Commands and identities used by the workload probes
    #[serde(default)]
    pub workload: WorkloadConfig,
}

impl Debug for HarnessConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("controller", &self.controller)
            .field("roles", &self.roles)
            .field("upgrade", &self.upgrade)
            .finish()
    }
}

impl HarnessConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `FLEET__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so further overrides can be applied via
    /// `with_override_config()`. Callers MUST call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("FLEET__CONVERGENCE__TIMEOUT_SECS", "600");
    /// let cfg = HarnessConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.controller.validate()?;
        self.roles.validate()?;
        self.convergence.validate()?;
        self.actions.validate()?;
        self.upgrade.validate()?;
        self.workload.validate()?;
        Ok(self)
    }
}

pub(super) fn invalid(message: impl Into<String>) -> crate::Error {
    crate::Error::Config(config::ConfigError::Message(message.into()))
}
