//! Relay configuration
//!
//! Resolved from, in priority order:
//! 1. Environment variables (`ACTION_RELAY_*`), set by the host when it
//!    launches a process
//! 2. A `[relay]`-style TOML table embedded in the host's own config
//! 3. Defaults (coordinator on the `GLOBAL_ACTION` channel)
//!
//! [`RelayConfig::load`] applies all three layers; `from_env` skips the TOML
//! layer and `from_toml_str` skips the environment.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::role::ProcessRole;
use crate::schema::{WindowId, GLOBAL_ACTION_CHANNEL};

pub const ROLE_ENV: &str = "ACTION_RELAY_ROLE";
pub const WINDOW_ID_ENV: &str = "ACTION_RELAY_WINDOW_ID";
pub const CHANNEL_ENV: &str = "ACTION_RELAY_CHANNEL";

/// Role as written in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    #[default]
    #[serde(alias = "main")]
    Coordinator,
    #[serde(alias = "renderer")]
    Dependent,
}

impl RoleKind {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "coordinator" | "main" => Ok(RoleKind::Coordinator),
            "dependent" | "renderer" => Ok(RoleKind::Dependent),
            _ => Err(ConfigError::InvalidRole(raw.to_string())),
        }
    }
}

/// Relay configuration for one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Which side of the relay this process is on
    #[serde(default)]
    pub role: RoleKind,

    /// Window id assigned by the host (dependents only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<u32>,

    /// Reserved message name used in both directions
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_channel() -> String {
    GLOBAL_ACTION_CHANNEL.to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            role: RoleKind::Coordinator,
            window_id: None,
            channel: default_channel(),
        }
    }
}

impl RelayConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparseable value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Parse a TOML table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown role names
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a TOML table, then apply `ACTION_RELAY_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns error if the TOML or an environment variable is invalid
    pub fn load(content: &str) -> Result<Self, ConfigError> {
        Self::from_toml_str(content)?.with_env_overrides()
    }

    /// Apply `ACTION_RELAY_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparseable value
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides for every variable `lookup` knows; others keep their
    /// current value.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparseable value
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ROLE_ENV) {
            self.role = RoleKind::parse(&raw)?;
        }
        if let Some(raw) = lookup(WINDOW_ID_ENV) {
            let id = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidWindowId(raw.clone()))?;
            self.window_id = Some(id);
        }
        if let Some(raw) = lookup(CHANNEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.channel = raw.trim().to_string();
        }

        Ok(self)
    }

    /// Resolve the validated process role.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingWindowId`] for a dependent without a window id
    pub fn process_role(&self) -> Result<ProcessRole, ConfigError> {
        match self.role {
            RoleKind::Coordinator => Ok(ProcessRole::Coordinator),
            RoleKind::Dependent => self
                .window_id
                .map(|id| ProcessRole::Dependent(WindowId(id)))
                .ok_or(ConfigError::MissingWindowId),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.channel, "GLOBAL_ACTION");
        assert_eq!(config.process_role().unwrap(), ProcessRole::Coordinator);
    }

    #[test]
    fn test_dependent_from_lookup() {
        let config = RelayConfig::from_lookup(lookup(&[
            (ROLE_ENV, "Dependent"),
            (WINDOW_ID_ENV, " 12 "),
            (CHANNEL_ENV, "APP_SYNC"),
        ]))
        .unwrap();
        assert_eq!(config.channel, "APP_SYNC");
        assert_eq!(
            config.process_role().unwrap(),
            ProcessRole::Dependent(WindowId(12))
        );
    }

    #[test]
    fn test_renderer_alias() {
        let config = RelayConfig::from_lookup(lookup(&[
            (ROLE_ENV, "renderer"),
            (WINDOW_ID_ENV, "1"),
        ]))
        .unwrap();
        assert_eq!(config.role, RoleKind::Dependent);
    }

    #[test]
    fn test_invalid_role() {
        let err = RelayConfig::from_lookup(lookup(&[(ROLE_ENV, "worker")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRole(ref r) if r == "worker"));
    }

    #[test]
    fn test_invalid_window_id() {
        let err = RelayConfig::from_lookup(lookup(&[(WINDOW_ID_ENV, "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWindowId(_)));
    }

    #[test]
    fn test_dependent_requires_window_id() {
        let config = RelayConfig::from_lookup(lookup(&[(ROLE_ENV, "dependent")])).unwrap();
        assert!(matches!(
            config.process_role(),
            Err(ConfigError::MissingWindowId)
        ));
    }

    #[test]
    fn test_empty_channel_keeps_default() {
        let config = RelayConfig::from_lookup(lookup(&[(CHANNEL_ENV, "  ")])).unwrap();
        assert_eq!(config.channel, GLOBAL_ACTION_CHANNEL);
    }

    #[test]
    fn test_from_toml() {
        let config = RelayConfig::from_toml_str(
            r#"
            role = "dependent"
            window_id = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.role, RoleKind::Dependent);
        assert_eq!(config.window_id, Some(5));
        assert_eq!(config.channel, GLOBAL_ACTION_CHANNEL);
    }

    #[test]
    fn test_from_toml_rejects_unknown_role() {
        let err = RelayConfig::from_toml_str(r#"role = "worker""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_toml_accepts_role_aliases() {
        let config = RelayConfig::from_toml_str(
            r#"
            role = "renderer"
            window_id = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.role, RoleKind::Dependent);

        let config = RelayConfig::from_toml_str(r#"role = "main""#).unwrap();
        assert_eq!(config.role, RoleKind::Coordinator);
    }

    #[test]
    fn test_env_overrides_toml() {
        let config = RelayConfig::from_toml_str(
            r#"
            role = "dependent"
            window_id = 5
            channel = "FROM_TOML"
            "#,
        )
        .unwrap()
        .with_overrides(lookup(&[(WINDOW_ID_ENV, "8")]))
        .unwrap();

        // Overridden
        assert_eq!(config.window_id, Some(8));
        // Kept from TOML
        assert_eq!(config.role, RoleKind::Dependent);
        assert_eq!(config.channel, "FROM_TOML");
    }

    #[test]
    fn test_overrides_keep_toml_when_env_empty() {
        let from_toml = RelayConfig::from_toml_str(r#"channel = "APP""#).unwrap();
        let config = from_toml.clone().with_overrides(lookup(&[])).unwrap();
        assert_eq!(config, from_toml);
    }

    #[test]
    #[serial]
    fn test_load_applies_process_env_over_toml() {
        // SAFETY: serialized with other env-mutating tests
        unsafe {
            std::env::set_var(ROLE_ENV, "coordinator");
            std::env::remove_var(WINDOW_ID_ENV);
            std::env::remove_var(CHANNEL_ENV);
        }
        let config = RelayConfig::load(
            r#"
            role = "dependent"
            window_id = 3
            "#,
        );
        unsafe {
            std::env::remove_var(ROLE_ENV);
        }
        let config = config.unwrap();
        assert_eq!(config.role, RoleKind::Coordinator);
        assert_eq!(config.window_id, Some(3));
        assert_eq!(config.process_role().unwrap(), ProcessRole::Coordinator);
    }

    #[test]
    #[serial]
    fn test_detect_from_process_env() {
        // SAFETY: serialized with other env-mutating tests
        unsafe {
            std::env::set_var(ROLE_ENV, "dependent");
            std::env::set_var(WINDOW_ID_ENV, "9");
        }
        let role = ProcessRole::detect();
        unsafe {
            std::env::remove_var(ROLE_ENV);
            std::env::remove_var(WINDOW_ID_ENV);
        }
        assert_eq!(role.unwrap(), ProcessRole::Dependent(WindowId(9)));
    }
}
