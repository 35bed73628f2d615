//! Transport configuration types and the per-call config cloner.
//!
//! Drivers keep one transport template per device and derive a fresh
//! config from it for every request. Templates are never mutated in place.

use crate::error::{EmulatorError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default WinRM HTTP port.
pub const DEFAULT_WINRM_PORT: u16 = 5985;

/// Default per-request transport timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Merge `overrides` onto a deep copy of `base`.
///
/// `base` is serialized into a fresh [`Value`], so the caller's object is
/// never touched. Each top-level key of `overrides` then replaces the copied
/// value wholesale; nested objects are not merged.
///
/// # Errors
///
/// Returns [`EmulatorError::Json`] if `base` cannot be serialized, and
/// [`EmulatorError::InvalidArgument`] if there are overrides to apply but
/// `base` is not an object.
pub fn clone_config<B>(overrides: Map<String, Value>, base: &B) -> Result<Value>
where
    B: Serialize + ?Sized,
{
    let mut merged = serde_json::to_value(base)?;
    if overrides.is_empty() {
        return Ok(merged);
    }

    let Some(target) = merged.as_object_mut() else {
        return Err(EmulatorError::invalid(
            "config base must be an object to apply overrides",
        ));
    };

    tracing::trace!(keys = ?overrides.keys().collect::<Vec<_>>(), "applying config overrides");
    for (key, value) in overrides {
        target.insert(key, value);
    }

    Ok(merged)
}

/// An immutable transport template that hands out per-call copies.
#[derive(Debug, Clone)]
pub struct ConfigTemplate<T> {
    base: T,
}

impl<T> ConfigTemplate<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Wrap a base config.
    pub fn new(base: T) -> Self {
        Self { base }
    }

    /// Borrow the base config.
    pub fn base(&self) -> &T {
        &self.base
    }

    /// A fresh copy of the base config with nothing overridden.
    pub fn instantiate(&self) -> T {
        self.base.clone()
    }

    /// A fresh config with `overrides` applied on top of the base.
    ///
    /// # Errors
    ///
    /// Fails if an override has the wrong type for its field.
    pub fn with_overrides(&self, overrides: Map<String, Value>) -> Result<T> {
        let merged = clone_config(overrides, &self.base)?;
        Ok(serde_json::from_value(merged)?)
    }
}

/// SSH transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    /// Device address.
    pub host: String,
    /// TCP port (default: 22).
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password, if password auth is used.
    pub password: Option<String>,
    /// Per-command timeout in milliseconds (default: 5000).
    pub timeout_ms: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SSH_PORT,
            username: String::new(),
            password: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SshConfig {
    /// Create a new config builder.
    pub fn builder() -> SshConfigBuilder {
        SshConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.host, self.port, self.timeout_ms)
    }
}

/// Builder for SshConfig.
#[derive(Debug, Default)]
pub struct SshConfigBuilder {
    config: SshConfig,
}

impl SshConfigBuilder {
    /// Set the device address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the TCP port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set username and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = username.into();
        self.config.password = Some(password.into());
        self
    }

    /// Set the per-command timeout.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Build the configuration, validating all required fields.
    pub fn build(self) -> Result<SshConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// WinRM transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinrmConfig {
    /// Device address.
    pub host: String,
    /// TCP port (default: 5985).
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: Option<String>,
    /// Use HTTPS instead of HTTP.
    pub https: bool,
    /// Per-command timeout in milliseconds (default: 5000).
    pub timeout_ms: u64,
}

impl Default for WinrmConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_WINRM_PORT,
            username: String::new(),
            password: None,
            https: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl WinrmConfig {
    /// Create a new config builder.
    pub fn builder() -> WinrmConfigBuilder {
        WinrmConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.host, self.port, self.timeout_ms)
    }
}

/// Builder for WinrmConfig.
#[derive(Debug, Default)]
pub struct WinrmConfigBuilder {
    config: WinrmConfig,
}

impl WinrmConfigBuilder {
    /// Set the device address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the TCP port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set username and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = username.into();
        self.config.password = Some(password.into());
        self
    }

    /// Switch to HTTPS.
    pub fn https(mut self, https: bool) -> Self {
        self.config.https = https;
        self
    }

    /// Set the per-command timeout.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    /// Build the configuration, validating all required fields.
    pub fn build(self) -> Result<WinrmConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn validate_endpoint(host: &str, port: u16, timeout_ms: u64) -> Result<()> {
    if host.is_empty() {
        return Err(EmulatorError::invalid("host is required"));
    }
    if port == 0 {
        return Err(EmulatorError::invalid("port must be > 0"));
    }
    if timeout_ms == 0 {
        return Err(EmulatorError::invalid("timeout_ms must be > 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test value must be an object")
    }

    #[test]
    fn test_clone_overrides_top_level_key() {
        let base = json!({"a": 0, "b": 2});
        let merged = clone_config(object(json!({"a": 1})), &base).unwrap();

        assert_eq!(merged, json!({"a": 1, "b": 2}));
        assert_eq!(base, json!({"a": 0, "b": 2}));
    }

    #[test]
    fn test_clone_result_is_independent_of_base() {
        let base = json!({"opts": {"retries": 1}});
        let mut merged = clone_config(Map::new(), &base).unwrap();

        merged["opts"]["retries"] = json!(9);
        assert_eq!(base["opts"]["retries"], 1);
    }

    #[test]
    fn test_clone_nested_override_replaces_wholesale() {
        let base = json!({"opts": {"retries": 1, "verbose": true}});
        let merged = clone_config(object(json!({"opts": {"retries": 3}})), &base).unwrap();

        assert_eq!(merged, json!({"opts": {"retries": 3}}));
    }

    #[test]
    fn test_clone_adds_new_keys() {
        let base = json!({"host": "10.0.0.1"});
        let merged = clone_config(object(json!({"command": "show run"})), &base).unwrap();
        assert_eq!(merged, json!({"host": "10.0.0.1", "command": "show run"}));
    }

    #[test]
    fn test_clone_non_object_base_with_overrides() {
        let result = clone_config(object(json!({"a": 1})), &json!([1, 2]));
        assert!(matches!(result, Err(EmulatorError::InvalidArgument(_))));

        let copy = clone_config(Map::new(), &json!([1, 2])).unwrap();
        assert_eq!(copy, json!([1, 2]));
    }

    #[test]
    fn test_ssh_defaults() {
        let config = SshConfig::default();
        assert_eq!(config.port, 22);
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.password.is_none());
    }

    #[test]
    fn test_ssh_builder_missing_host() {
        let result = SshConfig::builder().credentials("admin", "secret").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_winrm_builder_success() {
        let config = WinrmConfig::builder()
            .host("192.168.1.20")
            .credentials("Administrator", "pw")
            .https(true)
            .port(5986)
            .build()
            .expect("should build successfully");

        assert_eq!(config.host, "192.168.1.20");
        assert_eq!(config.port, 5986);
        assert!(config.https);
        assert_eq!(config.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_winrm_builder_zero_timeout() {
        let result = WinrmConfig::builder().host("h").timeout_ms(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_template_with_overrides_leaves_base() {
        let template = ConfigTemplate::new(
            SshConfig::builder()
                .host("10.0.0.1")
                .credentials("admin", "secret")
                .build()
                .unwrap(),
        );

        let per_call = template
            .with_overrides(object(json!({"timeout_ms": 30000})))
            .unwrap();

        assert_eq!(per_call.timeout_ms, 30000);
        assert_eq!(per_call.host, "10.0.0.1");
        assert_eq!(template.base().timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(template.instantiate(), *template.base());
    }

    #[test]
    fn test_template_rejects_wrong_typed_override() {
        let template = ConfigTemplate::new(WinrmConfig::default());
        let result = template.with_overrides(object(json!({"port": "not-a-port"})));
        assert!(matches!(result, Err(EmulatorError::Json(_))));
    }
}
