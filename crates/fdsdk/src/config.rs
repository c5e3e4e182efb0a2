//! SDK configuration.
//!
//! Everything has a default. `from_env` lets the host tune a guest without
//! rebuilding it, through the environment it passes to the module.

use fdpack::Limits;

/// Caps the encoded response size.
pub const ENV_MAX_MESSAGE_LEN: &str = "FDSDK_MAX_MESSAGE_LEN";
/// Status used when a handler never calls `write_header`.
pub const ENV_DEFAULT_STATUS: &str = "FDSDK_DEFAULT_STATUS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub limits: Limits,
    pub default_status: i32,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_default_status(mut self, status: i32) -> Self {
        self.default_status = status;
        self
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `var`. Unparseable values keep the default.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(len) = parse::<usize>(&var, ENV_MAX_MESSAGE_LEN) {
            config.limits = config.limits.with_max_message_len(len);
        }
        if let Some(status) = parse::<i32>(&var, ENV_DEFAULT_STATUS) {
            config.default_status = status;
        }
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { limits: Limits::default(), default_status: 200 }
    }
}

fn parse<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| owned.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn defaults_without_env() {
        let config = Config::from_vars(vars(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.default_status, 200);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_vars(vars(&[
            (ENV_MAX_MESSAGE_LEN, "4096"),
            (ENV_DEFAULT_STATUS, " 204 "),
        ]));
        assert_eq!(config.limits.max_message_len, 4096);
        assert_eq!(config.default_status, 204);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = Config::from_vars(vars(&[
            (ENV_MAX_MESSAGE_LEN, "lots"),
            (ENV_DEFAULT_STATUS, "ok"),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn builder_setters() {
        let limits = Limits::default().with_max_payload_len(10);
        let config = Config::new().with_limits(limits).with_default_status(418);
        assert_eq!(config.limits.max_payload_len, 10);
        assert_eq!(config.default_status, 418);
    }
}
