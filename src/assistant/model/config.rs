use anyhow::{anyhow, Context};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_IMAGE_BASE_URL: &str = "https://dynafiles.s3.us-east-2.amazonaws.com/dmfp/";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 20;
const DEFAULT_WAITER_CODE_MIN_LEN: usize = 1;

/// body encoding of outgoing requests, responses are always normalized the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum RequestEncoding {
    #[default]
    Form,
    Json,
}

impl FromStr for RequestEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "form" => Ok(Self::Form),
            "json" => Ok(Self::Json),
            s => Err(format!("Invalid request encoding: {s}")),
        }
    }
}

/// whether a new item lands in the cart or goes straight to the kitchen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum AddItemMode {
    #[default]
    Direct,
    Staged,
}

impl FromStr for AddItemMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "staged" => Ok(Self::Staged),
            s => Err(format!("Invalid add item mode: {s}")),
        }
    }
}

/// authorization rule for the waiter code typed before each mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WaiterCodePolicy {
    pub min_len: usize,
}

impl Default for WaiterCodePolicy {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_WAITER_CODE_MIN_LEN,
        }
    }
}

impl WaiterCodePolicy {
    pub fn accepts(&self, code: &str) -> bool {
        let code = code.trim();
        !code.is_empty() && code.chars().count() >= self.min_len
    }
}

/// Client configs
#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    pub base_url: String,
    pub encoding: RequestEncoding,
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub waiter_code: WaiterCodePolicy,
    pub add_item_mode: AddItemMode,
    pub session_dir: PathBuf,
    pub image_base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            encoding: RequestEncoding::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            waiter_code: WaiterCodePolicy::default(),
            add_item_mode: AddItemMode::default(),
            session_dir: PathBuf::from("."),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }

    /// build from process env, unset variables keep their defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(lookup("API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL.to_string()));
        if let Some(v) = lookup("REQUEST_ENCODING") {
            config.encoding = v.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(v) = lookup("POLL_INTERVAL_SECS") {
            config.poll_interval = Duration::from_secs(parse_secs("POLL_INTERVAL_SECS", &v)?);
        }
        if let Some(v) = lookup("CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(parse_secs("CONNECT_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("READ_TIMEOUT_SECS") {
            config.read_timeout = Duration::from_secs(parse_secs("READ_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("WAITER_CODE_MIN_LEN") {
            config.waiter_code.min_len = v
                .trim()
                .parse()
                .with_context(|| format!("failed to parse WAITER_CODE_MIN_LEN={v}"))?;
        }
        if let Some(v) = lookup("ADD_ITEM_MODE") {
            config.add_item_mode = v.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(v) = lookup("SESSION_DIR") {
            config.session_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("IMAGE_BASE_URL") {
            config.image_base_url = v;
        }
        Ok(config)
    }
}

fn parse_secs(key: &str, value: &str) -> anyhow::Result<u64> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("failed to parse {key}={value}"))?;
    if secs == 0 {
        return Err(anyhow!("{key} must be greater than zero"));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.encoding, RequestEncoding::Form);
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.add_item_mode, AddItemMode::Direct);
        assert_eq!(config.waiter_code.min_len, 1);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("API_BASE_URL", "https://pos.example/api"),
            ("REQUEST_ENCODING", "json"),
            ("POLL_INTERVAL_SECS", "30"),
            ("WAITER_CODE_MIN_LEN", "3"),
            ("ADD_ITEM_MODE", "staged"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://pos.example/api");
        assert_eq!(config.encoding, RequestEncoding::Json);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.waiter_code.min_len, 3);
        assert_eq!(config.add_item_mode, AddItemMode::Staged);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ClientConfig::from_lookup(lookup(&[("REQUEST_ENCODING", "xml")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("POLL_INTERVAL_SECS", "0")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("READ_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn test_waiter_code_policy() {
        let lenient = WaiterCodePolicy::default();
        assert!(lenient.accepts("7"));
        assert!(!lenient.accepts("  "));
        let legacy = WaiterCodePolicy { min_len: 3 };
        assert!(legacy.accepts("007"));
        assert!(!legacy.accepts("07"));
    }
}
