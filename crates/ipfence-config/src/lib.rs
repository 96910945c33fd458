//! Configuration for ipfence.
//!
//! TOML profiles, credential resolution (flags + profile + `ARM_*` env +
//! keyring), and translation to `ipfence_core::ReconcilerConfig`. The CLI
//! adds `GlobalOpts`-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use ipfence_core::{ClientCredentials, ReconcilerConfig};

/// Service name for keyring entries.
pub const KEYRING_SERVICE: &str = "ipfence";

pub const ENV_TENANT_ID: &str = "ARM_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "ARM_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ARM_CLIENT_SECRET";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {field} configured for profile '{profile}'")]
    MissingCredential {
        field: &'static str,
        profile: String,
        env: &'static str,
    },

    #[error("profile '{name}' not found in configuration")]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named service principal profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Profile name to use: explicit choice, then `default_profile`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up a profile. The implicit "default" profile may be absent from
    /// the file; credentials then come from flags or the environment.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profiles.keys().cloned().collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Operation poll interval in seconds (clamped to 5..=10).
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Tracked state file; defaults to the platform data directory.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            state_file: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    10
}

/// A named service principal profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Directory (tenant) id.
    pub tenant_id: Option<String>,

    /// Application (client) id.
    pub client_id: Option<String>,

    /// Client secret (plaintext; prefer keyring or env var).
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    pub client_secret_env: Option<String>,

    /// Resource Manager endpoint override (sovereign clouds).
    pub management_endpoint: Option<String>,

    /// Identity authority override.
    pub authority: Option<String>,

    /// Database account API version override.
    pub api_version: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval: Option<u64>,

    /// Override tracked state file.
    pub state_file: Option<PathBuf>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ipfence", "ipfence")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the tracked state file.
pub fn default_state_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

fn dirs_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("ipfence");
    p
}

/// Where tracked state lives for this profile.
pub fn state_path(profile: &Profile, defaults: &Defaults) -> PathBuf {
    profile
        .state_file
        .clone()
        .or_else(|| defaults.state_file.clone())
        .unwrap_or_else(default_state_path)
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layering defaults < TOML < `IPFENCE_*` env.
///
/// Nested keys use a double underscore: `IPFENCE_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("IPFENCE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Values given explicitly on the command line. They win over everything.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
}

/// Resolve service principal credentials from the process environment.
///
/// Order per field: override, profile, `ARM_*` env. The secret
/// additionally checks `client_secret_env` before plaintext and the
/// keyring entry `ipfence/<profile>/client-secret` last.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
    overrides: &CredentialOverrides,
) -> Result<ClientCredentials, ConfigError> {
    resolve_credentials_with(profile, profile_name, overrides, |name| {
        std::env::var(name).ok()
    })
}

/// [`resolve_credentials`] with an injectable environment lookup.
pub fn resolve_credentials_with(
    profile: &Profile,
    profile_name: &str,
    overrides: &CredentialOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientCredentials, ConfigError> {
    let missing = |field, var| ConfigError::MissingCredential {
        field,
        profile: profile_name.into(),
        env: var,
    };

    let tenant_id = overrides
        .tenant_id
        .clone()
        .or_else(|| profile.tenant_id.clone())
        .or_else(|| env(ENV_TENANT_ID))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing("tenant_id", ENV_TENANT_ID))?;

    let client_id = overrides
        .client_id
        .clone()
        .or_else(|| profile.client_id.clone())
        .or_else(|| env(ENV_CLIENT_ID))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing("client_id", ENV_CLIENT_ID))?;

    let client_secret = match overrides.client_secret.clone() {
        Some(secret) => secret,
        None => resolve_client_secret(profile, profile_name, &env)
            .ok_or_else(|| missing("client_secret", ENV_CLIENT_SECRET))?,
    };

    Ok(ClientCredentials {
        tenant_id,
        client_id,
        client_secret,
    })
}

fn resolve_client_secret(
    profile: &Profile,
    profile_name: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    // 1. Profile's client_secret_env → env var lookup
    if let Some(val) = profile.client_secret_env.as_deref().and_then(env) {
        return Some(SecretString::from(val));
    }

    // 2. Plaintext in config
    if let Some(ref secret) = profile.client_secret {
        return Some(SecretString::from(secret.clone()));
    }

    // 3. ARM_CLIENT_SECRET
    if let Some(val) = env(ENV_CLIENT_SECRET).filter(|v| !v.is_empty()) {
        return Some(SecretString::from(val));
    }

    // 4. System keyring
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/client-secret")).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

// ── Translation to core config ──────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL {raw:?}: {e}"),
    })
}

/// Build a `ReconcilerConfig` from a profile, defaults and resolved
/// credentials.
pub fn profile_to_reconciler_config(
    profile: &Profile,
    defaults: &Defaults,
    credentials: ClientCredentials,
) -> Result<ReconcilerConfig, ConfigError> {
    let mut config = ReconcilerConfig::new(credentials);

    if let Some(ref raw) = profile.management_endpoint {
        config.management_endpoint = parse_url("management_endpoint", raw)?;
    }
    if let Some(ref raw) = profile.authority {
        let mut authority = parse_url("authority", raw)?;
        // Tenant paths are joined onto the authority, which needs a trailing slash.
        if !authority.path().ends_with('/') {
            let path = format!("{}/", authority.path());
            authority.set_path(&path);
        }
        config.authority = authority;
    }
    if let Some(ref version) = profile.api_version {
        config.api_version.clone_from(version);
    }

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.poll_interval =
        Duration::from_secs(profile.poll_interval.unwrap_or(defaults.poll_interval));
    config.ca_cert.clone_from(&profile.ca_cert);

    Ok(config)
}
