//! Shared configuration for `ovpn-api` consumers.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `ovpn_api::AuthConfig` + `ovpn_api::TransportConfig`.
//! The `OVPN_HOST` / `OVPN_CLIENT_ID` / `OVPN_CLIENT_SECRET` triple, when
//! complete, bypasses the file entirely.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use ovpn_api::{AuthConfig, Client, TlsMode, TransportConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Overrides the config file location.
pub const ENV_CONFIG_PATH: &str = "OVPN_CONFIG_PATH";
pub const ENV_HOST: &str = "OVPN_HOST";
pub const ENV_CLIENT_ID: &str = "OVPN_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "OVPN_CLIENT_SECRET";

/// Keyring service name; entries are keyed `<profile>/client-secret`.
const KEYRING_SERVICE: &str = "ovpn";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found in {}", path.display())]
    UnknownProfile { profile: String, path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when the caller does not name one.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// A named set of API credentials.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Service root, must be `https://` (e.g. "https://acme.api.openvpn.com").
    pub host: String,

    pub client_id: String,

    /// Client secret (plaintext, prefer keyring or env var).
    pub client_secret: Option<String>,

    /// Environment variable name containing the client secret.
    pub client_secret_env: Option<String>,

    /// Path to an additional CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the default timeout.
    pub timeout: Option<u64>,
}

/// Everything needed to construct an `ovpn_api::Client`.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub auth: AuthConfig,
    pub transport: TransportConfig,
}

impl ResolvedConfig {
    /// Build an unauthenticated client backed by `reqwest`.
    pub fn into_client(self) -> Result<Client, ovpn_api::Error> {
        Client::from_config(self.auth, &self.transport)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// `$OVPN_CONFIG_PATH`, else `~/.openvpn/config.toml`.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(ENV_CONFIG_PATH).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    BaseDirs::new().map_or_else(
        || PathBuf::from(".openvpn").join("config.toml"),
        |dirs| dirs.home_dir().join(".openvpn").join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered over defaults.
///
/// A missing file yields the defaults. `OVPN_DEFAULT_PROFILE` overrides
/// `default_profile`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OVPN_").only(&["default_profile"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the client secret from the credential chain.
pub fn resolve_client_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's client_secret_env → env var lookup
    if let Some(ref env_name) = profile.client_secret_env {
        if let Some(val) = non_empty_env(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/client-secret"))
    {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref secret) = profile.client_secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Parse `host` and require an `https` URL.
pub fn validate_host(host: &str) -> Result<Url, ConfigError> {
    let url: Url = host.parse().map_err(|e| ConfigError::Validation {
        field: "host".into(),
        reason: format!("invalid URL '{host}': {e}"),
    })?;

    if url.scheme() != "https" {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("expected an https URL, got '{host}'"),
        });
    }
    Ok(url)
}

/// Build a `ResolvedConfig` from a profile.
pub fn profile_to_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ResolvedConfig, ConfigError> {
    validate_host(&profile.host)?;

    if profile.client_id.is_empty() {
        return Err(ConfigError::Validation {
            field: "client_id".into(),
            reason: format!("empty in profile '{profile_name}'"),
        });
    }

    let client_secret = resolve_client_secret(profile, profile_name)?;

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ResolvedConfig {
        auth: AuthConfig::new(profile.host.clone(), profile.client_id.clone(), client_secret),
        transport: TransportConfig { tls, timeout },
    })
}

/// Build a `ResolvedConfig` from `OVPN_HOST` / `OVPN_CLIENT_ID` /
/// `OVPN_CLIENT_SECRET`.
///
/// Returns `Ok(None)` unless all three are set and non-empty.
pub fn config_from_env() -> Result<Option<ResolvedConfig>, ConfigError> {
    let (Some(host), Some(client_id), Some(client_secret)) = (
        non_empty_env(ENV_HOST),
        non_empty_env(ENV_CLIENT_ID),
        non_empty_env(ENV_CLIENT_SECRET),
    ) else {
        return Ok(None);
    };

    validate_host(&host)?;

    Ok(Some(ResolvedConfig {
        auth: AuthConfig::new(host, client_id, SecretString::from(client_secret)),
        transport: TransportConfig::default(),
    }))
}

/// Resolve connection settings.
///
/// The complete env-var triple wins. Otherwise the config file is loaded
/// and `profile` (or the file's `default_profile`) is looked up.
pub fn resolve(profile: Option<&str>) -> Result<ResolvedConfig, ConfigError> {
    if let Some(resolved) = config_from_env()? {
        debug!("using credentials from environment");
        return Ok(resolved);
    }

    let path = config_path();
    let config = load_config_from(&path)?;

    let profile_name = profile
        .map(str::to_owned)
        .or(config.default_profile)
        .unwrap_or_else(|| "default".into());
    debug!(profile = %profile_name, path = %path.display(), "using config profile");

    let Some(selected) = config.profiles.get(&profile_name) else {
        return Err(ConfigError::UnknownProfile {
            profile: profile_name,
            path,
        });
    };

    profile_to_config(selected, &profile_name, &config.defaults)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const CONFIG: &str = r#"
        default_profile = "acme"

        [defaults]
        timeout = 45

        [profiles.acme]
        host = "https://acme.api.openvpn.com"
        client_id = "acme-id"
        client_secret_env = "ACME_SECRET"

        [profiles.staging]
        host = "https://staging.api.openvpn.com"
        client_id = "staging-id"
        client_secret = "plain"
        ca_cert = "/etc/ssl/staging.pem"
        timeout = 5

        [profiles.insecure]
        host = "http://acme.api.openvpn.com"
        client_id = "acme-id"
        client_secret = "plain"
    "#;

    fn to_figment(err: ConfigError) -> figment::Error {
        err.to_string().into()
    }

    #[test]
    fn env_triple_bypasses_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env(ENV_CONFIG_PATH, "missing.toml");
            jail.set_env(ENV_HOST, "https://env.api.openvpn.com");
            jail.set_env(ENV_CLIENT_ID, "env-id");
            jail.set_env(ENV_CLIENT_SECRET, "env-secret");

            let resolved = resolve(Some("acme")).map_err(to_figment)?;
            assert_eq!(resolved.auth.host, "https://env.api.openvpn.com");
            assert_eq!(resolved.auth.client_id, "env-id");
            assert_eq!(resolved.auth.client_secret.expose_secret(), "env-secret");
            assert_eq!(resolved.transport, TransportConfig::default());
            Ok(())
        });
    }

    #[test]
    fn incomplete_env_triple_falls_back_to_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env(ENV_CONFIG_PATH, "config.toml");
            jail.set_env(ENV_HOST, "https://env.api.openvpn.com");
            jail.set_env(ENV_CLIENT_ID, "env-id");
            jail.set_env(ENV_CLIENT_SECRET, "");
            jail.set_env("ACME_SECRET", "from-env-var");

            let resolved = resolve(None).map_err(to_figment)?;
            assert_eq!(resolved.auth.host, "https://acme.api.openvpn.com");
            assert_eq!(resolved.auth.client_secret.expose_secret(), "from-env-var");
            assert_eq!(resolved.transport.timeout, Duration::from_secs(45));
            assert_eq!(resolved.transport.tls, TlsMode::System);
            Ok(())
        });
    }

    #[test]
    fn named_profile_with_plaintext_secret_and_ca() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env(ENV_CONFIG_PATH, "config.toml");

            let resolved = resolve(Some("staging")).map_err(to_figment)?;
            assert_eq!(resolved.auth.client_id, "staging-id");
            assert_eq!(resolved.auth.client_secret.expose_secret(), "plain");
            assert_eq!(
                resolved.transport,
                TransportConfig {
                    tls: TlsMode::CustomCa(PathBuf::from("/etc/ssl/staging.pem")),
                    timeout: Duration::from_secs(5),
                }
            );
            Ok(())
        });
    }

    #[test]
    fn default_profile_env_override() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env(ENV_CONFIG_PATH, "config.toml");
            jail.set_env("OVPN_DEFAULT_PROFILE", "staging");

            let config = load_config().map_err(to_figment)?;
            assert_eq!(config.default_profile.as_deref(), Some("staging"));
            assert_eq!(config.profiles.len(), 3);
            Ok(())
        });
    }

    #[test]
    fn plain_http_host_is_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env(ENV_CONFIG_PATH, "config.toml");

            let err = resolve(Some("insecure")).unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation { ref field, .. } if field == "host"),
                "got: {err:?}"
            );
            Ok(())
        });
    }

    #[test]
    fn env_triple_requires_https() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env(ENV_HOST, "http://env.api.openvpn.com");
            jail.set_env(ENV_CLIENT_ID, "env-id");
            jail.set_env(ENV_CLIENT_SECRET, "env-secret");

            assert!(config_from_env().is_err());
            Ok(())
        });
    }

    #[test]
    fn unknown_profile_and_missing_secret() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("config.toml", CONFIG)?;
            jail.set_env(ENV_CONFIG_PATH, "config.toml");

            let err = resolve(Some("nope")).unwrap_err();
            assert!(matches!(err, ConfigError::UnknownProfile { ref profile, .. } if profile == "nope"));

            // ACME_SECRET unset, no keyring entry, no plaintext.
            let err = resolve(Some("acme")).unwrap_err();
            assert!(matches!(err, ConfigError::NoCredentials { .. }), "got: {err:?}");
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = load_config_from(Path::new("absent.toml")).map_err(to_figment)?;
            assert_eq!(config.default_profile.as_deref(), Some("default"));
            assert_eq!(config.defaults.timeout, 30);
            assert!(config.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn save_then_load() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let path = jail.directory().join("nested").join("config.toml");

            let mut config = Config::default();
            config.profiles.insert(
                "default".into(),
                Profile {
                    host: "https://acme.api.openvpn.com".into(),
                    client_id: "acme-id".into(),
                    client_secret_env: Some("ACME_SECRET".into()),
                    ..Profile::default()
                },
            );
            save_config_to(&config, &path).map_err(to_figment)?;

            let loaded = load_config_from(&path).map_err(to_figment)?;
            let profile = &loaded.profiles["default"];
            assert_eq!(profile.client_id, "acme-id");
            assert_eq!(profile.client_secret_env.as_deref(), Some("ACME_SECRET"));
            assert_eq!(profile.client_secret, None);
            Ok(())
        });
    }

    #[test]
    fn validate_host_accepts_https_only() {
        assert!(validate_host("https://acme.api.openvpn.com").is_ok());
        assert!(validate_host("http://acme.api.openvpn.com").is_err());
        assert!(validate_host("acme.api.openvpn.com").is_err());
    }
}
