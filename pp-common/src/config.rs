//! Configuration loading
//!
//! Services resolve their config file with the usual priority order:
//! 1. Command-line argument (highest priority)
//! 2. `PP_CONFIG` environment variable
//! 3. `pp.toml` in the working directory
//! 4. `przypis/pp.toml` under the platform config directory
//!
//! Missing file means compiled defaults. Individual `PP_*` environment
//! variables override file values afterwards, so containerized deployments
//! can run without any file at all.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub demagog: DemagogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API service binds to
    pub bind_addr: String,
    /// Public base URL used when building absolute links (mails, JSON:API links)
    pub public_host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5780".to_string(),
            public_host: "http://127.0.0.1:5780".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pp.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret used for signing JWTs and unsubscribe tokens
    pub secret_key: String,
    /// Session token lifetime
    pub token_ttl_secs: i64,
    /// OAuth userinfo endpoints, overridable so tests can point them at a stub
    pub google_userinfo_url: String,
    pub facebook_userinfo_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "insecure-dev-secret".to_string(),
            token_ttl_secs: 31_536_000, // 1 year
            google_userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            facebook_userinfo_url: "https://graph.facebook.com/me".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Full Mailgun messages endpoint for the sending domain
    pub api_url: String,
    /// Empty key disables sending (mails are logged and skipped)
    pub api_key: String,
    /// Domain appended to sender mailbox names
    pub mail_domain: String,
    /// Postbox notified about new annotation requests
    pub editors_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.mailgun.net/v3/przypispowszechny.pl/messages".to_string(),
            api_key: String::new(),
            mail_domain: "przypispowszechny.pl".to_string(),
            editors_address: "przypispowszechny@gmail.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemagogConfig {
    pub api_url: String,
    /// Username of the system user owning synced annotations
    pub username: String,
    /// Seconds between sync runs
    pub sync_interval_secs: u64,
}

impl Default for DemagogConfig {
    fn default() -> Self {
        Self {
            api_url: "http://beta.demagog.org.pl/api/v1".to_string(),
            username: "demagog.org.pl".to_string(),
            sync_interval_secs: 900, // 15 minutes
        }
    }
}

impl Config {
    /// Load configuration following the resolution priority order
    pub fn load(cli_path: Option<&Path>) -> Result<Config> {
        let mut config = match resolve_config_file(cli_path) {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
            }
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `PP_*` environment variable overrides on top of file values
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PP_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Ok(v) = std::env::var("PP_PUBLIC_HOST") {
            self.server.public_host = v;
        }
        if let Ok(v) = std::env::var("PP_DATABASE_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("PP_SECRET_KEY") {
            self.auth.secret_key = v;
        }
        if let Ok(v) = std::env::var("PP_MAILGUN_API_URL") {
            self.mail.api_url = v;
        }
        if let Ok(v) = std::env::var("PP_MAILGUN_API_KEY") {
            self.mail.api_key = v;
        }
        if let Ok(v) = std::env::var("PP_MAIL_DOMAIN") {
            self.mail.mail_domain = v;
        }
        if let Ok(v) = std::env::var("PP_EDITORS_ADDRESS") {
            self.mail.editors_address = v;
        }
        if let Ok(v) = std::env::var("PP_DEMAGOG_API_URL") {
            self.demagog.api_url = v;
        }
        if let Ok(v) = std::env::var("PP_DEMAGOG_USERNAME") {
            self.demagog.username = v;
        }
        if let Ok(v) = std::env::var("PP_DEMAGOG_SYNC_INTERVAL_SECS") {
            if let Ok(secs) = v.parse() {
                self.demagog.sync_interval_secs = secs;
            }
        }
    }
}

/// Find the config file for the current invocation, if any exists
fn resolve_config_file(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("PP_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // Priority 3: Working directory
    let local = PathBuf::from("pp.toml");
    if local.exists() {
        return Some(local);
    }

    // Priority 4: Platform config directory
    if let Some(dir) = dirs::config_dir() {
        let path = dir.join("przypis").join("pp.toml");
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:5780");
        assert_eq!(config.demagog.sync_interval_secs, 900);
        assert!(config.mail.api_key.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[demagog]\napi_url = \"http://localhost:9/api\"\n\n[server]\nbind_addr = \"0.0.0.0:80\"\n"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.demagog.api_url, "http://localhost:9/api");
        assert_eq!(config.server.bind_addr, "0.0.0.0:80");
        // Untouched sections fall back to defaults
        assert_eq!(config.demagog.username, "demagog.org.pl");
        assert_eq!(config.database.path, PathBuf::from("pp.db"));
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [").unwrap();
        assert!(matches!(
            Config::load(Some(file.path())),
            Err(Error::Config(_))
        ));
    }
}
