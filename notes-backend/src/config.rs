use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Upper bound for JSON and multipart request bodies, in bytes.
    pub const MAX_BODY_BYTES: &str = "MAX_BODY_BYTES";
    pub const RENDER_TIMEOUT_SECS: &str = "RENDER_TIMEOUT_SECS";
    /// Set to "false" or "0" to escape raw HTML found in note sources.
    /// Default: true (embedded markup is passed through untouched).
    pub const RENDER_ALLOW_RAW_HTML: &str = "RENDER_ALLOW_RAW_HTML";
    pub const GRAMMAR_LANGUAGE: &str = "GRAMMAR_LANGUAGE";
    pub const GRAMMAR_TIMEOUT_SECS: &str = "GRAMMAR_TIMEOUT_SECS";
    /// Set to "true" or "1" to refuse to start when no grammar provider
    /// can be initialized. Default: false (start with grammar-check disabled).
    pub const GRAMMAR_REQUIRED: &str = "GRAMMAR_REQUIRED";
    /// Path to `languagetool-server.jar` for the local grammar engine.
    pub const LANGUAGETOOL_JAR: &str = "LANGUAGETOOL_JAR";
    /// Java executable used to launch the local engine (default: `java` on PATH).
    pub const LANGUAGETOOL_JAVA: &str = "LANGUAGETOOL_JAVA";
    pub const LANGUAGETOOL_LOCAL_PORT: &str = "LANGUAGETOOL_LOCAL_PORT";
    pub const LANGUAGETOOL_STARTUP_SECS: &str = "LANGUAGETOOL_STARTUP_SECS";
    /// Number of grammar checks allowed in flight against the local engine.
    pub const LANGUAGETOOL_LOCAL_PERMITS: &str = "LANGUAGETOOL_LOCAL_PERMITS";
    pub const LANGUAGETOOL_REMOTE_URL: &str = "LANGUAGETOOL_REMOTE_URL";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const BIND_ADDRESS: &str = "0.0.0.0";
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
    pub const RENDER_TIMEOUT_SECS: u64 = 10;
    pub const GRAMMAR_LANGUAGE: &str = "en-US";
    pub const GRAMMAR_TIMEOUT_SECS: u64 = 30;
    pub const LANGUAGETOOL_JAVA: &str = "java";
    pub const LANGUAGETOOL_LOCAL_PORT: u16 = 8081;
    pub const LANGUAGETOOL_STARTUP_SECS: u64 = 30;
    pub const LANGUAGETOOL_LOCAL_PERMITS: usize = 1;
    pub const LANGUAGETOOL_REMOTE_URL: &str = "https://api.languagetool.org";
}

/// Parse an environment variable, falling back to `default` when it is
/// missing or malformed.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("{} has invalid value {:?}, using default {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Boolean flags accept "1"/"true"/"yes"/"on" and "0"/"false"/"no"/"off".
fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                log::warn!("{} has invalid value {:?}, using default {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Settings for the grammar-check backends
#[derive(Clone, Debug)]
pub struct GrammarConfig {
    /// LanguageTool language code, e.g. "en-US"
    pub language: String,
    /// Upper bound for a single check, including the network round trip
    pub timeout: Duration,
    /// Refuse to start when neither provider initializes
    pub required: bool,
    pub local: LocalEngineConfig,
    pub remote_url: String,
}

/// How to launch the local LanguageTool server
#[derive(Clone, Debug)]
pub struct LocalEngineConfig {
    pub jar: Option<PathBuf>,
    pub java: String,
    pub port: u16,
    pub startup_timeout: Duration,
    pub permits: usize,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            language: defaults::GRAMMAR_LANGUAGE.to_string(),
            timeout: Duration::from_secs(defaults::GRAMMAR_TIMEOUT_SECS),
            required: false,
            local: LocalEngineConfig::default(),
            remote_url: defaults::LANGUAGETOOL_REMOTE_URL.to_string(),
        }
    }
}

impl Default for LocalEngineConfig {
    fn default() -> Self {
        Self {
            jar: None,
            java: defaults::LANGUAGETOOL_JAVA.to_string(),
            port: defaults::LANGUAGETOOL_LOCAL_PORT,
            startup_timeout: Duration::from_secs(defaults::LANGUAGETOOL_STARTUP_SECS),
            permits: defaults::LANGUAGETOOL_LOCAL_PERMITS,
        }
    }
}

impl GrammarConfig {
    pub fn from_env() -> Self {
        Self {
            language: env::var(env_vars::GRAMMAR_LANGUAGE)
                .unwrap_or_else(|_| defaults::GRAMMAR_LANGUAGE.to_string()),
            timeout: Duration::from_secs(env_or(
                env_vars::GRAMMAR_TIMEOUT_SECS,
                defaults::GRAMMAR_TIMEOUT_SECS,
            )),
            required: env_flag(env_vars::GRAMMAR_REQUIRED, false),
            local: LocalEngineConfig {
                jar: env::var(env_vars::LANGUAGETOOL_JAR)
                    .ok()
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
                java: env::var(env_vars::LANGUAGETOOL_JAVA)
                    .unwrap_or_else(|_| defaults::LANGUAGETOOL_JAVA.to_string()),
                port: env_or(env_vars::LANGUAGETOOL_LOCAL_PORT, defaults::LANGUAGETOOL_LOCAL_PORT),
                startup_timeout: Duration::from_secs(env_or(
                    env_vars::LANGUAGETOOL_STARTUP_SECS,
                    defaults::LANGUAGETOOL_STARTUP_SECS,
                )),
                permits: env_or(
                    env_vars::LANGUAGETOOL_LOCAL_PERMITS,
                    defaults::LANGUAGETOOL_LOCAL_PERMITS,
                )
                .max(1),
            },
            remote_url: env::var(env_vars::LANGUAGETOOL_REMOTE_URL)
                .unwrap_or_else(|_| defaults::LANGUAGETOOL_REMOTE_URL.to_string()),
        }
    }
}

/// Settings for the markdown rendering pipeline
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub timeout: Duration,
    pub allow_raw_html: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(defaults::RENDER_TIMEOUT_SECS),
            allow_raw_html: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub database_url: String,
    pub max_body_bytes: usize,
    pub render: RenderConfig,
    pub grammar: GrammarConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::BIND_ADDRESS.to_string(),
            port: defaults::PORT,
            database_url: defaults::DATABASE_URL.to_string(),
            max_body_bytes: defaults::MAX_BODY_BYTES,
            render: RenderConfig::default(),
            grammar: GrammarConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var(env_vars::BIND_ADDRESS)
                .unwrap_or_else(|_| defaults::BIND_ADDRESS.to_string()),
            port: env_or(env_vars::PORT, defaults::PORT),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            max_body_bytes: env_or(env_vars::MAX_BODY_BYTES, defaults::MAX_BODY_BYTES),
            render: RenderConfig {
                timeout: Duration::from_secs(env_or(
                    env_vars::RENDER_TIMEOUT_SECS,
                    defaults::RENDER_TIMEOUT_SECS,
                )),
                allow_raw_html: env_flag(env_vars::RENDER_ALLOW_RAW_HTML, true),
            },
            grammar: GrammarConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_when_unset() {
        assert_eq!(env_or("NOTES_BACKEND_TEST_UNSET_VAR", 42u16), 42);
    }

    #[test]
    fn test_env_flag_default_when_unset() {
        assert!(env_flag("NOTES_BACKEND_TEST_UNSET_FLAG", true));
        assert!(!env_flag("NOTES_BACKEND_TEST_UNSET_FLAG", false));
    }

    #[test]
    fn test_defaults_are_consistent() {
        let config = Config::default();
        assert_eq!(config.port, defaults::PORT);
        assert_eq!(config.database_url, defaults::DATABASE_URL);
        assert!(config.render.allow_raw_html);
        assert!(!config.grammar.required);
        assert!(config.grammar.local.jar.is_none());
        assert_eq!(config.grammar.local.permits, 1);
    }
}
