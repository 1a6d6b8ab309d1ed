// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Service configuration.
//!
//! Values are layered, later sources winning:
//!
//! 1. Built-in defaults
//! 2. `config/haven.{toml,yaml,json}` if present
//! 3. `HAVEN__SECTION__KEY` environment variables
//! 4. `DATABASE_URL`, `JWT_SECRET` and `PORT` as conventional fallbacks
//!
//! ```bash
//! HAVEN__SERVER__PORT=8080 \
//! HAVEN__CORS__ALLOWED_ORIGINS=https://shop.example,https://admin.example \
//! DATABASE_URL=postgres://localhost/haven \
//! JWT_SECRET=change-me \
//! haven
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Secret used when none is configured. Never suitable for production.
pub const DEFAULT_SECRET: &str = "your-secret-key";

/// Root settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Listener.
    pub server:   ServerSettings,
    /// Persistence.
    pub database: DatabaseSettings,
    /// Token signing.
    pub auth:     AuthSettings,
    /// Cross-origin policy.
    pub cors:     CorsSettings,
    /// Log output.
    pub log:      LogSettings
}

/// Listener address.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001
        }
    }
}

impl ServerSettings {
    /// `host:port` for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// PostgreSQL connection.
///
/// Without a `url` the service runs on the in-memory store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url:             Option<String>,
    pub max_connections: u32,
    pub run_migrations:  bool
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url:             None,
            max_connections: 10,
            run_migrations:  true
        }
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub secret:            String,
    pub token_ttl_minutes: i64
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret:            DEFAULT_SECRET.to_string(),
            token_ttl_minutes: 60
        }
    }
}

impl AuthSettings {
    /// Whether the built-in development secret is in use.
    pub fn is_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

/// Origins allowed to call the API from a browser.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()]
        }
    }
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json:   bool
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "haven=info,tower_http=info".to_string(),
            json:   false
        }
    }
}

impl Settings {
    /// Load settings from file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .add_source(File::with_name("config/haven").required(false))
            .add_source(
                Environment::with_prefix("HAVEN")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true)
            )
            .build()?
            .try_deserialize()?;

        Ok(settings.with_fallbacks(|key| std::env::var(key).ok()))
    }

    /// Apply conventional unprefixed variables where the prefixed ones are
    /// absent.
    fn with_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.database.url.is_none() {
            self.database.url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        }
        if self.auth.is_default_secret()
            && let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty())
        {
            self.auth.secret = secret;
        }
        if self.server.port == ServerSettings::default().port
            && let Some(port) = lookup("PORT").and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.server.addr(), "0.0.0.0:3001");
        assert!(s.database.url.is_none());
        assert!(s.auth.is_default_secret());
        assert_eq!(s.auth.token_ttl_minutes, 60);
        assert_eq!(s.cors.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn fallbacks_fill_missing_values() {
        let s = Settings::default().with_fallbacks(lookup(&[
            ("DATABASE_URL", "postgres://localhost/haven"),
            ("JWT_SECRET", "s3cret"),
            ("PORT", "8080")
        ]));
        assert_eq!(s.database.url.as_deref(), Some("postgres://localhost/haven"));
        assert_eq!(s.auth.secret, "s3cret");
        assert_eq!(s.server.port, 8080);
    }

    #[test]
    fn fallbacks_do_not_override_configured_values() {
        let mut s = Settings::default();
        s.database.url = Some("postgres://primary/haven".into());
        s.auth.secret = "configured".into();
        let s = s.with_fallbacks(lookup(&[
            ("DATABASE_URL", "postgres://other/haven"),
            ("JWT_SECRET", "other"),
            ("PORT", "not-a-port")
        ]));
        assert_eq!(s.database.url.as_deref(), Some("postgres://primary/haven"));
        assert_eq!(s.auth.secret, "configured");
        assert_eq!(s.server.port, 3001);
    }
}
