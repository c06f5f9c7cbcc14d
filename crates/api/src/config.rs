//! Startup configuration, read once from the environment.

use std::net::SocketAddr;

use anyhow::{Context, bail};
use chrono::Duration;

use innkeep_auth::{AccessPolicy, AccessRule, Role, SigningSecret};

/// Used only when `APP_ENV=development` and `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "innkeep-dev-secret-not-for-production";

pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<&str>) -> anyhow::Result<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("production") | Some("prod") => Ok(Environment::Production),
            Some("development") | Some("dev") | Some("local") => Ok(Environment::Development),
            Some(other) => bail!("APP_ENV must be 'development' or 'production', got '{other}'"),
        }
    }
}

/// Account created at startup so a fresh deployment has an administrator.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub identifier: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    pub jwt_secret: SigningSecret,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub access_rules: Vec<AccessRule>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(lookup("APP_ENV").as_deref())?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a socket address")?;

        let jwt_secret = match (lookup("JWT_SECRET").filter(|s| !s.is_empty()), environment) {
            (Some(secret), Environment::Production) if secret.len() < MIN_PRODUCTION_SECRET_LEN => {
                bail!("JWT_SECRET must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production")
            }
            (Some(secret), _) => SigningSecret::new(secret),
            (None, Environment::Development) => {
                tracing::warn!("JWT_SECRET not set; using insecure development secret");
                SigningSecret::new(DEV_JWT_SECRET)
            }
            (None, Environment::Production) => {
                bail!("JWT_SECRET must be set (set APP_ENV=development for a local dev secret)")
            }
        };

        let ttl_secs = match lookup("TOKEN_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .context("TOKEN_TTL_SECS must be an integer")?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
            bail!("TOKEN_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}");
        }
        let token_ttl = Duration::try_seconds(ttl_secs).context("TOKEN_TTL_SECS is out of range")?;

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => raw.trim().parse::<u32>().context("BCRYPT_COST must be an integer")?,
            None => bcrypt::DEFAULT_COST,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }

        let access_rules = match lookup("ACCESS_RULES_FILE") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading ACCESS_RULES_FILE {path}"))?;
                serde_json::from_str::<Vec<AccessRule>>(&raw)
                    .with_context(|| format!("parsing ACCESS_RULES_FILE {path}"))?
            }
            None => default_access_rules(),
        };
        AccessPolicy::new(access_rules.clone()).context("invalid access rules")?;

        let bootstrap_admin = match (lookup("ADMIN_IDENTIFIER"), lookup("ADMIN_PASSWORD")) {
            (Some(identifier), Some(password)) => Some(BootstrapAdmin { identifier, password }),
            (None, None) => None,
            _ => bail!("ADMIN_IDENTIFIER and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            environment,
            bind_addr,
            jwt_secret,
            token_ttl,
            bcrypt_cost,
            access_rules,
            bootstrap_admin,
        })
    }

    /// Development config with the given secret and a cheap hash cost.
    pub fn local(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            environment: Environment::Development,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: SigningSecret::new(secret),
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            bcrypt_cost: 4,
            access_rules: default_access_rules(),
            bootstrap_admin: None,
        }
    }
}

/// Built-in rule table. Paths not listed here are public.
pub fn default_access_rules() -> Vec<AccessRule> {
    vec![
        AccessRule::role("/api/admin", Role::ADMIN),
        AccessRule::authenticated("/api/bookings"),
        AccessRule::authenticated("/api/me"),
    ]
}
