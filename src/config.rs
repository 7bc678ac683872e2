use axum_extra::extract::cookie::Key;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment keys read by [`Config::load`]. Matching is case-insensitive,
/// so `ADMIN_USER` and `admin_user` both work.
const ENV_KEYS: &[&str] = &[
    "database_url",
    "listen_addr",
    "admin_user",
    "admin_pass",
    "cookie_key",
    "loglevel",
    "insecure_cookie",
];

/// Master key length required by `Key::try_from`.
const MIN_COOKIE_KEY_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// sqlx connection string for the blog store.
    pub database_url: String,
    pub listen_addr: String,
    /// Admin account seeded on first run only.
    pub admin_user: String,
    pub admin_pass: String,
    /// Master secret for the private session cookie. A random key is used
    /// when unset, which logs everyone out on restart.
    pub cookie_key: Option<String>,
    pub loglevel: String,
    /// Drop the `Secure` flag from the session cookie (plain-http development).
    pub insecure_cookie: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:db.sqlite".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            admin_user: "admin".to_string(),
            admin_pass: String::new(),
            cookie_key: None,
            loglevel: "info".to_string(),
            insecure_cookie: false,
        }
    }
}

impl Config {
    /// Layer process environment over built-in defaults.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
    }

    pub fn cookie_key(&self) -> Key {
        match self.cookie_key.as_deref().map(str::as_bytes) {
            Some(secret) if secret.len() >= MIN_COOKIE_KEY_LEN => match Key::try_from(secret) {
                Ok(key) => key,
                Err(e) => {
                    warn!(error = %e, "cookie_key rejected; falling back to a random key");
                    Key::generate()
                }
            },
            Some(_) => {
                warn!(
                    min_len = MIN_COOKIE_KEY_LEN,
                    "cookie_key too short; falling back to a random key"
                );
                Key::generate()
            }
            None => Key::generate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_empty_environment() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let cfg = Config::load()?;
            assert_eq!(cfg.database_url, "sqlite:db.sqlite");
            assert_eq!(cfg.listen_addr, "0.0.0.0:8000");
            assert!(!cfg.insecure_cookie);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("ADMIN_USER", "editor");
            jail.set_env("INSECURE_COOKIE", "true");
            jail.set_env("DATABASE_URL", "sqlite:blog-test.sqlite");
            let cfg = Config::load()?;
            assert_eq!(cfg.admin_user, "editor");
            assert!(cfg.insecure_cookie);
            assert_eq!(cfg.database_url, "sqlite:blog-test.sqlite");
            Ok(())
        });
    }

    #[test]
    fn long_cookie_key_is_stable_across_calls() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("COOKIE_KEY", "k".repeat(MIN_COOKIE_KEY_LEN));
            let cfg = Config::load()?;
            assert!(cfg.cookie_key() == cfg.cookie_key());

            let other = Config {
                cookie_key: Some("j".repeat(MIN_COOKIE_KEY_LEN)),
                ..cfg.clone()
            };
            assert!(cfg.cookie_key() != other.cookie_key());
            Ok(())
        });
    }

    #[test]
    fn short_cookie_key_falls_back_to_random() {
        let cfg = Config {
            cookie_key: Some("too short".to_string()),
            ..Config::default()
        };
        assert!(cfg.cookie_key() != cfg.cookie_key());
    }
}
