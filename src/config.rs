use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

/// Development fallback for the token signing secret. Matches what the
/// original deployment shipped with; any real deployment must override it.
const DEV_JWT_SECRET: &str = "your-secret-key";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub token_ttl_hours: i64,
}

impl Config {
    pub fn load() -> Self {
        let jwt_secret = match env::var("SCOREBOOK_JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                warn!(
                    "SCOREBOOK_JWT_SECRET not set; using the development \
                     default. Do not run production like this."
                );
                DEV_JWT_SECRET.to_string()
            }
        };

        Self {
            db_path: PathBuf::from(try_load::<String>(
                "SCOREBOOK_DB",
                "./scorebook.sqlite3",
            )),
            port: try_load("SCOREBOOK_PORT", "5000"),
            jwt_secret,
            bcrypt_cost: try_load("SCOREBOOK_BCRYPT_COST", "10"),
            token_ttl_hours: try_load("SCOREBOOK_TOKEN_TTL_HOURS", "24"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
