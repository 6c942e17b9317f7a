use std::env;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where appointments and the doctor directory are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "supabase" => Ok(StorageBackend::Supabase),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub storage_backend: StorageBackend,
    pub meeting_base_url: String,
    pub host: String,
    pub port: u16,
    pub max_availability_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: String::new(),
            storage_backend: StorageBackend::Memory,
            meeting_base_url: "https://meet.jit.si".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_availability_days: 62,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_default(),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            storage_backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|value| match value.parse() {
                    Ok(backend) => Some(backend),
                    Err(e) => {
                        warn!("{}, falling back to in-memory storage", e);
                        None
                    }
                })
                .unwrap_or(defaults.storage_backend),
            meeting_base_url: env::var("MEETING_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.meeting_base_url),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_or_default("PORT", defaults.port),
            max_availability_days: at_least_one(
                "MAX_AVAILABILITY_DAYS",
                parse_or_default("MAX_AVAILABILITY_DAYS", defaults.max_availability_days),
                defaults.max_availability_days,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// True when every setting needed by the selected storage backend is present.
    pub fn is_configured(&self) -> bool {
        match self.storage_backend {
            StorageBackend::Memory => !self.supabase_jwt_secret.is_empty(),
            StorageBackend::Supabase => {
                !self.supabase_url.is_empty()
                    && !self.supabase_anon_key.is_empty()
                    && !self.supabase_jwt_secret.is_empty()
            }
        }
    }

    /// Key sent as bearer for server-side PostgREST calls.
    pub fn storage_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn parse_or_default<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn at_least_one(name: &str, value: i64, default: i64) -> i64 {
    if value < 1 {
        warn!("{} must be at least 1, got {}, using {}", name, value, default);
        return default;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("Supabase".parse::<StorageBackend>(), Ok(StorageBackend::Supabase));
        assert_eq!(" memory ".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("postgres".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn availability_range_cap_must_be_positive() {
        assert_eq!(at_least_one("MAX_AVAILABILITY_DAYS", 0, 62), 62);
        assert_eq!(at_least_one("MAX_AVAILABILITY_DAYS", -5, 62), 62);
        assert_eq!(at_least_one("MAX_AVAILABILITY_DAYS", 1, 62), 1);
        assert_eq!(at_least_one("MAX_AVAILABILITY_DAYS", 90, 62), 90);
    }

    #[test]
    fn storage_key_prefers_service_role() {
        let mut config = AppConfig {
            supabase_anon_key: "anon".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.storage_key(), "anon");

        config.supabase_service_role_key = "service".to_string();
        assert_eq!(config.storage_key(), "service");
    }
}
