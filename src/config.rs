//! Service configuration, read from environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `GENERATOR` | `llm` if `GROQ_API_KEY` is set, else `template` |
//! | `GROQ_API_KEY` | unset |
//! | `LLM_API_URL` | Groq chat-completions URL |
//! | `LLM_MODEL` | `llama-3.3-70b-versatile` |
//! | `LLM_TEMPERATURE` | `0.8` |
//! | `SUPABASE_URL` + `SUPABASE_SERVICE_ROLE_KEY` | unset (selects Supabase storage) |
//! | `DATABASE_PATH` | `harada.db` (SQLite, used when Supabase is not configured) |
//! | `PUBLIC_BASE_URL` | `http://localhost:5173` |

use std::path::PathBuf;
use thiserror::Error;

use crate::generator::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::llm::GROQ_API_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} must be set when GENERATOR=llm")]
    MissingApiKey(&'static str),
}

/// Which generator serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    Llm,
    Template,
}

impl std::str::FromStr for GeneratorMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" | "ai" => Ok(Self::Llm),
            "template" | "templates" => Ok(Self::Template),
            _ => Err(()),
        }
    }
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub temperature: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: GROQ_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Where grids are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Supabase { url: String, service_role_key: String },
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub generator: GeneratorMode,
    pub llm: LlmSettings,
    pub storage: StorageConfig,
    /// Base URL of the web app, used to build share links.
    pub public_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            generator: GeneratorMode::Template,
            llm: LlmSettings::default(),
            storage: StorageConfig::Sqlite {
                path: PathBuf::from("harada.db"),
            },
            public_base_url: "http://localhost:5173".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value,
            })?,
            None => defaults.port,
        };

        let temperature = match var("LLM_TEMPERATURE") {
            Some(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| (0.0..=2.0).contains(t))
                .ok_or(ConfigError::InvalidValue {
                    name: "LLM_TEMPERATURE",
                    value,
                })?,
            None => defaults.llm.temperature,
        };

        let api_key = var("GROQ_API_KEY");
        let generator = match var("GENERATOR") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "GENERATOR",
                value,
            })?,
            None if api_key.is_some() => GeneratorMode::Llm,
            None => GeneratorMode::Template,
        };
        if generator == GeneratorMode::Llm && api_key.is_none() {
            return Err(ConfigError::MissingApiKey("GROQ_API_KEY"));
        }

        let storage = match (var("SUPABASE_URL"), var("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => StorageConfig::Supabase {
                url,
                service_role_key,
            },
            _ => StorageConfig::Sqlite {
                path: var("DATABASE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("harada.db")),
            },
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            generator,
            llm: LlmSettings {
                api_key,
                api_url: var("LLM_API_URL").unwrap_or(defaults.llm.api_url),
                model: var("LLM_MODEL").unwrap_or(defaults.llm.model),
                temperature,
            },
            storage,
            public_base_url: var("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.generator, GeneratorMode::Template);
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(
            config.storage,
            StorageConfig::Sqlite {
                path: PathBuf::from("harada.db")
            }
        );
    }

    #[test]
    fn test_api_key_enables_llm() {
        let config = config_from(&[("GROQ_API_KEY", "gsk_test")]).unwrap();
        assert_eq!(config.generator, GeneratorMode::Llm);

        let config =
            config_from(&[("GROQ_API_KEY", "gsk_test"), ("GENERATOR", "template")]).unwrap();
        assert_eq!(config.generator, GeneratorMode::Template);
    }

    #[test]
    fn test_llm_without_key_fails() {
        assert!(matches!(
            config_from(&[("GENERATOR", "llm")]),
            Err(ConfigError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("LLM_TEMPERATURE", "5")]).is_err());
        assert!(config_from(&[("GENERATOR", "magic")]).is_err());
    }

    #[test]
    fn test_supabase_storage() {
        let config = config_from(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "srk"),
            ("PUBLIC_BASE_URL", "https://harada.app/"),
        ])
        .unwrap();
        assert!(matches!(config.storage, StorageConfig::Supabase { .. }));
        assert_eq!(config.public_base_url, "https://harada.app");
    }
}
