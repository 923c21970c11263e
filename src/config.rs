use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Knobs of the facets queries and their caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetsSettings {
    /// The site's primary content locale.
    pub default_locale: String,
    /// Content categories that appear in topic and product listings.
    pub default_categories: Vec<i32>,
    /// Lifetime of the cached anonymous result lists, in seconds.
    pub cache_default_timeout_secs: u64,
    /// Lifetime of the cached helpful-vote aggregates, in seconds.
    pub cache_long_timeout_secs: u64,
    /// Width of the helpful-vote window, in days.
    pub vote_window_days: i64,
}

impl Default for FacetsSettings {
    fn default() -> Self {
        Self {
            default_locale: "en-US".to_string(),
            default_categories: vec![10, 20, 30],
            cache_default_timeout_secs: 300,
            cache_long_timeout_secs: 60 * 60 * 24,
            vote_window_days: 30,
        }
    }
}

impl FacetsSettings {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_default_timeout_secs)
    }

    pub fn long_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_long_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mount the demo login routes and honour demo sessions.
    pub demo_mode: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            demo_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "kbfacets".to_string(),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub mongodb: MongoSettings,
    pub facets: FacetsSettings,
}

#[cfg(feature = "server")]
impl Settings {
    /// Layer built-in defaults, an optional config file and `KBFACETS__*`
    /// environment variables (e.g. `KBFACETS__FACETS__DEFAULT_LOCALE=de`).
    pub fn load(path: Option<&str>) -> Result<Self, crate::error::AppError> {
        let file = path.unwrap_or("kbfacets");

        let settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(path.is_some()))
            .add_source(
                config::Environment::with_prefix("KBFACETS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("facets.default_categories")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.facets.default_locale, "en-US");
        assert_eq!(settings.facets.default_categories, vec![10, 20, 30]);
        assert_eq!(settings.facets.default_timeout(), Duration::from_secs(300));
        assert_eq!(settings.facets.long_timeout(), Duration::from_secs(86_400));
        assert_eq!(settings.server.port, 3000);
        assert!(!settings.server.demo_mode);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let json = r###"{ "facets": { "default_locale": "de" } }"###;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.facets.default_locale, "de");
        assert_eq!(settings.facets.vote_window_days, 30);
        assert_eq!(settings.mongodb.database, "kbfacets");
    }

    #[test]
    fn test_demo_mode_opt_in() {
        let json = r###"{ "server": { "demo_mode": true } }"###;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.server.demo_mode);
        assert_eq!(settings.server.port, 3000);
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.facets.default_categories, vec![10, 20, 30]);
    }
}
