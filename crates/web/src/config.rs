//! Configuration du serveur web

use promoter_core::PipelineConfig;
use serde::Deserialize;
use std::time::Duration;

/// Configuration du serveur
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Taille maximale d'un corps JSON (FASTA compris)
    pub json_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 4,
            json_limit: 4 * 1024 * 1024, // 4MB
        }
    }
}

/// Configuration de la base de données
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub enabled: bool,
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "sqlite://promoter.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Classifieur externe: commande lancée pour chaque validation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration complète de l'application
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
    pub classifier: ClassifierConfig,
}

/// Configuration du logging
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl AppConfig {
    /// Charge la configuration depuis un fichier (optionnel) puis l'environnement.
    ///
    /// Les variables `PROMOTER__SECTION__CLE` surchargent le fichier,
    /// par exemple `PROMOTER__SERVER__PORT=9000`.
    pub fn load_from_file(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PROMOTER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize::<AppConfig>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(!config.database.enabled);
        assert!(config.classifier.command.is_none());
        assert_eq!(config.pipeline.default_analyst_id, "ANALYST001");
        assert_eq!(config.pipeline.rules.min_length, 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = std::env::temp_dir().join(format!("promoter-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[classifier]\ncommand = \"./classify.sh\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = AppConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.classifier.command.as_deref(), Some("./classify.sh"));
        assert_eq!(config.classifier.timeout(), Duration::from_secs(5));
        assert_eq!(config.logging.level, "info");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_motif_catalog_from_file() {
        let dir = std::env::temp_dir().join(format!("promoter-motifs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("motifs.toml");
        std::fs::write(
            &path,
            "[[pipeline.motifs]]\nname = \"TATA Box\"\npattern = \"TATAAA\"\n\n\
             [[pipeline.motifs]]\nname = \"GC Box\"\npattern = \"GGGCGG\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from_file(path.to_str().unwrap()).unwrap();
        let motifs = config.pipeline.motifs.motifs();
        assert_eq!(motifs.len(), 2);
        assert_eq!(motifs[0].name(), "TATA Box");
        assert_eq!(motifs[1].pattern(), "GGGCGG");
        assert_eq!(config.pipeline.rules.min_length, 10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("does-not-exist/config").unwrap();
        assert_eq!(config.server.workers, 4);
    }
}
