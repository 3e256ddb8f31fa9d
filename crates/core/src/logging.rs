//! Système de logging pour la validation de promoteurs

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise le logging avec un niveau par défaut, `RUST_LOG` restant prioritaire
pub fn init_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Sans effet si un subscriber global est déjà installé (tests)
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Niveau de log correspondant à un compteur `-v`
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Macro pour le logging des opérations critiques
#[macro_export]
macro_rules! log_operation {
    ($name:expr, $block:block) => {{
        let span = $crate::__tracing::span!($crate::__tracing::Level::INFO, $name);
        let _enter = span.enter();
        $crate::__tracing::info!("Début de l'opération: {}", $name);
        let result = $block;
        $crate::__tracing::info!("Fin de l'opération: {}", $name);
        result
    }};
}

/// Macro pour le logging des erreurs
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {{
        $crate::__tracing::error!("Erreur: {}", $error);
        $error
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(9), "trace");
    }

    #[test]
    fn test_log_operation_returns_block_value() {
        let value = crate::log_operation!("test", { 21 * 2 });
        assert_eq!(value, 42);
    }
}
