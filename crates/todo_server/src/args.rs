use std::path::PathBuf;

use clap::Parser;
use todo_core::config::{self, Config, ConfigOverrides};
use todo_core::error::AppError;
use todo_core::storage::StorageKind;

/// CLI arguments for the todo server. Flags win over environment variables,
/// which win over the config file.
#[derive(Parser, Debug, Default)]
#[command(version, about = "Todo list REST server")]
pub struct ServerArgs {
    /// Address to bind (default 127.0.0.1:3001).
    #[arg(short, long, env = "TODOAPP_BIND")]
    pub bind: Option<String>,

    /// Config file (default: ~/.config/todoapp/config.json).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where todos live: memory or file.
    #[arg(long)]
    pub storage: Option<StorageKind>,

    /// JSON store path for file storage.
    #[arg(long)]
    pub store_path: Option<PathBuf>,

    /// Insert two sample todos when the store starts empty.
    #[arg(long)]
    pub seed_demo: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, env = "TODOAPP_LOG")]
    pub log_level: Option<String>,
}

impl ServerArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_addr: self.bind.clone(),
            storage: self.storage,
            store_path: self.store_path.clone(),
            seed_demo: self.seed_demo.then_some(true),
            log_level: self.log_level.clone(),
            ..ConfigOverrides::default()
        }
    }

    /// Resolves the effective config. An explicit `--config` must load; the
    /// default location falls back to defaults and hands back the error so
    /// it can be logged once tracing is up.
    pub fn resolve_config(&self) -> Result<(Config, Option<AppError>), AppError> {
        let (base, warning) = match self.config.as_deref() {
            Some(path) => (config::load_config_from_path(path)?, None),
            None => {
                let loaded = config::load_config_with_fallback();
                (loaded.config, loaded.error)
            }
        };
        Ok((config::merge_overrides(&base, &self.overrides()), warning))
    }
}

#[cfg(test)]
mod tests {
    use super::ServerArgs;
    use clap::Parser;
    use todo_core::storage::StorageKind;

    #[test]
    fn parses_storage_and_seed_flags() {
        let args = ServerArgs::try_parse_from([
            "todo_server",
            "--bind",
            "0.0.0.0:9000",
            "--storage",
            "file",
            "--seed-demo",
        ])
        .unwrap();

        let overrides = args.overrides();
        assert_eq!(overrides.bind_addr.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(overrides.storage, Some(StorageKind::File));
        assert_eq!(overrides.seed_demo, Some(true));
    }

    #[test]
    fn seed_flag_absent_leaves_config_value() {
        let args = ServerArgs::default();
        assert_eq!(args.overrides().seed_demo, None);
    }

    #[test]
    fn rejects_unknown_storage() {
        let result = ServerArgs::try_parse_from(["todo_server", "--storage", "redis"]);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let args = ServerArgs {
            config: Some("/nonexistent/todoapp/config.json".into()),
            ..ServerArgs::default()
        };

        let err = args.resolve_config().unwrap_err();
        assert_eq!(err.code(), "io_error");
    }
}
