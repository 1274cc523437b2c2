use core_config::docs::DocsConfig;
use core_config::{AppInfo, FromEnv, app_info, env_or_default, server::ServerConfig};
use std::path::PathBuf;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub docs: DocsConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// YAML or JSON list of services loaded into the registry
    pub services_manifest: PathBuf,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let app = app_info!();
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let docs = DocsConfig::from_env_for(&app)?; // Credentials required in production

        Ok(Self {
            app,
            docs,
            server,
            environment,
            services_manifest: PathBuf::from(env_or_default(
                "DOCS_SERVICES_MANIFEST",
                "services.yaml",
            )),
        })
    }

    /// Snapshots are written outside production only
    pub fn snapshot_dir(&self) -> Option<&PathBuf> {
        (!self.environment.is_production()).then_some(&self.docs.snapshot_dir)
    }
}
