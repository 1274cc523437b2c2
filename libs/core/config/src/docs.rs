use crate::{
    env_optional, env_or_default, env_parse_or, env_required, AppInfo, ConfigError, Environment,
    FromEnv,
};
use std::fmt;
use std::path::PathBuf;

const DEFAULT_LOGIN: &str = "your-login";
const DEFAULT_PASSWORD: &str = "your-password";

/// Contact block published in the generated API description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactConfig {
    pub name: String,
    pub url: String,
    pub email: String,
}

/// Login/password pair guarding the private API description.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateDocsCredentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for PrivateDocsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateDocsCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for the aggregated API documentation service.
#[derive(Clone, Debug)]
pub struct DocsConfig {
    pub package_name: String,
    pub package_version: String,
    pub description: String,
    pub copyright_start_year: i32,
    pub sandbox_url: String,
    pub production_url: String,
    pub contact: ContactConfig,
    pub credentials: PrivateDocsCredentials,
    /// Directory receiving `openapi.json` / `openapi-private.json` outside production
    pub snapshot_dir: PathBuf,
    /// Optional JSON or YAML document merged over the built-in template
    pub override_path: Option<PathBuf>,
}

impl DocsConfig {
    /// Reads the configuration, defaulting package name and version to `app`.
    ///
    /// Environment variables:
    /// - `DOCS_PACKAGE_NAME`, `DOCS_PACKAGE_VERSION`, `DOCS_DESCRIPTION`
    /// - `DOCS_COPYRIGHT_START_YEAR` (default 2024)
    /// - `DOCS_SANDBOX_URL`, `DOCS_PRODUCTION_URL`
    /// - `DOCS_CONTACT_NAME`, `DOCS_CONTACT_URL`, `DOCS_CONTACT_EMAIL`
    /// - `DOCS_PRIVATE_LOGIN`, `DOCS_PRIVATE_PASSWORD`: required when `APP_ENV=production`
    /// - `DOCS_SNAPSHOT_DIR` (default `public`), `DOCS_OVERRIDE_PATH` (optional)
    pub fn from_env_for(app: &AppInfo) -> Result<Self, ConfigError> {
        let environment = Environment::from_env();

        let credentials = if environment.is_production() {
            PrivateDocsCredentials {
                login: env_required("DOCS_PRIVATE_LOGIN")?,
                password: env_required("DOCS_PRIVATE_PASSWORD")?,
            }
        } else {
            PrivateDocsCredentials {
                login: env_or_default("DOCS_PRIVATE_LOGIN", DEFAULT_LOGIN),
                password: env_or_default("DOCS_PRIVATE_PASSWORD", DEFAULT_PASSWORD),
            }
        };

        Ok(Self {
            package_name: env_or_default("DOCS_PACKAGE_NAME", app.name),
            package_version: env_or_default("DOCS_PACKAGE_VERSION", app.version),
            description: env_or_default(
                "DOCS_DESCRIPTION",
                "Aggregated API description generated from the live service registry.",
            ),
            copyright_start_year: env_parse_or("DOCS_COPYRIGHT_START_YEAR", 2024)?,
            sandbox_url: env_or_default("DOCS_SANDBOX_URL", "http://localhost:8080/api"),
            production_url: env_or_default("DOCS_PRODUCTION_URL", "https://api.example.com/api"),
            contact: ContactConfig {
                name: env_or_default("DOCS_CONTACT_NAME", "API Support"),
                url: env_or_default("DOCS_CONTACT_URL", "https://example.com/support"),
                email: env_or_default("DOCS_CONTACT_EMAIL", "support@example.com"),
            },
            credentials,
            snapshot_dir: PathBuf::from(env_or_default("DOCS_SNAPSHOT_DIR", "public")),
            override_path: env_optional("DOCS_OVERRIDE_PATH").map(PathBuf::from),
        })
    }
}

impl FromEnv for DocsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_for(&crate::app_info!())
    }
}
