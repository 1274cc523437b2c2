use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
///
/// Production keeps request traces quiet; development shows regeneration
/// and invalidation events from the aggregator.
pub fn default_directives(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "info,tower_http=warn"
    } else {
        "debug,tower_http=debug,hyper=info"
    }
}

/// Installs the color-eyre report hook.
///
/// Call first thing in `main`, before anything fallible. Repeated calls are
/// ignored.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Installs the global subscriber with an `ErrorLayer` for span traces.
///
/// - Production (`APP_ENV=production`): flattened JSON lines, no targets
/// - Development: pretty output with targets
///
/// `RUST_LOG` overrides [`default_directives`]. A subscriber that is already
/// installed (common in tests) is left in place.
///
/// # Example with instrumentation
///
/// ```ignore
/// use tracing::instrument;
/// use eyre::{Result, WrapErr};
///
/// #[instrument(skip(registry), fields(manifest = %path.display()))]
/// async fn reload(registry: &InMemoryRegistry, path: &Path) -> Result<()> {
///     registry
///         .reload_manifest(path)
///         .await
///         .wrap_err("Failed to reload service manifest")
/// }
/// ```
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(()) => info!(?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}
