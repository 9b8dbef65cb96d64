//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`] which configures the `tracing` subscriber and
//! publishes its configuration as a global.
//!
//! # Lifecycle
//!
//! - **`build()`** publishes [`TracingConfig`] so other plugins can read the
//!   intended configuration while they build.
//! - **`ready()`** installs the subscriber. Deferring it until every plugin is
//!   built means nothing is logged through a half-configured subscriber.
//!
//! Installing a subscriber is process-wide. If one is already installed
//! (a second server in the same process, or a test harness), the plugin
//! leaves it in place.
//!
//! # Environment Filter
//!
//! Use [`with_env_filter`](TracingPlugin::with_env_filter) for per-target
//! levels, e.g. to follow rebuilds closely while keeping the host quiet:
//!
//! ```
//! use phoenix_core_plugins::TracingPlugin;
//!
//! TracingPlugin::default()
//!     .with_env_filter("phoenix_swap=trace,phoenix_system=warn")
//! # ;
//! ```

use phoenix_system::plugin::{Plugin, Version};
use phoenix_system::resource::GlobalResource;
use phoenix_system::server::Server;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON lines for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig Resource
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration, published as a global.
///
/// ```
/// use phoenix_system::server::Server;
/// use phoenix_core_plugins::{TracingConfig, TracingPlugin};
/// use tracing::Level;
///
/// let mut server = Server::new();
/// server.add_plugins(TracingPlugin::default().with_level(Level::WARN));
/// server.finish();
///
/// let config = server.get_global::<TracingConfig>().unwrap();
/// assert_eq!(config.level, Level::WARN);
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Maximum log level.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
    /// Filter directives, if any were configured.
    pub env_filter: Option<String>,
}

impl GlobalResource for TracingConfig {}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// # Resources Provided
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`TracingConfig`] | Global | Tracing configuration (read-only) |
///
/// # Configuration Options
///
/// ```
/// use phoenix_core_plugins::{TracingPlugin, TracingFormat};
/// use tracing::Level;
///
/// // Development: see every construction step
/// let dev = TracingPlugin::default()
///     .with_level(Level::TRACE)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Production: JSON, rebuild outcomes only
/// let prod = TracingPlugin::default()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("phoenix_swap=info");
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    level: Level,
    format: TracingFormat,
    /// Filter directives (e.g. `"phoenix_swap=debug"`).
    env_filter: Option<String>,
    /// Whether to emit span enter/exit events.
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates a `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets filter directives, `target=level,target=level,...`.
    ///
    /// Invalid directives fall back to the plain level filter.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Builds the filter, plus the parse error when the configured
    /// directives were rejected in favor of the level filter.
    fn filter(&self) -> (EnvFilter, Option<ParseError>) {
        let by_level = || EnvFilter::new(self.level.as_str());
        match &self.env_filter {
            Some(directives) => match EnvFilter::try_new(directives) {
                Ok(filter) => (filter, None),
                Err(err) => (by_level(), Some(err)),
            },
            None => (by_level(), None),
        }
    }
}

impl Plugin for TracingPlugin {
    const ID: &'static str = "phoenix::tracing";
    const VERSION: Version = Version::new(0, 0, 1);

    fn build(&self, server: &mut Server) {
        server.insert_global(TracingConfig {
            level: self.level,
            format: self.format,
            env_filter: self.env_filter.clone(),
        });
    }

    fn ready(&self, _server: &mut Server) {
        let (env_filter, rejected) = self.filter();
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init fails only when a subscriber is already installed.
        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init(),
        };

        tracing::info!(
            level = %self.level,
            format = ?self.format,
            installed = installed.is_ok(),
            "TracingPlugin initialized"
        );

        // Reported only now so the warning reaches the subscriber just installed.
        if let Some(err) = rejected {
            tracing::warn!(
                %err,
                directives = self.env_filter.as_deref().unwrap_or_default(),
                "invalid filter directives, using level only"
            );
        }
    }

    fn cleanup(&self, _server: &mut Server) {
        tracing::info!("TracingPlugin shutting down");
    }
}
