//! Pool reload demo.
//!
//! Two pools are registered against a library reporting `4.2.0.Final`, so the
//! first refresh takes the legacy path. The library is then upgraded to
//! `5.4.1.Final` and the next refresh takes the modern path. A third refresh
//! makes one rebuild fail to show that the other pool is still swapped and
//! the failed one keeps serving from its previous instance.
//!
//! # Usage
//!
//! ```bash
//! pool-reload
//! RUST_LOG=phoenix_swap=debug pool-reload
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use example::{Pool, PoolLibrary, PoolUnit, Workers};
use phoenix_core_plugins::{TracingFormat, TracingPlugin};
use phoenix_swap::{
    BoxError, ConstructionParams, Descriptor, HotSwapPlugin, OnRefresh, Properties,
    RefreshCoordinator, ResourceRegistry,
};
use phoenix_system::server::Server;
use serde_json::json;

const SETTLE: Duration = Duration::from_millis(50);

fn main() -> Result<(), BoxError> {
    let library = PoolLibrary::new("4.2.0.Final");

    let mut tracing_plugin = TracingPlugin::default().with_format(TracingFormat::Compact);
    if let Ok(filter) = std::env::var("RUST_LOG") {
        tracing_plugin = tracing_plugin.with_env_filter(filter);
    }

    let mut server = Server::new();
    server.add_plugins(tracing_plugin);
    server.add_plugins(HotSwapPlugin::<dyn Pool>::for_library(Arc::new(library.clone())));
    server.finish();

    let registry = server
        .get_global::<ResourceRegistry<dyn Pool>>()
        .ok_or("hot-swap registry was not published")?
        .clone();

    let orders_params =
        ConstructionParams::named("orders", properties("postgres://db/orders", 1_000_000));
    let billing_params = ConstructionParams::described(
        "billing",
        Descriptor::new(PoolUnit {
            url: "postgres://db/billing".into(),
        }),
        properties("postgres://db/billing", 1_000_000),
    );

    let orders = registry.register(library.open(&orders_params)?, orders_params)?;
    let billing = registry.register(library.open(&billing_params)?, billing_params)?;
    tracing::info!(
        orders = orders.serial(),
        billing = billing.serial(),
        "pools opened"
    );

    let workers = Workers::spawn(&[orders.clone(), billing.clone()], 4);
    thread::sleep(SETTLE);

    server.tick::<OnRefresh>();
    log_report(&server, "legacy refresh");
    thread::sleep(SETTLE);

    library.set_version("5.4.1.Final");
    server.tick::<OnRefresh>();
    log_report(&server, "modern refresh");
    thread::sleep(SETTLE);

    library.fail_next_build("orders");
    let before = orders.serial();
    server.tick::<OnRefresh>();
    log_report(&server, "refresh with a failing pool");
    tracing::info!(
        before,
        after = orders.serial(),
        "orders kept its previous instance"
    );
    thread::sleep(SETTLE);

    let summary = workers.join();
    tracing::info!(
        checkouts = summary.checkouts,
        errors = summary.errors,
        instances = summary.serials.len(),
        regressions = summary.regressions,
        "workers stopped"
    );
    tracing::info!(
        orders = %orders.url(),
        orders_built_by = %orders.built_by(),
        billing = %billing.url(),
        billing_built_by = %billing.built_by(),
        "final pools"
    );

    server.cleanup();
    Ok(())
}

fn properties(url: &str, max_connections: u64) -> Properties {
    let mut properties = Properties::new();
    properties.insert("url".into(), json!(url));
    properties.insert("max_connections".into(), json!(max_connections));
    properties
}

fn log_report(server: &Server, label: &str) {
    let Some(report) = server
        .get_global::<RefreshCoordinator<dyn Pool>>()
        .and_then(|coordinator| coordinator.last_report())
    else {
        tracing::warn!(label, "no refresh report recorded");
        return;
    };
    tracing::info!(
        label,
        capability = %report.capability,
        refreshed = ?report.refreshed,
        skipped = ?report.skipped,
        clean = report.is_clean(),
        "refresh report"
    );
    for failure in &report.failed {
        tracing::warn!(label, pool = %failure.name, error = %failure.error, "rebuild failed");
    }
}
