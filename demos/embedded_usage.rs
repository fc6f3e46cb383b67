//! Minimal embedding example for kres-core
//!
//! An application owns the resolver, feeds endpoints into an in-memory
//! directory and watches the consumer receive only genuine changes.

use kres_core::{
    AddressSet, ClientConn, KresConfig, MemoryDirectory, ResolveNowOptions, Resolver,
    ResolverRegistry, Result, State, Target,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Duration;

/// Consumer that prints every update it receives
#[derive(Default)]
struct PrintingConn {
    updates: AtomicUsize,
}

impl ClientConn for PrintingConn {
    fn update_state(&self, state: State) {
        let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[Consumer] update #{}: {:?}", n, state.addrs());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Embedded kres-core Example ===\n");

    let config = KresConfig::from_json_str(
        r#"{ "resolver": { "refresh_interval_ms": 200, "debounce_interval_ms": 50 } }"#,
    )?
    .with_directory_options(
        "dns",
        serde_json::json!({ "cluster_domain": "cluster.local" }),
    );

    // Directories are plugins keyed by scheme
    let registry = ResolverRegistry::new();
    kres_directory_dns::register(&registry);
    registry.register_directory("memory", Box::new(kres_core::MemoryDirectoryFactory));
    println!("1. Registered schemes: {:?}", registry.schemes());

    // Keep a handle on the directory so the application can change it
    let target: Target = "greeter.prod:50051".parse()?;
    let directory = MemoryDirectory::new();
    directory.set_addresses(&target, AddressSet::new(["10.0.0.1:50051"]));

    let conn = Arc::new(PrintingConn::default());
    let resolver = Resolver::new(
        target.clone(),
        conn.clone(),
        Arc::new(directory.clone()),
        config.resolver.clone(),
    )?;

    println!("2. Starting resolver for {}...", target);
    resolver.start()?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n3. Scaling out (pushed through the watch stream)...");
    directory.set_addresses(
        &target,
        AddressSet::new(["10.0.0.1:50051", "10.0.0.2:50051"]),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n4. Requesting a lookup with nothing changed...");
    resolver.resolve_now(ResolveNowOptions::new());
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("\n5. Shutting down...");
    resolver.shutdown().await;

    println!("\n=== Done ===");
    println!("Consumer updates: {}", conn.updates.load(Ordering::SeqCst));
    println!("- Periodic lookups and the repeated request did not re-apply the same set");

    // Resolvers for other schemes are built the same way
    let dns = registry.build("dns:///greeter.prod:50051", conn, &config)?;
    println!("- Built (not started): {:?}", dns);

    Ok(())
}
