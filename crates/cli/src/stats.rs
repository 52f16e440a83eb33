//! Shutdown statistics report.

use ingestion::GatewayStats;

/// Print per-route counters collected during a run
pub fn print_summary(stats: &GatewayStats) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Gateway Statistics                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Overview");
    println!("   ├─ Duration: {:.2}s", stats.duration.as_secs_f64());
    println!("   ├─ Messages received: {}", stats.total_received());
    println!("   ├─ Messages dispatched: {}", stats.total_dispatched());
    println!("   └─ Messages dropped: {}", stats.total_dropped());

    if stats.routes.is_empty() {
        println!();
        return;
    }

    println!("\n🔀 Routes ({})", stats.routes.len());
    for (i, route) in stats.routes.iter().enumerate() {
        let is_last = i == stats.routes.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child = if is_last { "   " } else { "│  " };
        let c = &route.counters;

        println!(
            "   {} {} ({} :{} -> {})",
            prefix, route.name, route.protocol, route.port, route.sink
        );
        println!(
            "   {}  ├─ received={} dispatched={} dropped={}",
            child, c.received, c.dispatched, c.dropped
        );
        println!(
            "   {}  ├─ bytes={} connections={}",
            child, c.bytes_received, c.connections
        );
        println!("   {}  └─ delivery (ms): {}", child, c.delivery_latency_ms);
    }

    println!();
}
