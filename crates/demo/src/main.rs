//! Demo entry point.

use demo::{Config, LogFormat};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    // 1. Initialize tracing
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    // 2. Install Prometheus metrics recorder
    let metrics_handle = if config.print_metrics {
        Some(metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    // 3. Run the scenarios
    tracing::info!(runner = ?config.runner, "running order scenarios");
    let outcomes = demo::run_all(config.runner)?;
    metrics::counter!("demo_scenarios_total").increment(outcomes.len() as u64);
    for outcome in &outcomes {
        println!("== {}", outcome.name);
        for entry in &outcome.log {
            println!("{}", entry.message);
        }
        println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);
    }

    if let Some(handle) = metrics_handle {
        println!("{}", handle.render());
    }

    Ok(())
}
