//! CLI entry point.
//!
//! `main.rs` delegates here. `run` parses arguments, loads configuration,
//! builds the runtime, and wires the admission service together: store →
//! tracker → calculator → gate → periodic loops → HTTP server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;
use uuid::Uuid;

use crate::admission::{AdmissionGate, AdmissionStore};
use crate::capacity::CapacityCalculator;
use crate::cluster::{Partitioner, ReplicaLoadTracker};
use crate::config::{ConfigError, ServiceConfig};
use crate::expiry::ExpirySweeper;
use crate::http_server::{AppState, HttpServer};
use crate::metrics::{MetricsAggregator, MetricsCounters};
use crate::notify::{AdmissionEventLog, BroadcastSink, NotificationRelay};
use crate::observability::{Logger, Severity};
use crate::promotion::PromotionLoop;
use crate::scheduler::{PeriodicTask, Shutdown};
use crate::store::{MemoryStore, SharedStore, TimedStore};

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Runtime error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(name = "turnstile", version, about = "Distributed virtual waiting room")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the waiting-room service
    Serve {
        /// Path to a JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the HTTP port
        #[arg(long)]
        port: Option<u16>,

        /// Log at trace severity
        #[arg(long)]
        verbose: bool,
    },
}

/// Parse arguments and dispatch.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            config,
            port,
            verbose,
        } => {
            if verbose {
                Logger::set_min_severity(Severity::Trace);
            }
            let mut service_config = match config {
                Some(path) => ServiceConfig::load(&path)?,
                None => ServiceConfig::default(),
            };
            if let Some(port) = port {
                service_config.http.port = port;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve(service_config))
        }
    }
}

async fn serve(config: ServiceConfig) -> Result<(), CliError> {
    // Every component goes through the timeout layer, so a hung backend
    // degrades a tick instead of stalling it.
    let store: Arc<dyn SharedStore> = Arc::new(TimedStore::new(
        Arc::new(MemoryStore::new()),
        Duration::from_millis(config.store_timeout_ms),
    ));
    let replica_id = Uuid::new_v4();
    Logger::info(
        "service.starting",
        &[("replica_id", replica_id.to_string().as_str())],
    );

    let tracker = Arc::new(ReplicaLoadTracker::new(
        store.clone(),
        replica_id,
        Duration::from_secs(config.replica_liveness_window_secs.max(1) as u64),
    ));
    if let Err(err) = tracker.heartbeat().await {
        Logger::warn(
            "service.initial_heartbeat_failed",
            &[("error", err.to_string().as_str())],
        );
    }

    let calculator = Arc::new(CapacityCalculator::new(
        config.capacity.clone(),
        tracker.clone(),
    ));
    let admission = Arc::new(AdmissionStore::new(
        store.clone(),
        Duration::from_millis(config.store_timeout_ms),
    ));
    let counters = Arc::new(MetricsCounters::new());
    let sink = Arc::new(BroadcastSink::default());
    let event_log = Arc::new(AdmissionEventLog::new(store.clone()));
    let relay = Arc::new(NotificationRelay::new(
        sink.clone(),
        Some(event_log),
        counters.clone(),
    ));
    let partitioner = Arc::new(Partitioner::new(
        tracker.clone(),
        config.partition_strategy,
    ));
    let gate = Arc::new(AdmissionGate::new(
        admission.clone(),
        calculator.clone(),
        counters.clone(),
        config.session_timeout(),
    ));
    let aggregator = Arc::new(MetricsAggregator::new(
        admission.clone(),
        calculator.clone(),
        counters.clone(),
    ));

    let promotion = Arc::new(PromotionLoop::new(
        admission.clone(),
        calculator.clone(),
        partitioner.clone(),
        relay.clone(),
        counters.clone(),
        config.session_timeout(),
    ));
    let sweeper = Arc::new(ExpirySweeper::new(
        admission.clone(),
        relay.clone(),
        counters.clone(),
        config.session_timeout().is_some(),
    ));

    let shutdown = Shutdown::new();
    let mut handles = Vec::new();

    {
        let promotion = promotion.clone();
        handles.push(PeriodicTask::spawn(
            "promotion",
            Duration::from_millis(config.schedule.promotion_interval_ms),
            shutdown.subscribe(),
            move || {
                let promotion = promotion.clone();
                async move { promotion.run_cycle().await }
            },
        ));
    }
    {
        let sweeper = sweeper.clone();
        handles.push(PeriodicTask::spawn(
            "expiry",
            Duration::from_millis(config.schedule.expiry_interval_ms),
            shutdown.subscribe(),
            move || {
                let sweeper = sweeper.clone();
                async move { sweeper.run_cycle().await }
            },
        ));
    }
    {
        let aggregator = aggregator.clone();
        handles.push(PeriodicTask::spawn(
            "metrics_usage",
            Duration::from_millis(config.schedule.metrics_sample_interval_ms),
            shutdown.subscribe(),
            move || {
                let aggregator = aggregator.clone();
                async move { aggregator.sample_usage().await }
            },
        ));
    }
    {
        let aggregator = aggregator.clone();
        handles.push(PeriodicTask::spawn(
            "metrics_throughput",
            Duration::from_millis(config.schedule.throughput_sample_interval_ms),
            shutdown.subscribe(),
            move || {
                let aggregator = aggregator.clone();
                async move { aggregator.sample_throughput().await }
            },
        ));
    }
    {
        let tracker = tracker.clone();
        handles.push(PeriodicTask::spawn(
            "heartbeat",
            Duration::from_millis(config.schedule.heartbeat_interval_ms),
            shutdown.subscribe(),
            move || {
                let tracker = tracker.clone();
                async move {
                    tracker.heartbeat().await?;
                    Ok(())
                }
            },
        ));
    }

    let state = Arc::new(AppState {
        gate,
        admission,
        calculator,
        aggregator,
        tracker: tracker.clone(),
        partitioner,
    });
    let server = HttpServer::new(config.http.clone(), state);

    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            Logger::info("service.shutdown_requested", &[]);
        }
    }

    // Let in-flight cycles finish, then drop our replica record so the
    // remaining replicas repartition promptly.
    shutdown.trigger();
    for handle in handles {
        let _ = handle.await;
    }
    if let Err(err) = tracker.deregister().await {
        Logger::warn(
            "service.deregister_failed",
            &[("error", err.to_string().as_str())],
        );
    }
    Logger::info("service.stopped", &[]);
    Ok(())
}
