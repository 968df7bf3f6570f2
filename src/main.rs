//! Fraud Risk Scorer - Main Entry Point
//!
//! Answers NATS scoring requests with FRAUD/SAFE verdicts and publishes a
//! verdict event for each scored transaction.

use anyhow::Result;
use fraud_risk_scorer::{
    config::{AppConfig, LoggingConfig},
    consumer::TransactionConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    models::inference::ScoringEngine,
    producer::VerdictProducer,
    service::{ServiceReply, ScoringService},
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_risk_scorer={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Fraud Risk Scorer");
    info!(
        model = %config.model.path,
        backend = ?config.model.backend,
        decision_threshold = config.model.decision_threshold,
        "Configuration loaded"
    );

    let metrics = Arc::new(PipelineMetrics::new());
    let engine = Arc::new(ScoringEngine::new());
    let clock = Arc::new(config.clock.system_clock()?);
    let service = Arc::new(ScoringService::new(
        engine.clone(),
        clock,
        config.detection.risk_levels.clone(),
        metrics.clone(),
    ));

    // Without a model the service still answers, with ModelUnavailable.
    if let Err(e) = service.reload(&config.model) {
        error!(error = %e, "Initial model load failed; scoring requests will be rejected");
    }

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let mut consumer = TransactionConsumer::new(client.clone(), &config.nats.transaction_subject);
    if let Some(group) = &config.nats.queue_group {
        consumer = consumer.with_queue_group(group);
    }
    let producer = Arc::new(VerdictProducer::new(client.clone(), &config.nats.verdict_subject));

    let metrics_clone = metrics.clone();
    let interval = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        MetricsReporter::new(metrics_clone, interval).start().await;
    });

    #[cfg(unix)]
    spawn_reload_on_sighup(service.clone(), config.model.clone())?;

    let num_workers = config.pipeline.workers;
    info!(
        workers = num_workers,
        subject = %consumer.subject(),
        verdicts = %producer.subject(),
        "Starting scoring loop"
    );

    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));
    let mut subscription = consumer.subscribe().await?;

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break;
            }
        };

        let permit = semaphore.clone().acquire_owned().await?;
        let service = service.clone();
        let producer = producer.clone();
        let processed_count = processed_count.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let reply = service.handle(&message.payload);

            match message.reply {
                Some(reply_to) => {
                    if let Err(e) = producer.respond(reply_to, &reply).await {
                        error!(error = %e, "Failed to send reply");
                    }
                }
                None => warn!(
                    subject = %message.subject,
                    "Scoring request without reply subject; verdict only published as event"
                ),
            }

            if let ServiceReply::Scored { .. } = &reply {
                if let Err(e) = producer.publish_event(&reply).await {
                    error!(error = %e, "Failed to publish verdict event");
                }
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                info!(
                    processed = count,
                    throughput = format!("{:.1} tx/s", metrics.get_throughput()),
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    info!("Scorer shutting down...");
    drain_in_flight(&semaphore, num_workers).await?;
    metrics.print_summary();

    Ok(())
}

/// Wait until every spawned request task has released its permit.
async fn drain_in_flight(semaphore: &Semaphore, workers: usize) -> Result<()> {
    let permits = u32::try_from(workers)?;
    let _all = semaphore.acquire_many(permits).await?;
    info!("In-flight requests completed");
    Ok(())
}

/// Reload the model artifact whenever the process receives SIGHUP.
#[cfg(unix)]
fn spawn_reload_on_sighup(
    service: Arc<ScoringService>,
    model: fraud_risk_scorer::config::ModelConfig,
) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            info!(path = %model.path, "SIGHUP received, reloading model");
            if let Err(e) = service.reload(&model) {
                error!(error = %e, "Model reload failed; previous model keeps serving");
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_requests() {
        let semaphore = Arc::new(Semaphore::new(2));
        let replied = Arc::new(AtomicBool::new(false));

        let permit = semaphore.clone().acquire_owned().await.unwrap();
        let flag = replied.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            drop(permit);
        });

        drain_in_flight(&semaphore, 2).await.unwrap();
        assert!(replied.load(Ordering::SeqCst));
    }
}
