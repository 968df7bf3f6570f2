//! Test Transaction Producer
//!
//! Sends generated transactions to the scorer as NATS requests and logs the
//! verdicts that come back.

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Payload shape the scorer accepts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionPayload {
    transaction_id: String,
    amount: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_override: Option<String>,
}

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.transaction_counter += 1;
        format!("tx_{:012}", self.transaction_counter)
    }

    /// Daytime, moderate amount
    fn generate_legitimate(&mut self) -> TransactionPayload {
        let hour = self.rng.gen_range(8..21);
        TransactionPayload {
            transaction_id: self.next_id(),
            amount: serde_json::json!((self.rng.gen_range(10.0..5_000.0_f64) * 100.0).round() / 100.0),
            payment_method: Some(self.random_choice(&["card", "wallet", "upi"]).to_string()),
            timestamp_override: Some(self.timestamp_at_hour(hour)),
        }
    }

    /// Night-time, above the velocity threshold
    fn generate_suspicious(&mut self) -> TransactionPayload {
        let hour = *[0, 1, 2, 3, 4, 5, 23]
            .get(self.rng.gen_range(0..7))
            .unwrap_or(&2);
        TransactionPayload {
            transaction_id: self.next_id(),
            amount: serde_json::json!(self.rng.gen_range(50_001..500_000)),
            payment_method: Some(self.random_choice(&["card", "wallet"]).to_string()),
            timestamp_override: Some(self.timestamp_at_hour(hour)),
        }
    }

    /// Payload the scorer must reject
    fn generate_malformed(&mut self) -> TransactionPayload {
        TransactionPayload {
            transaction_id: self.next_id(),
            amount: serde_json::json!("not-a-number"),
            payment_method: None,
            timestamp_override: None,
        }
    }

    fn timestamp_at_hour(&mut self, hour: u32) -> String {
        let today = Utc::now().date_naive();
        let minute = self.rng.gen_range(0..60);
        today
            .and_hms_opt(hour, minute, 0)
            .map(|t| t.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| (Utc::now() - ChronoDuration::hours(1)).to_rfc3339())
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }

    fn generate(&mut self, fraud_rate: f64, malformed_rate: f64) -> TransactionPayload {
        let roll: f64 = self.rng.gen();
        if roll < malformed_rate {
            self.generate_malformed()
        } else if roll < malformed_rate + fraud_rate {
            self.generate_suspicious()
        } else {
            self.generate_legitimate()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("transactions.score");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);
    let malformed_rate = 0.02;

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, malformed_rate, delay_ms).await;
        }
    };

    let mut generator = TransactionGenerator::new();
    let mut fraud_verdicts = 0u64;
    let mut rejected = 0u64;

    info!("Sending {} scoring requests...", count);

    for i in 0..count {
        let transaction = generator.generate(fraud_rate, malformed_rate);
        let payload = serde_json::to_vec(&transaction)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(reply) => {
                let body: serde_json::Value = serde_json::from_slice(&reply.payload)?;
                if body.get("status").is_some() {
                    rejected += 1;
                } else if body["prediction"] == "FRAUD" {
                    fraud_verdicts += 1;
                }
                info!(
                    transaction_id = %transaction.transaction_id,
                    reply = %body,
                    "Verdict received"
                );
            }
            Err(e) => warn!(transaction_id = %transaction.transaction_id, error = %e, "Request failed"),
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} requests ({} FRAUD, {} rejected)",
                i + 1,
                count,
                fraud_verdicts,
                rejected
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} FRAUD, {} rejected)",
        count, fraud_verdicts, rejected
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, malformed_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = TransactionGenerator::new();

    for i in 0..count {
        let transaction = generator.generate(fraud_rate, malformed_rate);
        let json = serde_json::to_string_pretty(&transaction)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
