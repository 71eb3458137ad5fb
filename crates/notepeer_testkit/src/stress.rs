//! Load tests for the registry and the sync server.
//!
//! These drive many concurrent writers at one registry or one server and
//! report throughput.

use crate::fixtures::RawPeer;
use notepeer_protocol::{Message, ServerAddress};
use notepeer_server::NoteRegistry;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per writer.
    pub operations: usize,
    /// Number of concurrent writers.
    pub writers: usize,
    /// Number of distinct keys the writers share.
    pub keys: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 200,
            writers: 8,
            keys: 4,
        }
    }
}

/// Writers on separate threads registering into one registry.
pub fn stress_registry_writers(registry: Arc<NoteRegistry>, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let handles: Vec<_> = (0..config.writers)
        .map(|writer| {
            let registry = Arc::clone(&registry);
            let config = config.clone();
            thread::spawn(move || {
                for op in 0..config.operations {
                    let key = format!("key-{}", op % config.keys);
                    registry.register(&key, &format!("writer {} op {}", writer, op));
                    if op % 7 == 0 {
                        registry.delete(&key);
                    }
                }
                config.operations
            })
        })
        .collect();

    let mut successful = 0;
    let mut failed = 0;
    for handle in handles {
        match handle.join() {
            Ok(done) => successful += done,
            Err(_) => failed += config.operations,
        }
    }
    StressTestResult::new(successful, failed, start.elapsed())
}

/// Writers on separate connections sending `register-note` to one server.
///
/// Each writer keeps its own connection open and waits for every ack.
pub async fn stress_server_writers(address: &ServerAddress, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut writers = JoinSet::new();
    for writer in 0..config.writers {
        let address = address.clone();
        let config = config.clone();
        writers.spawn(async move {
            let mut peer = RawPeer::connect(&address).await;
            let mut acked = 0;
            for op in 0..config.operations {
                let key = format!("key-{}", op % config.keys);
                let request = Message::register_note(key, format!("writer {} op {}", writer, op));
                if let Message::Ack(_) = peer.request(&request).await {
                    acked += 1;
                }
            }
            peer.close().await;
            acked
        });
    }

    let mut successful = 0;
    let mut failed = 0;
    while let Some(outcome) = writers.join_next().await {
        match outcome {
            Ok(acked) => {
                successful += acked;
                failed += config.operations - acked;
            }
            Err(_) => failed += config.operations,
        }
    }
    StressTestResult::new(successful, failed, start.elapsed())
}
