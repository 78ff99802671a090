//! Bounded handoff demo: one producer, one consumer, capacity 3.
//!
//! Run with: cargo run --bin producer_consumer

use std::process::ExitCode;
use std::time::Duration;

use colored::Colorize;

use bounded_pipeline::report::OutputLog;
use bounded_pipeline::{Pipeline, PipelineConfig};

const OUTPUT_FILE: &str = "outputs/producer_consumer_output.txt";

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let source: Vec<i32> = (1..=8).collect();
    let config = PipelineConfig {
        capacity: 3,
        // Consumer slower than producer, so backpressure shows in the log.
        producer_delay: Some(Duration::from_millis(500)),
        consumer_delay: Some(Duration::from_millis(1000)),
        ..PipelineConfig::default()
    };

    let mut log = OutputLog::create(OUTPUT_FILE, "PRODUCER-CONSUMER PATTERN OUTPUT")?;
    log.log(&format!("Source data: {:?}", source))?;
    log.log(&format!("Queue capacity: {}", config.capacity))?;
    log.log("")?;

    let mut pipeline = Pipeline::new(source.clone(), config)?;
    let report = pipeline.run()?;

    for event in &report.events {
        log.log(&event.to_string())?;
    }

    log.log("")?;
    log.log("=== COMPLETE ===")?;
    log.log(&format!("Final destination: {:?}", report.destination))?;
    log.log(&format!("Items processed: {}", report.destination.len()))?;
    log.log(&format!("Success: {}", report.success))?;

    let status = if report.success {
        "✓ all items transferred in order".green()
    } else {
        "✗ destination does not match source".red()
    };
    println!("\n{}", status);
    println!("Output saved to: {}", OUTPUT_FILE);

    Ok(())
}

fn main() -> ExitCode {
    println!("=== Bounded Producer-Consumer Pipeline ===\n");
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
