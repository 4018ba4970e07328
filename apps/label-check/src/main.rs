//! label-check
//!
//! Checks one product label against a rule set, using OCR and barcode
//! output captured earlier, and prints the analysis result as JSON.
//!
//! ```text
//! label-check --capture label.capture.json --rules rules.json --sensitivity 70
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use label_engine::pipeline::{AnalysisRequest, LabelAnalyzer, LedgerSink};
use label_engine::{
    BoxHeightFontMeasure, EngineConfig, LabelEngine, MatchThresholds, ThresholdPolicy,
};
use shared_types::RuleSet;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod capture;

use capture::{Capture, ReplayCapture};

/// Command-line arguments for label-check
#[derive(Parser, Debug)]
#[command(name = "label-check")]
#[command(about = "Check a product label against a compliance rule set")]
struct Args {
    /// Captured OCR fragments and barcode detections (JSON)
    #[arg(long)]
    capture: PathBuf,

    /// Rule set to apply (JSON)
    #[arg(long)]
    rules: PathBuf,

    /// Matching strictness, 0 (lenient) to 100 (strict)
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    sensitivity: u8,

    /// Image resolution used for millimetre conversions
    #[arg(long)]
    dpi: Option<f64>,

    /// Measure font sizes from OCR box heights
    #[arg(long)]
    measure_fonts: bool,

    /// Use the default thresholds regardless of sensitivity
    #[arg(long)]
    fixed_thresholds: bool,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn engine_config(args: &Args) -> EngineConfig {
    let threshold_policy = if args.fixed_thresholds {
        ThresholdPolicy::Fixed(MatchThresholds::default())
    } else {
        ThresholdPolicy::Sensitivity
    };
    EngineConfig {
        threshold_policy,
        ..EngineConfig::default()
    }
}

fn build_engine(args: &Args) -> LabelEngine {
    let engine = LabelEngine::with_config(engine_config(args));
    if args.measure_fonts {
        engine.with_font_measure(BoxHeightFontMeasure)
    } else {
        engine
    }
}

fn load_rule_set(json: &str) -> anyhow::Result<RuleSet> {
    let rule_set: RuleSet = serde_json::from_str(json)?;
    rule_set.validate()?;
    Ok(rule_set)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let capture_json = fs::read_to_string(&args.capture)
        .with_context(|| format!("reading capture {}", args.capture.display()))?;
    let capture = Capture::from_json(&capture_json)
        .with_context(|| format!("parsing capture {}", args.capture.display()))?;

    let rules_json = fs::read_to_string(&args.rules)
        .with_context(|| format!("reading rules {}", args.rules.display()))?;
    let rule_set = load_rule_set(&rules_json)
        .with_context(|| format!("loading rules {}", args.rules.display()))?;

    info!(
        rule_set = %rule_set.name,
        conditions = rule_set.conditions.len(),
        fragments = capture.fragments.len(),
        barcodes = capture.barcodes.len(),
        "Replaying capture"
    );

    let replay = Arc::new(ReplayCapture::new(capture));
    let sink = Arc::new(LedgerSink::new());
    let analyzer = LabelAnalyzer::new(
        build_engine(&args),
        replay.clone(),
        replay.clone(),
        sink.clone(),
    );

    let mut request =
        AnalysisRequest::new(args.capture.clone(), rule_set).with_sensitivity(args.sensitivity);
    if let Some(name) = replay.original_filename() {
        request = request.with_original_filename(name);
    }
    if let Some(dpi) = args.dpi {
        request = request.with_dpi(dpi);
    }

    let result = analyzer.analyze(request).await?;
    let json = serde_json::to_string_pretty(&result)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
            info!("Result written to {}", path.display());
        }
        None => println!("{}", json),
    }

    if let Some(head) = sink.snapshot()?.last_hash() {
        info!(ledger_head = %head, "Analysis ledger updated");
    }

    Ok(())
}
