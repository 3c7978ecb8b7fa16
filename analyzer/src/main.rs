use anyhow::Context;
use bridge::server::{bridge_bind_address, JobBridge};
use bridge::store::InMemoryJobStore;
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod bridge;
mod generator;
mod sources;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Pickleball rally analysis driver")]
struct Args {
    /// Analyse one match and write its report
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Directory of still frames to analyse instead of the synthetic rally
    #[arg(long)]
    images: Option<PathBuf>,
    #[arg(long)]
    fps: Option<f64>,
    /// JSON landmark sidecar produced by an external pose tool
    #[arg(long)]
    landmarks: Option<PathBuf>,
    #[arg(long)]
    synthetic_seed: Option<u64>,
    /// Report destination for offline runs
    #[arg(long)]
    output: Option<PathBuf>,
    /// Keep the job bridge alive for incoming analysis requests
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let overrides = WorkflowConfig::from_args(
        args.images,
        args.fps,
        args.landmarks,
        args.synthetic_seed,
        args.output,
    );
    let workflow_config = match args.workflow {
        Some(path) => WorkflowConfig::load(path)?.with_overrides(overrides),
        None => overrides,
    };

    if args.offline {
        let runner = Runner::new(workflow_config.clone());
        let progress = |fraction: f64| info!("analysis {:.0}% complete", fraction * 100.0);
        let outcome = runner.execute(Some(&progress), None)?;
        let result = &outcome.result;

        println!(
            "Offline run -> {:.1}s, {} shots, {} rallies, confidence {:.2}",
            result.video_duration,
            result.shot_count(),
            result.rally_lengths.len(),
            result.overall_confidence
        );
        let scores = result.skill_scores;
        println!(
            "Skill scores -> power {} finesse {} speed {} court_iq {} consistency {}",
            scores.power, scores.finesse, scores.speed, scores.court_iq, scores.consistency
        );
        println!(
            "Metrics -> {}",
            serde_json::to_string(&outcome.metrics).context("encoding run metrics")?
        );

        let report_path = runner
            .config()
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from("reports/analysis.json"));
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let report = result.to_json().context("encoding analysis report")?;
        fs::write(&report_path, report)
            .with_context(|| format!("writing report {}", report_path.display()))?;
        println!("Report written to {}", report_path.display());
    }

    if args.serve {
        let bridge = JobBridge::new(Arc::new(InMemoryJobStore::new()), workflow_config);
        let addr = bridge_bind_address();
        let _server = bridge.spawn(addr);
        println!("Job bridge running on http://{} (Ctrl+C to stop)...", addr);
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
        let stored = bridge.store().list().len();
        info!(
            "job bridge stopping: {} jobs stored, {} finished",
            stored,
            bridge.finished_jobs()
        );
    }

    Ok(())
}
