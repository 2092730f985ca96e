use anyhow::Context;
use clap::Parser;
use generator::profile::build_bundle;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::ScanConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic-data sky scan over the resampling 2F core")]
struct Args {
    /// Load a scan config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 100.15)]
    f_start: f64,
    #[arg(long, default_value_t = 1024)]
    num_bins: usize,
    /// Sky positions stepped in right ascension from the injection
    #[arg(long, default_value_t = 4)]
    sky_points: usize,
    #[arg(long, default_value_t = 0.05)]
    sky_step: f64,
    #[arg(long, default_value_t = 3)]
    fdot_steps: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scan_config = if let Some(path) = &args.config {
        ScanConfig::load(path)?
    } else {
        let config = ScanConfig::from_args(
            args.f_start,
            args.num_bins,
            args.sky_points,
            args.sky_step,
            args.fdot_steps,
            args.seed,
        );
        config.validate()?;
        config
    };

    let bundle = build_bundle(&scan_config.generator).context("generating synthetic data")?;
    let names: Vec<&str> = bundle
        .geometry
        .sites()
        .iter()
        .map(|site| site.name.as_str())
        .collect();
    log::info!(
        "generated {} x {} samples spanning {:.0} s",
        names.join("/"),
        bundle.input.num_samples(),
        bundle.input.span()
    );

    let mut builder = TokioBuilder::new_multi_thread();
    builder.enable_all();
    if let Some(workers) = args.workers {
        builder.max_blocking_threads(workers.max(1));
    }
    let runtime = builder.build().context("creating scan runtime")?;

    let runner = Runner::new(scan_config);
    let report = runtime.block_on(async {
        tokio::select! {
            report = runner.execute(Arc::new(bundle)) => report.map(Some),
            interrupted = signal::ctrl_c() => {
                interrupted.context("awaiting Ctrl+C")?;
                log::warn!("scan interrupted, no report written");
                Ok(None)
            }
        }
    })?;

    let Some(report) = report else {
        return Ok(());
    };
    if let Some(best) = &report.loudest {
        log::info!(
            "scan -> {} templates, loudest 2F {:.2} at {:.6} Hz (alpha {:.4}, delta {:.4})",
            report.templates,
            best.two_f,
            best.freq,
            best.alpha,
            best.delta
        );
    }

    let json = serde_json::to_string_pretty(&report).context("serializing scan report")?;
    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        }
        None => println!("{}", json),
    }

    Ok(())
}
