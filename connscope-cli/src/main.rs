use clap::Parser;
use connscope_common::Config;
use connscope_core::{
    analyze, export_csv, export_json, parse_queries, plan_chunks, write_plan, write_query_counts,
    write_stats, Analysis, ChunkPlan, FileChunks, PipelineOptions,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "connscope", version, about = "Active connection counts and per-second volume for connection logs")]
struct Cli {
    /// Connection log (delimited, with ip, endTs and timeTaken columns)
    #[arg(short = 'f', long = "file-path", visible_alias = "filePath")]
    file_path: PathBuf,
    /// Query timestamp `YYYY-MM-DD HH:MM:SS.ffffff`; repeat for several
    #[arg(short = 'l', long = "list", required = true)]
    list: Vec<String>,
    /// Also export the analysis (json: full report, csv: per-second series)
    #[arg(long, value_parser = ["json", "csv"])]
    format: Option<String>,
    /// Export destination; defaults to connscope.<format> in export.output_dir
    #[arg(long)]
    output: Option<PathBuf>,
    /// trace, debug, info, warn or error; overrides config and RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
    /// Config file; defaults to $CONNSCOPE_CONFIG or the user config dir
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(cli_level: Option<&str>, config_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout carries the report
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_tracing(cli.log_level.as_deref(), &config.log.level);
    debug!(?config, "configuration loaded");
    // bad queries abort before any chunk is touched
    let queries = parse_queries(&cli.list)?;

    let plan = plan_chunks(&cli.file_path, &config.split)?;
    let mut stdout = std::io::stdout().lock();
    write_plan(&mut stdout, &plan, &cli.list)?;

    let options = PipelineOptions { parallel: config.analysis.parallel };
    let source = FileChunks::new(plan.chunks.clone());
    let analysis = analyze(&source, &queries, options)?;
    write_query_counts(&mut stdout, &analysis.query_counts)?;
    stdout.flush()?;

    if cli.format.is_some() || cli.output.is_some() {
        run_export(&cli, &config, &plan, &analysis)?;
    }

    let stats = analysis.stats()?;
    write_stats(&mut stdout, &plan.source, &stats)?;
    Ok(())
}

fn run_export(cli: &Cli, config: &Config, plan: &ChunkPlan, analysis: &Analysis) -> anyhow::Result<()> {
    let format = cli.format.clone().unwrap_or_else(|| config.export.format.clone());
    let out_path: PathBuf = match &cli.output {
        Some(o) => o.clone(),
        None => Path::new(&config.export.output_dir).join(format!("connscope.{format}")),
    };
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    match format.as_str() {
        "json" => export_json(&out_path, plan, analysis)?,
        "csv" => export_csv(&out_path, analysis.series.as_ref())?,
        _ => anyhow::bail!("Unknown format: {format} (use json or csv)"),
    }
    info!(path = %out_path.display(), %format, "exported analysis");
    eprintln!("Exported to {}", out_path.display());
    Ok(())
}
