use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use cluster_report_pdf::{AnalysisResult, Error, ReportConfig, export_analysis};

#[derive(Parser)]
#[command(name = "cluster-report-pdf")]
#[command(about = "Export a Kubernetes best-practice analysis as a paginated PDF report")]
#[command(version)]
struct Args {
    /// Analysis result JSON produced by the best-practice analyzer
    input: PathBuf,

    /// Directory the report is written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// JSON file with page geometry and layout settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the cluster name recorded in the analysis
    #[arg(long)]
    cluster_name: Option<String>,

    /// Overrides the cluster id recorded in the analysis
    #[arg(long)]
    cluster_id: Option<String>,

    /// JPEG quality of the rendered blocks (1-100)
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Result<PathBuf, Error> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(q) = args.jpeg_quality {
        config.jpeg_quality = q;
    }
    config.validate()?;

    let mut result = AnalysisResult::load(&args.input)?;
    if args.cluster_name.is_some() {
        result.cluster_name = args.cluster_name;
    }
    if args.cluster_id.is_some() {
        result.cluster_id = args.cluster_id;
    }

    let saved = export_analysis(&result, &args.out_dir, &config)?;
    Ok(saved.path)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(args) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
