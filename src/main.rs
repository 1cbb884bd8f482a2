use std::{io, path::PathBuf};

use clap::Parser;
use egoplot::{
    AppConfig, Compression, EgoPlotError, RunOptions, SvgFileSink, TrajectoryPlotter,
    extract_and_plot,
};
use log::{info, warn};

const REMEDIATION_HINT: &str = "Check that the file path is correct and that the file is a TFRecord of driving scenarios.";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TFRecord file with serialized driving scenarios
    input: PathBuf,

    /// Maximum number of scenarios to plot
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Directory the SVG figures are written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum)]
    compression: Option<Compression>,

    /// Skip record checksum verification
    #[arg(long)]
    no_verify: bool,

    /// Config file, defaults to the per-user egoplot config when present
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<AppConfig, EgoPlotError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::from_local_file()?.unwrap_or_default(),
    };
    if let Some(limit) = args.limit {
        config.scenario_limit = limit;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(compression) = args.compression {
        config.compression = compression;
    }
    if args.no_verify {
        config.verify_checksums = false;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), EgoPlotError> {
    let config = load_config(args)?;
    let options = RunOptions {
        limit: config.scenario_limit,
        compression: config.compression,
        verify_checksums: config.verify_checksums,
    };
    let plotter = TrajectoryPlotter::with_config(config.plot);
    let mut sink = SvgFileSink::new(&config.output_dir);

    let report = extract_and_plot(
        &args.input,
        &options,
        &plotter,
        &mut sink,
        &mut io::stdout().lock(),
    )?;
    info!(
        "Done: {} scenarios plotted into {:?}",
        report.plotted(),
        sink.output_dir()
    );
    Ok(())
}

fn main() {
    colog::init();

    let args = Args::parse();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", snafu::Report::from_error(e));
        eprintln!("{}", REMEDIATION_HINT);
        std::process::exit(1);
    }
}
