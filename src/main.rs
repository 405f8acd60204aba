use anyhow::Result;
use bugscan::cli::Cli;
use bugscan::engine::Engine;
use bugscan::output::ScanReport;
use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use log::info;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let config = cli.to_config()?;
    let hostnames = cli.load_hostnames()?;

    print_banner();

    info!(
        "Loaded {} hostnames from {}",
        hostnames.len(),
        cli.filename
    );

    let start = Instant::now();
    let mode = config.mode;
    let hostname_count = hostnames.len();

    let engine = Engine::new(config)?;
    let records = engine.run(hostnames).await?;

    let report = ScanReport::new(mode.to_string(), hostname_count, records, start.elapsed());
    report.print_summary();

    if let Some(path) = cli.output.as_ref() {
        report.to_json_file(path)?;
        println!("Results written to {}", path);
    }

    Ok(())
}

fn print_banner() {
    println!();
    println!(
        "{} {}",
        "bugscan".bright_green().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).blue().bold()
    );
    println!("{}", "Bug Host Discovery Scanner".blue());
    println!();
}
