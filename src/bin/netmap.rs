// Netmap CLI
//
// Scans a network with nmap and renders the findings as a heatmap image:
// every address in the CIDR block gets a pixel along a Hilbert curve, and
// each found host is colored by its RTT (host discovery) or open-port count
// (port scans) on a cold-to-hot gradient.
//
// Prerequisite: nmap installed and findable in $PATH. Scans run unprivileged
// with aggressive (-T5 like) timing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use netmap::geometry::Subnet;
use netmap::gradient::Gradient;
use netmap::output;
use netmap::render::render_heatmap;
use netmap::scanner::{self, ScanMode};

/// Render an nmap scan of a CIDR block as a Hilbert-curve heatmap
#[derive(Parser, Debug)]
#[command(name = "netmap", version)]
struct Args {
    /// Full path the generated heatmap is written to (.jpg or .png)
    #[arg(short, long)]
    file: PathBuf,

    /// Network to scan and render, in CIDR notation
    #[arg(short, long, default_value = "10.0.0.0/24")]
    network: Subnet,

    /// Type of scan to launch
    #[arg(short, long, value_enum, default_value = "hostup", ignore_case = true)]
    scantype: ScanMode,

    /// Leave unscanned pixels fully transparent instead of gradient-cold
    #[arg(short, long)]
    transparent: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // Fail on a bad output path or non-square subnet now, not after the scan.
    output::format_for(&args.file)?;
    let side = args
        .network
        .side()
        .with_context(|| format!("cannot render {}", args.network))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
    spinner.set_message(format!("scanning {}", args.network));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let records = scanner::scan(args.network, args.scantype)
        .with_context(|| format!("scan of {} failed", args.network))?;

    spinner.finish_and_clear();
    println!("scan finished: {} hosts found in {}", records.len(), args.network);

    let heatmap = render_heatmap(
        args.network,
        args.scantype,
        args.transparent,
        &Gradient::default(),
        &records,
    )
    .context("unable to render heatmap")?;
    if heatmap.skipped > 0 {
        println!(
            "  skipped {} hosts that do not map into {}",
            heatmap.skipped, args.network
        );
    }

    output::write_image(&args.file, &heatmap.image)
        .with_context(|| format!("unable to write {}", args.file.display()))?;
    println!(
        "wrote {side}x{side} heatmap ({} hosts) to {}",
        heatmap.painted,
        args.file.display()
    );

    Ok(())
}
