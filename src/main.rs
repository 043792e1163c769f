//! # Butterfly-net CLI
//!
//! Builds a routable node/link network and a POI table from an
//! OpenStreetMap PBF extract and writes them as CSV.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::error;
use std::path::PathBuf;

use butterfly_net::{export, ingest, pipeline, Mode, NetworkConfig, Region};

mod cli;

/// Command-line interface for butterfly-net
#[derive(Parser)]
#[command(name = "butterfly-net")]
#[command(about = "Mode-aware road network and POI extraction from OpenStreetMap data")]
#[command(long_about = "Builds node.csv, link.csv and poi.csv from an OSM PBF extract:
  butterfly-net monaco.osm.pbf out/                        # Auto network, header bbox
  butterfly-net city.osm.pbf out/ --modes auto,walk        # Several travel modes
  butterfly-net city.osm.pbf out/ --bbox 4.30,50.80,4.45,50.90
  butterfly-net city.osm.pbf out/ --graph-json             # Also write graph JSON")]
#[command(version = env!("BUTTERFLY_VERSION"))]
struct Cli {
    /// OSM PBF extract to read
    input: PathBuf,

    /// Directory receiving the output files
    outdir: PathBuf,

    /// Region to keep: min_lon,min_lat,max_lon,max_lat (defaults to the file header bbox)
    #[arg(long)]
    bbox: Option<String>,

    /// Travel modes to build for, comma separated (auto, bike, walk)
    #[arg(long)]
    modes: Option<String>,

    /// JSON configuration file overriding the default tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip POI extraction
    #[arg(long)]
    no_poi: bool,

    /// Also write point/edge/POI JSON documents for a graph store
    #[arg(long)]
    graph_json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Parse `min_lon,min_lat,max_lon,max_lat`
fn parse_bbox(value: &str) -> Result<Region> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid bbox '{value}'"))?;
    match *parts.as_slice() {
        [min_lon, min_lat, max_lon, max_lat] => {
            Ok(Region::from_bbox(min_lon, min_lat, max_lon, max_lat)?)
        }
        _ => bail!("bbox needs four values, got {}", parts.len()),
    }
}

fn load_config(cli: &Cli) -> Result<NetworkConfig> {
    let mut config = match &cli.config {
        Some(path) => NetworkConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => NetworkConfig::default(),
    };
    if let Some(modes) = &cli.modes {
        config.target_modes = Mode::parse_list(modes)?;
    }
    if cli.no_poi {
        config.extract_pois = false;
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    if let Err(e) = run() {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🦋 Butterfly-net v{} starting...", env!("BUTTERFLY_VERSION"));
    }

    let config = load_config(&cli)?;
    // Spinners would interleave with debug logs
    let hide_spinners = cli.verbose;
    let bbox = cli.bbox.as_deref().map(parse_bbox).transpose()?;

    let stage = cli::StageProgress::start(&format!("📖 Reading {}", cli.input.display()), hide_spinners);
    let data = match ingest::read_pbf(&cli.input, bbox, &config) {
        Ok(data) => data,
        Err(e) => {
            stage.abandon();
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to read {}", cli.input.display())));
        }
    };
    stage.finish(format!("✅ Read {} nodes, {} ways", data.nodes.len(), data.ways.len()));

    let stage = cli::StageProgress::start("🔧 Building network", hide_spinners);
    let (network, report) = match pipeline::build_network(data, &config) {
        Ok(built) => built,
        Err(e) => {
            stage.abandon();
            return Err(anyhow::Error::new(e).context("Failed to build network"));
        }
    };
    stage.finish("✅ Network built");

    let tables = export::write_csv(&network, &cli.outdir)
        .with_context(|| format!("Failed to write CSV to {}", cli.outdir.display()))?;
    eprintln!("📁 Saved {}", tables.node_file.display());
    eprintln!("📁 Saved {}", tables.link_file.display());
    if let Some(poi_file) = &tables.poi_file {
        eprintln!("📁 Saved {}", poi_file.display());
    }

    if cli.graph_json {
        let graph = export::write_graph_document(&network, &cli.outdir)
            .context("Failed to write graph document")?;
        eprintln!("📁 Saved {}", graph.point_file.display());
        eprintln!("📁 Saved {}", graph.edge_file.display());
        eprintln!("📁 Saved {}", graph.poi_file.display());
    }

    println!(
        "Generated {} nodes, {} links, {} POIs ({} link-ways, {} POI-ways, {} POIs linked to nodes)",
        network.node_count(),
        network.link_count(),
        network.poi_count(),
        report.link_ways,
        report.poi_ways,
        report.pois_linked
    );

    Ok(())
}
