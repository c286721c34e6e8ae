//! waymatch CLI: match GPS traces onto a road network, or simplify
//! polylines, from plain text inputs.
//!
//! The network file has one edge per line: a label, whitespace, then a WKT
//! `LINESTRING`. Observations come as CSV with `lon,lat,time` columns,
//! RFC-3339 times, non-decreasing.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use waymatch_common::CancelToken;
use waymatch_geometry::{simplify, wkt, GeoidalCalculator, Polyline};
use waymatch_matching::io::{parse_network, parse_observations_csv};
use waymatch_matching::{MapMatcher, MatchConfig};

#[derive(Parser)]
#[command(name = "waymatch")]
#[command(about = "HMM map matching over road networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Decoder {
    Viterbi,
    Astar,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a GPS trace against a road network
    Match {
        /// Network file: one `label LINESTRING (...)` per line
        network: PathBuf,
        /// Observation CSV with lon,lat,time columns
        observations: PathBuf,
        /// Match configuration as JSON (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Decoder to run
        #[arg(long, value_enum, default_value = "viterbi")]
        decoder: Decoder,
        /// Also add every edge's reverse twin
        #[arg(long)]
        bidirectional: bool,
        /// Emit the result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Ramer-Douglas-Peucker simplification of a WKT polyline
    Simplify {
        /// File holding one WKT LINESTRING
        input: PathBuf,
        /// Tolerance in metres
        #[arg(long)]
        tolerance: f64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Commands::Match {
            network,
            observations,
            config,
            decoder,
            bidirectional,
            json,
        } => run_match(network, observations, config, decoder, bidirectional, json),
        Commands::Simplify { input, tolerance } => run_simplify(input, tolerance),
    }
}

fn run_match(
    network: PathBuf,
    observations: PathBuf,
    config: Option<PathBuf>,
    decoder: Decoder,
    bidirectional: bool,
    json: bool,
) -> Result<()> {
    let config: MatchConfig = match config {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).context("parsing match config")?
        }
        None => MatchConfig::default(),
    };

    let network_text = fs::read_to_string(&network)
        .with_context(|| format!("reading network {}", network.display()))?;
    let graph = parse_network(
        &network_text,
        GeoidalCalculator::default(),
        config.snap_threshold,
        bidirectional,
    )
    .context("parsing network")?;
    let trace_text = fs::read_to_string(&observations)
        .with_context(|| format!("reading observations {}", observations.display()))?;
    let trace = parse_observations_csv(&trace_text).context("parsing observations")?;
    info!(
        "loaded {} edges, {} nodes, {} observations",
        graph.edge_count(),
        graph.node_count(),
        trace.len()
    );

    let matcher = MapMatcher::new(&graph, config).context("building matcher")?;
    let token = CancelToken::new();
    let outcome = match decoder {
        Decoder::Viterbi => matcher.match_viterbi(&trace, &token),
        Decoder::Astar => matcher.match_astar(&trace, &token),
    }
    .context("matching failed")?;

    let labels: Vec<&str> = outcome
        .route
        .iter()
        .map(|&e| graph.edge(e).id.as_str())
        .collect();
    if json {
        let payload = serde_json::json!({
            "score": outcome.paths[0].score,
            "edges": labels,
            "route": outcome.route_geometry.to_string(),
        });
        println!("{payload}");
    } else {
        println!("matched edges: {}", labels.join(" "));
        println!("{}", outcome.route_geometry);
    }
    Ok(())
}

fn run_simplify(input: PathBuf, tolerance: f64) -> Result<()> {
    let text =
        fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
    let line = wkt::parse_polyline(text.trim()).context("parsing LINESTRING")?;
    let calc = GeoidalCalculator::default();
    let simplified: Polyline = simplify::simplify(&line, tolerance, &calc)?;
    info!("{} -> {} points", line.len(), simplified.len());
    println!("{simplified}");
    Ok(())
}

