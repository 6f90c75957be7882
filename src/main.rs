use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gps2staticmap::options::{ConvertOptions, MarkerSize, OutType};
use gps2staticmap::order::CoordOrder;
use gps2staticmap::pipeline::Converter;

/// Convert GPX/KML/KMZ/TRC/NMEA/POS files (any mix) into a single
/// static-map POST body.
#[derive(Debug, Parser)]
#[command(name = "gps2staticmap", version, about)]
struct Cli {
    /// Input files (.gpx .kml .kmz .trc .nma .nmea .log .txt .pos)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output JSON file
    #[arg(short, long, default_value = "staticmap_body.json")]
    output: PathBuf,

    /// Map style
    #[arg(long, default_value = "osm-carto")]
    style: String,

    /// Image width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Image height
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Image format
    #[arg(long, default_value = "png", value_parser = ["png", "jpeg"])]
    format: String,

    /// Geometry encoding for tracks/routes
    #[arg(long, value_enum, default_value = "geojson")]
    out_type: OutType,

    /// Track line color
    #[arg(long, default_value = "#0066ff")]
    linecolor: String,

    /// Track line width (px)
    #[arg(long, default_value_t = 5)]
    linewidth: u32,

    /// Downsample: keep every Nth point
    #[arg(long, default_value_t = 1)]
    thin: usize,

    /// If all GPX segments have <2 points, merge all points into one segment
    #[arg(long)]
    gpx_merge_singletons: bool,

    /// Force coordinate order for generic numeric log lines
    #[arg(long, value_enum)]
    order: Option<CoordOrder>,

    /// New segment at blank lines in TRC/NMEA logs
    #[arg(long)]
    split_on_empty: bool,

    /// Marker color
    #[arg(long, default_value = "#D32F2F")]
    marker_color: String,

    /// Marker named size
    #[arg(long, value_enum, default_value = "medium")]
    marker_size: MarkerSize,

    /// Marker size in pixels (overrides named size)
    #[arg(long)]
    marker_size_px: Option<u32>,

    /// Disable label text inside markers
    #[arg(long)]
    no_text: bool,

    /// Label text size
    #[arg(long, default_value_t = 18)]
    textsize: u32,

    /// Truncate names longer than this (0 = no limit)
    #[arg(long, default_value_t = 40)]
    max_name_len: usize,

    /// Disable waypoint/position extraction from non-POS inputs
    #[arg(long)]
    no_auto_positions: bool,

    /// Global cap on total track points (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_points: usize,

    /// Marker count cap (enforced with --thin-markers)
    #[arg(long, default_value_t = 100)]
    marker_cap: usize,

    /// Reduce marker density down to --marker-cap
    #[arg(long)]
    thin_markers: bool,

    /// Floor of the per-file KML marker suppression threshold
    #[arg(long, default_value_t = 100)]
    kml_suppression_floor: usize,

    /// Bounding-box padding as a fraction of each axis extent
    #[arg(long, default_value_t = 0.05)]
    pad_fraction: f64,

    /// Minimum bounding-box padding in degrees
    #[arg(long, default_value_t = 0.005)]
    pad_min_deg: f64,

    /// Abort on first bad file instead of skipping
    #[arg(long)]
    strict: bool,
}

impl Cli {
    fn to_options(&self) -> ConvertOptions {
        ConvertOptions {
            out_type: self.out_type,
            linecolor: self.linecolor.clone(),
            linewidth: self.linewidth,
            thin: self.thin.max(1),
            gpx_merge_singletons: self.gpx_merge_singletons,
            order: self.order,
            split_on_empty: self.split_on_empty,
            auto_positions: !self.no_auto_positions,
            marker_color: self.marker_color.clone(),
            marker_size: self.marker_size,
            marker_size_px: self.marker_size_px,
            include_text: !self.no_text,
            textsize: self.textsize,
            max_name_len: self.max_name_len,
            max_points: self.max_points,
            marker_cap: self.marker_cap,
            thin_markers: self.thin_markers,
            kml_suppression_floor: self.kml_suppression_floor,
            pad_fraction: self.pad_fraction,
            pad_min_deg: self.pad_min_deg,
            strict: self.strict,
            style: self.style.clone(),
            width: self.width,
            height: self.height,
            format: self.format.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = cli.to_options();

    let mut converter = Converter::new(opts);
    for input in &cli.inputs {
        converter
            .ingest_file(input)
            .with_context(|| format!("failed to process {}", input.display()))?;
    }
    let output = converter.finish();

    for entry in &output.report.entries {
        eprintln!("{entry}");
    }

    let file = File::create(&cli.output)
        .with_context(|| format!("cannot create {}", cli.output.display()))?;
    serde_json::to_writer(BufWriter::new(file), &output.body)?;
    println!("{}", cli.output.display());

    Ok(())
}
