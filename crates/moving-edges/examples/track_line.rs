//! Example: track a straight contour through an image sequence.
//!
//! Places `--sites` equally spaced sites on the segment between `--from` and
//! `--to` (given as `row,col`), initializes them on the first frame and
//! tracks them through the remaining frames. Every frame's site positions and
//! suppress codes are written to a JSON file.
//!
//! Run from the workspace root:
//!   cargo run -p moving-edges --example track_line -- --help
//!   RUST_LOG=debug cargo run -p moving-edges --example track_line -- \
//!       --from 40,120 --to 400,120 frame_000.png frame_001.png

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use image::ImageReader;
use log::info;
use moving_edges::{EdgeSite, Image, MeConfig, SiteTracker, Suppress};
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Track moving-edge sites along a line over a sequence of frames")]
struct Args {
    /// PNG frames in tracking order
    #[arg(required = true)]
    frames: Vec<PathBuf>,

    /// Segment start as `row,col`
    #[arg(long, value_parser = parse_point)]
    from: (f32, f32),

    /// Segment end as `row,col`
    #[arg(long, value_parser = parse_point)]
    to: (f32, f32),

    /// Number of sites on the segment
    #[arg(long, default_value_t = 32)]
    sites: usize,

    /// JSON file with `MeConfig` fields; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the search half-range, in pixels
    #[arg(long)]
    range: Option<u32>,

    /// Accept matches of either polarity
    #[arg(long)]
    any_sign: bool,

    /// Output JSON path (default: tracks.json next to the first frame)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_point(s: &str) -> Result<(f32, f32), String> {
    let (r, c) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `row,col`, got `{s}`"))?;
    let r = r.trim().parse().map_err(|e| format!("row: {e}"))?;
    let c = c.trim().parse().map_err(|e| format!("col: {e}"))?;
    Ok((r, c))
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SiteDto {
    row: f32,
    col: f32,
    response: f32,
    normalized: f32,
    suppress: Suppress,
}

#[derive(Serialize)]
struct FrameResult {
    frame: String,
    /// Wall-clock time spent tracking this frame, in milliseconds.
    elapsed_ms: f64,
    trusted: usize,
    sites: Vec<SiteDto>,
}

#[derive(Serialize)]
struct Report {
    config: MeConfig,
    frames: Vec<FrameResult>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_gray(path: &Path) -> Result<Image<u8>> {
    let gray = ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?
        .into_luma8();
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    Image::from_vec(w, h, gray.into_raw()).context("building Image")
}

fn load_config(args: &Args) -> Result<MeConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => MeConfig::default(),
    };
    if let Some(range) = args.range {
        cfg.range = range;
    }
    Ok(cfg)
}

/// Sites on the segment, tangent along it.
fn line_sites(from: (f32, f32), to: (f32, f32), count: usize) -> Vec<EdgeSite> {
    let (dr, dc) = (to.0 - from.0, to.1 - from.1);
    // Tangent angle in (row, col): the segment direction is (cos alpha, sin alpha).
    let alpha = dc.atan2(dr);
    let denom = count.saturating_sub(1).max(1) as f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / denom;
            EdgeSite::with_angle(from.0 + t * dr, from.1 + t * dc, alpha)
        })
        .collect()
}

fn snapshot(sites: &[EdgeSite]) -> Vec<SiteDto> {
    sites
        .iter()
        .map(|s| SiteDto {
            row: s.row(),
            col: s.col(),
            response: s.response(),
            normalized: s.normalized_gradient(),
            suppress: s.suppress(),
        })
        .collect()
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.sites == 0 {
        bail!("--sites must be > 0");
    }
    let cfg = load_config(&args)?;
    let mut tracker = SiteTracker::new(cfg.clone()).context("invalid tracker config")?;
    let test_contrast = !args.any_sign;

    let out_path = args.out.clone().unwrap_or_else(|| {
        args.frames[0]
            .parent()
            .unwrap_or(Path::new("."))
            .join("tracks.json")
    });

    let mut sites = line_sites(args.from, args.to, args.sites);
    let mut frames = Vec::with_capacity(args.frames.len());
    let total_start = Instant::now();

    for (idx, path) in args.frames.iter().enumerate() {
        let img = load_gray(path)?;
        let view = img.as_view();

        let t0 = Instant::now();
        let trusted = if idx == 0 {
            for site in &mut sites {
                tracker.initialize(&view, site);
            }
            sites.iter().filter(|s| s.is_trusted()).count()
        } else {
            tracker.track_all(&view, &mut sites, test_contrast).trusted
        };
        let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

        info!("{}: {trusted}/{} trusted", path.display(), sites.len());
        println!(
            "  frame {idx}: {trusted}/{} trusted  ({elapsed_ms:.2} ms)",
            sites.len()
        );

        frames.push(FrameResult {
            frame: path.display().to_string(),
            elapsed_ms,
            trusted,
            sites: snapshot(&sites),
        });
    }

    let total_ms = total_start.elapsed().as_secs_f64() * 1e3;
    println!("total time: {total_ms:.2} ms");

    let report = Report {
        config: cfg,
        frames,
    };
    let out_file = std::fs::File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    serde_json::to_writer_pretty(out_file, &report)
        .with_context(|| format!("writing JSON to {}", out_path.display()))?;

    println!("results written to {}", out_path.display());
    Ok(())
}
