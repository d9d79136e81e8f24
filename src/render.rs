// Heatmap compositing: subnet geometry + scan records -> finished canvas

use image::RgbaImage;
use thiserror::Error;
use tracing::warn;

use crate::curve::{CurveError, HilbertCurve};
use crate::geometry::{InvalidSubnet, Subnet};
use crate::gradient::{Gradient, MAX_LEVEL};
use crate::scanner::{HostRecord, ScanMode};

// ============================================================================
// ERRORS
// ============================================================================

// Failures that abort a render before any pixel is painted. Individual
// unmappable records are not errors; they are skipped and counted.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    InvalidSubnet(#[from] InvalidSubnet),

    #[error(transparent)]
    UnsupportedSide(#[from] CurveError),
}

// ============================================================================
// RESULT TYPE
// ============================================================================

// A finished render plus paint statistics.
//
// `skipped` counts records whose address could not be placed on the canvas
// (outside the subnet, or supplied for a different network). Dropping data
// silently would hide scanner misconfiguration, so the count travels with
// the image.
#[derive(Debug)]
pub struct Heatmap {
    pub image: RgbaImage,
    pub painted: usize,
    pub skipped: usize,
}

// ============================================================================
// COMPOSITOR
// ============================================================================

// Render a heatmap for a subnet from a list of scanned host records.
//
// Pipeline:
// 1. Canvas side from the subnet geometry
// 2. Background fill: coldest gradient stop, or fully transparent pixels
// 3. Hilbert mapper for the canvas
// 4. Normalize each record's metric against the observed maximum and paint
//    its cell; later records overwrite earlier ones on collisions
//
// Single-threaded by design: the per-pixel work is trivial next to the
// minutes nmap spends producing the records.
pub fn render_heatmap(
    subnet: Subnet,
    mode: ScanMode,
    transparent: bool,
    gradient: &Gradient,
    records: &[HostRecord],
) -> Result<Heatmap, RenderError> {
    let side = subnet.side()?;
    let curve = HilbertCurve::new(side)?;

    // RgbaImage::new zeroes every pixel, which is exactly the transparent
    // baseline (alpha 0); the opaque variant paints the coldest stop over it.
    let mut image = RgbaImage::new(side, side);
    if !transparent {
        let cold = gradient.coldest();
        for pixel in image.pixels_mut() {
            *pixel = cold;
        }
    }

    // Maximum observed metric; zero when nothing was measured, in which case
    // every record normalizes to the coldest level (no division happens).
    let max = records.iter().map(|r| metric(r, mode)).max().unwrap_or(0);

    let mut painted = 0usize;
    let mut skipped = 0usize;
    for record in records {
        let Some(offset) = subnet.offset_of(record.addr) else {
            warn!(addr = %record.addr, subnet = %subnet, "host below subnet base, skipping");
            skipped += 1;
            continue;
        };
        let (x, y) = match curve.locate(offset) {
            Ok(cell) => cell,
            Err(err) => {
                warn!(addr = %record.addr, error = %err, "skipping unmappable host");
                skipped += 1;
                continue;
            }
        };
        let level = normalize(metric(record, mode), max);
        image.put_pixel(x, y, gradient.color_at(level));
        painted += 1;
    }

    Ok(Heatmap {
        image,
        painted,
        skipped,
    })
}

// The metric a scan mode measures: RTT for host discovery, open-port count
// for every port-scan mode.
#[inline]
fn metric(record: &HostRecord, mode: ScanMode) -> u64 {
    match mode {
        ScanMode::HostUp => record.rtt_us,
        ScanMode::WebPorts | ScanMode::DefaultPorts | ScanMode::AllPorts => {
            record.open_ports.len() as u64
        }
    }
}

// Scale a metric into the gradient's level range.
#[inline]
fn normalize(value: u64, max: u64) -> u16 {
    if max == 0 {
        return 0;
    }
    (value * u64::from(MAX_LEVEL) / max) as u16
}
