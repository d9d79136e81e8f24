// src/lib.rs

// Netmap - Network Heatmap Rendering Core
//
// This library maps every address of an IPv4 CIDR block onto a square canvas
// along a Hilbert curve, so that numerically adjacent addresses land on
// spatially adjacent pixels, and colors each scanned host by its measurement
// (round-trip time or open-port count) on a fixed cold-to-hot gradient.

pub mod curve;
pub mod geometry;
pub mod gradient;
pub mod output;
pub mod render;
pub mod scanner;

pub use curve::{CurveError, HilbertCurve};
pub use geometry::{InvalidSubnet, Subnet};
pub use gradient::{Gradient, MAX_LEVEL};
pub use render::{render_heatmap, Heatmap, RenderError};
pub use scanner::{scan, HostRecord, ScanError, ScanMode};
