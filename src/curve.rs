// Hilbert curve mapping between linear offsets and canvas coordinates
//
// The Hilbert curve is a space-filling curve with good locality: offsets
// that are numerically close stay spatially close on the canvas. That is
// what makes adjacent addresses cluster visibly in the rendered heatmap
// instead of scattering as they would with a row-major layout.

use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CurveError {
    // The curve construction subdivides the canvas into quadrants all the
    // way down, so the side length must be a power of two.
    #[error("canvas side {0} is not a power of two")]
    UnsupportedSide(u32),

    // Recoverable: the caller is expected to skip the record that produced
    // the offset, not abort the render.
    #[error("offset {offset} is outside the {side}x{side} canvas")]
    OffsetOutOfRange { offset: u32, side: u32 },
}

// ============================================================================
// HILBERT CURVE
// ============================================================================

// A Hilbert curve over a side x side grid.
//
// Once constructed the mapper is read-only; `locate` and `index_of` form a
// bijection between offsets [0, side^2) and grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HilbertCurve {
    side: u32,
}

impl HilbertCurve {
    pub fn new(side: u32) -> Result<Self, CurveError> {
        if side == 0 || !side.is_power_of_two() {
            return Err(CurveError::UnsupportedSide(side));
        }
        Ok(Self { side })
    }

    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    // Number of cells on the curve (side^2). u64 because a /0 subnet maps to
    // a 65536-sided canvas whose cell count overflows u32.
    #[inline]
    pub fn cell_count(&self) -> u64 {
        u64::from(self.side) * u64::from(self.side)
    }

    // Map a curve offset to its (x, y) cell.
    //
    // Standard iterative construction: walk quadrant sizes from 1 up to the
    // full side, pulling two bits of the offset per level and applying the
    // quadrant rotation.
    pub fn locate(&self, offset: u32) -> Result<(u32, u32), CurveError> {
        if u64::from(offset) >= self.cell_count() {
            return Err(CurveError::OffsetOutOfRange {
                offset,
                side: self.side,
            });
        }

        let n = u64::from(self.side);
        let mut x = 0u64;
        let mut y = 0u64;
        let mut t = u64::from(offset);
        let mut s = 1u64;

        while s < n {
            let rx = 1 & (t / 2);
            let ry = 1 & (t ^ rx);
            rot(s, &mut x, &mut y, rx, ry);
            x += s * rx;
            y += s * ry;
            t /= 4;
            s *= 2;
        }

        Ok((x as u32, y as u32))
    }

    // Map a cell back to its curve offset; the inverse of `locate`.
    //
    // Coordinates must lie inside the grid.
    pub fn index_of(&self, x: u32, y: u32) -> u32 {
        debug_assert!(x < self.side && y < self.side, "cell outside the grid");

        let mut x = u64::from(x);
        let mut y = u64::from(y);
        let mut d = 0u64;
        let mut s = u64::from(self.side) / 2;

        while s > 0 {
            let rx = u64::from((x & s) > 0);
            let ry = u64::from((y & s) > 0);
            d += s * s * ((3 * rx) ^ ry);
            rot(s, &mut x, &mut y, rx, ry);
            s /= 2;
        }

        d as u32
    }
}

// Rotate/flip a quadrant for the Hilbert curve transformation.
//
// Uses signed arithmetic for the reflection because during index_of the
// coordinates can exceed the current quadrant size s, making s - 1 - x
// negative as an intermediate value.
#[inline]
fn rot(s: u64, x: &mut u64, y: &mut u64, rx: u64, ry: u64) {
    if ry == 0 {
        if rx == 1 {
            let s_minus_1 = s as i64 - 1;
            *x = (s_minus_1 - *x as i64) as u64;
            *y = (s_minus_1 - *y as i64) as u64;
        }
        std::mem::swap(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rejects_non_power_of_two_sides() {
        for side in [0, 3, 12, 100, 65535] {
            assert_eq!(
                HilbertCurve::new(side),
                Err(CurveError::UnsupportedSide(side))
            );
        }
        for side in [1, 2, 16, 256, 65536] {
            assert!(HilbertCurve::new(side).is_ok(), "side {side}");
        }
    }

    #[test]
    fn test_locate_starts_at_origin() {
        let curve = HilbertCurve::new(16).unwrap();
        assert_eq!(curve.locate(0), Ok((0, 0)));
    }

    #[test]
    fn test_locate_rejects_out_of_range_offsets() {
        let curve = HilbertCurve::new(16).unwrap();
        assert!(curve.locate(255).is_ok());
        assert_eq!(
            curve.locate(256),
            Err(CurveError::OffsetOutOfRange {
                offset: 256,
                side: 16
            })
        );
    }

    #[test]
    fn test_bijection_over_full_grid() {
        // Every offset maps to a distinct cell and index_of inverts it.
        let curve = HilbertCurve::new(32).unwrap();
        let mut seen = HashSet::new();
        for offset in 0..curve.cell_count() as u32 {
            let (x, y) = curve.locate(offset).expect("offset in range");
            assert!(x < 32 && y < 32, "cell ({x}, {y}) outside grid");
            assert!(seen.insert((x, y)), "cell ({x}, {y}) visited twice");
            assert_eq!(curve.index_of(x, y), offset, "roundtrip for {offset}");
        }
        assert_eq!(seen.len(), 1024, "all cells must be covered");
    }

    #[test]
    fn test_consecutive_offsets_are_grid_neighbors() {
        // The locality property the whole heatmap layout rests on.
        let curve = HilbertCurve::new(16).unwrap();
        for offset in 0..(curve.cell_count() as u32 - 1) {
            let (x0, y0) = curve.locate(offset).unwrap();
            let (x1, y1) = curve.locate(offset + 1).unwrap();
            let dist = x0.abs_diff(x1) + y0.abs_diff(y1);
            assert_eq!(dist, 1, "offsets {offset} and {} not adjacent", offset + 1);
        }
    }

    #[test]
    fn test_single_cell_curve() {
        let curve = HilbertCurve::new(1).unwrap();
        assert_eq!(curve.locate(0), Ok((0, 0)));
        assert!(curve.locate(1).is_err());
    }
}
