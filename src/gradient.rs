// Cold-to-hot color gradient for normalized measurement levels
//
// Gradient math after http://www.andrewnoske.com/wiki/Code_-_heatmaps_and_color_gradients

use image::Rgba;

// Measurement levels are normalized into the full u16 range before lookup.
pub const MAX_LEVEL: u16 = u16::MAX;

// ============================================================================
// GRADIENT
// ============================================================================

// An ordered list of color stops spanning [0, MAX_LEVEL].
//
// Stop i sits at level i * MAX_LEVEL / N. The table is an explicit value
// rather than a process-wide constant so tests can substitute palettes, but
// rendering always uses `Gradient::default()`: the classic 7-stop
// black -> blue -> cyan -> green -> yellow -> red -> white ramp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gradient {
    stops: Vec<Rgba<u8>>,
}

impl Default for Gradient {
    fn default() -> Self {
        Self::new(vec![
            Rgba([0, 0, 0, 255]),       // black
            Rgba([0, 0, 255, 255]),     // blue
            Rgba([0, 255, 255, 255]),   // cyan
            Rgba([0, 255, 0, 255]),     // green
            Rgba([255, 255, 0, 255]),   // yellow
            Rgba([255, 0, 0, 255]),     // red
            Rgba([255, 255, 255, 255]), // white
        ])
    }
}

impl Gradient {
    pub fn new(stops: Vec<Rgba<u8>>) -> Self {
        assert!(!stops.is_empty(), "gradient needs at least one stop");
        Self { stops }
    }

    // The color an unmeasured (or zero-level) cell gets.
    #[inline]
    pub fn coldest(&self) -> Rgba<u8> {
        self.stops[0]
    }

    #[inline]
    pub fn hottest(&self) -> Rgba<u8> {
        self.stops[self.stops.len() - 1]
    }

    // Color for a normalized level.
    //
    // The extremes return the first and last stop exactly. In between, the
    // level falls between two stop centers and each channel is interpolated
    // linearly by its fractional position between them. Levels at or past
    // the last stop center take the last stop exactly (no extrapolation).
    pub fn color_at(&self, level: u16) -> Rgba<u8> {
        if level == 0 {
            return self.coldest();
        }
        if level == MAX_LEVEL {
            return self.hottest();
        }

        let n = self.stops.len() as u32;
        let max = u32::from(MAX_LEVEL);
        for i in 1..n {
            let center = i * max / n;
            if u32::from(level) < center {
                let prev_center = (i - 1) * max / n;
                let fract =
                    f64::from(u32::from(level) - prev_center) / f64::from(center - prev_center);
                return lerp(self.stops[(i - 1) as usize], self.stops[i as usize], fract);
            }
        }
        self.hottest()
    }
}

// Channel-wise linear interpolation, rounded to the nearest u8. Alpha is
// interpolated like any other channel; nothing is premultiplied.
fn lerp(a: Rgba<u8>, b: Rgba<u8>, fract: f64) -> Rgba<u8> {
    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let av = f64::from(a.0[c]);
        let bv = f64::from(b.0[c]);
        *slot = (av + (bv - av) * fract).round() as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_extremes_are_exact() {
        let g = Gradient::default();
        assert_eq!(g.color_at(0), BLACK);
        assert_eq!(g.color_at(MAX_LEVEL), WHITE);
    }

    #[test]
    fn test_first_segment_midpoint() {
        // Stop centers sit at i * 65535 / 7; halfway between black (0) and
        // blue (9362) only the blue channel has risen, to half intensity.
        let g = Gradient::default();
        assert_eq!(g.color_at(4681), Rgba([0, 0, 128, 255]));
    }

    #[test]
    fn test_levels_past_last_center_saturate() {
        // The last center is 6 * 65535 / 7 = 56172; beyond it there is
        // nothing left to interpolate toward.
        let g = Gradient::default();
        assert_eq!(g.color_at(56172), WHITE);
        assert_eq!(g.color_at(60000), WHITE);
    }

    #[test]
    fn test_determinism() {
        let g = Gradient::default();
        for level in [1, 1000, 9362, 30000, 65534] {
            assert_eq!(g.color_at(level), g.color_at(level), "level {level}");
        }
    }

    #[test]
    fn test_channel_trends_follow_stop_table() {
        // Walking up the levels, each channel must move monotonically within
        // a segment toward the next stop's value.
        let g = Gradient::default();
        let centers: Vec<u32> = (0..7).map(|i| i * 65535 / 7).collect();
        for seg in 1..centers.len() {
            let (lo, hi) = (centers[seg - 1], centers[seg]);
            let mut prev = g.color_at(lo as u16);
            let target = g.color_at((hi as u16).min(MAX_LEVEL));
            for level in (lo..hi).step_by(97) {
                let c = g.color_at(level as u16);
                for ch in 0..4 {
                    if target.0[ch] >= prev.0[ch] {
                        assert!(c.0[ch] >= prev.0[ch], "segment {seg} channel {ch} fell");
                    } else {
                        assert!(c.0[ch] <= prev.0[ch], "segment {seg} channel {ch} rose");
                    }
                }
                prev = c;
            }
        }
    }

    #[test]
    fn test_custom_two_stop_palette() {
        let g = Gradient::new(vec![BLACK, WHITE]);
        assert_eq!(g.color_at(0), BLACK);
        // The only interior center is 65535 / 2 = 32767; halfway to it the
        // channels sit at half intensity.
        let mid = g.color_at(16384);
        assert_eq!(mid.0[3], 255);
        assert!((126..=129).contains(&mid.0[0]), "got {:?}", mid);
        // At and past the single interior center the last stop wins.
        assert_eq!(g.color_at(32767), WHITE);
        assert_eq!(g.color_at(MAX_LEVEL), WHITE);
    }
}
