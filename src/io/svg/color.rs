//! Colors for group maps.

use std::fmt;

/// HSL color: h in degrees, s and l in [0.0, 1.0].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Hsl {
    pub(crate) h: f64,
    pub(crate) s: f64,
    pub(crate) l: f64,
}

impl fmt::Display for Hsl {
    /// Format as CSS HSL:
    ///   hsl({h:.1},{s:.0}%,{l:.0}%)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // normalize hue into [0,360)
        let h = (self.h % 360.0 + 360.0) % 360.0;
        let s = (self.s * 100.0).clamp(0.0, 100.0);
        let l = (self.l * 100.0).clamp(0.0, 100.0);
        write!(f, "hsl({:.1},{:.0}%,{:.0}%)", h, s, l)
    }
}

/// Fill for units that belong to no group.
pub(crate) const UNASSIGNED_FILL: &str = "#d1d5db";

/// `count` distinct hues spaced evenly around the color wheel.
pub(crate) fn spaced_hues(count: usize) -> Vec<Hsl> {
    (0..count)
        .map(|i| Hsl { h: 360.0 * i as f64 / count as f64, s: 0.70, l: 0.55 })
        .collect()
}
