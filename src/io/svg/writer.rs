//! SVG writing operations.

use std::{fs::File, io::{BufWriter, Write}, path::Path};

use anyhow::{Context, Result};
use geo::{Coord, CoordsIter, LineString, MultiPolygon, Rect};

pub(crate) struct SvgWriter {
    writer: BufWriter<File>
}

/// Implement std::io::Write so `write!` / `writeln!` work.
impl Write for SvgWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.writer.write(buf) }

    fn flush(&mut self) -> std::io::Result<()> { self.writer.flush() }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> { self.writer.write_all(buf) }
}

impl SvgWriter {
    /// Create a new SVG writer to a file path
    pub(crate) fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("[io::svg] Failed to create {}", path.display()))?;

        Ok(Self { writer: BufWriter::new(file) })
    }

    /// Write the XML declaration, the opening <svg> tag, a white background and styles.
    pub(crate) fn write_header(&mut self, width: f64, height: f64) -> Result<()> {
        writeln!(self, r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"##)?;
        writeln!(self, r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"##)?;
        writeln!(self, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;
        writeln!(self, r##"<defs>
<style>
    .unit {{ stroke: #111827; stroke-width: 0.3; fill-rule: evenodd; }}
    .centroid {{ fill: #ffffff; stroke: #111827; stroke-width: 0.5; }}
    .title {{ font-family: sans-serif; font-size: 20px; fill: #111827; }}
</style>
</defs>"##)?;
        Ok(())
    }

    /// Write the closing </svg> tag and flush.
    pub(crate) fn finish(mut self) -> Result<()> {
        writeln!(self, "</svg>")?;
        self.flush().context("[io::svg] Failed to flush SVG output")
    }
}

/// Maps lon/lat (or projected x/y) into SVG pixels, preserving aspect, Y down.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Projection {
    bounds: Rect<f64>,
    margin: f64,
    scale: f64,
}

impl Projection {
    /// Fit `bounds` into `width` pixels with `margin` on every side.
    pub(crate) fn fit(bounds: Rect<f64>, width: f64, margin: f64) -> Self {
        let extent = bounds.width().max(bounds.height());
        let scale = if extent > 0.0 { (width - 2.0 * margin) / extent } else { 1.0 };
        Self { bounds, margin, scale }
    }

    pub(crate) fn width(&self) -> f64 { self.bounds.width() * self.scale + 2.0 * self.margin }

    pub(crate) fn height(&self) -> f64 { self.bounds.height() * self.scale + 2.0 * self.margin }

    pub(crate) fn project(&self, coord: Coord<f64>) -> (f64, f64) {
        let x = self.margin + (coord.x - self.bounds.min().x) * self.scale;
        let y = self.margin + (self.bounds.max().y - coord.y) * self.scale; // invert vertically
        (x, y)
    }
}

/// Build a compact SVG path string for a MultiPolygon (exteriors + holes).
pub(crate) fn multipolygon_to_path(shape: &MultiPolygon<f64>, projection: &Projection) -> String {
    let mut out = String::new();

    for polygon in &shape.0 {
        out.push_str(&ring_to_path(polygon.exterior(), projection));
        for interior in polygon.interiors() {
            out.push_str(&ring_to_path(interior, projection));
        }
    }

    out
}

/// Build a compact SVG path string for a LineString (ring).
fn ring_to_path(ring: &LineString<f64>, projection: &Projection) -> String {
    let mut out = String::new();

    let mut coords = ring.coords_iter()
        .map(|coord| projection.project(coord));
    if let Some((x, y)) = coords.next() {
        out.push_str(&format!(" M{x:.3},{y:.3}"));
        for (x, y) in coords {
            out.push_str(&format!(" L{x:.3},{y:.3}"));
        }
        out.push('Z');
    }

    out
}

/// Escape text for use inside an SVG element.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use geo::{Coord, MultiPolygon, Rect};

    use super::{Projection, escape_xml, multipolygon_to_path};

    #[test]
    fn projection_flips_y_and_keeps_aspect() {
        let projection = Projection::fit(Rect::new((0.0, 0.0), (2.0, 1.0)), 220.0, 10.0);
        assert_eq!(projection.width(), 220.0);
        assert_eq!(projection.height(), 120.0);
        assert_eq!(projection.project(Coord { x: 0.0, y: 1.0 }), (10.0, 10.0));
        assert_eq!(projection.project(Coord { x: 2.0, y: 0.0 }), (210.0, 110.0));
    }

    #[test]
    fn path_closes_each_ring() {
        let square = MultiPolygon(vec![Rect::new((0.0, 0.0), (1.0, 1.0)).to_polygon()]);
        let projection = Projection::fit(Rect::new((0.0, 0.0), (1.0, 1.0)), 1.0, 0.0);
        let path = multipolygon_to_path(&square, &projection);
        assert!(path.starts_with(" M"));
        assert_eq!(path.matches('Z').count(), 1);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml(r#"A&B <"x">"#), "A&amp;B &lt;&quot;x&quot;&gt;");
    }
}
