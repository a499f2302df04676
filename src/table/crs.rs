use std::{fmt, str::FromStr, sync::LazyLock};

use anyhow::{Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Top-level EPSG authority clause in a WKT1 / ESRI `.prj` definition.
static EPSG_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"AUTHORITY\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#).expect("valid EPSG authority regex")
});

/// Coordinate reference system of a geometry table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crs {
    /// Registered EPSG code, e.g. 4269 for NAD83 lon/lat.
    Epsg(u32),
    /// Unregistered definition, compared textually.
    Wkt(String),
}

impl Crs {
    /// Interpret a WKT definition (e.g. the contents of a `.prj` file).
    /// The outermost EPSG authority wins; without one the trimmed text is kept.
    pub fn from_wkt(wkt: &str) -> Self {
        EPSG_AUTHORITY.captures_iter(wkt)
            .last()
            .and_then(|caps| caps[1].parse().ok())
            .map(Crs::Epsg)
            .unwrap_or_else(|| Crs::Wkt(wkt.trim().to_string()))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::Wkt(wkt) => {
                let head = wkt.chars().take(48).collect::<String>();
                if head.len() < wkt.len() { write!(f, "{head}...") } else { write!(f, "{head}") }
            }
        }
    }
}

impl FromStr for Crs {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() { bail!("Empty coordinate reference system") }

        let code = s.strip_prefix("EPSG:")
            .or_else(|| s.strip_prefix("epsg:"))
            .unwrap_or(s);
        if let Ok(code) = code.parse::<u32>() {
            return Ok(Crs::Epsg(code));
        }

        Ok(Crs::from_wkt(s))
    }
}
