//! Geographic-region default-depth grid: a coarse (lat, lon) grid
//! of default depths, read like the topography grid but carrying
//! floating-point depths rather than integer elevations. Used to seed
//! `DefaultDepth` when the per-event config doesn't override it.

use crate::error::TableError;

#[derive(Debug, Clone)]
pub struct RegionDepthGrid {
    pub nrows: usize,
    pub ncols: usize,
    pub cellsize: f64,
    pub lat0: f64,
    pub lon0: f64,
    depth_km: Vec<f32>,
}

impl RegionDepthGrid {
    pub fn from_bytes(
        bytes: &[u8],
        nrows: usize,
        ncols: usize,
        cellsize: f64,
        lat0: f64,
        lon0: f64,
    ) -> Result<Self, TableError> {
        let expected = nrows * ncols * 4;
        if bytes.len() != expected {
            return Err(TableError::Parse {
                table: "region_depth".to_string(),
                reason: format!("expected {expected} bytes, found {}", bytes.len()),
            });
        }
        let depth_km = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { nrows, ncols, cellsize, lat0, lon0, depth_km })
    }

    /// Default depth (km) at `(lat, lon)`, or `None` if there is no grid
    /// point covering it (the "no default-depth grid point" case feeding
    /// `DepthFixType::MedianOrNoGridPoint`).
    pub fn depth_at(&self, lat: f64, lon: f64) -> Option<f64> {
        let row = ((lat - self.lat0) / self.cellsize).round() as i64;
        let col = ((lon - self.lon0) / self.cellsize).round() as i64;
        if row < 0 || col < 0 || row as usize >= self.nrows || col as usize >= self.ncols {
            return None;
        }
        let idx = row as usize * self.ncols + col as usize;
        self.depth_km.get(idx).map(|&d| d as f64)
    }
}
