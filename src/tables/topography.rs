//! Topography grid loader: a regular (lat, lon) little-endian int16
//! elevation grid, used by the bounce-point correction.

use crate::error::TableError;

#[derive(Debug, Clone)]
pub struct TopographyGrid {
    pub nrows: usize,
    pub ncols: usize,
    /// cell size, degrees.
    pub cellsize: f64,
    /// grid origin, south-west corner.
    pub lat0: f64,
    pub lon0: f64,
    elevation_m: Vec<i16>,
}

impl TopographyGrid {
    pub fn from_bytes(
        bytes: &[u8],
        nrows: usize,
        ncols: usize,
        cellsize: f64,
        lat0: f64,
        lon0: f64,
    ) -> Result<Self, TableError> {
        let expected = nrows * ncols * 2;
        if bytes.len() != expected {
            return Err(TableError::Parse {
                table: "topography".to_string(),
                reason: format!("expected {expected} bytes, found {}", bytes.len()),
            });
        }
        let elevation_m = bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        Ok(Self { nrows, ncols, cellsize, lat0, lon0, elevation_m })
    }

    /// Nearest-cell elevation (meters) at `(lat, lon)`, or `None` outside
    /// the grid's coverage.
    pub fn elevation_at(&self, lat: f64, lon: f64) -> Option<f64> {
        let row = ((lat - self.lat0) / self.cellsize).round() as i64;
        let col = ((lon - self.lon0) / self.cellsize).round() as i64;
        if row < 0 || col < 0 || row as usize >= self.nrows || col as usize >= self.ncols {
            return None;
        }
        let idx = row as usize * self.ncols + col as usize;
        self.elevation_m.get(idx).map(|&e| e as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_grid() {
        let values: Vec<i16> = vec![10, -20, 30, 40];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let grid = TopographyGrid::from_bytes(&bytes, 2, 2, 1.0, 0.0, 0.0).unwrap();
        assert_eq!(grid.elevation_at(0.0, 0.0), Some(10.0));
        assert_eq!(grid.elevation_at(0.0, 1.0), Some(-20.0));
        assert_eq!(grid.elevation_at(1.0, 0.0), Some(30.0));
        assert_eq!(grid.elevation_at(5.0, 5.0), None);
    }
}
