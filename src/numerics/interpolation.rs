//! Bilinear and bicubic interpolation over (distance, depth) tables.
//!
//! Bilinear is used for ellipticity tables;
//! bicubic natural-spline interpolation is used for travel-time tables,
//! which are dense enough that the extra curvature is meaningful and a
//! bicubic fit does not overshoot.

use thiserror::Error;

use super::spline::natural_cubic_spline_coefficients;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InterpolationError {
    #[error("coordinate outside table domain")]
    OutOfRange,
    #[error("fewer than 3 valid samples on an axis")]
    InsufficientSamples,
}

/// Finds `i` such that `nodes[i] <= x <= nodes[i+1]`, or `OutOfRange`.
fn bracket(nodes: &[f64], x: f64) -> Result<usize, InterpolationError> {
    if nodes.len() < 2 || x < nodes[0] || x > nodes[nodes.len() - 1] {
        return Err(InterpolationError::OutOfRange);
    }
    // nodes are monotonically increasing
    let idx = match nodes.binary_search_by(|n| n.partial_cmp(&x).unwrap()) {
        Ok(i) => i.min(nodes.len() - 2),
        Err(i) => (i - 1).min(nodes.len() - 2),
    };
    Ok(idx)
}

/// Bilinear interpolation of `table[row][col]` at `(x, y)` given monotone
/// node arrays `xs` (rows) and `ys` (cols). Returns `OutOfRange` if `(x, y)`
/// lies outside the node domain, reproducing a linear function exactly
/// within one cell.
pub fn bilinear_interpolate(
    xs: &[f64],
    ys: &[f64],
    table: &[Vec<f64>],
    x: f64,
    y: f64,
) -> Result<f64, InterpolationError> {
    let i = bracket(xs, x)?;
    let j = bracket(ys, y)?;

    let (x0, x1) = (xs[i], xs[i + 1]);
    let (y0, y1) = (ys[j], ys[j + 1]);

    let tx = if (x1 - x0).abs() < f64::EPSILON {
        0.0
    } else {
        (x - x0) / (x1 - x0)
    };
    let ty = if (y1 - y0).abs() < f64::EPSILON {
        0.0
    } else {
        (y - y0) / (y1 - y0)
    };

    let f00 = table[i][j];
    let f10 = table[i + 1][j];
    let f01 = table[i][j + 1];
    let f11 = table[i + 1][j + 1];

    let value = (1.0 - tx) * (1.0 - ty) * f00
        + tx * (1.0 - ty) * f10
        + (1.0 - tx) * ty * f01
        + tx * ty * f11;

    Ok(value)
}

/// Bicubic interpolation: natural cubic spline across `ys` at each of the 4
/// bracketing `xs` rows, then a natural cubic spline across the 4
/// interpolated values in `x`. Negative table entries mark "no phase at
/// that node" and are dropped; at least 3 valid samples per axis are
/// required or `InsufficientSamples` is returned.
///
/// `want_second_derivative` additionally returns d2f/dx2 at the query
/// point (used for defining slownesses in the travel-time layer).
pub fn bicubic_interpolate(
    xs: &[f64],
    ys: &[f64],
    table: &[Vec<f64>],
    x: f64,
    y: f64,
    want_second_derivative: bool,
) -> Result<(f64, Option<f64>), InterpolationError> {
    let i = bracket(xs, x)?;
    let j = bracket(ys, y)?;

    // 4x4 window centered on the bracketing cell, clamped to table bounds.
    let row_lo = i.saturating_sub(1);
    let row_hi = (i + 2).min(xs.len() - 1);
    let col_lo = j.saturating_sub(1);
    let col_hi = (j + 2).min(ys.len() - 1);

    let rows: Vec<usize> = (row_lo..=row_hi).collect();
    let cols: Vec<usize> = (col_lo..=col_hi).collect();

    if rows.len() < 3 || cols.len() < 3 {
        return Err(InterpolationError::InsufficientSamples);
    }

    // interpolate across depth (y) for each candidate row, dropping
    // negative ("no phase") entries per row.
    let mut row_values = Vec::with_capacity(rows.len());
    for &r in &rows {
        let node_y: Vec<f64> = cols.iter().map(|&c| ys[c]).collect();
        let node_f: Vec<f64> = cols.iter().map(|&c| table[r][c]).collect();
        let valid: Vec<(f64, f64)> = node_y
            .iter()
            .zip(node_f.iter())
            .filter(|(_, f)| **f >= 0.0)
            .map(|(a, b)| (*a, *b))
            .collect();
        if valid.len() < 3 {
            return Err(InterpolationError::InsufficientSamples);
        }
        let vy: Vec<f64> = valid.iter().map(|p| p.0).collect();
        let vf: Vec<f64> = valid.iter().map(|p| p.1).collect();
        let (f, _) = spline_eval(&vy, &vf, y)?;
        row_values.push(f);
    }

    let node_x: Vec<f64> = rows.iter().map(|&r| xs[r]).collect();
    let (f, d2f) = spline_eval(&node_x, &row_values, x)?;

    Ok((f, if want_second_derivative { Some(d2f) } else { None }))
}

/// Evaluate a natural cubic spline through `(nodes[k], values[k])` at `x`,
/// returning `(f(x), f''(x))`.
fn spline_eval(nodes: &[f64], values: &[f64], x: f64) -> Result<(f64, f64), InterpolationError> {
    if nodes.len() < 3 {
        return Err(InterpolationError::InsufficientSamples);
    }
    let second_derivs = natural_cubic_spline_coefficients(nodes, values);
    let i = bracket(nodes, x)?;
    let (x0, x1) = (nodes[i], nodes[i + 1]);
    let h = x1 - x0;
    let a = (x1 - x) / h;
    let b = (x - x0) / h;

    let f = a * values[i]
        + b * values[i + 1]
        + ((a.powi(3) - a) * second_derivs[i] + (b.powi(3) - b) * second_derivs[i + 1]) * h * h
            / 6.0;

    let d2f = a * second_derivs[i] + b * second_derivs[i + 1];

    Ok((f, d2f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_table(xs: &[f64], ys: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<Vec<f64>> {
        xs.iter().map(|&x| ys.iter().map(|&y| f(x, y)).collect()).collect()
    }

    #[test]
    fn bilinear_reproduces_linear_function_exactly() {
        let xs = vec![0.0, 10.0, 20.0, 30.0];
        let ys = vec![0.0, 5.0, 10.0];
        let f = |x: f64, y: f64| 2.0 * x + 3.0 * y + 1.0;
        let table = flat_table(&xs, &ys, f);

        let got = bilinear_interpolate(&xs, &ys, &table, 13.0, 7.0).unwrap();
        assert!((got - f(13.0, 7.0)).abs() < 1e-9);
    }

    #[test]
    fn bilinear_matches_node_value() {
        let xs = vec![0.0, 10.0, 20.0];
        let ys = vec![0.0, 100.0];
        let table = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let got = bilinear_interpolate(&xs, &ys, &table, 10.0, 100.0).unwrap();
        assert_eq!(got, 4.0);
    }

    #[test]
    fn bilinear_out_of_range() {
        let xs = vec![0.0, 10.0];
        let ys = vec![0.0, 10.0];
        let table = vec![vec![0.0, 1.0], vec![1.0, 2.0]];
        assert_eq!(
            bilinear_interpolate(&xs, &ys, &table, 20.0, 5.0),
            Err(InterpolationError::OutOfRange)
        );
    }

    #[test]
    fn bicubic_matches_node_value() {
        let xs: Vec<f64> = (0..6).map(|i| i as f64 * 10.0).collect();
        let ys: Vec<f64> = (0..6).map(|i| i as f64 * 20.0).collect();
        let table = flat_table(&xs, &ys, |x, y| 0.01 * x * x + y);
        let (got, _) = bicubic_interpolate(&xs, &ys, &table, 30.0, 40.0, false).unwrap();
        let want = 0.01 * 30.0 * 30.0 + 40.0;
        assert!((got - want).abs() < 1e-6);
    }
}
