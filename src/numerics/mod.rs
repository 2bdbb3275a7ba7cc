//! Numerics primitives: interpolation, SVD helpers, clustering and
//! small allocation/sort utilities shared by the table and inversion layers.

mod cluster;
mod interpolation;
mod sort;
mod spline;
mod svd;

pub use cluster::single_link_order;
pub use interpolation::{bicubic_interpolate, bilinear_interpolate, InterpolationError};
pub use sort::{median, stable_index_sort};
pub use spline::natural_cubic_spline_coefficients;
pub use svd::{SvdDecomposition, SvdError};
