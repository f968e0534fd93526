//! Distance and travel time matrices.
//!
//! - [`Matrix`] — Dense row-major matrix of 64-bit integer entries

mod matrix;

pub use matrix::Matrix;
