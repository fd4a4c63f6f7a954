//! # Band Layout
//!
//! How a raster library's netCDF driver lays an N-dimensional variable out
//! as a stack of 2D bands.
//!
//! The last two declared dimensions always form the pixel grid: the
//! second-to-last gives the rows (`RasterYSize`), the last the columns
//! (`RasterXSize`). Position decides this, never the dimension name, so a
//! variable declared `(time, latitude, longitude, pressure)` becomes bands of
//! `longitude × pressure` pixels stacked over `time × latitude`.
//!
//! Every other dimension is stacked in declared order with the first one
//! varying slowest:
//!
//! ```text
//! band = 1 + Σ i_m × Π_{n>m} s_n
//! ```
//!
//! ```rust
//! use ncband::layout::BandLayout;
//!
//! // time(3) × pressure(7) × latitude(30) × longitude(20)
//! let layout = BandLayout::new(&[3, 7, 30, 20]).unwrap();
//! assert_eq!(layout.band_count(), 21);
//! assert_eq!(layout.band_number(&[1, 4]), 12);
//! assert_eq!(layout.band_indices(12), Some(vec![1, 4]));
//! ```

use crate::catalog::VariableDescriptor;
use serde::{Deserialize, Serialize};

/// Role a dimension plays in the raster view of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionRole {
    /// Stacked into bands
    Band,
    /// Pixel rows (second-to-last dimension)
    Row,
    /// Pixel columns (last dimension)
    Column,
}

impl DimensionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionRole::Band => "band",
            DimensionRole::Row => "row",
            DimensionRole::Column => "column",
        }
    }
}

/// Split of an ordered dimension list into stacked dimensions and pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandLayout {
    sizes: Vec<usize>,
}

impl BandLayout {
    /// Layout for dimension sizes in declared order; `None` for fewer than two.
    pub fn new(sizes: &[usize]) -> Option<Self> {
        if sizes.len() < 2 {
            return None;
        }
        Some(BandLayout {
            sizes: sizes.to_vec(),
        })
    }

    pub fn from_descriptor(descriptor: &VariableDescriptor) -> Self {
        let sizes: Vec<usize> = descriptor.dimensions().iter().map(|d| d.size()).collect();
        // VariableDescriptor guarantees at least two dimensions
        debug_assert!(sizes.len() >= 2);
        BandLayout { sizes }
    }

    /// Positions of the stacked dimensions, in declared order.
    pub fn stacked(&self) -> std::ops::Range<usize> {
        0..self.sizes.len() - 2
    }

    pub fn role(&self, position: usize) -> DimensionRole {
        let rows = self.sizes.len() - 2;
        match position {
            p if p < rows => DimensionRole::Band,
            p if p == rows => DimensionRole::Row,
            _ => DimensionRole::Column,
        }
    }

    pub fn raster_x_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    pub fn raster_y_size(&self) -> usize {
        self.sizes[self.sizes.len() - 2]
    }

    fn stacked_sizes(&self) -> &[usize] {
        &self.sizes[self.stacked()]
    }

    /// Number of bands; 1 when nothing is stacked.
    pub fn band_count(&self) -> usize {
        self.stacked_sizes().iter().product()
    }

    /// 1-based band number for 0-based indices along the stacked dimensions.
    ///
    /// `indices` holds one entry per stacked dimension, each below that
    /// dimension's size.
    pub fn band_number(&self, indices: &[usize]) -> usize {
        debug_assert_eq!(indices.len(), self.stacked_sizes().len());
        1 + indices
            .iter()
            .zip(self.stacked_sizes())
            .fold(0, |offset, (&index, &size)| offset * size + index)
    }

    /// Indices along the stacked dimensions addressed by `band`.
    pub fn band_indices(&self, band: usize) -> Option<Vec<usize>> {
        if band == 0 || band > self.band_count() {
            return None;
        }
        let mut offset = band - 1;
        let mut indices = vec![0; self.stacked_sizes().len()];
        for (slot, &size) in indices.iter_mut().zip(self.stacked_sizes()).rev() {
            *slot = offset % size;
            offset /= size;
        }
        Some(indices)
    }
}
