//! Rolling line-scan image built from successive line profiles
//!
//! Each column is one profile; the newest column is on the right. Once the
//! image holds `max_width` columns the oldest one is evicted.

use std::collections::VecDeque;

use log::debug;
use ndarray::Array2;

#[derive(Debug, Clone)]
pub struct LineScanImage {
    columns: VecDeque<Vec<f64>>,
    max_width: usize,
}

impl LineScanImage {
    /// Create an empty image holding at most `max_width` columns (at least one)
    pub fn new(max_width: usize) -> Self {
        let max_width = max_width.max(1);
        Self {
            columns: VecDeque::with_capacity(max_width),
            max_width,
        }
    }

    /// Append a profile as the newest column
    ///
    /// A profile whose length differs from the current column height (the
    /// line was redrawn) restarts the image.
    ///
    /// # Returns
    /// The evicted oldest column, if the image was full
    pub fn push_column(&mut self, profile: Vec<f64>) -> Option<Vec<f64>> {
        if let Some(height) = self.height() {
            if height != profile.len() {
                debug!(
                    "Line profile length changed from {} to {}; restarting line scan",
                    height,
                    profile.len()
                );
                self.columns.clear();
            }
        }

        let evicted = if self.columns.len() == self.max_width {
            self.columns.pop_front()
        } else {
            None
        };
        self.columns.push_back(profile);
        evicted
    }

    /// Number of columns (time axis)
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Length of each column (position along the line)
    pub fn height(&self) -> Option<usize> {
        self.columns.front().map(Vec::len)
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column `index`, counted from the oldest
    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// Render as a `(height, width)` intensity map
    pub fn to_array(&self) -> Array2<f64> {
        let height = self.height().unwrap_or(0);
        Array2::from_shape_fn((height, self.width()), |(row, col)| {
            self.columns[col][row]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_append_on_the_right() {
        let mut image = LineScanImage::new(10);
        image.push_column(vec![1.0, 2.0, 3.0]);
        image.push_column(vec![4.0, 5.0, 6.0]);

        let array = image.to_array();
        assert_eq!(array.dim(), (3, 2));
        assert_eq!(array[[0, 0]], 1.0);
        assert_eq!(array[[2, 1]], 6.0);
    }

    #[test]
    fn test_fifo_eviction_by_content() {
        let mut image = LineScanImage::new(3);
        for i in 0..3 {
            assert!(image.push_column(vec![i as f64; 4]).is_none());
        }
        let second_oldest = image.column(1).unwrap().to_vec();

        let evicted = image.push_column(vec![3.0; 4]);

        assert_eq!(evicted, Some(vec![0.0; 4]));
        assert_eq!(image.width(), 3);
        assert_eq!(image.column(0).unwrap(), second_oldest.as_slice());
        assert_eq!(image.column(2).unwrap(), &[3.0; 4]);

        for i in 4..20 {
            image.push_column(vec![i as f64; 4]);
            assert_eq!(image.width(), 3);
        }
        assert_eq!(image.column(0).unwrap(), &[17.0; 4]);
    }

    #[test]
    fn test_profile_length_change_restarts() {
        let mut image = LineScanImage::new(5);
        image.push_column(vec![1.0; 4]);
        image.push_column(vec![1.0; 4]);
        image.push_column(vec![2.0; 6]);

        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), Some(6));
    }

    #[test]
    fn test_empty_image() {
        let image = LineScanImage::new(0);
        assert_eq!(image.max_width(), 1);
        assert!(image.is_empty());
        assert_eq!(image.to_array().dim(), (0, 0));
    }
}
