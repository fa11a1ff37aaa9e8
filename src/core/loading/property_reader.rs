//! Property side-channel for multi-property relationship batches.

/// Buffers property rows for relationships carrying two or more properties.
///
/// The batch buffer stores a local edge id per relationship; this reader maps
/// `(local edge id, property index)` back to the values at drain time. Local
/// ids restart at zero on every flush.
pub struct BufferedPropertyReader {
    property_count: usize,
    rows: Vec<f64>,
}

impl BufferedPropertyReader {
    pub fn new(property_count: usize) -> Self {
        debug_assert!(property_count >= 2, "inline encoding covers 0 or 1 properties");
        Self {
            property_count,
            rows: Vec::new(),
        }
    }

    pub fn property_count(&self) -> usize {
        self.property_count
    }

    /// Stores one row and returns its local edge id.
    pub fn add_row(&mut self, values: &[f64]) -> i64 {
        debug_assert_eq!(values.len(), self.property_count);
        let local_id = (self.rows.len() / self.property_count) as i64;
        self.rows.extend_from_slice(values);
        local_id
    }

    pub fn row(&self, local_id: i64) -> &[f64] {
        let start = local_id as usize * self.property_count;
        &self.rows[start..start + self.property_count]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len() / self.property_count
    }

    /// Clears all rows; the next local edge id is zero again.
    pub fn reset(&mut self) {
        self.rows.clear();
    }
}
