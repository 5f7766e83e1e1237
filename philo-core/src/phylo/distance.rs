/// Square distance matrix that can grow up to a fixed capacity.
///
/// Storage is a single row-major buffer of `capacity * capacity` cells
/// allocated up front; `n` is the number of rows currently in use.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    n: usize,
    capacity: usize,
}

impl DistanceMatrix {
    pub fn with_capacity(n: usize, capacity: usize) -> Self {
        assert!(
            n <= capacity,
            "distance matrix size {n} exceeds capacity {capacity}"
        );
        Self {
            data: vec![0.0; capacity * capacity],
            n,
            capacity,
        }
    }

    /// Build an `n x n` matrix from row-major `rows`.
    pub fn from_rows(n: usize, capacity: usize, rows: &[f64]) -> Self {
        assert_eq!(
            rows.len(),
            n * n,
            "distance matrix data length mismatch: expected {}, got {}",
            n * n,
            rows.len()
        );
        let mut dm = Self::with_capacity(n, capacity);
        for (i, row) in rows.chunks_exact(n.max(1)).enumerate().take(n) {
            dm.data[i * capacity..i * capacity + n].copy_from_slice(row);
        }
        dm
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.n && j < self.n);
        self.data[i * self.capacity + j]
    }

    /// Write `val` at `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: usize, j: usize, val: f64) {
        debug_assert!(i < self.n && j < self.n);
        self.data[i * self.capacity + j] = val;
        self.data[j * self.capacity + i] = val;
    }

    /// The first `n` cells of row `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.capacity;
        &self.data[start..start + self.n]
    }

    /// Append a zeroed row and column, returning the new index.
    pub fn grow(&mut self) -> usize {
        assert!(
            self.n < self.capacity,
            "distance matrix is full ({} rows)",
            self.capacity
        );
        let idx = self.n;
        self.n += 1;
        idx
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }

    pub fn has_zero_diagonal(&self) -> bool {
        (0..self.n).all(|i| self.get(i, i) == 0.0)
    }
}
