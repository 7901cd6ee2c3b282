//! Fluence accumulator (component H): the shared, append-only-additive grid the transport kernel
//! writes into from every photon task.

use std::sync::atomic::{AtomicU32, Ordering};

/// Strategy for combining per-photon deposits into the shared grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReductionMode {
    /// Atomic compare-exchange add on a single shared grid. Simplest correct strategy; some
    /// contention under high voxel reuse.
    #[default]
    Atomic,
    /// Each worker thread accumulates into a private grid, reduced into the shared grid at the
    /// end of the run. Trades memory for reduced contention.
    ThreadLocal,
}

/// Shape of the fluence grid, matching the medium grid it is accumulated over.
#[derive(Clone, Copy, Debug)]
pub struct GridDims {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridDims {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i * self.ny * self.nz + j * self.nz + k
    }
}

/// Race-free fluence grid: each cell is an `f32` stored behind an `AtomicU32` bit-cast, updated
/// by a compare-exchange retry loop. Correctness under concurrent writers to the same voxel is
/// the only contract; exact reduction order (and hence bit-for-bit float results) is not
/// guaranteed, as documented for the parallel accumulator.
pub struct FluenceGrid {
    dims: GridDims,
    cells: Vec<AtomicU32>,
}

impl FluenceGrid {
    #[must_use]
    pub fn zeroed(dims: GridDims) -> Self {
        let cells = (0..dims.len()).map(|_| AtomicU32::new(0)).collect();
        Self { dims, cells }
    }

    #[must_use]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Adds `delta` to the voxel at `(i, j, k)`. Out-of-bounds indices are a programmer error in
    /// the caller (the kernel must check bounds before depositing) and panic via the underlying
    /// `Vec` index.
    pub fn add(&self, i: usize, j: usize, k: usize, delta: f32) {
        let idx = self.dims.index(i, j, k);
        let cell = &self.cells[idx];
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let new = f32::from_bits(current) + delta;
            match cell.compare_exchange_weak(
                current,
                new.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f32 {
        f32::from_bits(self.cells[self.dims.index(i, j, k)].load(Ordering::Relaxed))
    }

    /// Snapshots the grid into a plain `Vec<f32>` in `(x, y, z)` major order, matching the raw
    /// little-endian dump format.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        self.cells
            .iter()
            .map(|c| f32::from_bits(c.load(Ordering::Relaxed)))
            .collect()
    }

    /// Merges `other` additively into `self`, cell by cell. Used to reduce per-thread shadow
    /// grids under [`ReductionMode::ThreadLocal`].
    ///
    /// # Panics
    ///
    /// Panics if `other`'s dimensions differ from `self`'s.
    pub fn merge_from(&self, other: &Self) {
        assert_eq!(self.dims.len(), other.dims.len());
        for (idx, cell) in other.cells.iter().enumerate() {
            let delta = f32::from_bits(cell.load(Ordering::Relaxed));
            if delta != 0.0 {
                let (i, j, k) = self.unflatten(idx);
                self.add(i, j, k, delta);
            }
        }
    }

    fn unflatten(&self, idx: usize) -> (usize, usize, usize) {
        let k = idx % self.dims.nz;
        let j = (idx / self.dims.nz) % self.dims.ny;
        let i = idx / (self.dims.nz * self.dims.ny);
        (i, j, k)
    }
}

/// A private, non-atomic grid used by a single worker under [`ReductionMode::ThreadLocal`];
/// cheaper to update than [`FluenceGrid`] since no worker else touches it.
#[derive(Clone, Debug)]
pub struct LocalGrid {
    dims: GridDims,
    cells: Vec<f32>,
}

impl LocalGrid {
    #[must_use]
    pub fn zeroed(dims: GridDims) -> Self {
        Self {
            dims,
            cells: vec![0.0; dims.len()],
        }
    }

    pub fn add(&mut self, i: usize, j: usize, k: usize, delta: f32) {
        let idx = self.dims.index(i, j, k);
        self.cells[idx] += delta;
    }

    /// Adds another grid's cells into this one, elementwise.
    ///
    /// # Panics
    ///
    /// Panics if `other`'s dimensions differ from `self`'s.
    pub(crate) fn merge_cells(&mut self, other: &Self) {
        assert_eq!(self.dims.len(), other.dims.len());
        for (a, b) in self.cells.iter_mut().zip(other.cells.iter()) {
            *a += b;
        }
    }
}

impl FluenceGrid {
    /// Merges a [`LocalGrid`] produced under [`ReductionMode::ThreadLocal`] into this grid.
    ///
    /// # Panics
    ///
    /// Panics if `local`'s dimensions differ from `self`'s.
    pub fn merge_from_local(&self, local: &LocalGrid) {
        assert_eq!(self.dims.len(), local.dims.len());
        for (idx, &delta) in local.cells.iter().enumerate() {
            if delta != 0.0 {
                let (i, j, k) = self.unflatten(idx);
                self.add(i, j, k, delta);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additions_accumulate() {
        let grid = FluenceGrid::zeroed(GridDims { nx: 2, ny: 2, nz: 2 });
        grid.add(0, 0, 0, 1.5);
        grid.add(0, 0, 0, 2.5);
        assert_eq!(grid.get(0, 0, 0), 4.0);
        assert_eq!(grid.get(1, 1, 1), 0.0);
    }

    #[test]
    fn concurrent_adds_to_same_voxel_are_race_free() {
        use std::sync::Arc;
        use std::thread;

        let grid = Arc::new(FluenceGrid::zeroed(GridDims { nx: 1, ny: 1, nz: 1 }));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let grid = Arc::clone(&grid);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        grid.add(0, 0, 0, 1.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(grid.get(0, 0, 0), 8000.0);
    }

    #[test]
    fn merge_from_sums_grids() {
        let a = FluenceGrid::zeroed(GridDims { nx: 1, ny: 1, nz: 2 });
        let b = FluenceGrid::zeroed(GridDims { nx: 1, ny: 1, nz: 2 });
        a.add(0, 0, 0, 1.0);
        b.add(0, 0, 0, 2.0);
        b.add(0, 0, 1, 3.0);

        a.merge_from(&b);

        assert_eq!(a.get(0, 0, 0), 3.0);
        assert_eq!(a.get(0, 0, 1), 3.0);
    }
}
