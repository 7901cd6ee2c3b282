//! Voxel medium grid and material table (component D): read-only broadcast state consulted by the
//! transport kernel on every micro-step.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optical properties of a single material. Entry `0` is reserved for vacuum
/// (`mu_a == 0.0 && mu_s == 0.0`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Absorption coefficient, `mu_a >= 0`, inverse length.
    pub mu_a: f64,
    /// Scattering coefficient, `mu_s >= 0`, inverse length.
    pub mu_s: f64,
    /// Anisotropy, `g in (-1, 1)`.
    pub g: f64,
    /// Refractive index, `n > 0`.
    pub n: f64,
}

impl Material {
    /// The material ID `0` entry: no absorption, no scattering.
    pub const VACUUM: Self = Self {
        mu_a: 0.0,
        mu_s: 0.0,
        g: 0.0,
        n: 1.0,
    };
}

/// Ordered material table; index `0` is conventionally [`Material::VACUUM`] but callers are
/// responsible for inserting it.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialTable {
    entries: Vec<Material>,
}

impl MaterialTable {
    /// Builds a table from an explicit entry list; entry `0` should be vacuum by convention but
    /// this is not enforced here.
    #[must_use]
    pub fn new(entries: Vec<Material>) -> Self {
        Self { entries }
    }

    /// Looks up a material by ID, returning [`Material::VACUUM`] for an out-of-range ID rather
    /// than panicking, matching [`MediumGrid::lookup_material`]'s out-of-bounds convention.
    #[must_use]
    pub fn get(&self, id: u8) -> Material {
        self.entries
            .get(usize::from(id))
            .copied()
            .unwrap_or(Material::VACUUM)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Backing storage for [`MediumGrid`]: either one byte per voxel (the general case, up to 256
/// materials) or two bits per voxel (up to 4 materials, per the packed wire format in the file
/// format documentation).
#[derive(Clone, Debug)]
enum Voxels {
    Byte(Vec<u8>),
    Packed2Bit(Vec<u8>),
}

/// Dense three-dimensional array of material IDs, indexed `(i, j, k)` with dimensions
/// `(nx, ny, nz)`. Read-only after construction.
#[derive(Clone, Debug)]
pub struct MediumGrid {
    nx: usize,
    ny: usize,
    nz: usize,
    voxels: Voxels,
}

impl MediumGrid {
    /// Builds a one-byte-per-voxel grid. `ids.len()` must equal `nx * ny * nz`.
    ///
    /// # Panics
    ///
    /// Panics if `ids.len() != nx * ny * nz`.
    #[must_use]
    pub fn from_bytes(nx: usize, ny: usize, nz: usize, ids: Vec<u8>) -> Self {
        assert_eq!(ids.len(), nx * ny * nz);
        Self {
            nx,
            ny,
            nz,
            voxels: Voxels::Byte(ids),
        }
    }

    /// Builds a 2-bit-packed grid from already-packed bytes, per the wire format in the file
    /// format documentation: voxel `n = i*ny*nz + j*nz + k` lives at byte `n/4`, bit offset
    /// `(n % 4) * 2`.
    ///
    /// # Panics
    ///
    /// Panics if `packed.len()` is too small to hold `nx * ny * nz` 2-bit entries.
    #[must_use]
    pub fn from_packed(nx: usize, ny: usize, nz: usize, packed: Vec<u8>) -> Self {
        assert!(packed.len() * 4 >= nx * ny * nz);
        Self {
            nx,
            ny,
            nz,
            voxels: Voxels::Packed2Bit(packed),
        }
    }

    #[must_use]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// Looks up the material ID at `(i, j, k)`. Out-of-bounds coordinates (including negative
    /// ones) return `0` (vacuum), per the transport kernel's boundary convention.
    #[must_use]
    pub fn lookup_material(&self, i: i64, j: i64, k: i64) -> u8 {
        if i < 0
            || j < 0
            || k < 0
            || i as usize >= self.nx
            || j as usize >= self.ny
            || k as usize >= self.nz
        {
            return 0;
        }

        let (i, j, k) = (i as usize, j as usize, k as usize);
        let n = i * self.ny * self.nz + j * self.nz + k;

        match &self.voxels {
            Voxels::Byte(bytes) => bytes[n],
            Voxels::Packed2Bit(packed) => {
                let byte = packed[n / 4];
                let shift = (n % 4) * 2;
                (byte >> shift) & 0b11
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_lookup_is_vacuum() {
        let grid = MediumGrid::from_bytes(2, 2, 2, vec![1; 8]);
        assert_eq!(grid.lookup_material(-1, 0, 0), 0);
        assert_eq!(grid.lookup_material(0, 0, 2), 0);
    }

    #[test]
    fn in_bounds_lookup_matches_stored_id() {
        let mut ids = vec![0u8; 8];
        ids[1 * 2 * 2 + 1 * 2 + 1] = 3;
        let grid = MediumGrid::from_bytes(2, 2, 2, ids);
        assert_eq!(grid.lookup_material(1, 1, 1), 3);
        assert_eq!(grid.lookup_material(0, 0, 0), 0);
    }

    #[test]
    fn packed_grid_decodes_two_bit_entries() {
        // voxel 0 -> id 1, voxel 1 -> id 2, voxel 2 -> id 3, voxel 3 -> id 0
        let byte = 0b00_11_10_01;
        let grid = MediumGrid::from_packed(4, 1, 1, vec![byte]);
        assert_eq!(grid.lookup_material(0, 0, 0), 1);
        assert_eq!(grid.lookup_material(1, 0, 0), 2);
        assert_eq!(grid.lookup_material(2, 0, 0), 3);
        assert_eq!(grid.lookup_material(3, 0, 0), 0);
    }

    #[test]
    fn material_table_out_of_range_id_is_vacuum() {
        let table = MaterialTable::new(vec![Material::VACUUM]);
        assert_eq!(table.get(5), Material::VACUUM);
    }
}
