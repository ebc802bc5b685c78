//! Binary matrices and rank over GF(2).

use super::NumericError;

/// A 0/1 matrix with up to 64 columns, one `u64` per row.
///
/// Column 0 is the most significant bit of the row word that is in use.
#[derive(Clone, PartialEq, Eq)]
pub struct Gf2Matrix {
    rows: Vec<u64>,
    cols: usize,
}

impl Gf2Matrix {
    /// Builds a matrix from row-major entries; any non-zero entry is a 1.
    pub fn from_bits(rows: usize, cols: usize, bits: &[u8]) -> Result<Self, NumericError> {
        if cols > 64 {
            return Err(NumericError::TooManyColumns(cols));
        }
        if bits.len() != rows * cols {
            return Err(NumericError::DimensionMismatch {
                expected: rows * cols,
                got: bits.len(),
            });
        }

        let rows = if cols == 0 {
            vec![0; rows]
        } else {
            bits.chunks_exact(cols)
                .map(|row| row.iter().fold(0u64, |acc, &b| (acc << 1) | u64::from(b != 0)))
                .collect()
        };

        Ok(Self { rows, cols })
    }

    /// The n×n identity matrix.
    pub fn identity(n: usize) -> Result<Self, NumericError> {
        if n > 64 {
            return Err(NumericError::TooManyColumns(n));
        }
        let rows = (0..n).map(|i| 1u64 << (n - 1 - i)).collect();
        Ok(Self { rows, cols: n })
    }

    /// The n×n zero matrix.
    pub fn zero(n: usize) -> Result<Self, NumericError> {
        if n > 64 {
            return Err(NumericError::TooManyColumns(n));
        }
        Ok(Self {
            rows: vec![0; n],
            cols: n,
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Rank by Gaussian elimination with XOR row reduction.
    pub fn rank(&self) -> usize {
        let mut rows = self.rows.clone();
        let mut rank = 0;

        for col in 0..self.cols {
            if rank == rows.len() {
                break;
            }
            let mask = 1u64 << (self.cols - 1 - col);
            let Some(pivot) = (rank..rows.len()).find(|&r| rows[r] & mask != 0) else {
                continue;
            };

            rows.swap(rank, pivot);
            let pivot_row = rows[rank];
            for (r, row) in rows.iter_mut().enumerate() {
                if r != rank && *row & mask != 0 {
                    *row ^= pivot_row;
                }
            }
            rank += 1;
        }

        rank
    }
}

impl std::fmt::Debug for Gf2Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gf2Matrix")
            .field("rows", &self.rows.len())
            .field("cols", &self.cols)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rank_of_duplicate_rows() {
        let bits = [
            1, 0, 1, //
            1, 0, 1, //
            0, 1, 1,
        ];
        let m = Gf2Matrix::from_bits(3, 3, &bits).unwrap();
        assert_eq!(m.rank(), 2);
    }

    #[test]
    fn test_rank_uses_xor_not_integer_arithmetic() {
        // Third row is the GF(2) sum of the first two.
        let bits = [
            1, 1, 0, //
            0, 1, 1, //
            1, 0, 1,
        ];
        let m = Gf2Matrix::from_bits(3, 3, &bits).unwrap();
        assert_eq!(m.rank(), 2);
    }

    #[test]
    fn test_dimension_checks() {
        assert!(matches!(
            Gf2Matrix::from_bits(2, 2, &[1, 0, 1]),
            Err(NumericError::DimensionMismatch { expected: 4, got: 3 })
        ));
        assert!(matches!(
            Gf2Matrix::identity(65),
            Err(NumericError::TooManyColumns(65))
        ));
    }

    proptest! {
        #[test]
        fn test_identity_and_zero_rank(n in 0usize..=64) {
            prop_assert_eq!(Gf2Matrix::identity(n).unwrap().rank(), n);
            prop_assert_eq!(Gf2Matrix::zero(n).unwrap().rank(), 0);
        }

        #[test]
        fn test_rank_bounded_by_dimensions(bits in proptest::collection::vec(0u8..2, 32 * 32)) {
            let m = Gf2Matrix::from_bits(32, 32, &bits).unwrap();
            prop_assert!(m.rank() <= 32);
        }
    }
}
