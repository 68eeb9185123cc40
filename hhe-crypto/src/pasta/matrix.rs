// HHE-Pasta, hybrid homomorphic transciphering
// Copyright (C) 2025 A. Russon
// 
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
// 
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

// The pseudorandom matrix is never drawn whole: row i+1 follows from row i
// and the first row through
//     row_{i+1}[j] = first[j] * row_i[t-1] + row_i[j-1]    (row_i[-1] = 0)

use crate::field::Modulus;

pub(crate) fn next_row(prev: &[u64], first: &[u64], modulus: &Modulus) -> Vec<u64> {
    let last = prev[prev.len() - 1];
    let mut row = Vec::with_capacity(first.len());
    for (j, &f) in first.iter().enumerate() {
        let mut v = modulus.mul(f, last);
        if j > 0 {
            v = modulus.add(v, prev[j - 1]);
        }
        row.push(v);
    }
    row
}

/// Expands the full matrix from its first row.
pub fn materialize(first: &[u64], modulus: &Modulus) -> Vec<Vec<u64>> {
    let mut matrix = Vec::with_capacity(first.len());
    let mut row = first.to_vec();
    for i in 0..first.len() {
        if i + 1 != first.len() {
            let next = next_row(&row, first, modulus);
            matrix.push(std::mem::replace(&mut row, next));
        }
        else {
            matrix.push(std::mem::take(&mut row));
        }
    }
    matrix
}

pub fn mat_vec(matrix: &[Vec<u64>], v: &[u64], modulus: &Modulus) -> Vec<u64> {
    matrix
        .iter()
        .map(|row| {
            row.iter()
                .zip(v.iter())
                .fold(0, |acc, (&m, &x)| modulus.add(acc, modulus.mul(m, x)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        Modulus,
        materialize
    };

    #[test]
    fn test_materialize() {
        let modulus = Modulus::new(17).unwrap();
        let matrix = materialize(&[1, 2, 3], &modulus);
        assert_eq!(matrix, [[1, 2, 3], [3, 7, 11], [11, 8, 6]]);

        assert_eq!(materialize(&[5], &modulus), [[5]]);
        assert!(materialize(&[], &modulus).is_empty());
    }
}
