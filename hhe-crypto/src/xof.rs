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

use std::io::Read;

use sha3::{
    Shake128,
    Shake128Reader,
    digest::{
        ExtendableOutput,
        Update
    }
};

use crate::{
    field::Modulus,
    pasta::{
        Error,
        Result,
        matrix
    }
};

/// Field element generator bound to one `(nonce, block index)` pair.
///
/// The stream is SHAKE128 absorbed over the 16-byte big-endian encoding
/// of the pair. Two sessions seeded identically squeeze identical
/// sequences, which is what lets the plain and the homomorphic keystream
/// draw the same matrices and round constants.
///
/// A session is not meant to be shared: each keystream block gets its own.
pub struct FieldPrg {
    modulus: Modulus,
    reader: Shake128Reader
}

impl FieldPrg {
    pub const SEED_LEN: usize = 16;

    pub fn new(modulus: Modulus, nonce: u64, block_index: u64) -> Self {
        Self {
            modulus,
            reader: Self::absorb(nonce, block_index)
        }
    }

    pub fn seed_bytes(nonce: u64, block_index: u64) -> [u8; Self::SEED_LEN] {
        let mut seed = [0u8; Self::SEED_LEN];
        seed[..8].copy_from_slice(&nonce.to_be_bytes());
        seed[8..].copy_from_slice(&block_index.to_be_bytes());
        seed
    }

    fn absorb(nonce: u64, block_index: u64) -> Shake128Reader {
        let mut shake = Shake128::default();
        shake.update(&Self::seed_bytes(nonce, block_index));
        shake.finalize_xof()
    }

    /// Restarts the stream, idempotent for the same pair.
    pub fn reseed(&mut self, nonce: u64, block_index: u64) {
        self.reader = Self::absorb(nonce, block_index);
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    // rejection sampling over 8-byte big-endian words
    pub fn next_element(&mut self, allow_zero: bool) -> Result<u64> {
        let mut buf = [0u8; 8];
        loop {
            self.reader.read_exact(&mut buf).map_err(|_| Error::PrgExhausted)?;
            let candidate = u64::from_be_bytes(buf) & self.modulus.mask();
            if !allow_zero && candidate == 0 {
                continue;
            }
            if self.modulus.contains(candidate) {
                return Ok(candidate);
            }
        }
    }

    pub fn next_vector(&mut self, len: usize, allow_zero: bool) -> Result<Vec<u64>> {
        (0..len).map(|_| self.next_element(allow_zero)).collect()
    }

    /// Draws one first row and expands the whole `size x size` matrix.
    ///
    /// Consumes exactly what the plain `matmul` consumes for one half.
    pub fn random_matrix(&mut self, size: usize) -> Result<Vec<Vec<u64>>> {
        let first = self.next_vector(size, false)?;
        Ok(matrix::materialize(&first, &self.modulus))
    }

    /// Round constants of both halves, laid out for a packed ciphertext:
    /// `state1` constants in `[0, size)`, `state2` constants in
    /// `[halfslots, halfslots + size)`, zero elsewhere.
    pub fn round_constants(&mut self, size: usize, halfslots: usize) -> Result<Vec<u64>> {
        if halfslots < size {
            return Err(Error::DimensionMismatch {
                expected: size,
                found: halfslots
            });
        }
        let mut rc = vec![0u64; halfslots + size];
        for c in rc[..size].iter_mut() {
            *c = self.next_element(true)?;
        }
        for c in rc[halfslots..].iter_mut() {
            *c = self.next_element(true)?;
        }
        Ok(rc)
    }
}
