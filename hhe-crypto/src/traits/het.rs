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

// Interface of the batched homomorphic scheme (BFV-like) the transcipher
// runs on. Key generation, encoding and the ciphertext arithmetic belong
// to the implementation; this crate only composes them.
//
// Slots are laid out as two rows of `row_size()` slots each:
// - `rotate_rows_inplace(ct, k)` rotates both rows cyclically, slot j
//   receiving the former slot (j + k) mod row_size (k < 0 rotates right);
// - `rotate_columns_inplace(ct)` swaps the two rows.

use crate::pasta;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    DepthExceeded { required: usize, available: usize },
    DimensionMismatch { expected: usize, found: usize },
    InvalidLevel(usize),
    NotRelinearized,
    Cipher(pasta::Error),
}

impl From<pasta::Error> for Error {
    fn from(value: pasta::Error) -> Self {
        Self::Cipher(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DepthExceeded { required, available } => write!(
                f,
                "Homomorphic: multiplicative depth exceeded ({required} levels required, {available} left)."
            ),
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "Homomorphic: dimension mismatch (expected {expected}, found {found})."
            ),
            Self::InvalidLevel(level) => write!(f, "Homomorphic: invalid level {level}."),
            Self::NotRelinearized => write!(f, "Homomorphic: ciphertext must be relinearized first."),
            Self::Cipher(err) => write!(f, "{err}"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

// --- evaluation side, no secret material ---

pub trait HeEvaluatorT {
    type Plaintext;
    type Ciphertext: Clone;

    fn slot_count(&self) -> usize;
    fn max_level(&self) -> usize;
    // remaining multiplicative depth
    fn level(&self, ciphertext: &Self::Ciphertext) -> usize;

    fn row_size(&self) -> usize {
        self.slot_count() / 2
    }

    // missing trailing slots are zero
    fn encode(&self, values: &[u64], level: usize) -> Result<Self::Plaintext>;

    fn add_inplace(&self, lhs: &mut Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<()>;
    fn add_plain_inplace(&self, lhs: &mut Self::Ciphertext, rhs: &Self::Plaintext) -> Result<()>;
    fn negate_inplace(&self, ciphertext: &mut Self::Ciphertext);
    fn multiply_inplace(&self, lhs: &mut Self::Ciphertext, rhs: &Self::Ciphertext) -> Result<()>;
    fn multiply_plain_inplace(
        &self,
        lhs: &mut Self::Ciphertext,
        rhs: &Self::Plaintext
    ) -> Result<()>;
    fn relinearize_inplace(&self, ciphertext: &mut Self::Ciphertext) -> Result<()>;
    fn rotate_rows_inplace(&self, ciphertext: &mut Self::Ciphertext, steps: isize) -> Result<()>;
    fn rotate_columns_inplace(&self, ciphertext: &mut Self::Ciphertext) -> Result<()>;
}

// --- secret key holder ---

pub trait HeCryptorT: HeEvaluatorT {
    fn encrypt(&self, plaintext: &Self::Plaintext) -> Result<Self::Ciphertext>;
    fn decrypt(&self, ciphertext: &Self::Ciphertext) -> Result<Self::Plaintext>;
    fn decode(&self, plaintext: &Self::Plaintext) -> Vec<u64>;
}
