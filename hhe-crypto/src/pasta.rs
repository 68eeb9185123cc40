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

// PASTA-style stream cipher over Z_p, see https://eprint.iacr.org/2021/731

pub(crate) mod matrix;
pub mod round;

use rand::{
    Rng,
    RngCore
};
use secrecy::{
    ExposeSecret,
    SecretBox
};
use subtle::ConstantTimeEq;

use crate::{
    field::Modulus,
    xof::FieldPrg
};
use round::State;

pub use matrix::{
    mat_vec,
    materialize
};

// ----- PASTA errors -----

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    InvalidParameters(&'static str),
    PrgExhausted,
    DimensionMismatch { expected: usize, found: usize },
    ElementOutOfRange { index: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameters(s) => write!(f, "Pasta: invalid parameters ({s})."),
            Self::PrgExhausted => write!(f, "Pasta: randomness stream exhausted."),
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "Pasta: dimension mismatch (expected {expected}, found {found})."
            ),
            Self::ElementOutOfRange { index } => write!(
                f,
                "Pasta: element at index {index} is not reduced modulo p."
            ),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

// ----- PASTA parameters -----

/// Modulus, number of rounds and half-state width `t`.
///
/// Both the plain cipher and the homomorphic evaluator are built from the
/// same value, so the two keystreams cannot disagree on these.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PastaParams {
    modulus: Modulus,
    rounds: usize,
    block_size: usize
}

impl PastaParams {
    pub const PASTA3_ROUNDS: usize = 3;
    pub const PASTA3_BLOCK_SIZE: usize = 128;
    pub const PASTA4_ROUNDS: usize = 4;
    pub const PASTA4_BLOCK_SIZE: usize = 32;

    pub fn new(modulus: u64, rounds: usize, block_size: usize) -> Result<Self> {
        let modulus = Modulus::new(modulus)?;
        if rounds == 0 {
            return Err(Error::InvalidParameters("at least one round is required"));
        }
        if block_size == 0 {
            return Err(Error::InvalidParameters("block size must be positive"));
        }
        Ok(Self {
            modulus,
            rounds,
            block_size
        })
    }

    pub fn pasta3(modulus: u64) -> Result<Self> {
        Self::new(modulus, Self::PASTA3_ROUNDS, Self::PASTA3_BLOCK_SIZE)
    }

    pub fn pasta4(modulus: u64) -> Result<Self> {
        Self::new(modulus, Self::PASTA4_ROUNDS, Self::PASTA4_BLOCK_SIZE)
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn key_size(&self) -> usize {
        2 * self.block_size
    }

    pub fn num_blocks(&self, len: usize) -> usize {
        len.div_ceil(self.block_size)
    }

    /// Rejects the first element outside `[0, p)`.
    pub fn check_reduced(&self, elements: &[u64]) -> Result<()> {
        match elements.iter().position(|&e| !self.modulus.contains(e)) {
            Some(index) => Err(Error::ElementOutOfRange { index }),
            None => Ok(())
        }
    }
}

// ----- secret key -----

/// `2t` field elements, zeroized on drop.
pub struct SecretKey(SecretBox<Vec<u64>>);

impl SecretKey {
    pub fn new(elements: Vec<u64>, params: &PastaParams) -> Result<Self> {
        let key = Self(SecretBox::new(Box::new(elements)));
        if key.len() != params.key_size() {
            return Err(Error::DimensionMismatch {
                expected: params.key_size(),
                found: key.len()
            });
        }
        params.check_reduced(key.expose_elements())?;
        Ok(key)
    }

    pub fn random(params: &PastaParams) -> Self {
        Self::random_with(params, &mut rand::rng())
    }

    pub fn random_with<R: RngCore + ?Sized>(params: &PastaParams, rng: &mut R) -> Self {
        let p = params.modulus().value();
        let elements = (0..params.key_size()).map(|_| rng.random_range(0..p)).collect();
        Self(SecretBox::new(Box::new(elements)))
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn expose_elements(&self) -> &[u64] {
        self.0.expose_secret()
    }

    // (key[0..t], key[t..2t])
    pub fn halves(&self) -> (&[u64], &[u64]) {
        let elements = self.expose_elements();
        elements.split_at(elements.len() / 2)
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.expose_elements().ct_eq(other.expose_elements()).into()
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([REDACTED; {}])", self.len())
    }
}

// ----- PASTA cipher -----

pub struct Pasta {
    key: SecretKey,
    params: PastaParams,
    nonce: u64
}

impl Pasta {
    pub const DEFAULT_NONCE: u64 = 123_456_789;

    pub fn new(key: SecretKey, params: PastaParams) -> Result<Self> {
        Self::with_nonce(key, params, Self::DEFAULT_NONCE)
    }

    // The nonce is fixed for the lifetime of the cipher: a (key, nonce)
    // pair must not encrypt two unrelated messages.
    pub fn with_nonce(key: SecretKey, params: PastaParams, nonce: u64) -> Result<Self> {
        if key.len() != params.key_size() {
            return Err(Error::DimensionMismatch {
                expected: params.key_size(),
                found: key.len()
            });
        }
        // the key may have been checked against another modulus
        params.check_reduced(key.expose_elements())?;
        Ok(Self {
            key,
            params,
            nonce
        })
    }

    pub fn params(&self) -> &PastaParams {
        &self.params
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Keystream block: `t` elements taken from `state1` after the last
    /// linear layer.
    pub fn keystream(&self, nonce: u64, block_index: u64) -> Result<Vec<u64>> {
        let modulus = self.params.modulus();
        let rounds = self.params.rounds();
        let mut prg = FieldPrg::new(*modulus, nonce, block_index);

        let (key1, key2) = self.key.halves();
        let mut state = State::new(key1, key2);
        for r in 0..rounds {
            round::round(r, rounds, &mut state, &mut prg, modulus)?;
        }

        // final affine layer with mixing, no S-box
        round::linear_layer(&mut state, &mut prg, modulus)?;
        Ok(state.state1().to_vec())
    }

    pub fn encrypt(&self, plaintext: &[u64]) -> Result<Vec<u64>> {
        self.params.check_reduced(plaintext)?;
        let modulus = self.params.modulus();
        let mut ciphertext = plaintext.to_vec();
        for (b, block) in ciphertext.chunks_mut(self.params.block_size()).enumerate() {
            let ks = self.keystream(self.nonce, b as u64)?;
            for (c, k) in block.iter_mut().zip(ks.iter()) {
                *c = modulus.add(*c, *k);
            }
        }
        Ok(ciphertext)
    }

    pub fn decrypt(&self, ciphertext: &[u64]) -> Result<Vec<u64>> {
        self.params.check_reduced(ciphertext)?;
        let modulus = self.params.modulus();
        let mut plaintext = ciphertext.to_vec();
        for (b, block) in plaintext.chunks_mut(self.params.block_size()).enumerate() {
            let ks = self.keystream(self.nonce, b as u64)?;
            for (m, k) in block.iter_mut().zip(ks.iter()) {
                *m = modulus.sub(*m, *k);
            }
        }
        Ok(plaintext)
    }
}
