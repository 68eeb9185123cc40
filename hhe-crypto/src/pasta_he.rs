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

// PASTA rounds evaluated over a single ciphertext holding both halves:
// state1 in slots [0, t) of the first row, state2 in slots [0, t) of the
// second row (offset `halfslots`). Every other slot stays zero.

use crate::{
    pasta::{
        self,
        PastaParams
    },
    traits::het::{
        Error,
        HeEvaluatorT,
        Result
    },
    xof::FieldPrg
};

// ----- packing -----

/// Slot layout of the packed state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Packing {
    slots: usize,
    halfslots: usize
}

impl Packing {
    // With `halfslots == t` the rows are full and rotations wrap by
    // themselves. Otherwise the matrix product needs a copy of the state
    // right before the end of the row, hence `halfslots >= 2t`.
    pub fn new(slots: usize, halfslots: usize, block_size: usize) -> pasta::Result<Self> {
        if slots != 2 * halfslots {
            return Err(pasta::Error::InvalidParameters("slots must be twice halfslots"));
        }
        if halfslots < block_size {
            return Err(pasta::Error::InvalidParameters("too few slots for the block size"));
        }
        if halfslots != block_size && halfslots < 2 * block_size {
            return Err(pasta::Error::InvalidParameters(
                "too few slots for the matrix product (halfslots must equal t or be at least 2t)"
            ));
        }
        Ok(Self {
            slots,
            halfslots
        })
    }

    pub fn full(block_size: usize) -> Self {
        Self {
            slots: 2 * block_size,
            halfslots: block_size
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn halfslots(&self) -> usize {
        self.halfslots
    }

    pub fn is_full(&self, block_size: usize) -> bool {
        self.halfslots == block_size
    }

    /// Spreads two halves over the slot vector: `[h1, 0.., h2, 0..]`.
    pub fn pack(&self, state1: &[u64], state2: &[u64]) -> pasta::Result<Vec<u64>> {
        let found = state1.len().max(state2.len());
        if found > self.halfslots {
            return Err(pasta::Error::DimensionMismatch {
                expected: self.halfslots,
                found
            });
        }
        let mut slots = vec![0u64; self.slots];
        slots[..state1.len()].copy_from_slice(state1);
        slots[self.halfslots..self.halfslots + state2.len()].copy_from_slice(state2);
        Ok(slots)
    }
}

// ----- homomorphic evaluator -----

pub struct PastaHe<'a, S: HeEvaluatorT> {
    scheme: &'a S,
    params: PastaParams,
    packing: Packing
}

impl<'a, S: HeEvaluatorT> PastaHe<'a, S> {
    pub const FEISTEL_DEPTH: usize = 1;
    pub const CUBE_DEPTH: usize = 2;

    pub fn new(scheme: &'a S, params: PastaParams, packing: Packing) -> Result<Self> {
        let packing = Packing::new(packing.slots, packing.halfslots, params.block_size())?;
        if scheme.slot_count() != packing.slots() {
            return Err(Error::DimensionMismatch {
                expected: packing.slots(),
                found: scheme.slot_count()
            });
        }
        Ok(Self {
            scheme,
            params,
            packing
        })
    }

    pub fn params(&self) -> &PastaParams {
        &self.params
    }

    pub fn packing(&self) -> &Packing {
        &self.packing
    }

    pub fn scheme(&self) -> &S {
        self.scheme
    }

    /// Levels consumed by one keystream block: one per Feistel layer, two
    /// for the final cube.
    pub fn required_depth(&self) -> usize {
        (self.params.rounds() - 1) * Self::FEISTEL_DEPTH + Self::CUBE_DEPTH
    }

    fn check_depth(&self, state: &S::Ciphertext, required: usize) -> Result<()> {
        let available = self.scheme.level(state);
        match available >= required {
            true => Ok(()),
            false => Err(Error::DepthExceeded {
                required,
                available
            })
        }
    }

    fn check_matrix(&self, matrix: &[Vec<u64>]) -> Result<()> {
        let t = self.params.block_size();
        if matrix.len() != t {
            return Err(Error::DimensionMismatch {
                expected: t,
                found: matrix.len()
            });
        }
        match matrix.iter().find(|row| row.len() != t) {
            Some(row) => Err(Error::DimensionMismatch {
                expected: t,
                found: row.len()
            }),
            None => Ok(())
        }
    }

    // i-th generalized diagonal of both matrices: slot j holds mat[j][(j - i) mod t]
    fn diagonal(
        &self,
        mat1: &[Vec<u64>],
        mat2: &[Vec<u64>],
        i: usize,
        level: usize
    ) -> Result<S::Plaintext> {
        let t = self.params.block_size();
        let halfslots = self.packing.halfslots();
        let mut diag = vec![0u64; halfslots + t];
        for j in 0..t {
            let col = (j + t - i) % t;
            diag[j] = mat1[j][col];
            diag[halfslots + j] = mat2[j][col];
        }
        self.scheme.encode(&diag, level)
    }

    /// Diagonal method: `t` rotate, multiply and accumulate steps.
    pub fn matmul(
        &self,
        state: &mut S::Ciphertext,
        mat1: &[Vec<u64>],
        mat2: &[Vec<u64>]
    ) -> Result<()> {
        self.check_matrix(mat1)?;
        self.check_matrix(mat2)?;
        let t = self.params.block_size();

        // Rotating right by one moves slot j - i into slot j. For j < i it
        // wraps to halfslots + j - i, so a copy of the state must sit at
        // the end of the row: adding the state rotated left by t puts it
        // in [halfslots - t, halfslots) and leaves [0, t) untouched.
        if !self.packing.is_full(t) {
            let mut rotated = state.clone();
            self.scheme.rotate_rows_inplace(&mut rotated, t as isize)?;
            self.scheme.add_inplace(state, &rotated)?;
        }

        let level = self.scheme.level(state);
        let mut sum = state.clone();
        self.scheme.multiply_plain_inplace(&mut sum, &self.diagonal(mat1, mat2, 0, level)?)?;
        for i in 1..t {
            self.scheme.rotate_rows_inplace(state, -1)?;
            let mut tmp = state.clone();
            self.scheme.multiply_plain_inplace(&mut tmp, &self.diagonal(mat1, mat2, i, level)?)?;
            self.scheme.add_inplace(&mut sum, &tmp)?;
        }
        *state = sum;
        Ok(())
    }

    pub fn add_round_constants(&self, state: &mut S::Ciphertext, rc: &[u64]) -> Result<()> {
        let expected = self.packing.halfslots() + self.params.block_size();
        if rc.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: rc.len()
            });
        }
        let constants = self.scheme.encode(rc, self.scheme.level(state))?;
        self.scheme.add_plain_inplace(state, &constants)
    }

    // tmp = (state2 | state1) + (state1 | state2), then state += tmp
    pub fn mix(&self, state: &mut S::Ciphertext) -> Result<()> {
        let mut tmp = state.clone();
        self.scheme.rotate_columns_inplace(&mut tmp)?;
        self.scheme.add_inplace(&mut tmp, state)?;
        self.scheme.add_inplace(state, &tmp)
    }

    pub fn sbox_cube(&self, state: &mut S::Ciphertext) -> Result<()> {
        self.check_depth(state, Self::CUBE_DEPTH)?;
        let mut square = state.clone();
        self.scheme.multiply_inplace(&mut square, state)?;
        self.scheme.relinearize_inplace(&mut square)?;
        self.scheme.multiply_inplace(state, &square)?;
        self.scheme.relinearize_inplace(state)
    }

    pub fn sbox_feistel(&self, state: &mut S::Ciphertext) -> Result<()> {
        self.check_depth(state, Self::FEISTEL_DEPTH)?;
        let t = self.params.block_size();
        let halfslots = self.packing.halfslots();

        // slot j <- slot j - 1
        let mut rotated = state.clone();
        self.scheme.rotate_rows_inplace(&mut rotated, -1)?;

        // zero the wrapped slot of each half and the padding
        let mut mask = vec![1u64; halfslots + t];
        mask[0] = 0;
        mask[t..=halfslots].fill(0);
        let mask = self.scheme.encode(&mask, self.scheme.level(state))?;
        self.scheme.multiply_plain_inplace(&mut rotated, &mask)?;
        // rotated = 0, x_0, x_1, ..., x_(t-2)

        let factor = rotated.clone();
        self.scheme.multiply_inplace(&mut rotated, &factor)?;
        self.scheme.relinearize_inplace(&mut rotated)?;

        self.scheme.add_inplace(state, &rotated)
        // state = x_0, x_0^2 + x_1, ..., x_(t-2)^2 + x_(t-1)
    }

    pub fn linear_layer(&self, state: &mut S::Ciphertext, prg: &mut FieldPrg) -> Result<()> {
        let t = self.params.block_size();
        // same draw order as the plain cipher
        let mat1 = prg.random_matrix(t)?;
        let mat2 = prg.random_matrix(t)?;
        let rc = prg.round_constants(t, self.packing.halfslots())?;

        self.matmul(state, &mat1, &mat2)?;
        self.add_round_constants(state, &rc)?;
        self.mix(state)
    }

    pub fn round(&self, r: usize, state: &mut S::Ciphertext, prg: &mut FieldPrg) -> Result<()> {
        self.linear_layer(state, prg)?;
        match r == self.params.rounds() - 1 {
            true => self.sbox_cube(state),
            false => self.sbox_feistel(state)
        }
    }

    /// Turns an encryption of the packed key into an encryption of the
    /// packed final state; slots [0, t) hold the keystream block.
    pub fn keystream(&self, state: &mut S::Ciphertext, prg: &mut FieldPrg) -> Result<()> {
        self.check_depth(state, self.required_depth())?;
        for r in 0..self.params.rounds() {
            self.round(r, state, prg)?;
        }
        self.linear_layer(state, prg)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Error,
        Packing,
        PastaHe
    };
    use crate::{
        clear::{
            ClearCiphertext,
            ClearScheme
        },
        pasta::{
            self,
            Pasta,
            PastaParams,
            SecretKey,
            materialize,
            round
        },
        traits::het::{
            HeCryptorT,
            HeEvaluatorT
        },
        xof::FieldPrg
    };

    const NONCE: u64 = 123_456_789;

    fn encrypt_state(
        he: &ClearScheme,
        packing: &Packing,
        state1: &[u64],
        state2: &[u64]
    ) -> ClearCiphertext {
        let pt = he.encode(&packing.pack(state1, state2).unwrap(), he.max_level()).unwrap();
        he.encrypt(&pt).unwrap()
    }

    fn decrypt_state(he: &ClearScheme, packing: &Packing, t: usize, ct: &ClearCiphertext) -> Vec<u64> {
        let slots = he.decode(&he.decrypt(ct).unwrap());
        let halfslots = packing.halfslots();
        // padding slots must stay empty
        assert!(slots[t..halfslots].iter().all(|&s| s == 0));
        assert!(slots[halfslots + t..].iter().all(|&s| s == 0));
        [&slots[..t], &slots[halfslots..halfslots + t]].concat()
    }

    fn setup(p: u64, rounds: usize, t: usize, halfslots: usize) -> (PastaParams, Packing, ClearScheme) {
        let params = PastaParams::new(p, rounds, t).unwrap();
        let packing = Packing::new(2 * halfslots, halfslots, t).unwrap();
        let he = ClearScheme::new(*params.modulus(), packing.slots(), rounds + 1).unwrap();
        (params, packing, he)
    }

    #[test]
    fn test_packing_validation() {
        // halfslots = 2 < t = 4
        assert!(Packing::new(4, 2, 4).is_err());
        // t < halfslots < 2t
        assert!(Packing::new(12, 6, 4).is_err());
        // slots != 2 * halfslots
        assert!(Packing::new(10, 4, 4).is_err());

        assert!(Packing::new(8, 4, 4).unwrap().is_full(4));
        assert!(!Packing::new(16, 8, 4).unwrap().is_full(4));
        assert_eq!(Packing::full(4), Packing::new(8, 4, 4).unwrap());
        assert_eq!(Packing::full(2).pack(&[1, 2], &[3, 4]).unwrap(), [1, 2, 3, 4]);
        assert_eq!(
            Packing::new(10, 5, 2).unwrap().pack(&[1, 2], &[3, 4]).unwrap(),
            [1, 2, 0, 0, 0, 3, 4, 0, 0, 0]
        );
    }

    #[test]
    fn test_pack_oversized_half() {
        let packing = Packing::full(2);
        assert_eq!(
            packing.pack(&[1, 2, 3], &[4, 5]).unwrap_err(),
            pasta::Error::DimensionMismatch { expected: 2, found: 3 }
        );
        assert_eq!(
            packing.pack(&[1], &[2, 3, 4]).unwrap_err(),
            pasta::Error::DimensionMismatch { expected: 2, found: 3 }
        );
        assert_eq!(packing.pack(&[1], &[]).unwrap(), [1, 0, 0, 0]);
    }

    #[test]
    fn test_slot_count_mismatch() {
        let (params, packing, _) = setup(65537, 3, 4, 8);
        let he = ClearScheme::new(*params.modulus(), 8, 4).unwrap();
        assert!(matches!(
            PastaHe::new(&he, params, packing),
            Err(Error::DimensionMismatch { expected: 16, found: 8 })
        ));
    }

    #[test]
    fn test_matmul() {
        for halfslots in [4, 8, 11] {
            let (params, packing, he) = setup(65537, 3, 4, halfslots);
            let modulus = *params.modulus();
            let pasta_he = PastaHe::new(&he, params, packing).unwrap();
            let state1 = [1, 65536, 300, 4];
            let state2 = [5, 0, 7, 12345];

            let mut prg = FieldPrg::new(modulus, NONCE, 9);
            let mat1 = prg.random_matrix(4).unwrap();
            let mat2 = prg.random_matrix(4).unwrap();
            let mut ct = encrypt_state(&he, &packing, &state1, &state2);
            pasta_he.matmul(&mut ct, &mat1, &mat2).unwrap();

            let mut prg = FieldPrg::new(modulus, NONCE, 9);
            let mut plain1 = state1;
            let mut plain2 = state2;
            round::matmul(&mut plain1, &mut prg, &modulus).unwrap();
            round::matmul(&mut plain2, &mut prg, &modulus).unwrap();

            assert_eq!(decrypt_state(&he, &packing, 4, &ct), [plain1, plain2].concat());
        }
    }

    #[test]
    fn test_matmul_dimension() {
        let (params, packing, he) = setup(17, 3, 3, 3);
        let pasta_he = PastaHe::new(&he, params, packing).unwrap();
        let mut ct = encrypt_state(&he, &packing, &[1, 2, 3], &[4, 5, 6]);
        let mat = materialize(&[1, 2, 3], params.modulus());
        let short = materialize(&[1, 2], params.modulus());
        assert!(pasta_he.matmul(&mut ct, &mat, &short).is_err());
        assert!(pasta_he.matmul(&mut ct, &mat[..2], &mat).is_err());
        assert!(pasta_he.add_round_constants(&mut ct, &[0; 5]).is_err());
    }

    #[test]
    fn test_mix_and_sboxes() {
        for halfslots in [4, 8] {
            let (params, packing, he) = setup(17, 3, 4, halfslots);
            let modulus = *params.modulus();
            let pasta_he = PastaHe::new(&he, params, packing).unwrap();
            let state1 = [2, 3, 5, 7];
            let state2 = [11, 13, 16, 1];

            let mut ct = encrypt_state(&he, &packing, &state1, &state2);
            pasta_he.mix(&mut ct).unwrap();
            let (mut plain1, mut plain2) = (state1, state2);
            round::mix(&mut plain1, &mut plain2, &modulus);
            assert_eq!(decrypt_state(&he, &packing, 4, &ct), [plain1, plain2].concat());

            let mut ct = encrypt_state(&he, &packing, &state1, &state2);
            pasta_he.sbox_feistel(&mut ct).unwrap();
            assert_eq!(decrypt_state(&he, &packing, 4, &ct), [2, 7, 14, 15, 11, 15, 15, 2]);
            assert_eq!(ct.level(), he.max_level() - 1);

            let mut ct = encrypt_state(&he, &packing, &state1, &state2);
            pasta_he.sbox_cube(&mut ct).unwrap();
            let (mut plain1, mut plain2) = (state1, state2);
            round::sbox_cube(&mut plain1, &modulus);
            round::sbox_cube(&mut plain2, &modulus);
            assert_eq!(decrypt_state(&he, &packing, 4, &ct), [plain1, plain2].concat());
            assert_eq!(ct.level(), he.max_level() - 2);
        }
    }

    #[test]
    fn test_keystream_equivalence() {
        let configs = [
            (65537, 3, 4, 4),
            (65537, 3, 4, 8),
            (65537, 3, 4, 13),
            (17, 1, 1, 1),
            (17, 2, 3, 6),
            ((1 << 61) - 1, 4, 5, 5),
            (1096486890805657601, 3, 6, 16)
        ];
        for (p, rounds, t, halfslots) in configs {
            let (params, packing, he) = setup(p, rounds, t, halfslots);
            let key: Vec<u64> = (0..2 * t as u64).map(|i| (i * 7919 + 1) % p).collect();
            let pasta = Pasta::new(SecretKey::new(key.clone(), &params).unwrap(), params).unwrap();
            let pasta_he = PastaHe::new(&he, params, packing).unwrap();

            for block in 0..3 {
                let mut ct = encrypt_state(&he, &packing, &key[..t], &key[t..]);
                let mut prg = FieldPrg::new(*params.modulus(), NONCE, block);
                pasta_he.keystream(&mut ct, &mut prg).unwrap();
                assert_eq!(ct.level(), 0);

                let decrypted = decrypt_state(&he, &packing, t, &ct);
                assert_eq!(decrypted[..t], pasta.keystream(NONCE, block).unwrap());
            }
        }
    }

    #[test]
    fn test_full_and_padded_packing_agree() {
        let key = [11, 22, 33, 44, 55, 66, 77, 88];
        let mut outputs = Vec::new();
        for halfslots in [4, 8] {
            let (params, packing, he) = setup(65537, 3, 4, halfslots);
            let pasta_he = PastaHe::new(&he, params, packing).unwrap();
            let mut ct = encrypt_state(&he, &packing, &key[..4], &key[4..]);
            let mut prg = FieldPrg::new(*params.modulus(), NONCE, 0);
            pasta_he.keystream(&mut ct, &mut prg).unwrap();
            outputs.push(decrypt_state(&he, &packing, 4, &ct));
        }
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0][..4], [1417, 17160, 59464, 57076]);
    }

    #[test]
    fn test_depth() {
        let (params, packing, _) = setup(65537, 3, 4, 4);
        let he = ClearScheme::new(*params.modulus(), packing.slots(), 3).unwrap();
        let pasta_he = PastaHe::new(&he, params, packing).unwrap();
        assert_eq!(pasta_he.required_depth(), 4);

        let mut ct = encrypt_state(&he, &packing, &[1, 2, 3, 4], &[5, 6, 7, 8]);
        let mut prg = FieldPrg::new(*params.modulus(), NONCE, 0);
        assert_eq!(
            pasta_he.keystream(&mut ct, &mut prg).unwrap_err(),
            Error::DepthExceeded { required: 4, available: 3 }
        );

        // a single level left: Feistel fits, the cube does not
        let (params, packing, _) = setup(65537, 3, 4, 4);
        let he = ClearScheme::new(*params.modulus(), packing.slots(), 1).unwrap();
        let pasta_he = PastaHe::new(&he, params, packing).unwrap();
        let mut ct = encrypt_state(&he, &packing, &[1, 2, 3, 4], &[5, 6, 7, 8]);
        assert_eq!(
            pasta_he.sbox_cube(&mut ct).unwrap_err(),
            Error::DepthExceeded { required: 2, available: 1 }
        );
        pasta_he.sbox_feistel(&mut ct).unwrap();
        assert!(pasta_he.sbox_feistel(&mut ct).is_err());
    }
}
