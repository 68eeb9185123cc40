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

// Reference backend: slot vectors are kept in the clear. It follows the
// bookkeeping of a batched BFV implementation (two rows of slots, level
// budget, ciphertext size after products) so the evaluator can be checked
// slot for slot against the plain cipher, without the cost of a real
// scheme. It offers no confidentiality.

use crate::{
    field::Modulus,
    pasta,
    traits::het::{
        Error,
        HeCryptorT,
        HeEvaluatorT,
        Result
    }
};

#[derive(Clone, Debug, PartialEq)]
pub struct ClearPlaintext {
    slots: Vec<u64>,
    level: usize
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClearCiphertext {
    slots: Vec<u64>,
    level: usize,
    // 2 when fresh or relinearized, 3 after a ciphertext product
    size: usize
}

impl ClearCiphertext {
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

pub struct ClearScheme {
    modulus: Modulus,
    slots: usize,
    max_level: usize
}

impl ClearScheme {
    pub fn new(modulus: Modulus, slots: usize, max_level: usize) -> pasta::Result<Self> {
        if slots == 0 || slots % 2 != 0 {
            return Err(pasta::Error::InvalidParameters("slot count must be even and positive"));
        }
        Ok(Self {
            modulus,
            slots,
            max_level
        })
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    fn check_slots(&self, found: usize) -> Result<()> {
        match found == self.slots {
            true => Ok(()),
            false => Err(Error::DimensionMismatch {
                expected: self.slots,
                found
            })
        }
    }

    fn zip_with(&self, lhs: &mut [u64], rhs: &[u64], op: impl Fn(&Modulus, u64, u64) -> u64) {
        for (a, &b) in lhs.iter_mut().zip(rhs.iter()) {
            *a = op(&self.modulus, *a, b);
        }
    }
}

impl HeEvaluatorT for ClearScheme {
    type Plaintext = ClearPlaintext;
    type Ciphertext = ClearCiphertext;

    fn slot_count(&self) -> usize {
        self.slots
    }

    fn max_level(&self) -> usize {
        self.max_level
    }

    fn level(&self, ciphertext: &ClearCiphertext) -> usize {
        ciphertext.level
    }

    fn encode(&self, values: &[u64], level: usize) -> Result<ClearPlaintext> {
        if values.len() > self.slots {
            return Err(Error::DimensionMismatch {
                expected: self.slots,
                found: values.len()
            });
        }
        if level > self.max_level {
            return Err(Error::InvalidLevel(level));
        }
        if let Some(index) = values.iter().position(|&v| !self.modulus.contains(v)) {
            return Err(pasta::Error::ElementOutOfRange { index }.into());
        }
        let mut slots = values.to_vec();
        slots.resize(self.slots, 0);
        Ok(ClearPlaintext { slots, level })
    }

    fn add_inplace(&self, lhs: &mut ClearCiphertext, rhs: &ClearCiphertext) -> Result<()> {
        self.check_slots(rhs.slots.len())?;
        self.zip_with(&mut lhs.slots, &rhs.slots, Modulus::add);
        lhs.level = lhs.level.min(rhs.level);
        lhs.size = lhs.size.max(rhs.size);
        Ok(())
    }

    fn add_plain_inplace(&self, lhs: &mut ClearCiphertext, rhs: &ClearPlaintext) -> Result<()> {
        self.check_slots(rhs.slots.len())?;
        self.zip_with(&mut lhs.slots, &rhs.slots, Modulus::add);
        Ok(())
    }

    fn negate_inplace(&self, ciphertext: &mut ClearCiphertext) {
        for s in ciphertext.slots.iter_mut() {
            *s = self.modulus.neg(*s);
        }
    }

    fn multiply_inplace(&self, lhs: &mut ClearCiphertext, rhs: &ClearCiphertext) -> Result<()> {
        self.check_slots(rhs.slots.len())?;
        if lhs.size != 2 || rhs.size != 2 {
            return Err(Error::NotRelinearized);
        }
        let level = lhs.level.min(rhs.level);
        if level == 0 {
            return Err(Error::DepthExceeded {
                required: 1,
                available: 0
            });
        }
        self.zip_with(&mut lhs.slots, &rhs.slots, Modulus::mul);
        lhs.level = level - 1;
        lhs.size = 3;
        Ok(())
    }

    fn multiply_plain_inplace(
        &self,
        lhs: &mut ClearCiphertext,
        rhs: &ClearPlaintext
    ) -> Result<()> {
        self.check_slots(rhs.slots.len())?;
        self.zip_with(&mut lhs.slots, &rhs.slots, Modulus::mul);
        Ok(())
    }

    fn relinearize_inplace(&self, ciphertext: &mut ClearCiphertext) -> Result<()> {
        ciphertext.size = 2;
        Ok(())
    }

    fn rotate_rows_inplace(&self, ciphertext: &mut ClearCiphertext, steps: isize) -> Result<()> {
        if ciphertext.size != 2 {
            return Err(Error::NotRelinearized);
        }
        let row_size = self.row_size();
        let shift = steps.rem_euclid(row_size as isize) as usize;
        for row in ciphertext.slots.chunks_exact_mut(row_size) {
            row.rotate_left(shift);
        }
        Ok(())
    }

    fn rotate_columns_inplace(&self, ciphertext: &mut ClearCiphertext) -> Result<()> {
        if ciphertext.size != 2 {
            return Err(Error::NotRelinearized);
        }
        let row_size = self.row_size();
        ciphertext.slots.rotate_left(row_size);
        Ok(())
    }
}

impl HeCryptorT for ClearScheme {
    fn encrypt(&self, plaintext: &ClearPlaintext) -> Result<ClearCiphertext> {
        self.check_slots(plaintext.slots.len())?;
        Ok(ClearCiphertext {
            slots: plaintext.slots.clone(),
            level: plaintext.level,
            size: 2
        })
    }

    fn decrypt(&self, ciphertext: &ClearCiphertext) -> Result<ClearPlaintext> {
        self.check_slots(ciphertext.slots.len())?;
        Ok(ClearPlaintext {
            slots: ciphertext.slots.clone(),
            level: ciphertext.level
        })
    }

    fn decode(&self, plaintext: &ClearPlaintext) -> Vec<u64> {
        plaintext.slots.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ClearScheme,
        Error,
        HeCryptorT,
        HeEvaluatorT,
        Modulus
    };

    fn scheme(max_level: usize) -> ClearScheme {
        ClearScheme::new(Modulus::new(17).unwrap(), 8, max_level).unwrap()
    }

    #[test]
    fn test_rotations() {
        let he = scheme(2);
        let mut ct = he.encrypt(&he.encode(&[1, 2, 3, 4, 5, 6, 7, 8], 2).unwrap()).unwrap();

        he.rotate_rows_inplace(&mut ct, 1).unwrap();
        assert_eq!(he.decode(&he.decrypt(&ct).unwrap()), [2, 3, 4, 1, 6, 7, 8, 5]);

        he.rotate_rows_inplace(&mut ct, -2).unwrap();
        assert_eq!(he.decode(&he.decrypt(&ct).unwrap()), [4, 1, 2, 3, 8, 5, 6, 7]);

        he.rotate_columns_inplace(&mut ct).unwrap();
        assert_eq!(he.decode(&he.decrypt(&ct).unwrap()), [8, 5, 6, 7, 4, 1, 2, 3]);
    }

    #[test]
    fn test_arithmetic() {
        let he = scheme(2);
        let pt = he.encode(&[1, 2, 16], 2).unwrap();
        let mut a = he.encrypt(&pt).unwrap();
        let b = a.clone();

        he.add_inplace(&mut a, &b).unwrap();
        assert_eq!(he.decode(&he.decrypt(&a).unwrap()), [2, 4, 15, 0, 0, 0, 0, 0]);

        he.multiply_plain_inplace(&mut a, &pt).unwrap();
        assert_eq!(he.decode(&he.decrypt(&a).unwrap()), [2, 8, 2, 0, 0, 0, 0, 0]);
        assert_eq!(a.level(), 2);

        he.negate_inplace(&mut a);
        he.add_plain_inplace(&mut a, &pt).unwrap();
        assert_eq!(he.decode(&he.decrypt(&a).unwrap()), [16, 11, 14, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_depth_exceeded() {
        let he = scheme(2);
        let mut ct = he.encrypt(&he.encode(&[3], 2).unwrap()).unwrap();
        let factor = ct.clone();

        for expected_level in [1, 0] {
            he.multiply_inplace(&mut ct, &factor).unwrap();
            he.relinearize_inplace(&mut ct).unwrap();
            assert_eq!(ct.level(), expected_level);
        }

        // third and fourth products do not fit in two levels
        for _ in 0..2 {
            assert_eq!(
                he.multiply_inplace(&mut ct, &factor).unwrap_err(),
                Error::DepthExceeded { required: 1, available: 0 }
            );
        }
        assert_eq!(he.decode(&he.decrypt(&ct).unwrap())[0], 10);
    }

    #[test]
    fn test_relinearization_required() {
        let he = scheme(3);
        let mut ct = he.encrypt(&he.encode(&[3], 3).unwrap()).unwrap();
        let factor = ct.clone();
        he.multiply_inplace(&mut ct, &factor).unwrap();
        assert_eq!(ct.size(), 3);
        assert_eq!(he.rotate_rows_inplace(&mut ct, 1).unwrap_err(), Error::NotRelinearized);
        assert_eq!(he.multiply_inplace(&mut ct, &factor).unwrap_err(), Error::NotRelinearized);
        he.relinearize_inplace(&mut ct).unwrap();
        assert!(he.rotate_columns_inplace(&mut ct).is_ok());
    }

    #[test]
    fn test_encode_errors() {
        let he = scheme(2);
        assert!(he.encode(&[0; 9], 2).is_err());
        assert_eq!(he.encode(&[1], 3).unwrap_err(), Error::InvalidLevel(3));
        assert!(he.encode(&[17], 2).is_err());
        assert!(ClearScheme::new(Modulus::new(17).unwrap(), 7, 1).is_err());
    }
}
