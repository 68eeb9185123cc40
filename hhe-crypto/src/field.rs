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

use crate::pasta::{
    Error,
    Result
};

// Arithmetic modulo p < 2^61. Every operand is expected to be reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modulus {
    p: u64,
    bits: u32,
    mask: u64
}

impl Modulus {
    pub const MAX_BITS: u32 = 61;

    pub fn new(p: u64) -> Result<Self> {
        if p < 2 {
            return Err(Error::InvalidParameters("modulus must be at least 2"));
        }
        // smallest b such that 2^b > p
        let bits = u64::BITS - p.leading_zeros();
        if bits > Self::MAX_BITS {
            return Err(Error::InvalidParameters("modulus must fit in 61 bits"));
        }
        Ok(Self {
            p,
            bits,
            mask: (1u64 << bits) - 1
        })
    }

    pub fn value(&self) -> u64 {
        self.p
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    // rejection mask 2^bits - 1
    pub fn mask(&self) -> u64 {
        self.mask
    }

    pub fn contains(&self, a: u64) -> bool {
        a < self.p
    }

    pub fn add(&self, a: u64, b: u64) -> u64 {
        // a + b < 2^62, no overflow
        let s = a + b;
        if s >= self.p { s - self.p } else { s }
    }

    pub fn sub(&self, a: u64, b: u64) -> u64 {
        if b > a { a + self.p - b } else { a - b }
    }

    pub fn neg(&self, a: u64) -> u64 {
        if a == 0 { 0 } else { self.p - a }
    }

    pub fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % self.p as u128) as u64
    }

    pub fn square(&self, a: u64) -> u64 {
        self.mul(a, a)
    }

    pub fn cube(&self, a: u64) -> u64 {
        self.mul(self.square(a), a)
    }
}

#[cfg(test)]
mod tests {
    use super::Modulus;

    #[test]
    fn test_modulus_bits() {
        let m = Modulus::new(65537).unwrap();
        assert_eq!(m.bits(), 17);
        assert_eq!(m.mask(), 0x1ffff);

        let m = Modulus::new(1 << 16).unwrap();
        assert_eq!(m.bits(), 17);

        let m = Modulus::new((1 << 61) - 1).unwrap();
        assert_eq!(m.bits(), 61);
        assert_eq!(m.mask(), (1 << 61) - 1);
    }

    #[test]
    fn test_modulus_invalid() {
        assert!(Modulus::new(0).is_err());
        assert!(Modulus::new(1).is_err());
        assert!(Modulus::new(1 << 61).is_err());
        assert!(Modulus::new(u64::MAX).is_err());
    }

    #[test]
    fn test_wide_mul() {
        let p = (1u64 << 61) - 1;
        let m = Modulus::new(p).unwrap();
        // (p - 1)^2 = 1 mod p
        assert_eq!(m.mul(p - 1, p - 1), 1);
        // 2^60 * 2 = 2^61 = 1 mod p
        assert_eq!(m.mul(1 << 60, 2), 1);
        assert_eq!(m.cube(p - 1), p - 1);
    }

    #[test]
    fn test_add_sub() {
        let m = Modulus::new(17).unwrap();
        for a in 0..17 {
            for b in 0..17 {
                assert_eq!(m.add(a, b), (a + b) % 17);
                assert_eq!(m.add(m.sub(a, b), b), a);
            }
            assert_eq!(m.add(a, m.neg(a)), 0);
        }
        assert_eq!(m.sub(3, 5), 15);
    }
}
