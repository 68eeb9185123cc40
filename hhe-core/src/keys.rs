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

use secrecy::SecretString;
use zeroize::{
    Zeroize,
    Zeroizing
};

use hhe_crypto::{
    pasta::{
        PastaParams,
        SecretKey
    },
    pasta_he::Packing,
    traits::het::{
        self,
        HeCryptorT
    }
};

use crate::errors::{
    Error,
    Result
};

const ELEMENT_BYTES: usize = 8;

/// Hex export: every element as 8 big-endian bytes.
pub fn key_to_hex(key: &SecretKey) -> SecretString {
    let mut bytes = Zeroizing::new(Vec::with_capacity(key.len() * ELEMENT_BYTES));
    for element in key.expose_elements() {
        bytes.extend_from_slice(&element.to_be_bytes());
    }
    SecretString::from(hex::encode(&*bytes))
}

pub fn key_from_hex(s: &str, params: &PastaParams) -> Result<SecretKey> {
    let bytes = Zeroizing::new(hex::decode(s.trim())?);
    if bytes.len() != params.key_size() * ELEMENT_BYTES {
        return Err(Error::InvalidKey);
    }
    let elements = bytes
        .chunks_exact(ELEMENT_BYTES)
        .map(|chunk| chunk.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
        .collect::<Vec<u64>>();
    Ok(SecretKey::new(elements, params)?)
}

/// Slot vector of the key: `key[0..t]` at the start of the first row,
/// `key[t..2t]` at the start of the second one.
pub fn pack_key(key: &SecretKey, packing: &Packing) -> Result<Zeroizing<Vec<u64>>> {
    let (key1, key2) = key.halves();
    Ok(Zeroizing::new(packing.pack(key1, key2)?))
}

/// Encrypts the packed key at the top level so that every keystream block
/// can start from it.
pub fn encrypt_key<C: HeCryptorT>(
    cryptor: &C,
    key: &SecretKey,
    packing: &Packing
) -> Result<C::Ciphertext> {
    if cryptor.slot_count() != packing.slots() {
        return Err(Error::Homomorphic(het::Error::DimensionMismatch {
            expected: packing.slots(),
            found: cryptor.slot_count()
        }));
    }
    let mut slots = pack_key(key, packing)?;
    let plaintext = cryptor.encode(&slots, cryptor.max_level());
    slots.zeroize();
    Ok(cryptor.encrypt(&plaintext?)?)
}
