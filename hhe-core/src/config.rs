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

use std::path::Path;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use hhe_crypto::pasta::{Pasta, PastaParams};
use hhe_crypto::pasta_he::Packing;

use crate::errors::{Error, Result};

// decimal or 0x-prefixed hexadecimal
fn parse_integer(value: &str) -> Option<u64> {
    match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse::<u64>().ok()
    }
}

/// Cipher and slot layout shared by the client and the server.
///
/// Validation happens in [`Config::validate`], before any cipher or
/// ciphertext is built from these values.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    modulus: u64,
    rounds: usize,
    block_size: usize,
    slots: usize,
    halfslots: usize,
    nonce: u64
}

impl Config {
    const MODULUS: &str = "modulus";
    const ROUNDS: &str = "rounds";
    const BLOCK_SIZE: &str = "block-size";
    const SLOTS: &str = "slots";
    const HALFSLOTS: &str = "halfslots";
    const NONCE: &str = "nonce";

    pub const DEFAULT_MODULUS: u64 = 65537;

    /// Settings with the default nonce.
    pub fn new(
        modulus: u64,
        rounds: usize,
        block_size: usize,
        slots: usize,
        halfslots: usize
    ) -> Self {
        Self {
            modulus,
            rounds,
            block_size,
            slots,
            halfslots,
            nonce: Pasta::DEFAULT_NONCE
        }
    }

    /// Full packing for the given parameters: `halfslots == t`.
    pub fn full(params: &PastaParams) -> Self {
        let t = params.block_size();
        Self::new(params.modulus().value(), params.rounds(), t, 2 * t, t)
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();
        for line in text.lines() {
            config.parse_config_line(line)?;
        }
        Ok(config)
    }

    pub fn load_config_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let mut config = Self::default();
        let lines = BufReader::new(File::open(path)?).lines();
        for line in lines {
            let line = line?;
            config.parse_config_line(&line)?;
        }
        Ok(config)
    }

    /// Writes the settings that differ from the defaults.
    pub fn write_config_file(&self, path: &Path) -> Result<()> {
        let default = Self::default();
        let mut content = String::new();

        if self.modulus != default.modulus {
            content.push_str(&format!("{} = {:#x}\n", Self::MODULUS, self.modulus));
        }
        if self.rounds != default.rounds {
            content.push_str(&format!("{} = {}\n", Self::ROUNDS, self.rounds));
        }
        if self.block_size != default.block_size {
            content.push_str(&format!("{} = {}\n", Self::BLOCK_SIZE, self.block_size));
        }
        if self.slots != default.slots {
            content.push_str(&format!("{} = {}\n", Self::SLOTS, self.slots));
        }
        if self.halfslots != default.halfslots {
            content.push_str(&format!("{} = {}\n", Self::HALFSLOTS, self.halfslots));
        }
        if self.nonce != default.nonce {
            content.push_str(&format!("{} = {}\n", Self::NONCE, self.nonce));
        }

        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn halfslots(&self) -> usize {
        self.halfslots
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn pasta_params(&self) -> Result<PastaParams> {
        Ok(PastaParams::new(self.modulus, self.rounds, self.block_size)?)
    }

    pub fn packing(&self) -> Result<Packing> {
        Ok(Packing::new(self.slots, self.halfslots, self.block_size)?)
    }

    /// Checks every setting and returns the values both the plain and the
    /// homomorphic side are built from.
    pub fn validate(&self) -> Result<(PastaParams, Packing)> {
        Ok((self.pasta_params()?, self.packing()?))
    }

    fn parse_config_line(&mut self, line: &str) -> Result<()> {
        // comment or empty line
        let line = line.trim();
        if line.is_empty() || line.starts_with("#") {
            return Ok(())
        }

        // key = value
        let split = line.splitn(2, "=").collect::<Vec<&str>>();
        if split.len() != 2 {
            return Err(Error::Config("bad configuration line"));
        }

        let key = split[0].trim();
        let value = split[1].trim();
        if key == Self::MODULUS {
            match parse_integer(value) {
                Some(p) => self.modulus = p,
                None => return Err(Error::Config("modulus is not an integer"))
            }
        }
        else if key == Self::NONCE {
            match parse_integer(value) {
                Some(nonce) => self.nonce = nonce,
                None => return Err(Error::Config("nonce is not an integer"))
            }
        }
        else {
            let Ok(n) = value.parse::<usize>() else {
                return Err(Error::Config("expected a non-negative integer"))
            };
            match key {
                Self::ROUNDS => self.rounds = n,
                Self::BLOCK_SIZE => self.block_size = n,
                Self::SLOTS => self.slots = n,
                Self::HALFSLOTS => self.halfslots = n,
                _ => return Err(Error::Config("unknown configuration key"))
            }
        }

        Ok(())
    }
}

impl Default for Config {
    // PASTA-3 over 65537 with full packing
    fn default() -> Self {
        let t = PastaParams::PASTA3_BLOCK_SIZE;
        Self::new(Self::DEFAULT_MODULUS, PastaParams::PASTA3_ROUNDS, t, 2 * t, t)
    }
}
