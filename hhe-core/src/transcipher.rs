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

// Server side: turns PASTA ciphertext blocks into homomorphic encryptions of
// the plaintext, given an encryption of the packed PASTA key.

use std::thread;

use hhe_crypto::{
    pasta,
    pasta_he::PastaHe,
    traits::het::{
        self,
        HeCryptorT,
        HeEvaluatorT
    },
    xof::FieldPrg
};

use crate::config::Config;
use crate::errors::Result;

pub struct Transcipher<'a, S: HeEvaluatorT> {
    evaluator: PastaHe<'a, S>,
    nonce: u64
}

impl<'a, S: HeEvaluatorT> Transcipher<'a, S> {
    pub fn new(scheme: &'a S, config: &Config) -> Result<Self> {
        let (params, packing) = config.validate()?;
        Ok(Self {
            evaluator: PastaHe::new(scheme, params, packing)?,
            nonce: config.nonce()
        })
    }

    pub fn evaluator(&self) -> &PastaHe<'a, S> {
        &self.evaluator
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn required_depth(&self) -> usize {
        self.evaluator.required_depth()
    }

    fn check_key(&self, key: &S::Ciphertext) -> Result<()> {
        let required = self.required_depth();
        let available = self.evaluator.scheme().level(key);
        match available >= required {
            true => Ok(()),
            false => Err(het::Error::DepthExceeded {
                required,
                available
            }.into())
        }
    }

    /// Homomorphic encryption of one plaintext block, from the block of
    /// PASTA ciphertext and its index in the stream.
    ///
    /// The slots `[0, block.len())` of the result hold the plaintext, the
    /// other slots carry no meaning.
    pub fn transcipher_block(
        &self,
        key: &S::Ciphertext,
        block: &[u64],
        block_index: u64
    ) -> Result<S::Ciphertext> {
        let params = self.evaluator.params();
        if block.is_empty() || block.len() > params.block_size() {
            return Err(pasta::Error::DimensionMismatch {
                expected: params.block_size(),
                found: block.len()
            }.into());
        }
        params.check_reduced(block)?;

        let scheme = self.evaluator.scheme();
        let mut prg = FieldPrg::new(*params.modulus(), self.nonce, block_index);
        let mut state = key.clone();
        self.evaluator.keystream(&mut state, &mut prg)?;

        // m = c - keystream
        let cipher = scheme.encode(block, scheme.level(&state))?;
        scheme.negate_inplace(&mut state);
        scheme.add_plain_inplace(&mut state, &cipher)?;
        Ok(state)
    }

    /// One ciphertext per block of `t` elements, the last one possibly
    /// shorter. The key level is checked before any block is evaluated.
    pub fn transcipher(&self, key: &S::Ciphertext, ciphertext: &[u64]) -> Result<Vec<S::Ciphertext>> {
        self.check_key(key)?;
        ciphertext
            .chunks(self.evaluator.params().block_size())
            .enumerate()
            .map(|(b, block)| self.transcipher_block(key, block, b as u64))
            .collect()
    }

    /// Same output as [`Transcipher::transcipher`], blocks spread over
    /// `threads` scoped threads.
    pub fn transcipher_multi_thread(
        &self,
        threads: usize,
        key: &S::Ciphertext,
        ciphertext: &[u64]
    ) -> Result<Vec<S::Ciphertext>>
    where
        S: Sync,
        S::Ciphertext: Send + Sync
    {
        self.check_key(key)?;
        let blocks = ciphertext
            .chunks(self.evaluator.params().block_size())
            .collect::<Vec<&[u64]>>();
        if blocks.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = blocks.len().div_ceil(threads.max(1));
        let mut outputs = (0..blocks.len())
            .map(|_| None)
            .collect::<Vec<Option<Result<S::Ciphertext>>>>();

        thread::scope(|scope| {
            for (thread_idx, out_chunk) in outputs.chunks_mut(chunk_size).enumerate() {
                let blocks = &blocks;
                scope.spawn(move || {
                    for (idx, out) in out_chunk.iter_mut().enumerate() {
                        let b = thread_idx * chunk_size + idx;
                        *out = Some(self.transcipher_block(key, blocks[b], b as u64));
                    }
                });
            }
        });

        // every slot was filled, a panicking thread propagates out of the scope
        outputs.into_iter().flatten().collect()
    }
}

impl<S: HeCryptorT> Transcipher<'_, S> {
    /// Client side: decrypts the transciphered blocks back into the first
    /// `len` plaintext elements.
    pub fn decrypt_output(&self, outputs: &[S::Ciphertext], len: usize) -> Result<Vec<u64>> {
        let params = self.evaluator.params();
        let t = params.block_size();
        if outputs.len() != params.num_blocks(len) {
            return Err(pasta::Error::DimensionMismatch {
                expected: params.num_blocks(len),
                found: outputs.len()
            }.into());
        }

        let scheme = self.evaluator.scheme();
        let mut plaintext = Vec::with_capacity(len);
        for (b, output) in outputs.iter().enumerate() {
            let slots = scheme.decode(&scheme.decrypt(output)?);
            let block_len = t.min(len - b * t);
            let Some(block) = slots.get(..block_len) else {
                return Err(het::Error::DimensionMismatch {
                    expected: block_len,
                    found: slots.len()
                }.into());
            };
            plaintext.extend_from_slice(block);
        }
        Ok(plaintext)
    }
}
