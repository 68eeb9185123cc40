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

use zeroize::{
    Zeroize,
    ZeroizeOnDrop
};

use crate::{
    field::Modulus,
    pasta::{
        Result,
        matrix::next_row
    },
    xof::FieldPrg
};

/// Working state of one keystream block: two halves of `t` elements.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct State {
    pub(crate) state1: Vec<u64>,
    pub(crate) state2: Vec<u64>
}

impl State {
    pub fn new(state1: &[u64], state2: &[u64]) -> Self {
        Self {
            state1: state1.to_vec(),
            state2: state2.to_vec()
        }
    }

    pub fn state1(&self) -> &[u64] {
        &self.state1
    }

    pub fn state2(&self) -> &[u64] {
        &self.state2
    }
}

// state <- M * state, with M expanded row by row from one drawn row
pub fn matmul(state: &mut [u64], prg: &mut FieldPrg, modulus: &Modulus) -> Result<()> {
    let t = state.len();
    let first = prg.next_vector(t, false)?;
    let mut row = first.clone();
    let mut out = vec![0u64; t];

    for (i, o) in out.iter_mut().enumerate() {
        for (&m, &x) in row.iter().zip(state.iter()) {
            *o = modulus.add(*o, modulus.mul(m, x));
        }
        if i + 1 != t {
            row = next_row(&row, &first, modulus);
        }
    }
    state.copy_from_slice(&out);
    out.zeroize();
    Ok(())
}

pub fn add_round_constants(
    state: &mut [u64],
    prg: &mut FieldPrg,
    modulus: &Modulus
) -> Result<()> {
    for s in state.iter_mut() {
        *s = modulus.add(*s, prg.next_element(true)?);
    }
    Ok(())
}

// state1 <- 2*state1 + state2, state2 <- state1 + 2*state2
pub fn mix(state1: &mut [u64], state2: &mut [u64], modulus: &Modulus) {
    for (a, b) in state1.iter_mut().zip(state2.iter_mut()) {
        let sum = modulus.add(*a, *b);
        *a = modulus.add(*a, sum);
        *b = modulus.add(*b, sum);
    }
}

pub fn sbox_cube(state: &mut [u64], modulus: &Modulus) {
    for s in state.iter_mut() {
        *s = modulus.cube(*s);
    }
}

// state[i] <- state[i-1]^2 + state[i] for i >= 1, state[0] untouched
pub fn sbox_feistel(state: &mut [u64], modulus: &Modulus) {
    // walking backwards keeps state[i-1] unmodified when it is read
    for i in (1..state.len()).rev() {
        state[i] = modulus.add(modulus.square(state[i - 1]), state[i]);
    }
}

pub fn linear_layer(state: &mut State, prg: &mut FieldPrg, modulus: &Modulus) -> Result<()> {
    matmul(&mut state.state1, prg, modulus)?;
    matmul(&mut state.state2, prg, modulus)?;
    add_round_constants(&mut state.state1, prg, modulus)?;
    add_round_constants(&mut state.state2, prg, modulus)?;
    mix(&mut state.state1, &mut state.state2, modulus);
    Ok(())
}

pub fn round(
    r: usize,
    rounds: usize,
    state: &mut State,
    prg: &mut FieldPrg,
    modulus: &Modulus
) -> Result<()> {
    linear_layer(state, prg, modulus)?;
    if r == rounds - 1 {
        sbox_cube(&mut state.state1, modulus);
        sbox_cube(&mut state.state2, modulus);
    }
    else {
        sbox_feistel(&mut state.state1, modulus);
        sbox_feistel(&mut state.state2, modulus);
    }
    Ok(())
}
