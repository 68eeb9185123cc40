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

mod config;
mod keys;
mod transcipher;
pub mod errors;

pub use config::Config;

pub use keys::{
    encrypt_key,
    key_from_hex,
    key_to_hex,
    pack_key
};

pub use transcipher::Transcipher;
