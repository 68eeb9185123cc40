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

use hhe_crypto::pasta;
use hhe_crypto::traits::het;

#[derive(Debug)]
pub enum Error {
    // common errors
    Io(std::io::Error),
    FileNotFound(std::path::PathBuf),

    // crypto errors
    Pasta(pasta::Error),
    Homomorphic(het::Error),

    // keys
    InvalidKey,
    Hex(hex::FromHexError),

    // configuration
    Config(&'static str)
}

impl Error {
    /// Errors after which the session cannot go on with the same
    /// parameters. A depth shortfall only asks for a larger level budget.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Pasta(err) | Self::Homomorphic(het::Error::Cipher(err)) => matches!(
                err,
                pasta::Error::PrgExhausted | pasta::Error::InvalidParameters(_)
            ),
            Self::Homomorphic(het::Error::DepthExceeded { .. }) => false,
            Self::Config(_) => true,
            _ => false
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<pasta::Error> for Error {
    fn from(value: pasta::Error) -> Self {
        Self::Pasta(value)
    }
}

impl From<het::Error> for Error {
    fn from(value: het::Error) -> Self {
        Self::Homomorphic(value)
    }
}

impl From<hex::FromHexError> for Error {
    fn from(value: hex::FromHexError) -> Self {
        Self::Hex(value)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::FileNotFound(path) => write!(f, "File \"{}\" not found.", path.display()),

            // crypto errors
            Self::Pasta(err) => write!(f, "{err}"),
            Self::Homomorphic(err) => write!(f, "{err}"),

            // keys
            Self::InvalidKey => write!(f, "Key: invalid secret key encoding."),
            Self::Hex(err) => write!(f, "Key: {err}."),

            Self::Config(s) => write!(f, "Configuration: {s}.")
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
