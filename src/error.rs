// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Parity.

// Parity is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Parity is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Parity.  If not, see <http://www.gnu.org/licenses/>.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of the external heap and its block store.
#[derive(Debug)]
pub enum Error {
	/// `peek`/`extract` called on a heap with no elements.
	Empty,
	/// A batch passed to `insert_block` held more elements than the block
	/// capacity.
	BlockTooLarge,
	/// The backing file could not be created or opened.
	IoOpen(std::io::Error),
	/// A block read failed.
	IoRead(std::io::Error),
	/// A block write failed.
	IoWrite(std::io::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::Empty => write!(f, "heap is empty"),
			Error::BlockTooLarge => write!(f, "batch exceeds block capacity"),
			Error::IoOpen(e) => write!(f, "error opening block store: {}", e),
			Error::IoRead(e) => write!(f, "error reading block: {}", e),
			Error::IoWrite(e) => write!(f, "error writing block: {}", e),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::IoOpen(e) | Error::IoRead(e) | Error::IoWrite(e) => Some(e),
			Error::Empty | Error::BlockTooLarge => None,
		}
	}
}
