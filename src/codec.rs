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

//! Fixed-width element encoding for the block store.
//!
//! The heap algorithm is agnostic to byte order; this module just picks
//! one (little-endian) so that block offset = block_index * B *
//! `Element::ENCODED_SIZE` is well defined on disk.

/// A totally ordered, `Copy` element with a fixed on-disk width.
///
/// Implementations must round-trip through `encode`/`decode` and must not
/// change their `Ord` relationship across that round trip.
pub trait Element: Ord + Copy + Send + Sync + 'static {
	/// Width of the encoded form, in bytes.
	const ENCODED_SIZE: usize;

	/// Encode `self` into the front of `buf`. `buf.len() >= ENCODED_SIZE`.
	fn encode(&self, buf: &mut [u8]);

	/// Decode an element from the front of `buf`. `buf.len() >= ENCODED_SIZE`.
	fn decode(buf: &[u8]) -> Self;
}

macro_rules! impl_element_for_int {
	($($t:ty),* $(,)?) => {
		$(
			impl Element for $t {
				const ENCODED_SIZE: usize = std::mem::size_of::<$t>();

				fn encode(&self, buf: &mut [u8]) {
					buf[..Self::ENCODED_SIZE].copy_from_slice(&self.to_le_bytes());
				}

				fn decode(buf: &[u8]) -> Self {
					let mut bytes = [0u8; std::mem::size_of::<$t>()];
					bytes.copy_from_slice(&buf[..Self::ENCODED_SIZE]);
					<$t>::from_le_bytes(bytes)
				}
			}
		)*
	};
}

impl_element_for_int!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);
