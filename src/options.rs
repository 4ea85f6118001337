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

/// Open-time options for an [`ExternalHeap`](crate::heap::ExternalHeap).
#[derive(Debug, Clone, Copy)]
pub struct Options {
	/// Truncate any existing file at `path` and start from an empty heap.
	///
	/// This is the only supported mode today: the heap keeps `N` purely in
	/// memory, so opening an existing file without clearing it would leave
	/// `N` unknown. See `recover` below.
	pub clear: bool,
	/// Reserved for a future on-disk recovery scheme that reconstructs `N`
	/// and the block count from an existing file rather than clearing it.
	/// Currently has no effect beyond `clear`: a heap opened with
	/// `recover: true` still starts empty, and a warning is logged.
	pub recover: bool,
}

impl Default for Options {
	fn default() -> Self {
		Options { clear: true, recover: false }
	}
}
