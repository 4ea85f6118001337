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

//! An external-memory max-heap: a priority queue whose backing store is a
//! single file on disk, for working sets that far exceed memory.
//!
//! The heap node is a *block* of up to `B` elements rather than a single
//! element; blocks form an implicit binary tree on disk, and every
//! operation touches O(log(N/B)) blocks instead of O(log N) individual
//! elements. See [`ExternalHeap`] for the public operations and
//! [`store::BlockStore`] for the file layout underneath it.

pub mod codec;
pub mod error;
pub mod heap;
pub mod options;
pub mod store;

pub use codec::Element;
pub use error::{Error, Result};
pub use heap::ExternalHeap;
pub use options::Options;
pub use store::BlockStore;
