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

//! The external-memory max-heap proper: block shape, sift-up/sift-down
//! with inter-block remerge, and the insert/extract operations.
//!
//! Every block read from the store is a full `block_capacity`-length
//! buffer; the heap is the only thing that knows which suffix of the last
//! block is live (`N mod B`). Every code path below that touches the last
//! block truncates it to that live length before comparing or returning it.

use std::path::Path;

use crate::{
	codec::Element,
	error::{Error, Result},
	options::Options,
	store::BlockStore,
};

/// A max-heap of elements of type `T`, backed by a file of fixed-size
/// blocks.
pub struct ExternalHeap<T: Element> {
	store: BlockStore<T>,
	block_capacity: usize,
	n: u64,
}

fn sort_desc<T: Ord>(block: &mut [T]) {
	block.sort_unstable_by(|a, b| b.cmp(a));
}

/// Reassign elements of `larger` and `smaller` so that every element of
/// `larger` is >= every element of `smaller`, both stay sorted descending,
/// and the combined multiset is preserved. `larger` ends up with exactly
/// `block_capacity` elements (or fewer if the combined size is smaller);
/// `smaller` gets whatever remains.
fn remerge<T: Ord + Copy>(larger: &mut Vec<T>, smaller: &mut Vec<T>, block_capacity: usize) {
	larger.append(smaller);
	sort_desc(larger);
	if larger.len() > block_capacity {
		*smaller = larger.split_off(block_capacity);
	}
}

impl<T: Element> ExternalHeap<T> {
	/// Open a heap backed by `path`, with up to `block_capacity` elements
	/// per block. `options.clear` truncates any existing file; the heap
	/// always starts with `N = 0` (see [`Options::recover`]).
	pub fn open(path: impl AsRef<Path>, block_capacity: usize, options: Options) -> Result<Self> {
		assert!(block_capacity > 0, "block capacity must be positive");
		if options.recover && !options.clear {
			log::warn!(
				target: "ext-heap",
				"Recovery from an existing heap file is not implemented; opening {:?} empty",
				path.as_ref(),
			);
		}
		let clear = options.clear || options.recover;
		let store = BlockStore::open(path.as_ref(), block_capacity, clear)?;
		log::debug!(target: "ext-heap", "Opened external heap at {:?}, block capacity {}", path.as_ref(), block_capacity);
		Ok(ExternalHeap { store, block_capacity, n: 0 })
	}

	/// Number of elements currently held in the heap.
	pub fn size(&self) -> u64 {
		self.n
	}

	/// Whether the heap holds no elements.
	pub fn empty(&self) -> bool {
		self.n == 0
	}

	/// Index of the last (possibly underfilled) block, i.e. `K - 1`.
	/// Only meaningful when `N > 0`.
	fn last_block_index(&self) -> u64 {
		(self.n - 1) / self.block_capacity as u64
	}

	/// Number of blocks currently holding live elements, `K = ceil(N/B)`.
	fn block_count(&self) -> u64 {
		(self.n + self.block_capacity as u64 - 1) / self.block_capacity as u64
	}

	/// Live length of the block at `index`: `block_capacity` for every
	/// block except the last, which holds `N mod B` (or a full block, if
	/// that remainder is zero).
	fn live_len(&self, index: u64) -> usize {
		if self.n == 0 {
			return 0;
		}
		if index == self.last_block_index() {
			let r = (self.n % self.block_capacity as u64) as usize;
			if r == 0 {
				self.block_capacity
			} else {
				r
			}
		} else {
			self.block_capacity
		}
	}

	/// The global maximum, without removing it.
	pub fn peek_max(&self) -> Result<T> {
		if self.n == 0 {
			return Err(Error::Empty);
		}
		let block0 = self.store.read_block(0)?;
		Ok(block0[0])
	}

	/// The live prefix of block 0 (length `min(N, B)`), without removing it.
	pub fn peek_max_block(&self) -> Result<Vec<T>> {
		if self.n == 0 {
			return Err(Error::Empty);
		}
		let mut block0 = self.store.read_block(0)?;
		block0.truncate(self.live_len(0));
		Ok(block0)
	}

	/// Insert a single element.
	pub fn insert(&mut self, x: T) -> Result<()> {
		let b = self.block_capacity as u64;
		let k = self.n / b;
		let r = (self.n % b) as usize;

		if r == 0 {
			self.store.write_block(k, &[x])?;
			self.n += 1;
			log::trace!(target: "ext-heap", "Inserted into new block {}", k);
			self.sift_up(k)
		} else {
			let mut block = self.store.read_block(k)?;
			let top = block[0];
			block.truncate(r);
			block.push(x);
			sort_desc(&mut block);
			self.n += 1;
			self.store.write_block(k, &block)?;
			if top < x {
				log::trace!(target: "ext-heap", "Insert into block {} broke invariant, sifting up", k);
				self.sift_up(k)
			} else {
				Ok(())
			}
		}
	}

	/// Insert up to `block_capacity` elements at once. Splits the batch
	/// and recurses if it doesn't fit in the current underfilled block.
	pub fn insert_block(&mut self, mut batch: Vec<T>) -> Result<()> {
		if batch.len() > self.block_capacity {
			return Err(Error::BlockTooLarge);
		}
		if batch.is_empty() {
			return Ok(());
		}

		let b = self.block_capacity as u64;
		let k = self.n / b;
		let r = (self.n % b) as usize;

		if r == 0 {
			sort_desc(&mut batch);
			let added = batch.len() as u64;
			self.store.write_block(k, &batch)?;
			self.n += added;
			return self.sift_up(k);
		}

		if r + batch.len() <= self.block_capacity {
			let mut block = self.store.read_block(k)?;
			block.truncate(r);
			block.extend(batch);
			sort_desc(&mut block);
			self.n += (block.len() - r) as u64;
			self.store.write_block(k, &block)?;
			return self.sift_up(k);
		}

		// Split: fill block k to capacity, then recurse with the rest.
		let take = self.block_capacity - r;
		let rest = batch.split_off(take);
		let mut block = self.store.read_block(k)?;
		block.truncate(r);
		block.extend(batch);
		sort_desc(&mut block);
		debug_assert_eq!(block.len(), self.block_capacity);
		self.n += take as u64;
		debug_assert_eq!(self.n % b, 0);
		self.store.write_block(k, &block)?;
		self.sift_up(k)?;

		self.insert_block(rest)
	}

	/// Remove and return the global maximum.
	pub fn extract_max(&mut self) -> Result<T> {
		if self.n == 0 {
			return Err(Error::Empty);
		}
		let b = self.block_capacity as u64;
		let mut block0 = self.store.read_block(0)?;
		let result = block0[0];

		if self.n <= b {
			let new_len = (self.n - 1) as usize;
			block0.swap(0, new_len);
			block0.truncate(new_len);
			sort_desc(&mut block0);
			self.n -= 1;
			self.store.write_block(0, &block0)?;
			return Ok(result);
		}

		let k = self.block_count();
		let r = (self.n % b) as usize;
		let last = self.store.read_block(k - 1)?;
		let x = if r > 0 { last[r - 1] } else { last[self.block_capacity - 1] };

		block0[0] = x;
		sort_desc(&mut block0);
		self.n -= 1;
		self.sift_down(0, block0)?;
		Ok(result)
	}

	/// Remove and return the live prefix of block 0 (length `min(N, B)`)
	/// as it stood before the call.
	pub fn extract_max_block(&mut self) -> Result<Vec<T>> {
		if self.n == 0 {
			return Err(Error::Empty);
		}
		let b = self.block_capacity as u64;
		let mut block0 = self.store.read_block(0)?;

		if self.n <= b {
			block0.truncate(self.n as usize);
			self.n = 0;
			return Ok(block0);
		}

		let k = self.block_count();
		let r = (self.n % b) as usize;
		let mut last = self.store.read_block(k - 1)?;

		if r > 0 && self.n > 2 * b {
			last.truncate(r);
			let pre_last = self.store.read_block(k - 2)?;
			last.extend_from_slice(&pre_last[r..]);
			sort_desc(&mut last);
			debug_assert_eq!(last.len(), self.block_capacity);
		}

		// Always removes exactly min(N, B) = B elements here, regardless of
		// whether the last block was topped up: when it wasn't (r > 0, no
		// borrow), `last` keeps its stale [r, B) suffix and block 0 becomes
		// a last-underfilled block of length r once N drops by a full B.
		self.n -= b;
		self.sift_down(0, last)?;
		Ok(block0)
	}

	fn sift_up(&mut self, mut j: u64) -> Result<()> {
		if j == 0 {
			return Ok(());
		}
		let mut block = self.store.read_block(j)?;
		block.truncate(self.live_len(j));

		while j > 0 {
			let p = (j - 1) / 2;
			let mut parent = self.store.read_block(p)?;
			if parent[self.block_capacity - 1] >= block[0] {
				break;
			}
			remerge(&mut parent, &mut block, self.block_capacity);
			self.store.write_block(j, &block)?;
			block = parent;
			j = p;
		}
		self.store.write_block(j, &block)
	}

	fn sift_down(&mut self, mut j: u64, mut block: Vec<T>) -> Result<()> {
		let b = self.block_capacity;
		let k = self.block_count();

		loop {
			let l = 2 * j + 1;
			let r_idx = 2 * j + 2;
			if l >= k {
				break;
			}

			if r_idx >= k {
				// One child: necessarily the last (possibly underfilled) block.
				let mut son = self.store.read_block(l)?;
				son.truncate(self.live_len(l));
				if block[b - 1] >= son[0] {
					break;
				}
				remerge(&mut block, &mut son, b);
				self.store.write_block(j, &block)?;
				self.store.write_block(l, &son)?;
				return Ok(());
			}

			let mut son_l = self.store.read_block(l)?;
			let mut son_r = self.store.read_block(r_idx)?;
			son_r.truncate(self.live_len(r_idx));

			let m = block[b - 1];
			if m >= son_l[0] && m >= son_r[0] {
				break;
			}

			if m >= son_l[0] {
				remerge(&mut block, &mut son_r, b);
				self.store.write_block(j, &block)?;
				j = r_idx;
				block = son_r;
				continue;
			}

			if m >= son_r[0] {
				remerge(&mut block, &mut son_l, b);
				self.store.write_block(j, &block)?;
				j = l;
				block = son_l;
				continue;
			}

			// Heap property violated on both sides: descend towards
			// whichever child holds the global minimum of the two, so the
			// other child's integrity is automatic afterwards.
			let min_l = son_l[b - 1];
			let min_r = *son_r.last().expect("son_r always non-empty");

			if min_l > min_r {
				remerge(&mut son_l, &mut son_r, b);
				remerge(&mut block, &mut son_l, b);
				self.store.write_block(j, &block)?;
				self.store.write_block(r_idx, &son_r)?;
				j = l;
				block = son_l;
				continue;
			}

			remerge(&mut son_r, &mut son_l, b);
			remerge(&mut block, &mut son_r, b);
			self.store.write_block(j, &block)?;
			if son_l.len() == b {
				self.store.write_block(l, &son_l)?;
			} else {
				// son_l (still holding the minimum) is shorter than a
				// full block: swap children on disk so the underfilled
				// one stays rightmost. Both are leaves, so this is safe.
				self.store.write_block(l, &son_r)?;
				self.store.write_block(r_idx, &son_l)?;
				return Ok(());
			}
			j = r_idx;
			block = son_r;
		}

		self.store.write_block(j, &block)
	}
}
