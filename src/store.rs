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

// On disk data layout.
//
// A single flat file of fixed-size blocks. Block `i` occupies the byte
// range [i * block_bytes, (i + 1) * block_bytes). Each block holds exactly
// `block_capacity` encoded elements, back to back, no header, no padding
// between elements, no checksum.
//
// The store has no notion of which elements within a block are "live" —
// that accounting belongs entirely to the heap above it.

use std::marker::PhantomData;
use std::path::Path;

use crate::{
	codec::Element,
	error::{Error, Result},
};

#[cfg(target_os = "macos")]
fn disable_read_ahead(file: &std::fs::File) -> Result<()> {
	use std::os::unix::io::AsRawFd;
	if unsafe { libc::fcntl(file.as_raw_fd(), libc::F_RDAHEAD, 0) } != 0 {
		Err(Error::IoOpen(std::io::Error::last_os_error()))
	} else {
		Ok(())
	}
}

#[cfg(not(target_os = "macos"))]
fn disable_read_ahead(_file: &std::fs::File) -> Result<()> {
	Ok(())
}

/// A random-access file of fixed-size blocks of `T`.
///
/// Blocks are addressed by index; reading past the current block count
/// yields an empty block, and writing past it extends the file, padding
/// the gap with zero bytes.
pub struct BlockStore<T: Element> {
	file: std::fs::File,
	block_capacity: usize,
	block_bytes: usize,
	blocks: u64,
	#[cfg(test)]
	reads: std::cell::Cell<u64>,
	#[cfg(test)]
	writes: std::cell::Cell<u64>,
	_element: PhantomData<T>,
}

impl<T: Element> BlockStore<T> {
	/// Open `path` as a block store with the given block capacity (in
	/// elements). If `clear`, the file is truncated to zero length first.
	pub fn open(path: &Path, block_capacity: usize, clear: bool) -> Result<Self> {
		assert!(block_capacity > 0);
		let block_bytes = block_capacity * T::ENCODED_SIZE;

		let file = std::fs::OpenOptions::new()
			.create(true)
			.read(true)
			.write(true)
			.truncate(clear)
			.open(path)
			.map_err(Error::IoOpen)?;
		disable_read_ahead(&file)?;

		let blocks = if clear {
			0
		} else {
			let len = file.metadata().map_err(Error::IoOpen)?.len();
			len / block_bytes as u64
		};

		log::debug!(target: "ext-heap", "Opened block store {:?} with {} blocks of {} elements", path, blocks, block_capacity);

		Ok(BlockStore {
			file,
			block_capacity,
			block_bytes,
			blocks,
			#[cfg(test)]
			reads: std::cell::Cell::new(0),
			#[cfg(test)]
			writes: std::cell::Cell::new(0),
			_element: PhantomData,
		})
	}

	pub fn block_capacity(&self) -> usize {
		self.block_capacity
	}

	#[cfg(unix)]
	fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
		use std::os::unix::fs::FileExt;
		self.file.read_exact_at(buf, offset).map_err(Error::IoRead)
	}

	#[cfg(unix)]
	fn write_at(&self, buf: &[u8], offset: u64) -> Result<()> {
		use std::os::unix::fs::FileExt;
		self.file.write_all_at(buf, offset).map_err(Error::IoWrite)
	}

	#[cfg(windows)]
	fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
		use std::os::windows::fs::FileExt;
		let mut read = 0;
		while read < buf.len() {
			let n = self.file.seek_read(&mut buf[read..], offset + read as u64).map_err(Error::IoRead)?;
			if n == 0 {
				return Err(Error::IoRead(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read")));
			}
			read += n;
		}
		Ok(())
	}

	#[cfg(windows)]
	fn write_at(&self, buf: &[u8], offset: u64) -> Result<()> {
		use std::os::windows::fs::FileExt;
		let mut written = 0;
		while written < buf.len() {
			let n = self.file.seek_write(&buf[written..], offset + written as u64).map_err(Error::IoWrite)?;
			written += n;
		}
		Ok(())
	}

	/// Read the block at `index`. Returns an empty vector if `index` is
	/// past the current block count; otherwise always returns exactly
	/// `block_capacity` elements.
	pub fn read_block(&self, index: u64) -> Result<Vec<T>> {
		#[cfg(test)]
		self.reads.set(self.reads.get() + 1);

		if index >= self.blocks {
			return Ok(Vec::new());
		}

		let mut raw = vec![0u8; self.block_bytes];
		self.read_at(&mut raw, index * self.block_bytes as u64)?;

		let mut block = Vec::with_capacity(self.block_capacity);
		for chunk in raw.chunks_exact(T::ENCODED_SIZE) {
			block.push(T::decode(chunk));
		}
		Ok(block)
	}

	/// Write `block` (up to `block_capacity` elements) at `index`, padding
	/// with zero bytes up to a full block. If `index` is past the current
	/// block count, the file is extended first; the gap is left
	/// zero-filled, which the heap never reads without writing it first.
	pub fn write_block(&mut self, index: u64, block: &[T]) -> Result<()> {
		#[cfg(test)]
		self.writes.set(self.writes.get() + 1);

		if block.len() > self.block_capacity {
			return Err(Error::BlockTooLarge);
		}

		if index >= self.blocks {
			self.file.set_len((index + 1) * self.block_bytes as u64).map_err(Error::IoWrite)?;
			self.blocks = index + 1;
		}

		let mut raw = vec![0u8; self.block_bytes];
		for (elem, chunk) in block.iter().zip(raw.chunks_exact_mut(T::ENCODED_SIZE)) {
			elem.encode(chunk);
		}
		self.write_at(&raw, index * self.block_bytes as u64)
	}

	/// Truncate the store to zero length.
	pub fn clear(&mut self) -> Result<()> {
		self.file.set_len(0).map_err(Error::IoWrite)?;
		self.blocks = 0;
		Ok(())
	}

	#[cfg(test)]
	pub fn read_count(&self) -> u64 {
		self.reads.get()
	}

	#[cfg(test)]
	pub fn write_count(&self) -> u64 {
		self.writes.get()
	}

	#[cfg(test)]
	pub fn reset_counts(&self) {
		self.reads.set(0);
		self.writes.set(0);
	}
}

#[cfg(test)]
mod test {
	use super::BlockStore;

	struct TempDir(std::path::PathBuf);

	impl TempDir {
		fn new(name: &'static str) -> TempDir {
			env_logger::try_init().ok();
			let mut path = std::env::temp_dir();
			path.push("ext-heap-test");
			path.push("store");
			path.push(name);
			if path.exists() {
				std::fs::remove_dir_all(&path).unwrap();
			}
			std::fs::create_dir_all(&path).unwrap();
			path.push("blocks.bin");
			TempDir(path)
		}
	}

	impl Drop for TempDir {
		fn drop(&mut self) {
			if let Some(dir) = self.0.parent() {
				let _ = std::fs::remove_dir_all(dir);
			}
		}
	}

	#[test]
	fn missing_block_is_empty() {
		let dir = TempDir::new("missing_block_is_empty");
		let store = BlockStore::<u32>::open(&dir.0, 4, true).unwrap();
		assert_eq!(store.read_block(0).unwrap(), Vec::<u32>::new());
		assert_eq!(store.read_block(7).unwrap(), Vec::<u32>::new());
	}

	#[test]
	fn write_then_read_round_trips() {
		let dir = TempDir::new("write_then_read_round_trips");
		let mut store = BlockStore::<u32>::open(&dir.0, 4, true).unwrap();
		store.write_block(0, &[4, 3, 2, 1]).unwrap();
		assert_eq!(store.read_block(0).unwrap(), vec![4, 3, 2, 1]);
	}

	#[test]
	fn write_past_end_extends_and_pads() {
		let dir = TempDir::new("write_past_end_extends_and_pads");
		let mut store = BlockStore::<u32>::open(&dir.0, 2, true).unwrap();
		store.write_block(2, &[9, 8]).unwrap();
		assert_eq!(store.read_block(2).unwrap(), vec![9, 8]);
		// gap blocks exist (reads don't panic) though their content is unspecified.
		assert_eq!(store.read_block(0).unwrap().len(), 2);
		assert_eq!(store.read_block(1).unwrap().len(), 2);
	}

	#[test]
	fn oversize_block_rejected() {
		let dir = TempDir::new("oversize_block_rejected");
		let mut store = BlockStore::<u32>::open(&dir.0, 2, true).unwrap();
		assert!(matches!(store.write_block(0, &[1, 2, 3]), Err(crate::Error::BlockTooLarge)));
	}

	#[test]
	fn reopen_existing_recovers_block_count() {
		let dir = TempDir::new("reopen_existing_recovers_block_count");
		{
			let mut store = BlockStore::<u32>::open(&dir.0, 2, true).unwrap();
			store.write_block(3, &[1, 2]).unwrap();
		}
		let store = BlockStore::<u32>::open(&dir.0, 2, false).unwrap();
		assert_eq!(store.read_block(3).unwrap(), vec![1, 2]);
		assert_eq!(store.read_block(4).unwrap(), Vec::<u32>::new());
	}

	#[test]
	fn clear_resets_block_count() {
		let dir = TempDir::new("clear_resets_block_count");
		let mut store = BlockStore::<u32>::open(&dir.0, 2, true).unwrap();
		store.write_block(0, &[1, 2]).unwrap();
		store.clear().unwrap();
		assert_eq!(store.read_block(0).unwrap(), Vec::<u32>::new());
	}
}
