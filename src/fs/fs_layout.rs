//! what the filesystem looks like to a reader: one handle over an image
//! file, addressing arithmetic, and the path walk.
//!
//! Every operation opens the backing store, performs a bounded sequence of
//! seeks and reads or writes, and releases the handle; nothing is cached
//! between calls, and a read racing a concurrent writer may observe a torn
//! view. Callers that mutate concurrently must serialize externally.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom},
    os::unix::ffi::OsStrExt,
    path::{Component, Path, PathBuf},
};

use log::debug;

use super::{
    directory::{self, DirScanner},
    error::{FsError, Result},
    GroupDescriptor, Inode, SuperBlock, BLOCK_SIZE, FILENAME_MAX_LENGTH, INODE_SIZE, ROOT_INODE,
};

/// Totals the adapter layer reports for the whole filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSummary {
    pub block_size: u32,
    pub total_blocks: u64,
    pub free_blocks: u64,
    pub total_inodes: u64,
    pub free_inodes: u64,
    pub max_name_length: usize,
}

/// Handle over a formatted image file or block device.
#[derive(Debug)]
pub struct Ffs {
    image: PathBuf,
}

/// (group index, index within the group's inode table); inode numbers are
/// 1-based
fn inode_offsets(number: u64, inodes_per_group: u64) -> (u64, u64) {
    ((number - 1) / inodes_per_group, (number - 1) % inodes_per_group)
}

impl Ffs {
    pub fn new<P: AsRef<Path>>(image: P) -> Self {
        Ffs {
            image: image.as_ref().to_path_buf(),
        }
    }

    fn open_read(&self) -> Result<File> {
        Ok(File::open(&self.image)?)
    }

    fn open_write(&self) -> Result<File> {
        Ok(OpenOptions::new().read(true).write(true).open(&self.image)?)
    }

    pub fn superblock(&self) -> Result<SuperBlock> {
        let mut store = self.open_read()?;
        Ok(SuperBlock::load(&mut store)?)
    }

    /// byte position of an inode record: superblock for the group size,
    /// then the group's descriptor for its inode table
    fn inode_seek_position<R: Read + Seek>(store: &mut R, number: u64) -> Result<u64> {
        let superblock = SuperBlock::load(store)?;
        let (group, index) = inode_offsets(number, superblock.inodes_per_group as u64);
        let descriptor = GroupDescriptor::load(store, group)?;
        Ok(descriptor.inode_table as u64 * BLOCK_SIZE as u64 + index * INODE_SIZE as u64)
    }

    /// Read one inode record. Nothing about `number` is validated beyond
    /// the addressing arithmetic; a number past the end of the device
    /// surfaces as an I/O error.
    pub fn read_inode(&self, number: u64) -> Result<Inode> {
        let mut store = self.open_read()?;
        let position = Self::inode_seek_position(&mut store, number)?;
        store.seek(SeekFrom::Start(position))?;
        Ok(Inode::deserialize_from(&mut store)?)
    }

    /// Write one inode record back. Free-count bookkeeping in the
    /// superblock and descriptors is not updated.
    pub fn write_inode(&self, number: u64, inode: &Inode) -> Result<()> {
        let mut store = self.open_write()?;
        let position = Self::inode_seek_position(&mut store, number)?;
        store.seek(SeekFrom::Start(position))?;
        Ok(inode.serialize_into(&mut store)?)
    }

    /// Lazy scan of a directory inode's entries in on-disk order.
    pub fn read_dir(&self, number: u64) -> Result<DirScanner<File>> {
        let inode = self.read_inode(number)?;
        let store = self.open_read()?;
        Ok(DirScanner::new(store, &inode))
    }

    /// Walk a slash-separated path from the root inode. `/` resolves to
    /// inode 2 without touching the store. Intermediate components are not
    /// checked to be directories before scanning them as one.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let mut current = ROOT_INODE;
        for component in path.as_ref().components() {
            let name = match component {
                Component::RootDir | Component::CurDir => continue,
                Component::ParentDir => "..".as_ref(),
                Component::Normal(name) => name,
                Component::Prefix(_) => continue,
            };
            let inode = self.read_inode(current)?;
            let store = self.open_read()?;
            match directory::lookup(store, &inode, name.as_bytes())? {
                Some(entry_inode) => current = entry_inode as u64,
                None => {
                    debug!("resolve: no entry {name:?} under inode {current}");
                    return Err(FsError::NotFound {
                        component: name.to_string_lossy().into_owned(),
                    });
                }
            }
        }
        Ok(current)
    }

    /// Read up to `size` bytes of an inode's file data starting at byte
    /// `offset`, across its direct blocks. Reads past the end of the file
    /// are truncated; bytes beyond the 12th block are unreachable.
    pub fn read_file_data(&self, inode: &Inode, offset: u64, size: u32) -> Result<Vec<u8>> {
        let end = (inode.size as u64).min(offset.saturating_add(size as u64));
        if offset >= end {
            return Ok(Vec::new());
        }
        let mut store = self.open_read()?;
        let mut data = Vec::with_capacity((end - offset) as usize);
        let mut position = offset;
        while position < end {
            let block_index = (position / BLOCK_SIZE as u64) as usize;
            if block_index >= inode.occupied_blocks() {
                break;
            }
            let within = position % BLOCK_SIZE as u64;
            let chunk = (BLOCK_SIZE as u64 - within).min(end - position);
            let block = inode.block[block_index] as u64;
            store.seek(SeekFrom::Start(block * BLOCK_SIZE as u64 + within))?;
            let mut buf = vec![0u8; chunk as usize];
            store.read_exact(&mut buf)?;
            data.append(&mut buf);
            position += chunk;
        }
        Ok(data)
    }

    pub fn stat_summary(&self) -> Result<StatSummary> {
        let superblock = self.superblock()?;
        Ok(StatSummary {
            block_size: superblock.block_size(),
            total_blocks: superblock.blocks_count as u64,
            free_blocks: superblock.free_blocks_count as u64,
            total_inodes: superblock.inodes_count as u64,
            free_inodes: superblock.free_inodes_count as u64,
            max_name_length: FILENAME_MAX_LENGTH,
        })
    }
}
