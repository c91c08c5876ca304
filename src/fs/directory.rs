//! Directory entries: packed variable-length records inside a directory
//! inode's data blocks, and the scanner that walks them.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::{
    error::Result,
    inode::Inode,
    BLOCK_SIZE, DIR_ENTRY_RECORD_LENGTH, FILENAME_MAX_LENGTH,
};

/// One directory entry. `rec_len` is the length of the slot the record
/// occupies on disk, its own bytes plus trailing zero padding; a slot of
/// `rec_len == 0` marks the end of valid entries within a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode: u32,
    pub rec_len: u16,
    pub name: Vec<u8>,
}

impl DirEntry {
    /// inode number + rec_len + name_len
    pub const HEADER_SIZE: usize = 8;

    /// Entry occupying the fixed slot length the formatter uses.
    pub fn new(name: &[u8], inode: u32) -> Self {
        DirEntry {
            inode,
            rec_len: DIR_ENTRY_RECORD_LENGTH,
            name: name.to_vec(),
        }
    }

    /// Write the record including its padding, `rec_len` bytes in total.
    pub fn serialize_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.name.len() > FILENAME_MAX_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "directory entry name longer than 247 bytes",
            ));
        }
        let occupied = Self::HEADER_SIZE + self.name.len();
        if (self.rec_len as usize) < occupied {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "directory entry rec_len shorter than the record",
            ));
        }
        w.write_u32::<LittleEndian>(self.inode)?;
        w.write_u16::<LittleEndian>(self.rec_len)?;
        w.write_u16::<LittleEndian>(self.name.len() as u16)?;
        w.write_all(&self.name)?;
        w.write_all(&vec![0u8; self.rec_len as usize - occupied])
    }

    /// Read one record header and name. Returns `None` on the
    /// end-of-entries sentinel. Consumes the header and name bytes only;
    /// the caller advances by `rec_len` to reach the next record.
    pub fn deserialize_from<R: Read>(r: &mut R) -> io::Result<Option<Self>> {
        let inode = r.read_u32::<LittleEndian>()?;
        let rec_len = r.read_u16::<LittleEndian>()?;
        if rec_len == 0 {
            return Ok(None);
        }
        let name_len = r.read_u16::<LittleEndian>()?;
        let mut name = vec![0u8; name_len as usize];
        r.read_exact(&mut name)?;
        Ok(Some(DirEntry {
            inode,
            rec_len,
            name,
        }))
    }
}

/// Lazy scan over the `(name, inode)` pairs of a directory inode, in
/// on-disk order across its occupied direct blocks. Duplicate names are
/// yielded as stored; nothing is deduplicated.
#[derive(Debug)]
pub struct DirScanner<R> {
    store: R,
    blocks: Vec<u32>,
    block_index: usize,
    offset: u32,
}

impl<R: Read + Seek> DirScanner<R> {
    pub fn new(store: R, inode: &Inode) -> Self {
        let occupied = inode.occupied_blocks();
        DirScanner {
            store,
            blocks: inode.block[..occupied].to_vec(),
            block_index: 0,
            offset: 0,
        }
    }
}

impl<R: Read + Seek> Iterator for DirScanner<R> {
    type Item = Result<(Vec<u8>, u32)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = *self.blocks.get(self.block_index)?;
            // entries never span a block boundary
            if self.offset as usize + DirEntry::HEADER_SIZE > BLOCK_SIZE as usize {
                self.block_index += 1;
                self.offset = 0;
                continue;
            }
            let position = block as u64 * BLOCK_SIZE as u64 + self.offset as u64;
            if let Err(err) = self.store.seek(SeekFrom::Start(position)) {
                self.block_index = self.blocks.len();
                return Some(Err(err.into()));
            }
            match DirEntry::deserialize_from(&mut self.store) {
                Err(err) => {
                    self.block_index = self.blocks.len();
                    return Some(Err(err.into()));
                }
                Ok(None) => {
                    self.block_index += 1;
                    self.offset = 0;
                }
                Ok(Some(entry)) => {
                    self.offset += entry.rec_len as u32;
                    return Some(Ok((entry.name, entry.inode)));
                }
            }
        }
    }
}

/// Exact byte-for-byte lookup of `name` among a directory inode's entries;
/// first match wins, end of the occupied blocks means no match.
pub fn lookup<R: Read + Seek>(store: R, inode: &Inode, name: &[u8]) -> Result<Option<u32>> {
    for entry in DirScanner::new(store, inode) {
        let (entry_name, entry_inode) = entry?;
        if entry_name == name {
            return Ok(Some(entry_inode));
        }
    }
    Ok(None)
}
