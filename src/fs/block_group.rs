//! Block-group descriptors: per-group metadata locating that group's
//! bitmaps and inode table.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::BLOCK_SIZE;

/// One 32-byte record of the descriptor table at block 1; descriptor `i`
/// describes group `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDescriptor {
    /// block number of the group's block-usage bitmap
    pub block_bitmap: u32,
    /// block number of the group's inode-usage bitmap
    pub inode_bitmap: u32,
    /// first block of the group's inode table
    pub inode_table: u32,
    pub free_blocks_count: u16,
    pub free_inodes_count: u16,
    pub used_dirs_count: u16,
}

impl GroupDescriptor {
    /// on-disk record size; 64 descriptors pack into one block
    pub const RECORD_SIZE: usize = 32;

    pub fn serialize_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.block_bitmap)?;
        w.write_u32::<LittleEndian>(self.inode_bitmap)?;
        w.write_u32::<LittleEndian>(self.inode_table)?;
        w.write_u16::<LittleEndian>(self.free_blocks_count)?;
        w.write_u16::<LittleEndian>(self.free_inodes_count)?;
        w.write_u16::<LittleEndian>(self.used_dirs_count)?;
        w.write_all(&[0u8; 14])
    }

    pub fn deserialize_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let block_bitmap = r.read_u32::<LittleEndian>()?;
        let inode_bitmap = r.read_u32::<LittleEndian>()?;
        let inode_table = r.read_u32::<LittleEndian>()?;
        let free_blocks_count = r.read_u16::<LittleEndian>()?;
        let free_inodes_count = r.read_u16::<LittleEndian>()?;
        let used_dirs_count = r.read_u16::<LittleEndian>()?;
        let mut pad = [0u8; 14];
        r.read_exact(&mut pad)?;
        Ok(GroupDescriptor {
            block_bitmap,
            inode_bitmap,
            inode_table,
            free_blocks_count,
            free_inodes_count,
            used_dirs_count,
        })
    }

    /// byte position of descriptor `group` inside the table at block 1
    pub fn seek_position(group: u64) -> u64 {
        BLOCK_SIZE as u64 + group * Self::RECORD_SIZE as u64
    }

    pub fn load<R: Read + Seek>(store: &mut R, group: u64) -> io::Result<Self> {
        store.seek(SeekFrom::Start(Self::seek_position(group)))?;
        Self::deserialize_from(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> GroupDescriptor {
        GroupDescriptor {
            block_bitmap: 2,
            inode_bitmap: 3,
            inode_table: 4,
            free_blocks_count: 1915,
            free_inodes_count: 2037,
            used_dirs_count: 1,
        }
    }

    #[test]
    fn test_record_size() {
        let mut buf = Vec::new();
        sample().serialize_into(&mut buf).unwrap();
        assert_eq!(buf.len(), GroupDescriptor::RECORD_SIZE);
        assert_eq!(BLOCK_SIZE as usize % GroupDescriptor::RECORD_SIZE, 0);
        assert_eq!(BLOCK_SIZE as usize / GroupDescriptor::RECORD_SIZE, 64);
    }

    #[test]
    fn test_roundtrip() {
        let desc = sample();
        let mut buf = Vec::new();
        desc.serialize_into(&mut buf).unwrap();
        let decoded = GroupDescriptor::deserialize_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, desc);
    }

    #[test]
    fn test_seek_position() {
        assert_eq!(GroupDescriptor::seek_position(0), 2048);
        assert_eq!(GroupDescriptor::seek_position(1), 2048 + 32);
        assert_eq!(GroupDescriptor::seek_position(64), 2048 + 2048);
    }

    #[test]
    fn test_load_indexes_the_table() {
        let mut image = vec![0u8; 8192];
        for group in 0..3u64 {
            let desc = GroupDescriptor {
                block_bitmap: group as u32 * 2048,
                ..sample()
            };
            let mut cursor = Cursor::new(&mut image[..]);
            cursor
                .seek(SeekFrom::Start(GroupDescriptor::seek_position(group)))
                .unwrap();
            desc.serialize_into(&mut cursor).unwrap();
        }

        let mut cursor = Cursor::new(&image[..]);
        let decoded = GroupDescriptor::load(&mut cursor, 2).unwrap();
        assert_eq!(decoded.block_bitmap, 4096);
    }
}
