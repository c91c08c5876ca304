//! The superblock: global metadata describing the whole image.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::{
    Layout, BLOCKS_PER_GROUP, FS_ERRORS_CONTINUE, FS_MAGIC, FS_STATE_CLEAN, INODES_PER_GROUP,
    LOG_BLOCK_SIZE, SUPERBLOCK_OFFSET,
};

/// The superblock of this filesystem, one per image at byte offset 1024.
///
/// Fields that are padding on disk, or that only mirror another field
/// (the fragment columns always equal the block columns), are not kept
/// in memory; [`serialize_into`](SuperBlock::serialize_into) reproduces
/// them byte-exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    pub inodes_count: u32,
    pub blocks_count: u32,
    pub free_blocks_count: u32,
    pub free_inodes_count: u32,
    /// log2-encoded: `block_size == 1024 << log_block_size`
    pub log_block_size: u32,
    pub blocks_per_group: u32,
    pub inodes_per_group: u32,
    pub max_mnt_count: u16,
    pub magic: u16,
    pub state: u16,
    pub errors: u16,
    pub minor_rev_level: u16,
    pub checkinterval: u32,
    pub rev_level: u32,
}

impl SuperBlock {
    /// on-disk record size, padding included
    pub const RECORD_SIZE: usize = 1024;

    /// Superblock of a freshly formatted image.
    pub fn new(layout: &Layout) -> Self {
        SuperBlock {
            inodes_count: layout.inodes_count() as u32,
            blocks_count: layout.blocks_count() as u32,
            free_blocks_count: layout.free_blocks_count() as u32,
            free_inodes_count: layout.free_inodes_count() as u32,
            log_block_size: LOG_BLOCK_SIZE,
            blocks_per_group: BLOCKS_PER_GROUP,
            inodes_per_group: INODES_PER_GROUP,
            max_mnt_count: 0xffff,
            magic: FS_MAGIC,
            state: FS_STATE_CLEAN,
            errors: FS_ERRORS_CONTINUE,
            minor_rev_level: 0,
            checkinterval: 0xffff_ffff,
            rev_level: 0,
        }
    }

    pub fn block_size(&self) -> u32 {
        1024 << self.log_block_size
    }

    /// Write the full 1024-byte record, fixed field offsets, little endian.
    pub fn serialize_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.inodes_count)?;
        w.write_u32::<LittleEndian>(self.blocks_count)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(self.free_blocks_count)?;
        w.write_u32::<LittleEndian>(self.free_inodes_count)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(self.log_block_size)?;
        // fragments are not implemented and mirror the block columns
        w.write_u32::<LittleEndian>(self.log_block_size)?;
        w.write_u32::<LittleEndian>(self.blocks_per_group)?;
        w.write_u32::<LittleEndian>(self.blocks_per_group)?;
        w.write_u32::<LittleEndian>(self.inodes_per_group)?;
        w.write_all(&[0u8; 10])?;
        w.write_u16::<LittleEndian>(self.max_mnt_count)?;
        w.write_u16::<LittleEndian>(self.magic)?;
        w.write_u16::<LittleEndian>(self.state)?;
        w.write_u16::<LittleEndian>(self.errors)?;
        w.write_u16::<LittleEndian>(self.minor_rev_level)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(self.checkinterval)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(self.rev_level)?;
        w.write_all(&[0u8; Self::RECORD_SIZE - 80])
    }

    /// Read a full record. No field is validated, not even the magic;
    /// callers get whatever bytes are present.
    pub fn deserialize_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let inodes_count = r.read_u32::<LittleEndian>()?;
        let blocks_count = r.read_u32::<LittleEndian>()?;
        r.read_u32::<LittleEndian>()?;
        let free_blocks_count = r.read_u32::<LittleEndian>()?;
        let free_inodes_count = r.read_u32::<LittleEndian>()?;
        r.read_u32::<LittleEndian>()?;
        let log_block_size = r.read_u32::<LittleEndian>()?;
        r.read_u32::<LittleEndian>()?; // log_frag_size
        let blocks_per_group = r.read_u32::<LittleEndian>()?;
        r.read_u32::<LittleEndian>()?; // frags_per_group
        let inodes_per_group = r.read_u32::<LittleEndian>()?;
        let mut pad = [0u8; 10];
        r.read_exact(&mut pad)?;
        let max_mnt_count = r.read_u16::<LittleEndian>()?;
        let magic = r.read_u16::<LittleEndian>()?;
        let state = r.read_u16::<LittleEndian>()?;
        let errors = r.read_u16::<LittleEndian>()?;
        let minor_rev_level = r.read_u16::<LittleEndian>()?;
        r.read_u32::<LittleEndian>()?;
        let checkinterval = r.read_u32::<LittleEndian>()?;
        r.read_u32::<LittleEndian>()?;
        let rev_level = r.read_u32::<LittleEndian>()?;
        let mut tail = [0u8; Self::RECORD_SIZE - 80];
        r.read_exact(&mut tail)?;
        Ok(SuperBlock {
            inodes_count,
            blocks_count,
            free_blocks_count,
            free_inodes_count,
            log_block_size,
            blocks_per_group,
            inodes_per_group,
            max_mnt_count,
            magic,
            state,
            errors,
            minor_rev_level,
            checkinterval,
            rev_level,
        })
    }

    /// Read the superblock from its fixed offset in the backing store.
    pub fn load<R: Read + Seek>(store: &mut R) -> io::Result<Self> {
        store.seek(SeekFrom::Start(SUPERBLOCK_OFFSET))?;
        Self::deserialize_from(store)
    }

    pub fn store<W: Write + Seek>(&self, store: &mut W) -> io::Result<()> {
        store.seek(SeekFrom::Start(SUPERBLOCK_OFFSET))?;
        self.serialize_into(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> SuperBlock {
        SuperBlock::new(&Layout::for_device_size(8 * 1024 * 1024).unwrap())
    }

    #[test]
    fn test_record_size() {
        let mut buf = Vec::new();
        sample().serialize_into(&mut buf).unwrap();
        assert_eq!(buf.len(), SuperBlock::RECORD_SIZE);
    }

    #[test]
    fn test_roundtrip() {
        let sb = sample();
        let mut buf = Vec::new();
        sb.serialize_into(&mut buf).unwrap();
        let decoded = SuperBlock::deserialize_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, sb);
    }

    #[test]
    fn test_field_offsets() {
        let sb = sample();
        let mut buf = Vec::new();
        sb.serialize_into(&mut buf).unwrap();

        assert_eq!(&buf[0..4], &sb.inodes_count.to_le_bytes());
        assert_eq!(&buf[24..28], &1u32.to_le_bytes());
        // fragment columns mirror the block columns
        assert_eq!(&buf[28..32], &buf[24..28].to_vec()[..]);
        assert_eq!(&buf[32..36], &2048u32.to_le_bytes());
        assert_eq!(&buf[40..44], &2048u32.to_le_bytes());
        assert_eq!(&buf[56..58], &0xef53u16.to_le_bytes());
        assert_eq!(&buf[58..60], &1u16.to_le_bytes());
        assert_eq!(&buf[60..62], &1u16.to_le_bytes());
    }

    #[test]
    fn test_decode_is_trusting() {
        // garbage magic decodes without complaint; validation is the
        // caller's business
        let mut buf = Vec::new();
        let mut sb = sample();
        sb.magic = 0x1234;
        sb.serialize_into(&mut buf).unwrap();
        let decoded = SuperBlock::deserialize_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded.magic, 0x1234);
    }

    #[test]
    fn test_load_seeks_past_boot_area() {
        let mut image = vec![0xaau8; 4096];
        let sb = sample();
        let mut cursor = Cursor::new(&mut image[..]);
        sb.store(&mut cursor).unwrap();
        let decoded = SuperBlock::load(&mut Cursor::new(&image[..])).unwrap();
        assert_eq!(decoded, sb);
        // boot area untouched
        assert!(image[..1024].iter().all(|b| *b == 0xaa));
    }

    #[test]
    fn test_short_record_is_an_error() {
        let buf = vec![0u8; 100];
        assert!(SuperBlock::deserialize_from(&mut Cursor::new(&buf)).is_err());
    }
}
