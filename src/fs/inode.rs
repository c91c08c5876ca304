//! Fixed-size inode records and their codec.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use super::{BLOCK_SIZE, DIRECT_POINTERS};

/// One 128-byte inode record. The direct-pointer array holds 15 slots on
/// disk but only the first [`DIRECT_POINTERS`] are meaningful; this engine
/// defines no indirect pointers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inode {
    /// type and permission bits
    pub mode: u16,
    pub uid: u16,
    /// size in bytes
    pub size: u32,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub dtime: u32,
    pub gid: u16,
    pub links_count: u16,
    /// usage in 512-byte sectors, for size-in-sectors compatibility
    pub blocks: u32,
    pub block: [u32; 15],
    pub uid_high: u16,
    pub gid_high: u16,
}

impl Inode {
    /// on-disk record size
    pub const RECORD_SIZE: usize = 128;

    pub fn serialize_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u16::<LittleEndian>(self.mode)?;
        w.write_u16::<LittleEndian>(self.uid)?;
        w.write_u32::<LittleEndian>(self.size)?;
        w.write_u32::<LittleEndian>(self.atime)?;
        w.write_u32::<LittleEndian>(self.ctime)?;
        w.write_u32::<LittleEndian>(self.mtime)?;
        w.write_u32::<LittleEndian>(self.dtime)?;
        w.write_u16::<LittleEndian>(self.gid)?;
        w.write_u16::<LittleEndian>(self.links_count)?;
        w.write_u32::<LittleEndian>(self.blocks)?;
        w.write_all(&[0u8; 8])?;
        for pointer in self.block {
            w.write_u32::<LittleEndian>(pointer)?;
        }
        w.write_all(&[0u8; 20])?;
        w.write_u16::<LittleEndian>(self.uid_high)?;
        w.write_u16::<LittleEndian>(self.gid_high)?;
        w.write_all(&[0u8; 4])
    }

    pub fn deserialize_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mode = r.read_u16::<LittleEndian>()?;
        let uid = r.read_u16::<LittleEndian>()?;
        let size = r.read_u32::<LittleEndian>()?;
        let atime = r.read_u32::<LittleEndian>()?;
        let ctime = r.read_u32::<LittleEndian>()?;
        let mtime = r.read_u32::<LittleEndian>()?;
        let dtime = r.read_u32::<LittleEndian>()?;
        let gid = r.read_u16::<LittleEndian>()?;
        let links_count = r.read_u16::<LittleEndian>()?;
        let blocks = r.read_u32::<LittleEndian>()?;
        let mut pad1 = [0u8; 8];
        r.read_exact(&mut pad1)?;
        let mut block = [0u32; 15];
        for pointer in &mut block {
            *pointer = r.read_u32::<LittleEndian>()?;
        }
        let mut pad2 = [0u8; 20];
        r.read_exact(&mut pad2)?;
        let uid_high = r.read_u16::<LittleEndian>()?;
        let gid_high = r.read_u16::<LittleEndian>()?;
        let mut pad3 = [0u8; 4];
        r.read_exact(&mut pad3)?;
        Ok(Inode {
            mode,
            uid,
            size,
            atime,
            ctime,
            mtime,
            dtime,
            gid,
            links_count,
            blocks,
            block,
            uid_high,
            gid_high,
        })
    }

    pub fn is_dir(&self) -> bool {
        self.mode as u32 & libc::S_IFMT == libc::S_IFDIR
    }

    /// Data blocks this inode actually addresses: capped at the 12 direct
    /// pointers, larger sizes are out of reach by design.
    pub fn occupied_blocks(&self) -> usize {
        let blocks = (self.size as u64).div_ceil(BLOCK_SIZE as u64);
        blocks.min(DIRECT_POINTERS as u64) as usize
    }

    pub fn uid32(&self) -> u32 {
        (self.uid_high as u32) << 16 | self.uid as u32
    }

    pub fn gid32(&self) -> u32 {
        (self.gid_high as u32) << 16 | self.gid as u32
    }

    pub fn set_uid32(&mut self, uid: u32) {
        self.uid = uid as u16;
        self.uid_high = (uid >> 16) as u16;
    }

    pub fn set_gid32(&mut self, gid: u32) {
        self.gid = gid as u16;
        self.gid_high = (gid >> 16) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Inode {
        let mut inode = Inode {
            mode: 0x41ed,
            size: 2048,
            links_count: 2,
            blocks: 4,
            atime: 1_600_000_000,
            ctime: 1_600_000_000,
            mtime: 1_600_000_000,
            ..Inode::default()
        };
        inode.block[0] = 132;
        inode
    }

    #[test]
    fn test_record_size() {
        let mut buf = Vec::new();
        sample().serialize_into(&mut buf).unwrap();
        assert_eq!(buf.len(), Inode::RECORD_SIZE);
    }

    #[test]
    fn test_roundtrip() {
        let mut inode = sample();
        inode.set_uid32(0x0003_1234);
        inode.set_gid32(0x0001_4321);
        let mut buf = Vec::new();
        inode.serialize_into(&mut buf).unwrap();
        let decoded = Inode::deserialize_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, inode);
        assert_eq!(decoded.uid32(), 0x0003_1234);
        assert_eq!(decoded.gid32(), 0x0001_4321);
    }

    #[test]
    fn test_field_offsets() {
        let inode = sample();
        let mut buf = Vec::new();
        inode.serialize_into(&mut buf).unwrap();

        assert_eq!(&buf[0..2], &0x41edu16.to_le_bytes());
        assert_eq!(&buf[4..8], &2048u32.to_le_bytes());
        assert_eq!(&buf[26..28], &2u16.to_le_bytes());
        assert_eq!(&buf[28..32], &4u32.to_le_bytes());
        // direct pointer array starts at byte 40
        assert_eq!(&buf[40..44], &132u32.to_le_bytes());
    }

    #[test]
    fn test_mode_bits() {
        assert!(sample().is_dir());
        let file = Inode {
            mode: 0x81a4, // S_IFREG | 0644
            ..Inode::default()
        };
        assert!(!file.is_dir());
    }

    #[test]
    fn test_occupied_blocks() {
        let mut inode = sample();
        inode.size = 0;
        assert_eq!(inode.occupied_blocks(), 0);
        inode.size = 1;
        assert_eq!(inode.occupied_blocks(), 1);
        inode.size = 2048;
        assert_eq!(inode.occupied_blocks(), 1);
        inode.size = 2049;
        assert_eq!(inode.occupied_blocks(), 2);
        // capped at the 12 direct pointers
        inode.size = 100 * 2048;
        assert_eq!(inode.occupied_blocks(), 12);
    }
}
