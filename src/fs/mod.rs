//! our on-disk filesystem engine
pub mod bitmap;
pub mod block_group;
pub mod directory;
pub mod error;
pub mod fs_layout;
pub mod inode;
pub mod layout;
pub mod superblock;
mod fs_api_impl;
pub use block_group::*;
pub use directory::*;
pub use error::*;
pub use fs_layout::*;
pub use inode::*;
pub use layout::*;
pub use superblock::*;

/// fixed block size of every image this engine produces or reads
pub const BLOCK_SIZE: u32 = 2048;
/// `block_size == 1024 << LOG_BLOCK_SIZE`
pub const LOG_BLOCK_SIZE: u32 = 1;
pub const BLOCKS_PER_GROUP: u32 = 2048;
pub const INODES_PER_GROUP: u32 = 2048;
/// on-disk inode record size
pub const INODE_SIZE: u32 = 128;
/// blocks occupied by one group's inode table
pub const INODE_TABLE_BLOCKS: u32 = INODE_SIZE * INODES_PER_GROUP / BLOCK_SIZE;
/// inodes 1..=11 are reserved; inode 2 is the root directory
pub const RESERVED_INODES: u32 = 11;
pub const ROOT_INODE: u64 = 2;
pub const FS_MAGIC: u16 = 0xef53;
pub const FS_STATE_CLEAN: u16 = 1;
pub const FS_ERRORS_CONTINUE: u16 = 1;
/// only the first 12 direct pointers of an inode are meaningful
pub const DIRECT_POINTERS: usize = 12;
/// slot length the formatter gives every directory entry it writes
pub const DIR_ENTRY_RECORD_LENGTH: u16 = 256;
pub const FILENAME_MAX_LENGTH: usize = 247;
/// byte offset of the superblock, after the boot/reserved area
pub const SUPERBLOCK_OFFSET: u64 = 1024;
