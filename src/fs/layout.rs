//! This module derives the on-disk layout of an image from its size.

use super::{
    error::{FsError, Result},
    GroupDescriptor, BLOCKS_PER_GROUP, BLOCK_SIZE, INODES_PER_GROUP, INODE_TABLE_BLOCKS,
    RESERVED_INODES,
};

/// bytes covered by one block group
pub const fn block_group_size() -> u64 {
    BLOCK_SIZE as u64 * BLOCKS_PER_GROUP as u64
}

/// Block-group count and descriptor-table size for a given device.
///
/// Pure arithmetic, no I/O; the formatter and the tests share it so both
/// sides of the on-disk contract agree on every derived number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub group_count: u64,
    pub descriptor_table_blocks: u64,
}

impl Layout {
    pub fn for_device_size(size: u64) -> Result<Self> {
        let group_count = size / block_group_size();
        if group_count < 1 {
            return Err(FsError::DeviceTooSmall {
                size,
                required: block_group_size(),
            });
        }
        let descriptors_per_block = (BLOCK_SIZE / GroupDescriptor::RECORD_SIZE as u32) as u64;
        let descriptor_table_blocks = group_count.div_ceil(descriptors_per_block);
        Ok(Layout {
            group_count,
            descriptor_table_blocks,
        })
    }

    pub fn blocks_count(&self) -> u64 {
        self.group_count * BLOCKS_PER_GROUP as u64
    }

    pub fn inodes_count(&self) -> u64 {
        self.group_count * INODES_PER_GROUP as u64
    }

    /// Blocks left free after formatting: every group gives up its two
    /// bitmaps and its inode table, group 0 additionally the descriptor
    /// table and two blocks of bitmap self-reference accounting.
    pub fn free_blocks_count(&self) -> u64 {
        self.group_count * (BLOCKS_PER_GROUP - 2 - INODE_TABLE_BLOCKS) as u64
            - 2
            - self.descriptor_table_blocks
    }

    pub fn free_inodes_count(&self) -> u64 {
        self.inodes_count() - RESERVED_INODES as u64
    }

    /// First block of a group's region (its block bitmap). Group 0's region
    /// starts right after the descriptor table; every later group starts at
    /// a group-aligned block.
    pub fn group_first_block(&self, group: u64) -> u64 {
        if group == 0 {
            1 + self.descriptor_table_blocks
        } else {
            group * BLOCKS_PER_GROUP as u64
        }
    }

    /// First data block of group 0, where the root directory lives.
    pub fn root_data_block(&self) -> u64 {
        3 + self.descriptor_table_blocks + INODE_TABLE_BLOCKS as u64
    }
}
