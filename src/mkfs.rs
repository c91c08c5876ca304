//! create a fresh filesystem image: superblock, descriptor table, per-group
//! bitmaps and inode tables, and the root directory.
//!
//! A failed write aborts mid-layout and leaves the image in an unspecified
//! partially-written state; there is no rollback.

use log::info;
use std::{
    fs::OpenOptions,
    io::{Seek, SeekFrom, Write},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::fs::{
    bitmap::set_bit, DirEntry, GroupDescriptor, Inode, Layout, Result, SuperBlock,
    BLOCKS_PER_GROUP, BLOCK_SIZE, DIR_ENTRY_RECORD_LENGTH, INODES_PER_GROUP, INODE_SIZE,
    INODE_TABLE_BLOCKS, RESERVED_INODES, ROOT_INODE,
};

/// Format the file or block device at `image_path`, laying out
/// `device_size` bytes. Fails with
/// [`FsError::DeviceTooSmall`](crate::FsError::DeviceTooSmall) before any
/// write when the device cannot hold one full block group (4 MiB).
pub fn mkfs<P: AsRef<Path>>(image_path: P, device_size: u64) -> Result<Layout> {
    let layout = Layout::for_device_size(device_size)?;
    let mut store = OpenOptions::new().write(true).open(image_path)?;
    write_superblock(&mut store, &layout)?;
    write_descriptor_table(&mut store, &layout)?;
    write_block_groups(&mut store, &layout)?;
    write_root_directory(&mut store, &layout)?;
    store.flush()?;
    Ok(layout)
}

fn write_superblock<W: Write + Seek>(store: &mut W, layout: &Layout) -> Result<()> {
    SuperBlock::new(layout).store(store)?;
    info!("superblock and filesystem accounting information written");
    Ok(())
}

fn group_descriptor(layout: &Layout, group: u64) -> GroupDescriptor {
    let first = layout.group_first_block(group) as u32;
    let (free_blocks_count, free_inodes_count, used_dirs_count) = if group == 0 {
        (
            BLOCKS_PER_GROUP as u16
                - 4
                - INODE_TABLE_BLOCKS as u16
                - layout.descriptor_table_blocks as u16,
            (INODES_PER_GROUP - RESERVED_INODES) as u16,
            1,
        )
    } else {
        (
            (BLOCKS_PER_GROUP - 2 - INODE_TABLE_BLOCKS) as u16,
            INODES_PER_GROUP as u16,
            0,
        )
    };
    GroupDescriptor {
        block_bitmap: first,
        inode_bitmap: first + 1,
        inode_table: first + 2,
        free_blocks_count,
        free_inodes_count,
        used_dirs_count,
    }
}

fn write_descriptor_table<W: Write + Seek>(store: &mut W, layout: &Layout) -> Result<()> {
    store.seek(SeekFrom::Start(BLOCK_SIZE as u64))?;
    for group in 0..layout.group_count {
        group_descriptor(layout, group).serialize_into(store)?;
    }
    info!(
        "block group descriptor table written: {} groups",
        layout.group_count
    );
    Ok(())
}

fn epoch_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}

fn root_inode(layout: &Layout) -> Inode {
    let now = epoch_seconds();
    let mut inode = Inode {
        mode: 0x41ed, // directory, rwxr-xr-x
        size: BLOCK_SIZE,
        links_count: 2,
        blocks: BLOCK_SIZE / 512,
        atime: now,
        ctime: now,
        mtime: now,
        ..Inode::default()
    };
    inode.set_uid32(users::get_effective_uid());
    inode.set_gid32(users::get_effective_gid());
    inode.block[0] = layout.root_data_block() as u32;
    inode
}

fn write_block_groups<W: Write + Seek>(store: &mut W, layout: &Layout) -> Result<()> {
    let zero_table = vec![0u8; (INODE_TABLE_BLOCKS * BLOCK_SIZE) as usize];
    for group in 0..layout.group_count {
        let first = layout.group_first_block(group);

        let mut block_bitmap = vec![0u8; BLOCK_SIZE as usize];
        // every group owns its two bitmaps and its inode table
        for bit in 0..(2 + INODE_TABLE_BLOCKS) as usize {
            set_bit(&mut block_bitmap, bit, true);
        }
        let mut inode_bitmap = vec![0u8; BLOCK_SIZE as usize];
        if group == 0 {
            // descriptor table plus two blocks of self-reference accounting
            for bit in 0..(layout.descriptor_table_blocks + 2) as usize {
                set_bit(&mut block_bitmap, (2 + INODE_TABLE_BLOCKS) as usize + bit, true);
            }
            for bit in 0..RESERVED_INODES as usize {
                set_bit(&mut inode_bitmap, bit, true);
            }
        }

        store.seek(SeekFrom::Start(first * BLOCK_SIZE as u64))?;
        store.write_all(&block_bitmap)?;
        store.write_all(&inode_bitmap)?;
        store.write_all(&zero_table)?;

        if group == 0 {
            // the root directory is inode 2, the table's second record
            let table_start = (first + 2) * BLOCK_SIZE as u64;
            store.seek(SeekFrom::Start(table_start + INODE_SIZE as u64))?;
            root_inode(layout).serialize_into(store)?;
        }
    }
    info!("block groups written");
    Ok(())
}

fn write_root_directory<W: Write + Seek>(store: &mut W, layout: &Layout) -> Result<()> {
    store.seek(SeekFrom::Start(layout.root_data_block() * BLOCK_SIZE as u64))?;
    DirEntry::new(b".", ROOT_INODE as u32).serialize_into(store)?;
    DirEntry::new(b"..", ROOT_INODE as u32).serialize_into(store)?;
    // zero the rest of the block: leftover device bytes would otherwise
    // decode as live records after the two entries
    let occupied = 2 * DIR_ENTRY_RECORD_LENGTH as usize;
    store.write_all(&vec![0u8; BLOCK_SIZE as usize - occupied])?;
    info!("root directory written");
    Ok(())
}
