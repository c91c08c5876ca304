use anyhow::anyhow;
use byte_unit::Byte;
use clap::Parser;
use ffs::cli_interface::FfsCli;
use std::{
    fs::File,
    io::{Seek, SeekFrom},
    os::unix::fs::FileTypeExt,
};

/// a CLI interface to users to choose create our filesystem,
/// or register it to `FUSE` and mount it.
///
/// The latter will block the program until we umount our filesystem ourselves.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = FfsCli::parse();
    match args {
        FfsCli::Mkfs(args) => {
            let metadata = std::fs::symlink_metadata(&args.image_file_path)?;
            let file_type = metadata.file_type();
            if !file_type.is_file() && !file_type.is_block_device() {
                return Err(anyhow!(
                    "{:?} is not a regular file or block device",
                    args.image_file_path
                ));
            }
            // a block device reports metadata len 0, so measure by seeking
            let device_size = File::open(&args.image_file_path)?.seek(SeekFrom::End(0))?;

            let layout = ffs::mkfs::mkfs(&args.image_file_path, device_size)?;
            println!(
                "Created filesystem on {:?}: {} blocks in {} groups, {} inodes, {} usable",
                args.image_file_path,
                layout.blocks_count(),
                layout.group_count,
                layout.inodes_count(),
                Byte::from_bytes((layout.free_blocks_count() * ffs::BLOCK_SIZE as u64) as _)
                    .get_appropriate_unit(true),
            );
        }
        FfsCli::Mount(args) => {
            // register the filesystem to `FUSE`; blocks until unmounted
            ffs::mount::mount(args.image_file_path, args.mount_point)?;
        }
    }
    Ok(())
}
