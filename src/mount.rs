//! register our filesystem to `FUSE` and mount it
use fuser::MountOption;
use std::path::Path;

use crate::fs::Ffs;

pub fn mount<P>(image_path: P, mountpoint: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let fs = Ffs::new(&image_path);
    // fail before mounting when the image carries no readable superblock
    let superblock = fs.superblock()?;
    log::info!(
        "mounting image {:?}: {} blocks of {} bytes",
        image_path.as_ref(),
        superblock.blocks_count,
        superblock.block_size()
    );

    let opts = vec![
        MountOption::FSName("ffs".to_string()),
        MountOption::DefaultPermissions,
        // MountOption::AllowOther,
        // MountOption::AutoUnmount,
    ];

    Ok(fuser::mount2(fs, mountpoint, &opts)?)
}
