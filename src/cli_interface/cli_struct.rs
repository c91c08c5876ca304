use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum FfsCli {
    /// create a new file system on an existing image file or block device
    Mkfs(MkfsArgs),
    /// register a filesystem to `FUSE` and mount it
    Mount(MountArgs),
}

/// make a new fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "make a new file system")]
pub struct MkfsArgs {
    /// the path of the file system image file or block device
    pub image_file_path: PathBuf,
}

/// mount a fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "mount a file system")]
pub struct MountArgs {
    /// the path of the file system image file
    pub image_file_path: PathBuf,
    /// the mount point of the file system
    pub mount_point: PathBuf,
}

/// test the `FfsCli` struct
#[cfg(test)]
mod parse_args_tests {
    use super::*;

    #[test]
    fn test_mkfs_subcommand() {
        let args = FfsCli::parse_from(["ffs", "mkfs", "disk.img"]);
        assert_eq!(
            args,
            FfsCli::Mkfs(MkfsArgs {
                image_file_path: PathBuf::from("disk.img"),
            })
        );
    }

    #[test]
    fn test_mkfs_requires_an_image() {
        assert!(FfsCli::try_parse_from(["ffs", "mkfs"]).is_err());
    }

    #[test]
    fn test_mount_subcommand() {
        let args = FfsCli::parse_from(["ffs", "mount", "disk.img", "/mnt/ffs"]);
        assert_eq!(
            args,
            FfsCli::Mount(MountArgs {
                image_file_path: PathBuf::from("disk.img"),
                mount_point: PathBuf::from("/mnt/ffs"),
            })
        );
    }

    #[test]
    fn test_mount_requires_both_paths() {
        assert!(FfsCli::try_parse_from(["ffs", "mount", "disk.img"]).is_err());
    }
}
