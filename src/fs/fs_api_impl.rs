//! `fuser::Filesystem` implementation over the [`Ffs`] handle.

use std::{
    os::unix::prelude::OsStrExt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use fuser::{FileAttr, FileType, Filesystem};
use log::info;

use super::{error::FsError, fs_layout::Ffs, Inode, BLOCK_SIZE, FILENAME_MAX_LENGTH};

fn errno(err: &FsError) -> libc::c_int {
    match err {
        FsError::NotFound { .. } => libc::ENOENT,
        _ => libc::EIO,
    }
}

fn file_kind(inode: &Inode) -> FileType {
    match inode.mode as u32 & libc::S_IFMT {
        libc::S_IFDIR => FileType::Directory,
        libc::S_IFLNK => FileType::Symlink,
        libc::S_IFCHR => FileType::CharDevice,
        libc::S_IFBLK => FileType::BlockDevice,
        libc::S_IFIFO => FileType::NamedPipe,
        libc::S_IFSOCK => FileType::Socket,
        _ => FileType::RegularFile,
    }
}

fn epoch(seconds: u32) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(seconds as u64)
}

fn file_attr(ino: u64, inode: &Inode) -> FileAttr {
    FileAttr {
        ino,
        size: inode.size as u64,
        blocks: inode.blocks as u64,
        atime: epoch(inode.atime),
        mtime: epoch(inode.mtime),
        ctime: epoch(inode.ctime),
        crtime: epoch(inode.ctime),
        kind: file_kind(inode),
        perm: inode.mode & 0o7777,
        nlink: inode.links_count as u32,
        uid: inode.uid32(),
        gid: inode.gid32(),
        rdev: 0,
        blksize: BLOCK_SIZE,
        flags: 0,
    }
}

impl Filesystem for Ffs {
    fn init(
        &mut self,
        _req: &fuser::Request<'_>,
        _config: &mut fuser::KernelConfig,
    ) -> Result<(), libc::c_int> {
        // the handle is stateless, nothing to set up
        Ok(())
    }

    fn destroy(&mut self) {
        info!("destroy() called, filesystem unmounted");
    }

    // to show FS information
    fn statfs(&mut self, _req: &fuser::Request<'_>, _ino: u64, reply: fuser::ReplyStatfs) {
        let Ok(summary) = self.stat_summary() else {
            reply.error(libc::EIO);
            return;
        };
        reply.statfs(
            summary.total_blocks,
            summary.free_blocks,
            summary.free_blocks,
            summary.total_inodes,
            summary.free_inodes,
            summary.block_size,
            FILENAME_MAX_LENGTH as u32,
            summary.block_size,
        )
    }

    // to look up a file
    fn lookup(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &std::ffi::OsStr,
        reply: fuser::ReplyEntry,
    ) {
        info!("lookup() called with parent inode number: {parent} and name: {name:?}");
        let ttl = Duration::new(0, 0);
        let scanner = match self.read_dir(parent) {
            Ok(scanner) => scanner,
            Err(err) => {
                reply.error(errno(&err));
                return;
            }
        };
        for entry in scanner {
            let Ok((entry_name, entry_inode)) = entry else {
                reply.error(libc::EIO);
                return;
            };
            if entry_name == name.as_bytes() {
                match self.read_inode(entry_inode as u64) {
                    Ok(inode) => {
                        reply.entry(&ttl, &file_attr(entry_inode as u64, &inode), 0)
                    }
                    Err(err) => reply.error(errno(&err)),
                }
                return;
            }
        }
        reply.error(libc::ENOENT);
    }

    fn getattr(&mut self, _req: &fuser::Request<'_>, ino: u64, reply: fuser::ReplyAttr) {
        info!("getattr() called with inode number: {:?}", ino);
        let ttl = Duration::new(0, 0);
        let Ok(inode) = self.read_inode(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        reply.attr(&ttl, &file_attr(ino, &inode));
    }

    // to set file attributes
    fn setattr(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<fuser::TimeOrNow>,
        mtime: Option<fuser::TimeOrNow>,
        _ctime: Option<std::time::SystemTime>,
        fh: Option<u64>,
        _crtime: Option<std::time::SystemTime>,
        _chgtime: Option<std::time::SystemTime>,
        _bkuptime: Option<std::time::SystemTime>,
        _flags: Option<u32>,
        reply: fuser::ReplyAttr,
    ) {
        info!(
            "setattr() called with inode number: {:?}, mode: {:?}, uid: {:?}, gid: {:?}, size: {:?}, atime: {:?}, mtime: {:?}, fh: {:?}",
            ino, mode, uid, gid, size, atime, mtime, fh
        );
        // the data plane is read-only, so truncate is unsupported
        if size.is_some() {
            reply.error(libc::ENOSYS);
            return;
        }
        let Ok(mut inode) = self.read_inode(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        if let Some(mode) = mode {
            inode.mode = mode as u16;
        }
        if let Some(uid) = uid {
            inode.set_uid32(uid);
        }
        if let Some(gid) = gid {
            inode.set_gid32(gid);
        }
        // timestamps are accepted but nothing reads them back differently
        if mode.is_some() || uid.is_some() || gid.is_some() {
            if let Err(err) = self.write_inode(ino, &inode) {
                reply.error(errno(&err));
                return;
            }
        }
        reply.attr(&Duration::new(0, 0), &file_attr(ino, &inode));
    }

    fn open(&mut self, _req: &fuser::Request<'_>, ino: u64, _flags: i32, reply: fuser::ReplyOpen) {
        info!("open() called with inode number: {ino}");
        reply.opened(0, 0);
    }

    fn opendir(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _flags: i32,
        reply: fuser::ReplyOpen,
    ) {
        info!("opendir() called with inode number: {ino}");
        reply.opened(0, 0);
    }

    // to read from a file
    fn read(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        flags: i32,
        lock_owner: Option<u64>,
        reply: fuser::ReplyData,
    ) {
        info!(
            "read() called with inode number: {:?}, fh: {:?}, offset: {:?}, size: {:?}, flags: {:?}, lock_owner: {:?}",
            ino, fh, offset, size, flags, lock_owner
        );
        if offset < 0 {
            reply.error(libc::EINVAL);
            return;
        }
        let Ok(inode) = self.read_inode(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.read_file_data(&inode, offset as u64, size) {
            Ok(data) => reply.data(&data),
            Err(err) => reply.error(errno(&err)),
        }
    }

    // to read a dir
    fn readdir(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: fuser::ReplyDirectory,
    ) {
        info!("readdir() called with inode number: {ino}");
        if offset < 0 {
            reply.error(libc::EINVAL);
            return;
        }
        let Ok(scanner) = self.read_dir(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        for (index, entry) in scanner.skip(offset as usize).enumerate() {
            let Ok((name, entry_inode)) = entry else {
                reply.error(libc::EIO);
                return;
            };
            let Ok(inode) = self.read_inode(entry_inode as u64) else {
                reply.error(libc::EIO);
                return;
            };
            let buffer_full = reply.add(
                entry_inode as u64,
                offset + index as i64 + 1,
                file_kind(&inode),
                std::ffi::OsStr::from_bytes(&name),
            );
            if buffer_full {
                break;
            }
        }
        reply.ok();
    }

    fn access(&mut self, _req: &fuser::Request<'_>, ino: u64, mask: i32, reply: fuser::ReplyEmpty) {
        info!("access() called with inode number: {ino}, mask: {mask}");
        // DefaultPermissions delegates the actual check to the kernel
        reply.ok();
    }

    fn getxattr(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        name: &std::ffi::OsStr,
        size: u32,
        reply: fuser::ReplyXattr,
    ) {
        info!(
            "getxattr() called with inode number: {:?}, name: {:?}, size: {:?}",
            ino, name, size
        );
        reply.error(libc::ENOTSUP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ROOT_INODE;

    #[test]
    fn test_file_kind_from_mode() {
        let dir = Inode {
            mode: 0x41ed,
            ..Inode::default()
        };
        assert_eq!(file_kind(&dir), FileType::Directory);

        let file = Inode {
            mode: 0x81a4,
            ..Inode::default()
        };
        assert_eq!(file_kind(&file), FileType::RegularFile);

        let link = Inode {
            mode: 0xa1ff,
            ..Inode::default()
        };
        assert_eq!(file_kind(&link), FileType::Symlink);
    }

    #[test]
    fn test_file_attr_fields() {
        let mut inode = Inode {
            mode: 0x41ed,
            size: 2048,
            links_count: 2,
            blocks: 4,
            atime: 1_700_000_000,
            ctime: 1_700_000_000,
            mtime: 1_700_000_000,
            ..Inode::default()
        };
        inode.set_uid32(1000);
        inode.set_gid32(1000);

        let attr = file_attr(ROOT_INODE, &inode);
        assert_eq!(attr.ino, ROOT_INODE);
        assert_eq!(attr.size, 2048);
        assert_eq!(attr.perm, 0o755);
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(attr.nlink, 2);
        assert_eq!(attr.uid, 1000);
        assert_eq!(attr.blksize, BLOCK_SIZE);
        assert_eq!(attr.atime, epoch(1_700_000_000));
    }

    #[test]
    fn test_backing_store_failure_is_eio() {
        // a missing image is an I/O failure, not a missing directory entry
        let fs = Ffs::new("/no/such/image");
        let err = fs.read_dir(ROOT_INODE).unwrap_err();
        assert_eq!(errno(&err), libc::EIO);
    }

    #[test]
    fn test_errno_mapping() {
        let not_found = FsError::NotFound {
            component: "x".to_string(),
        };
        assert_eq!(errno(&not_found), libc::ENOENT);

        let io = FsError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(errno(&io), libc::EIO);
    }
}
