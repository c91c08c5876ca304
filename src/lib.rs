pub mod cli_interface;
mod fs;
pub mod mkfs;
pub mod mount;
pub use fs::*;
