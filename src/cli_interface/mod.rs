//! command line surface of the `ffs` binary
mod cli_struct;
pub use cli_struct::*;
