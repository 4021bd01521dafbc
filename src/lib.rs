#![doc = include_str!("../README.md")]

mod binding;
mod error;
mod lazy;
mod loader;
mod matrix;
mod platform;
mod resolver;

/// Detection of the C library the current process is linked against.
pub mod libc;

#[cfg(feature = "fs-err")]
pub(crate) use fs_err as fs;
#[cfg(not(feature = "fs-err"))]
pub(crate) use std::fs;

pub use self::binding::*;
pub use self::error::*;
pub use self::lazy::*;
pub use self::loader::*;
pub use self::matrix::*;
pub use self::platform::*;
pub use self::resolver::*;
