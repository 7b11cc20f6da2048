#[macro_use]
mod macros;
pub(crate) mod common;
pub(crate) mod cutils;
pub(crate) mod log;
pub(crate) mod smallsh;
pub(crate) mod system;

pub use smallsh::main as smallsh_main;
