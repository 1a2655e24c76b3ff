mod base;
mod common;

pub use base::*;
pub use common::*;
