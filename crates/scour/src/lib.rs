#![doc = include_str!("../README.md")]

mod context;
mod descriptor;
mod directory;
mod engine;
mod error;
mod handler;
mod partition;
mod pool;
mod queue;
mod retry;
mod stream;

pub use crate::descriptor::*;
pub use crate::directory::*;
pub use crate::engine::*;
pub use crate::error::*;
pub use crate::partition::*;
pub use crate::retry::*;
pub use crate::stream::*;
