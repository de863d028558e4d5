#![doc = include_str!("../README.md")]

pub mod base32;
mod error;
mod factory;
mod generator;
mod global;
mod id;
mod pool;
mod rand;
#[cfg(feature = "serde")]
mod serde;
mod time;

pub use crate::base32::{Base32Buf, Base32Error};
pub use crate::error::*;
pub use crate::factory::*;
pub use crate::generator::*;
pub use crate::global::*;
pub use crate::id::*;
pub use crate::pool::*;
pub use crate::rand::*;
#[cfg(feature = "serde")]
pub use crate::serde::*;
pub use crate::time::*;
