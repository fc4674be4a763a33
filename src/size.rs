//! Definitions of the sizes of binary types.

use std::mem;

pub const U8: usize = mem::size_of::<u8>();
pub const U16: usize = mem::size_of::<u16>();
pub const I16: usize = mem::size_of::<i16>();
pub const U32: usize = mem::size_of::<u32>();
