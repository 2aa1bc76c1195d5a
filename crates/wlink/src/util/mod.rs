//! Shared utilities for wlink.

pub mod ifname;

pub use ifname::{index_to_name, name_or_index, name_to_index, resolve};
