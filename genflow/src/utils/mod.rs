//! Utility functions for UUID generation and timestamp handling.

mod timestamps;
mod uuid_utils;

pub use timestamps::{iso_timestamp, parse_timestamp};
pub use uuid_utils::{generate_uuid, generate_uuid_v7};
