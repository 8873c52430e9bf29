//! Utilities shared by the nigiwai crates: logger setup and clock abstraction.

pub mod logger;
pub mod time;
