pub mod analysis;
pub mod bin_common;
pub mod cleanup;
pub mod manifest;
pub mod naming;
pub mod pipeline;

/// For stand-alone functionality that fit comfortably within one file.
pub mod utils;
