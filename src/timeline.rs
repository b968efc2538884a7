pub(crate) mod config;
pub(crate) mod registry;
pub(crate) mod stitcher;
