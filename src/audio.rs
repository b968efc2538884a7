pub(crate) mod buffer;
pub(crate) mod clip;
pub(crate) mod envelope;
pub(crate) mod mix;
pub(crate) mod supplier;
