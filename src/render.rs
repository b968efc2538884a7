pub(crate) mod composite;
pub(crate) mod layers;
pub(crate) mod producer;
pub(crate) mod scheduler;
pub(crate) mod surface;
