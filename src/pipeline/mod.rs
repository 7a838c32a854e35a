pub(crate) mod batch;
pub(crate) mod persist;
