pub(crate) mod frame;
pub(crate) mod model;
pub(crate) mod store;
