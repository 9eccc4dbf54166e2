pub(crate) mod affine;
pub(crate) mod controller;
