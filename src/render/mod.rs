pub(crate) mod cpu;
pub(crate) mod export;
pub(crate) mod snapshot;
