pub(crate) mod device;
pub(crate) mod fill;
pub(crate) mod server;
pub(crate) mod status;
