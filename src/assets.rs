pub(crate) mod color;
pub(crate) mod decode;
pub(crate) mod gradient;
pub(crate) mod resolve;
pub(crate) mod store;
