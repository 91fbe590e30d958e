pub(crate) mod controller;
pub(crate) mod handles;
pub(crate) mod input;
pub(crate) mod throttle;
