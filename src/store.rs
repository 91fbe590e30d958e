pub(crate) mod history;
pub(crate) mod overlay_store;
