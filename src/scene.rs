pub(crate) mod blend;
pub(crate) mod document;
pub(crate) mod model;
