pub(crate) mod element;
pub(crate) mod presentation;
pub(crate) mod slide;
