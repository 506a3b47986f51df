pub(crate) mod slide;
pub(crate) mod temp;
