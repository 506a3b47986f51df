pub(crate) mod result;
pub(crate) mod session;
