pub(crate) mod decode;
pub(crate) mod narration;
pub(crate) mod pcm;
