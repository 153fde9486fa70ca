pub(crate) mod answer_crypto;
pub(crate) mod credits;
pub(crate) mod grading;
pub(crate) mod hints;
pub(crate) mod storage;
