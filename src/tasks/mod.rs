pub(crate) mod credit_refill;
pub(crate) mod scheduler;
