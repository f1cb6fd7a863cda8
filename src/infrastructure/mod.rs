pub mod agent;
pub mod asr;
pub mod observability;
