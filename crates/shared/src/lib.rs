pub mod domain;
pub mod error;
pub mod mow;
pub mod protocol;
