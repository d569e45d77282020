//! Cache domain - backend contract, key naming and value encoding

mod backend;
pub mod key;
pub mod value;

pub use backend::{CacheBackend, ConnectionEvent};

#[cfg(test)]
pub use backend::mock::MockBackend;
