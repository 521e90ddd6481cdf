//! Model store - trained model triples and installed capacity per district

mod handle;

pub use handle::{ModelTriple, StoreHandle};

#[cfg(test)]
pub use handle::mock;
