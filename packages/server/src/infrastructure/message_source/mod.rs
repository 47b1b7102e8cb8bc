//! Message source implementations for the background generator.

pub mod random;

pub use random::RandomMessageSource;
