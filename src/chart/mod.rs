//! Chart descriptions and the deterministic builders that produce them.

pub mod builder;
pub mod color;
pub mod spec;
