//! Configuration types and loading for the column mapping engine.
//!
//! The engine itself never reads files or environment variables; callers load a
//! [`shared::MappingConfig`] through [`load::load_config`] (or build one in code) and hand it to
//! the engine.

pub mod environment;
pub mod load;
pub mod shared;
