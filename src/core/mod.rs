//! # Core Module
//!
//! Shared-ownership primitives used across the world state.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking.
//!   Chunk handles and the cleanup queue are both `MtResource`s.

pub mod mt_resource;

pub use mt_resource::MtResource;
