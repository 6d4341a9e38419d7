//! `switchyard-core` — building blocks shared by the event bus.
//!
//! - [`TypeMap`]: heterogeneous, type-keyed storage (plain and trait-object values)
//! - [`SystemId`]: identity of a registered system

pub mod id;
pub mod type_map;

pub use id::SystemId;
pub use type_map::TypeMap;
