//! cdist: component distribution toolchain.
//!
//! Components, their artifacts and the configuration driving transfers
//! are all described by discriminated spec payloads decoded through the
//! [`cdist_runtime`] typed-object scheme. This crate supplies the
//! concrete spec families (repositories, access methods, configuration,
//! plugin descriptors) and the explicit registry bootstrap; transports,
//! credential resolution and the plugin executor build on top of it.

pub mod access;
pub mod config;
pub mod plugin;
pub mod registries;
pub mod repository;

pub use registries::Registries;
