//! Layer tree engine for map viewers
//!
//! Maintains a map viewer's layer configuration as a forest of nested
//! layer groups. The core is the explode/implode pair that converts the
//! forest into a flat, path-addressed sequence and back; on top of it
//! sit group-safe reordering, capability-tree merging, mutual-exclusivity
//! enforcement, WMS request parameter assembly and the compact permalink
//! codec.
//!
//! Every transformation is a pure function: it takes a snapshot of the
//! flat root array and returns a new one, sharing unchanged subtrees.
//! The layering follows domain (entities and pure tree logic),
//! application (transformation services, permalink codec) and cli.

pub mod application;
pub mod cli;
pub mod domain;
pub mod exitcode;
pub mod util;
