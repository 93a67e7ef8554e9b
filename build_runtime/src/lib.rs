#![forbid(unsafe_code)]

//! Build runtime: wraps the build kernel with session isolation,
//! an action journal, replay and checkpoints.
//!
//! No rules live here. Every transition and invariant is delegated to
//! `build_engine`.

pub mod error;
pub mod proto_types;
pub mod proto_bridge;
pub mod journal;
pub mod replay;
pub mod snapshot;
pub mod snapshot_codec;
pub mod session;
pub mod registry;
