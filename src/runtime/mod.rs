//! The `Runtime` facade: the single entry point an embedder constructs to
//! get an actor registry, handle registry, shared variable store, and
//! thread-pool registry wired together (spec §6).

pub mod api;

pub use api::{InterpreterFactory, Runtime};
