//! # thread_actors
//!
//! An embeddable actor-style concurrency runtime for scripting hosts. Each
//! actor is an OS thread that exclusively owns one [`script::Interpreter`]
//! and is reachable only through its mailbox — callers never touch another
//! actor's interpreter directly. On top of the actor/mailbox layer this
//! crate also provides:
//!
//! - a bounded, idle-reclaiming thread pool for fire-and-forget script jobs
//!   ([`pool`]),
//! - non-reentrant, recursive, and reader-writer mutexes plus condition
//!   variables, exposed through an opaque handle table ([`handle`],
//!   [`sync`]),
//! - a process-wide shared-variable key/value store with list semantics
//!   ([`vars`]).
//!
//! [`runtime::Runtime`] wires all of the above into a single owner an
//! embedder constructs once and shares across threads.
//!
//! ## Quick example
//!
//! ```rust
//! use thread_actors::actor::{ActorId, ActorSpawnOptions};
//! use thread_actors::runtime::Runtime;
//! use thread_actors::script::EchoInterpreter;
//!
//! let runtime = Runtime::new(|| Box::new(EchoInterpreter::new()));
//! let worker = runtime.actor_create(None, ActorSpawnOptions::default());
//! let mut caller = EchoInterpreter::new();
//! let result = runtime
//!     .send_sync(ActorId::new(0), worker, "expr {2+3}".into(), &mut caller)
//!     .unwrap();
//! assert_eq!(result, "5");
//! ```
//!
//! For complete scenarios — actor death unblocking peers, pool retirement,
//! recursive/reader-writer locking, shared-variable list operations — see
//! the integration tests under `tests/`.

#![deny(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// The actor runtime: registry, mailboxes, channels, send/reply arenas, and
/// worker lifecycle.
pub mod actor;
/// Configuration models for actor spawn defaults and thread-pool sizing.
pub mod config;
/// Crate-wide error type.
pub mod error;
/// The process-wide sync-handle table.
pub mod handle;
/// Bounded, idle-reclaiming worker pool for fire-and-forget script jobs.
pub mod pool;
/// The [`Runtime`](runtime::Runtime) facade wiring every component together.
pub mod runtime;
/// The embedded-interpreter collaborator trait and reference implementation.
pub mod script;
/// Synchronization primitives: exclusive/recursive/reader-writer mutexes and
/// condition variables.
pub mod sync;
/// Shared utilities: id allocation and tracing setup.
pub mod util;
/// Process-wide shared variable store with list semantics.
pub mod vars;
