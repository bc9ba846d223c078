//! The actor runtime: registry, mailboxes, channels, the send/reply
//! arenas, and worker lifecycle (spec §4, components D/E/F).

pub mod channel;
pub mod lifecycle;
pub mod mailbox;
pub mod registry;
pub mod send;

pub use lifecycle::{spawn, ActorContext, ActorSpawnOptions, ErrorHandler, SpawnedActor};
pub use registry::{ActorId, ActorRecord, ActorRegistry};
pub use send::{send_async, send_async_with_callback, send_sync, transfer, SlotOutcome, SlotTicket};
