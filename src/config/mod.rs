//! Configuration models: actor spawn defaults and thread-pool sizing.

pub mod actor;
pub mod pool;

pub use actor::ActorConfig;
pub use pool::PoolConfig;
