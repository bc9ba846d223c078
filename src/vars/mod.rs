//! Process-wide shared variable store (component C / spec §4.C): a
//! bucketed two-level map (`array -> key -> value`) with per-bucket
//! locking, plus the `lpop`/`lpush`/`lreplace`/`linsert`/`llength`/
//! `lindex`/`lrange`/`lsearch` list family.

pub mod bucket;
pub mod list_ops;
pub mod value;

pub use bucket::{hash_array_name, SharedVarStore, NUM_BUCKETS};
pub use list_ops::SearchMode;
pub use value::ValueContainer;
