//! Synchronization shell (design §4.6): the two disciplines a pool can run
//! under. Neither module knows anything about regions, blocks, or the
//! best-fit/split/merge engine — they only ever touch a [`crate::pool::Pool`]
//! through a lock or a thread-local cell.

pub mod global;
pub mod local;

pub use global::GlobalPool;
pub use local::LocalPool;
