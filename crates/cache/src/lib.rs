//! Cache layer for sparrow.
//!
//! Implements the cache-aside pattern shared by the User and Relation
//! services over Redis:
//!
//! - [`KeyValueCache`]: generic string cache with compute-if-absent
//! - [`SetMembershipCache`]: follow/fan lists as sets, with self-repair
//!   and asynchronous population on miss
//! - [`CounterCache`]: follow/fan counts with read-through seeding and
//!   atomic in-place adjustment
//! - [`BackgroundTasks`]: bounded worker for fire-and-forget population
//!
//! The authoritative data always lives in the relational store; everything
//! cached here is advisory and rebuildable.

pub mod backend;
pub mod background;
pub mod counter;
pub mod keys;
pub mod kv;
pub mod set;
pub mod test_utils;

pub use backend::{CacheBackend, CacheError, CacheResult, RedisBackend};
pub use background::BackgroundTasks;
pub use counter::{CounterCache, CounterKind};
pub use kv::KeyValueCache;
pub use set::{ListKind, SetMembershipCache};
