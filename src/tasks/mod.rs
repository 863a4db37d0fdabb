//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: removes expired in-memory store entries at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
