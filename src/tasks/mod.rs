//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Purges expired entries of the in-process cache backend

mod cleanup;

pub use cleanup::spawn_cleanup_task;
