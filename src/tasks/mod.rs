//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a coordinator lives.
//!
//! # Tasks
//! - Janitor: purges expired results and enforces cache capacity

mod janitor;

pub use janitor::{spawn_janitor, Sweep};
