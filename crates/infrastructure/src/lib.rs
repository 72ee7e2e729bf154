//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod countdown_attempt_tracker;
mod in_memory_subnet_registry;
mod redis_attempt_tracker;

pub use countdown_attempt_tracker::CountdownAttemptTracker;
pub use in_memory_subnet_registry::InMemorySubnetRegistry;
pub use redis_attempt_tracker::RedisAttemptTracker;
