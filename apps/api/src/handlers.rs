pub mod access_lists;
pub mod authorize;
pub mod buckets;
pub mod health;
