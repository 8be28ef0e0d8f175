pub mod coordinator;
pub mod keys;
