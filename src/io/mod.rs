pub mod export;
pub mod persist;
