pub mod backends;
pub mod identity;
pub mod persistence;
