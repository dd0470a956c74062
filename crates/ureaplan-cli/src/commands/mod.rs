pub mod backends;
pub mod solve;
pub mod validate;
