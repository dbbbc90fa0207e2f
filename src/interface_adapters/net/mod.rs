pub mod client;
pub mod internal;
