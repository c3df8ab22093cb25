pub mod capabilities;
pub mod client;
pub mod decoder;
pub mod session;
pub mod store;
