pub mod attachment;
pub mod message;
pub mod shared;
pub mod thread;
pub mod user;
