pub mod file;
pub mod message;
pub mod thread;
pub mod user;
