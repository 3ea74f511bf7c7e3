pub mod directory;
pub mod history;
pub mod membership;
pub mod message;
pub mod search;
pub mod thread;
pub mod upload;
