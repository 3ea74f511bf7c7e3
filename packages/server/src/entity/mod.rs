pub mod attachment;
pub mod block;
pub mod message;
pub mod message_hide;
pub mod pinned_message;
pub mod pinned_thread;
pub mod thread;
pub mod thread_member;
