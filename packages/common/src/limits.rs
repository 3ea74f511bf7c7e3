//! Hard limits shared by the messaging services.

/// Largest attachment accepted at reservation or confirmation time (15 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 15 * 1024 * 1024;

/// Most attachments a single message may declare.
pub const MAX_ATTACHMENTS_PER_MESSAGE: usize = 10;

/// Longest message body, in characters.
pub const MAX_CONTENT_CHARS: usize = 4000;

/// Largest message-history page.
pub const MAX_PAGE_SIZE: u64 = 80;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 40;

pub const MAX_SEARCH_RESULTS: u64 = 50;

/// Attachments listed in thread info.
pub const MAX_INFO_ATTACHMENTS: u64 = 30;

/// Pinned messages listed in thread info.
pub const MAX_PINNED_MESSAGES: u64 = 20;

/// Minutes after creation during which the sender may edit a message.
pub const EDIT_WINDOW_MINUTES: i64 = 60;

/// Minimum participants of a group thread, creator included.
pub const MIN_GROUP_MEMBERS: usize = 3;
