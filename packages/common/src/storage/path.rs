use rand::Rng;
use rand::distr::Alphanumeric;

const MAX_FILE_NAME_CHARS: usize = 100;
const SUFFIX_LEN: usize = 12;

/// Reduce a client-supplied file name to a storage-safe form.
///
/// Every character outside `[A-Za-z0-9_.-]` becomes `_`, leading dots are
/// dropped so the result can never name a hidden file or a parent directory,
/// and the name is capped at 100 characters.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = replaced.trim_start_matches('.');
    let capped: String = trimmed.chars().take(MAX_FILE_NAME_CHARS).collect();

    if capped.is_empty() {
        "file".to_string()
    } else {
        capped
    }
}

/// Object key for an attachment: `<thread>/<message>/<random>_<name>`.
///
/// The random segment keeps paths unique so concurrent uploads of the same
/// file name never collide.
pub fn attachment_path(thread_id: i32, message_id: i32, file_name: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!(
        "{thread_id}/{message_id}/{suffix}_{}",
        sanitize_file_name(file_name)
    )
}
