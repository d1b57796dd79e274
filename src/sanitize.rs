/// Longest name segment we will put on disk.
const MAX_NAME_LEN: usize = 100;
/// Substituted when sanitization leaves nothing usable.
const PLACEHOLDER: &str = "unnamed";

/// Maps an arbitrary guild/channel name to a safe filesystem segment:
/// strips characters illegal on common filesystems, truncates to 100
/// characters, and falls back to a placeholder for empty results.
pub fn safe_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .take(MAX_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        cleaned
    }
}
