//! Eligibility check for raw history lines.

/// Characters skipped before looking at the first meaningful character.
/// Unlike [`char::is_ascii_whitespace`] this includes vertical tab.
const BLANK: &[char] = &[' ', '\t', '\n', '\u{0b}', '\u{0c}', '\r'];

/// Whether `command` should be stored at all.
///
/// Blank lines and lines whose first non-blank character is `#` (comments)
/// are rejected. Callers drop rejected commands silently.
pub fn is_command_valid(command: &str) -> bool {
    command
        .trim_start_matches(BLANK)
        .chars()
        .next()
        .is_some_and(|c| c != '#')
}
