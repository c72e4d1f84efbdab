//! Stored history entities.

/// One row of the `histories` table.
///
/// `directory`, `return_code` and `time` are `None` only for bare commands
/// imported from a legacy history file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub command: String,
    pub directory: Option<String>,
    pub return_code: Option<i32>,
    /// Capture time (unix millis).
    pub time: Option<i64>,
}

impl HistoryRecord {
    /// True for rows without directory or exit-code context.
    pub fn is_bare(&self) -> bool {
        self.directory.is_none() && self.return_code.is_none()
    }
}
