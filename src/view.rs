//! Output rendering for `zhist list`.

use std::io::{self, Write};

/// Which commands a listing selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Every distinct command.
    All,
    /// The most recent successful commands, bounded by `recent_num`.
    Recent,
    /// Successful commands run in the current directory.
    #[default]
    CurrentPath,
}

/// How selected commands are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// One raw command per line.
    #[default]
    Normal,
    /// One command per line with newlines and tabs escaped.
    Escaped,
    /// `escaped\traw\0` records for fzf `--read0 --with-nth=1 --delimiter='\t'`.
    Fzf,
    /// Raw lines, skipping multi-line commands, for loading into zsh history.
    ZshHistory,
}

/// Replace embedded `\n` and `\t` with their two-character escapes.
pub fn escape_newlines(command: &str) -> String {
    let mut escaped = String::with_capacity(command.len() + 10);
    for c in command.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Write `commands` (storage order) to `out`, last one first.
pub fn render<W: Write>(out: &mut W, commands: &[String], view: ViewMode) -> io::Result<()> {
    for command in commands.iter().rev() {
        match view {
            ViewMode::Normal => writeln!(out, "{command}")?,
            ViewMode::Escaped => writeln!(out, "{}", escape_newlines(command))?,
            ViewMode::Fzf => write!(out, "{}\t{command}\0", escape_newlines(command))?,
            ViewMode::ZshHistory => {
                if !command.contains('\n') {
                    writeln!(out, "{command}")?;
                }
            }
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(commands: &[&str], view: ViewMode) -> String {
        let commands: Vec<String> = commands.iter().map(|s| (*s).to_string()).collect();
        let mut out = Vec::new();
        render(&mut out, &commands, view).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn escape_handles_newline_and_tab() {
        assert_eq!(escape_newlines("a\nb\tc"), "a\\nb\\tc");
        assert_eq!(escape_newlines("plain"), "plain");
        assert_eq!(escape_newlines(""), "");
    }

    #[test]
    fn normal_reverses_storage_order() {
        assert_eq!(rendered(&["old", "new"], ViewMode::Normal), "new\nold\n");
    }

    #[test]
    fn normal_keeps_multiline_raw() {
        assert_eq!(rendered(&["a\nb"], ViewMode::Normal), "a\nb\n");
    }

    #[test]
    fn escaped_view() {
        assert_eq!(
            rendered(&["x\ty", "for i\ndone"], ViewMode::Escaped),
            "for i\\ndone\nx\\ty\n"
        );
    }

    #[test]
    fn fzf_view_pairs_escaped_and_raw() {
        assert_eq!(
            rendered(&["ls", "echo a\necho b"], ViewMode::Fzf),
            "echo a\\necho b\techo a\necho b\0ls\tls\0"
        );
    }

    #[test]
    fn zsh_history_view_drops_multiline() {
        assert_eq!(
            rendered(&["one", "two\nlines", "three"], ViewMode::ZshHistory),
            "three\none\n"
        );
    }

    #[test]
    fn empty_input_writes_nothing() {
        for view in [
            ViewMode::Normal,
            ViewMode::Escaped,
            ViewMode::Fzf,
            ViewMode::ZshHistory,
        ] {
            assert_eq!(rendered(&[], view), "");
        }
    }

    #[test]
    fn defaults() {
        assert_eq!(FilterMode::default(), FilterMode::CurrentPath);
        assert_eq!(ViewMode::default(), ViewMode::Normal);
    }
}
