use ropey::Rope;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

/// An open document: rope content plus the metadata providers select on.
#[derive(Debug, Clone)]
pub struct TextDocument {
    pub uri: Url,
    pub language_id: String,
    pub version: i32,
    pub rope: Rope,
}

impl TextDocument {
    pub fn new(uri: Url, language_id: impl Into<String>, version: i32, text: &str) -> Self {
        Self {
            uri,
            language_id: language_id.into(),
            version,
            rope: Rope::from_str(text),
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Apply incremental (or full) content changes and bump the version.
    pub fn apply_changes(&mut self, version: i32, changes: Vec<TextDocumentContentChangeEvent>) {
        for change in changes {
            if let Some(range) = change.range {
                let start = self.char_offset(range.start);
                let end = self.char_offset(range.end).max(start);
                self.rope.remove(start..end);
                self.rope.insert(start, &change.text);
            } else {
                self.rope = Rope::from_str(&change.text);
            }
        }
        self.version = version;
    }

    /// Convert an LSP position (UTF-16 columns) to a char offset, clamped to the document.
    fn char_offset(&self, pos: Position) -> usize {
        let line = pos.line as usize;
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let line_start = self.rope.line_to_char(line);
        let line_end = if line + 1 < self.rope.len_lines() {
            self.rope.line_to_char(line + 1)
        } else {
            self.rope.len_chars()
        };
        let line_start_cu = self.rope.char_to_utf16_cu(line_start);
        let line_end_cu = self.rope.char_to_utf16_cu(line_end);
        let target_cu = (line_start_cu + pos.character as usize).min(line_end_cu);
        self.rope.utf16_cu_to_char(target_cu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Range;

    fn doc(text: &str) -> TextDocument {
        TextDocument::new(
            Url::parse("file:///notes/a.md").unwrap(),
            "markdown",
            1,
            text,
        )
    }

    fn edit(range: Option<Range>, text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range,
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn incremental_change_replaces_range() {
        let mut d = doc("hello world\nsecond");
        let range = Range::new(Position::new(0, 6), Position::new(0, 11));
        d.apply_changes(2, vec![edit(Some(range), "there")]);
        assert_eq!(d.text(), "hello there\nsecond");
        assert_eq!(d.version, 2);
    }

    #[test]
    fn full_change_replaces_document() {
        let mut d = doc("old");
        d.apply_changes(5, vec![edit(None, "new text")]);
        assert_eq!(d.text(), "new text");
    }

    #[test]
    fn columns_are_utf16() {
        // '𝄞' is two UTF-16 code units.
        let mut d = doc("𝄞ab");
        let range = Range::new(Position::new(0, 2), Position::new(0, 3));
        d.apply_changes(2, vec![edit(Some(range), "X")]);
        assert_eq!(d.text(), "𝄞Xb");
    }

    #[test]
    fn out_of_range_position_is_clamped() {
        let mut d = doc("abc");
        let range = Range::new(Position::new(4, 0), Position::new(9, 9));
        d.apply_changes(2, vec![edit(Some(range), "!")]);
        assert_eq!(d.text(), "abc!");
    }
}
