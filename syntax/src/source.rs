use std::fmt;

/// A half-open byte range `[start, end)` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn contains_inclusive(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn cover(a: TextRange, b: TextRange) -> TextRange {
        TextRange::new(a.start.min(b.start), a.end.max(b.end))
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A zero-based line/column position. The column is counted in UTF-16 code
/// units, matching what editors send over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// Index of line-break offsets for converting between byte offsets and
/// line/column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    text_len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            text_len: text.len(),
        }
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    pub fn line_of(&self, offset: usize) -> u32 {
        self.line_starts.partition_point(|&start| start <= offset) as u32 - 1
    }

    pub fn line_start(&self, line: u32) -> Option<usize> {
        self.line_starts.get(line as usize).copied()
    }

    /// The byte range of a line's content, excluding the line break.
    pub fn line_range(&self, line: u32, text: &str) -> Option<TextRange> {
        let start = self.line_start(line)?;
        let end = match self.line_start(line + 1) {
            Some(next) => {
                let mut end = next - 1; // strip '\n'
                if end > start && text.as_bytes()[end - 1] == b'\r' {
                    end -= 1;
                }
                end
            }
            None => self.text_len,
        };
        Some(TextRange::new(start, end))
    }

    /// Converts a byte offset to a line/UTF-16-column position.
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(self.text_len);
        let line = self.line_of(offset);
        let line_start = self.line_starts[line as usize];
        let character = utf16_len(&text[line_start..offset]);
        Position::new(line, character)
    }

    /// Converts a line/UTF-16-column position to a byte offset. Returns
    /// `None` when the position is outside the document bounds.
    pub fn offset(&self, text: &str, pos: Position) -> Option<usize> {
        if pos.line >= self.line_count() {
            return None;
        }
        let range = self.line_range(pos.line, text)?;
        let line_text = &text[range.start..range.end];
        if pos.character > utf16_len(line_text) {
            return None;
        }
        let mut seen = 0u32;
        for (i, ch) in line_text.char_indices() {
            if seen >= pos.character {
                return Some(range.start + i);
            }
            seen += ch.len_utf16() as u32;
        }
        Some(range.end)
    }

    /// UTF-16 length of a line's content.
    pub fn line_len_utf16(&self, line: u32, text: &str) -> Option<u32> {
        let range = self.line_range(line, text)?;
        Some(utf16_len(&text[range.start..range.end]))
    }
}

pub fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_round_trips() {
        let text = "local a\nlocal b\r\nreturn a + b\n";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position(text, 0), Position::new(0, 0));
        assert_eq!(index.position(text, 8), Position::new(1, 0));
        let offset = index.offset(text, Position::new(2, 7)).unwrap();
        assert_eq!(&text[offset..offset + 1], "a");
        assert_eq!(index.position(text, offset), Position::new(2, 7));
    }

    #[test]
    fn offset_rejects_out_of_bounds_positions() {
        let text = "print(1)\n";
        let index = LineIndex::new(text);
        assert!(index.offset(text, Position::new(5, 0)).is_none());
        assert!(index.offset(text, Position::new(0, 42)).is_none());
        // End of line is a valid cursor position.
        assert_eq!(index.offset(text, Position::new(0, 8)), Some(8));
    }

    #[test]
    fn line_range_strips_crlf() {
        let text = "a\r\nbb\n";
        let index = LineIndex::new(text);
        assert_eq!(index.line_range(0, text), Some(TextRange::new(0, 1)));
        assert_eq!(index.line_range(1, text), Some(TextRange::new(3, 5)));
    }
}
