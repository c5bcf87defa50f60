// Single-line text field state.
// - Cursor positions count chars, not bytes, so non-ASCII paths edit correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub(crate) fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub(crate) fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set(&mut self, value: impl Into<String>) {
        *self = Self::with_value(value);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn insert(&mut self, ch: char) {
        let byte_index = byte_index_for_char(&self.value, self.cursor);
        self.value.insert(byte_index, ch);
        self.cursor += 1;
    }

    /// Inserts pasted text, dropping line breaks.
    pub(crate) fn insert_str(&mut self, text: &str) {
        for ch in text.chars().filter(|ch| *ch != '\n' && *ch != '\r') {
            self.insert(ch);
        }
    }

    /// Returns false when there was nothing to delete.
    pub(crate) fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.remove_at_cursor();
        true
    }

    pub(crate) fn delete(&mut self) -> bool {
        if self.cursor >= self.value.chars().count() {
            return false;
        }
        self.remove_at_cursor();
        true
    }

    pub(crate) fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(crate) fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub(crate) fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    fn remove_at_cursor(&mut self) {
        let start = byte_index_for_char(&self.value, self.cursor);
        let end = byte_index_for_char(&self.value, self.cursor + 1);
        self.value.replace_range(start..end, "");
    }
}

pub(crate) fn byte_index_for_char(input: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }

    input
        .char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_in_the_middle_of_multibyte_text() {
        let mut input = TextInput::with_value("héllo");
        input.move_left();
        input.move_left();
        input.insert('X');
        assert_eq!(input.value(), "hélXlo");

        input.move_home();
        input.move_right();
        input.move_right();
        assert!(input.backspace());
        assert_eq!(input.value(), "hlXlo");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn edges_are_no_ops() {
        let mut input = TextInput::default();
        assert!(!input.backspace());
        assert!(!input.delete());
        input.move_left();
        assert_eq!(input.cursor(), 0);

        input.insert_str("a\nb");
        assert_eq!(input.value(), "ab");
        assert!(!input.delete());
    }
}
