/// Scan position over a source string.
///
/// Each parse owns its cursor, so nothing about the position is shared
/// between calls. `base` is the absolute offset of `src` inside the original
/// template and is added to every reported offset.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_base(src, 0)
    }

    pub fn with_base(src: &'a str, base: usize) -> Self {
        Self { src, pos: 0, base }
    }

    /// Relative byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Absolute offset in the original template.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Absolute offset of a relative position.
    pub fn offset_of(&self, pos: usize) -> usize {
        self.base + pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.src[start..end]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    /// Advances past the next character and returns it.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advances by `n` bytes, clamped to the end of input.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.src.len());
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Moves to the next occurrence of `pat` and returns its relative
    /// position, or `None` (leaving the cursor untouched) if absent.
    pub fn seek(&mut self, pat: &str) -> Option<usize> {
        let found = self.pos + self.rest().find(pat)?;
        self.pos = found;
        Some(found)
    }
}
