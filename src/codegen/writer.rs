//! Indent-aware line builder for the pretty DSL layout.
//!
//! Nested constructs are indented by 2 spaces per level.

pub struct CodeWriter {
    buf: String,
    indent_level: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(1024),
            indent_level: 0,
        }
    }

    /// Write a complete line at the current indent.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent_level {
            self.buf.push_str("  ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Write `head`, run `body` one level deeper, then write `tail`.
    pub fn nested(&mut self, head: &str, tail: &str, body: impl FnOnce(&mut Self)) {
        self.line(head);
        self.indent();
        body(self);
        self.dedent();
        self.line(tail);
    }

    /// Consume the writer and return the text without the final newline.
    pub fn finish(mut self) -> String {
        while self.buf.ends_with('\n') {
            self.buf.pop();
        }
        self.buf
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}
