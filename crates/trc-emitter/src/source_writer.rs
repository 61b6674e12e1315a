//! Indentation-aware output buffer shared by the Ruby and RBS printers.

use memchr::memrchr;

const INDENT: &str = "  ";

#[derive(Debug)]
pub struct SourceWriter {
    output: String,
    indent_level: u32,
    /// Nothing has been written on the current line yet.
    at_line_start: bool,
}

impl Default for SourceWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SourceWriter {
            output: String::with_capacity(capacity),
            indent_level: 0,
            at_line_start: true,
        }
    }

    /// Write text, indenting first when it starts a line. Embedded newlines
    /// are copied verbatim: multi-line literals must not be re-indented.
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent_level {
                self.output.push_str(INDENT);
            }
        }
        self.output.push_str(text);
        self.at_line_start = memrchr(b'\n', text.as_bytes()) == Some(text.len() - 1);
    }

    pub fn write_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.write(ch.encode_utf8(&mut buf));
    }

    pub fn write_space(&mut self) {
        self.write(" ");
    }

    pub fn write_line(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// End the current line unless nothing has been written on it.
    pub fn ensure_line(&mut self) {
        if !self.at_line_start {
            self.write_line();
        }
    }

    /// Separate what follows by one empty line; never stacks.
    pub fn blank_line(&mut self) {
        self.ensure_line();
        if !self.output.is_empty() && !self.output.ends_with("\n\n") {
            self.output.push('\n');
        }
    }

    pub fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn decrease_indent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    pub fn indent_level(&self) -> u32 {
        self.indent_level
    }

    pub fn is_at_line_start(&self) -> bool {
        self.at_line_start
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    /// The output so far; the writer is left empty at the same indentation.
    pub fn take_output(&mut self) -> String {
        self.at_line_start = true;
        std::mem::take(&mut self.output)
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

#[cfg(test)]
#[path = "../tests/source_writer_tests.rs"]
mod source_writer_tests;
