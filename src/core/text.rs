//! Byte buffers split into lines for diffing.

use std::sync::Arc;

/// A text buffer optimized for line-based access.
///
/// - Stores bytes as `Arc<[u8]>` for cheap cloning.
/// - Precomputes line start offsets for O(1) line slicing.
/// - Splits on `\n` only; a trailing newline does not produce an extra empty line,
///   so `"a\nb"` and `"a\nb\n"` have the same lines.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    bytes: Arc<[u8]>,
    /// Byte offsets where each line starts. Always starts with 0.
    /// Length = line_count + 1 (last entry is bytes.len()).
    line_starts: Vec<usize>,
    is_binary: bool,
}

impl TextBuffer {
    /// Create a new TextBuffer from raw bytes.
    pub fn new(input: &[u8]) -> Self {
        Self {
            is_binary: detect_binary(input),
            line_starts: compute_line_starts(input),
            bytes: Arc::from(input),
        }
    }

    /// Whether content appears to be binary (NUL byte near the start).
    pub fn is_binary(&self) -> bool {
        self.is_binary
    }

    /// Number of lines in the buffer. An empty buffer has 0 lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }

    /// Get the bytes for a specific line (0-indexed), without the newline.
    pub fn line(&self, line_num: usize) -> Option<&[u8]> {
        if line_num >= self.line_count() {
            return None;
        }
        let start = self.line_starts[line_num];
        let end = self.line_starts[line_num + 1];
        let end = if end > start && self.bytes.get(end - 1) == Some(&b'\n') {
            end - 1
        } else {
            end
        };
        Some(&self.bytes[start..end])
    }

    /// All lines as owned strings. Invalid UTF-8 is replaced with U+FFFD.
    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count())
            .filter_map(|i| self.line(i).map(|b| String::from_utf8_lossy(b).into_owned()))
            .collect()
    }
}

/// Split raw bytes into lines the way the assembler feeds them to the differ.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    TextBuffer::new(bytes).lines()
}

fn compute_line_starts(bytes: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    // Unterminated last line still needs its end marker.
    if !bytes.is_empty() && bytes.last() != Some(&b'\n') {
        starts.push(bytes.len());
    }
    starts
}

/// Git's heuristic: NUL byte in the first 8000 bytes.
fn detect_binary(bytes: &[u8]) -> bool {
    let check_len = bytes.len().min(8000);
    bytes[..check_len].contains(&0)
}
