// Newline-delimited message framing over TCP.
//
// The game writes one message per line. TCP delivers bytes in arbitrary
// chunks, so a message can be split across two reads or several messages can
// arrive in one. `LineBuffer` reassembles complete lines: bytes after the last
// terminator stay pending and are prepended to the next read. Any of `\n`,
// `\r\n` or `\r` ends a line; empty lines are skipped.
//
// Lines are split on bytes before UTF-8 decoding so a multi-byte character
// straddling two reads is never cut in half. Invalid UTF-8 is replaced rather
// than rejected.
//
// `MAX_LINE_LENGTH` bounds the pending fragment. A peer that streams more than
// that without a terminator has its line discarded up to the next terminator.
//
// `write_line` is the sending side used by the game client.

use std::io::{self, Write};

use tracing::warn;

/// Maximum length of a single line (64 KiB). Protocol lines are a few dozen
/// bytes; anything this long is a broken or hostile peer.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Reassembles complete lines out of arbitrarily chunked input.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    discarding: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return every line it completes, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0;

        for (idx, &byte) in bytes.iter().enumerate() {
            if byte != b'\n' && byte != b'\r' {
                continue;
            }
            let segment = &bytes[start..idx];
            start = idx + 1;

            if self.discarding {
                self.discarding = false;
                self.pending.clear();
                continue;
            }
            if self.pending.len() + segment.len() > MAX_LINE_LENGTH {
                self.drop_oversized();
                self.discarding = false;
                continue;
            }

            self.pending.extend_from_slice(segment);
            if !self.pending.is_empty() {
                lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                self.pending.clear();
            }
        }

        let tail = &bytes[start..];
        if !self.discarding {
            if self.pending.len() + tail.len() > MAX_LINE_LENGTH {
                self.drop_oversized();
            } else {
                self.pending.extend_from_slice(tail);
            }
        }

        lines
    }

    /// Take the unterminated fragment left over from previous pushes, if any.
    pub fn take_remainder(&mut self) -> Option<String> {
        let discarding = std::mem::take(&mut self.discarding);
        if discarding || self.pending.is_empty() {
            self.pending.clear();
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }

    /// Number of bytes waiting for a terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn drop_oversized(&mut self) {
        warn!(
            max = MAX_LINE_LENGTH,
            "discarding line that exceeds the maximum length"
        );
        self.pending.clear();
        self.discarding = true;
    }
}

/// Write one line followed by `\n`, then flush.
///
/// Returns `InvalidInput` if the line contains a terminator of its own or
/// exceeds `MAX_LINE_LENGTH`.
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    if line.contains(['\n', '\r']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "line contains an embedded line break",
        ));
    }
    let len = line.len();
    if len > MAX_LINE_LENGTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("line too long: {len} bytes (max {MAX_LINE_LENGTH})"),
        ));
    }
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_several_lines_in_one_chunk() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"a b 1\nc d 2\n");
        assert_eq!(lines, vec!["a b 1", "c d 2"]);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn reassembles_line_split_across_reads() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"char.pos v \"0.002 45.5").is_empty());
        let lines = buffer.push(b"235 -55.352\"\nchar.grounded b 1\n");
        assert_eq!(
            lines,
            vec!["char.pos v \"0.002 45.5235 -55.352\"", "char.grounded b 1"]
        );
    }

    #[test]
    fn handles_crlf_and_bare_cr() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"one\r\ntwo\rthree\n");
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn crlf_split_between_reads() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"one\r"), vec!["one"]);
        assert_eq!(buffer.push(b"\ntwo\n"), vec!["two"]);
    }

    #[test]
    fn skips_empty_lines() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"\n\n x \n\n"), vec![" x "]);
    }

    #[test]
    fn multibyte_character_across_reads() {
        let mut buffer = LineBuffer::new();
        let text = "sign.text s café\n".as_bytes();
        let split = text.len() - 2; // inside the two-byte 'é'
        assert!(buffer.push(&text[..split]).is_empty());
        assert_eq!(buffer.push(&text[split..]), vec!["sign.text s café"]);
    }

    #[test]
    fn remainder_is_taken_once() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"done\npartial");
        assert_eq!(buffer.take_remainder().as_deref(), Some("partial"));
        assert_eq!(buffer.take_remainder(), None);
    }

    #[test]
    fn oversized_line_is_discarded_until_terminator() {
        let mut buffer = LineBuffer::new();
        let big = vec![b'x'; MAX_LINE_LENGTH + 1];
        assert!(buffer.push(&big).is_empty());
        assert_eq!(buffer.pending_len(), 0);
        // The rest of the oversized line is dropped, the next one survives.
        assert_eq!(buffer.push(b"more junk\nok i 1\n"), vec!["ok i 1"]);
    }

    #[test]
    fn oversized_remainder_is_not_returned() {
        let mut buffer = LineBuffer::new();
        buffer.push(&vec![b'x'; MAX_LINE_LENGTH + 1]);
        assert_eq!(buffer.take_remainder(), None);
    }

    #[test]
    fn write_line_appends_newline() {
        let mut out = Vec::new();
        write_line(&mut out, "char.grounded b 1").unwrap();
        assert_eq!(out, b"char.grounded b 1\n");
    }

    #[test]
    fn write_line_rejects_embedded_break() {
        let mut out = Vec::new();
        let err = write_line(&mut out, "a b 1\nc d 2").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }

    #[test]
    fn write_line_rejects_oversized() {
        let mut out = Vec::new();
        let big = "x".repeat(MAX_LINE_LENGTH + 1);
        let err = write_line(&mut out, &big).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
