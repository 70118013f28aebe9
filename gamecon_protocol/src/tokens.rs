// Whitespace tokenizing for protocol lines and their content field.
//
// A line is split into three fields by a quote-aware tokenizer: whitespace
// separates tokens except inside a double-quoted section, so
// `char.pos v "1 2 3"` yields `char.pos`, `v` and `"1 2 3"` (quotes kept).
// The content field is then unquoted and walked with `ContentCursor`, which
// hands out sub-tokens left to right. String payloads are a single token like
// everything else.

use crate::message::RawMessage;

/// Split a line into `name`, `type` and `content`. Missing fields come back
/// empty and tokens after the third are ignored. Returns `None` for a blank
/// line.
pub fn split_fields(line: &str) -> Option<RawMessage<'_>> {
    let mut tokens = QuotedTokens::new(line);
    let name = tokens.next()?;
    let kind = tokens.next().unwrap_or("");
    let content = tokens.next().unwrap_or("");
    Some(RawMessage::new(name, kind, content))
}

/// Strip one leading and one trailing double quote, if present.
pub fn unquote(content: &str) -> &str {
    let content = content.strip_prefix('"').unwrap_or(content);
    content.strip_suffix('"').unwrap_or(content)
}

/// Iterator over whitespace-separated tokens that keeps double-quoted
/// sections (including their quotes) inside a single token. An unterminated
/// quote runs to the end of the input.
pub struct QuotedTokens<'a> {
    rest: &'a str,
}

impl<'a> QuotedTokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }
}

impl<'a> Iterator for QuotedTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let input = self.rest.trim_start();
        if input.is_empty() {
            self.rest = input;
            return None;
        }

        let mut in_quotes = false;
        let mut end = input.len();
        for (idx, ch) in input.char_indices() {
            if ch == '"' {
                in_quotes = !in_quotes;
            } else if ch.is_whitespace() && !in_quotes {
                end = idx;
                break;
            }
        }

        let (token, rest) = input.split_at(end);
        self.rest = rest;
        Some(token)
    }
}

/// Left-to-right reader over the sub-tokens of an (unquoted) content field.
/// Reading past the end yields empty tokens, which the numeric parsers turn
/// into zero.
#[derive(Clone, Debug)]
pub struct ContentCursor<'a> {
    rest: &'a str,
}

impl<'a> ContentCursor<'a> {
    /// Cursor over `content` with its surrounding quotes removed.
    pub fn new(content: &'a str) -> Self {
        Self {
            rest: unquote(content),
        }
    }

    /// The next whitespace-separated token, or `""` when exhausted.
    pub fn next_token(&mut self) -> &'a str {
        let input = self.rest.trim_start();
        let end = input.find(char::is_whitespace).unwrap_or(input.len());
        let (token, rest) = input.split_at(end);
        self.rest = rest;
        token
    }
}
