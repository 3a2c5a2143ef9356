//! Range-preserving parsers for Liberty bootstrap and environment files.
//!
//! `bootstrap.properties` follows Java properties syntax (escapes, `\`
//! continuations, `=`/`:`/whitespace separators). `server.env` is a plain
//! `KEY=value` format: no escapes, no continuations, values taken verbatim.
//! Both parsers keep byte ranges for key and value spans so hover and
//! completion can anchor to the original text.

use liberty_core::{TextRange, TextSize};

/// Which file format to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesDialect {
    /// `bootstrap.properties`: Java properties rules.
    Bootstrap,
    /// `server.env`: verbatim `KEY=value` lines.
    ServerEnv,
}

/// Part of an entry an offset falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertySpan {
    Key,
    Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: String,
    pub value: String,
    pub key_range: TextRange,
    pub value_range: TextRange,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertiesFile {
    pub entries: Vec<PropertyEntry>,
}

impl PropertiesFile {
    pub fn parse(text: &str, dialect: PropertiesDialect) -> Self {
        let entries = match dialect {
            PropertiesDialect::Bootstrap => parse_bootstrap(text),
            PropertiesDialect::ServerEnv => parse_server_env(text),
        };
        Self { entries }
    }

    /// First entry with the given key, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertyEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// The entry whose key or value span contains `offset`.
    #[must_use]
    pub fn entry_at(&self, offset: TextSize) -> Option<(&PropertyEntry, PropertySpan)> {
        for entry in &self.entries {
            if entry.key_range.contains_inclusive(offset) {
                return Some((entry, PropertySpan::Key));
            }
            if entry.value_range.contains_inclusive(offset) {
                return Some((entry, PropertySpan::Value));
            }
        }
        None
    }
}

fn text_range(start: usize, end: usize) -> TextRange {
    TextRange::new(
        TextSize::from(u32::try_from(start).unwrap_or(u32::MAX)),
        TextSize::from(u32::try_from(end).unwrap_or(u32::MAX)),
    )
}

fn parse_server_env(text: &str) -> Vec<PropertyEntry> {
    let mut entries = Vec::new();
    let mut offset = 0usize;

    for raw in text.split_inclusive('\n') {
        let line_start = offset;
        offset += raw.len();

        let line = raw.trim_end_matches(['\n', '\r']);
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(eq) = line.find('=') else {
            continue;
        };

        let key_start = line_start + (line.len() - trimmed.len());
        let key_text = line[..eq].trim_end();
        if key_text.trim().is_empty() {
            continue;
        }
        let key_end = line_start + key_text.len();

        // Values are verbatim: leading/trailing whitespace is significant in
        // server.env, so the span starts right after `=`.
        let value_start = line_start + eq + 1;
        let value_end = line_start + line.len();

        entries.push(PropertyEntry {
            key: key_text.trim().to_string(),
            value: line[eq + 1..].to_string(),
            key_range: text_range(key_start, key_end),
            value_range: text_range(value_start, value_end),
        });
    }

    entries
}

fn parse_bootstrap(text: &str) -> Vec<PropertyEntry> {
    let bytes = text.as_bytes();
    let mut entries = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        let start = offset;
        let Some(entry) = parse_bootstrap_line(text, &mut offset) else {
            if offset == start {
                offset += 1;
            }
            continue;
        };
        entries.push(entry);
        if offset == start {
            offset += 1;
        }
    }

    entries
}

/// Parse one logical line starting at `*offset`, leaving `*offset` just past
/// it. Returns `None` for blank lines and comments.
fn parse_bootstrap_line(text: &str, offset: &mut usize) -> Option<PropertyEntry> {
    let bytes = text.as_bytes();

    // Leading whitespace.
    while *offset < bytes.len() && matches!(bytes[*offset], b' ' | b'\t' | b'\x0C') {
        *offset += 1;
    }

    if *offset >= bytes.len() {
        return None;
    }

    if matches!(bytes[*offset], b'\r' | b'\n') {
        skip_line_ending(bytes, offset);
        return None;
    }

    if matches!(bytes[*offset], b'#' | b'!') {
        skip_to_next_line(bytes, offset);
        return None;
    }

    // Key: ends at an unescaped separator or whitespace.
    let key_start = *offset;
    while *offset < bytes.len() {
        match bytes[*offset] {
            b'\\' => *offset = (*offset + 2).min(bytes.len()),
            b'=' | b':' => break,
            b' ' | b'\t' | b'\x0C' | b'\r' | b'\n' => break,
            _ => *offset += 1,
        }
    }
    let key_end = *offset;

    // Whitespace and one optional separator before the value.
    while *offset < bytes.len() && matches!(bytes[*offset], b' ' | b'\t' | b'\x0C') {
        *offset += 1;
    }
    if *offset < bytes.len() && matches!(bytes[*offset], b'=' | b':') {
        *offset += 1;
        while *offset < bytes.len() && matches!(bytes[*offset], b' ' | b'\t' | b'\x0C') {
            *offset += 1;
        }
    }

    // Value: runs to the end of the logical line, folding `\` continuations.
    let value_start = *offset;
    let mut value = String::new();
    loop {
        let segment_start = *offset;
        while *offset < bytes.len() && !matches!(bytes[*offset], b'\r' | b'\n') {
            *offset += 1;
        }
        let segment = &text[segment_start..*offset];

        if ends_with_unescaped_backslash(segment.as_bytes()) {
            value.push_str(&unescape(&segment[..segment.len() - 1]));
            skip_line_ending(bytes, offset);
            // Continuation lines drop their leading whitespace.
            while *offset < bytes.len() && matches!(bytes[*offset], b' ' | b'\t' | b'\x0C') {
                *offset += 1;
            }
            if *offset >= bytes.len() {
                break;
            }
        } else {
            value.push_str(&unescape(segment));
            break;
        }
    }
    let value_end = *offset;
    skip_line_ending(bytes, offset);

    if key_start == key_end {
        return None;
    }

    Some(PropertyEntry {
        key: unescape(&text[key_start..key_end]),
        value,
        key_range: text_range(key_start, key_end),
        value_range: text_range(value_start, value_end),
    })
}

fn skip_line_ending(bytes: &[u8], offset: &mut usize) {
    if *offset < bytes.len() && bytes[*offset] == b'\r' {
        *offset += 1;
    }
    if *offset < bytes.len() && bytes[*offset] == b'\n' {
        *offset += 1;
    }
}

fn skip_to_next_line(bytes: &[u8], offset: &mut usize) {
    while *offset < bytes.len() && !matches!(bytes[*offset], b'\r' | b'\n') {
        *offset += 1;
    }
    skip_line_ending(bytes, offset);
}

fn ends_with_unescaped_backslash(line: &[u8]) -> bool {
    let mut backslashes = 0usize;
    for &b in line.iter().rev() {
        if b != b'\\' {
            break;
        }
        backslashes += 1;
    }
    backslashes % 2 == 1
}

fn unescape(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = String::with_capacity(segment.len());
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            let ch_len = utf8_len(b);
            out.push_str(&segment[i..(i + ch_len).min(segment.len())]);
            i += ch_len;
            continue;
        }

        i += 1;
        if i >= bytes.len() {
            out.push('\\');
            break;
        }

        match bytes[i] {
            b't' => out.push('\t'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b'f' => out.push('\x0C'),
            b'\\' => out.push('\\'),
            b'u' if i + 4 < bytes.len() => {
                let decoded = segment
                    .get(i + 1..i + 5)
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        i += 4;
                    }
                    None => out.push('u'),
                }
            }
            other => {
                let ch_len = utf8_len(other);
                out.push_str(&segment[i..(i + ch_len).min(segment.len())]);
                i += ch_len - 1;
            }
        }
        i += 1;
    }

    out
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}
