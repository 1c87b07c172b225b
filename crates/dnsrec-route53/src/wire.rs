//! Route 53 wire forms of names and values
//!
//! - Names come back with special characters as octal escapes (`*` is
//!   `\052`).
//! - TXT and SPF values are sequences of quoted character-strings of at most
//!   255 bytes each (`"part one" "part two"`).

use dnsrec_core::RecordType;

/// Longest character-string Route 53 accepts inside one TXT value
const MAX_CHARACTER_STRING: usize = 255;

/// Undo Route 53's octal escaping of a record-set name
pub fn decode_name(name: &str) -> String {
    if !name.contains('\\') {
        return name.to_string();
    }

    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 4 <= bytes.len()
            && let Some(byte) = octal_byte(&bytes[i + 1..i + 4])
        {
            out.push(byte);
            i += 4;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Route 53's stored form of a record-set name
///
/// Bytes outside letters, digits, `-`, `_` and `.` become octal escapes, the
/// way Route 53 lists them.
pub fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in decode_name(name).bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out
}

/// Wire form of a record value
pub fn encode_value(record_type: &RecordType, value: &str) -> String {
    if record_type.is_text() {
        quote_text(value)
    } else {
        value.to_string()
    }
}

/// Caller form of a wire value
pub fn decode_value(record_type: &RecordType, value: &str) -> String {
    if record_type.is_text() {
        unquote_text(value)
    } else {
        value.to_string()
    }
}

/// Quote a TXT value, splitting it into 255-byte character-strings
///
/// Values that are already a sequence of quoted character-strings are passed
/// through untouched.
pub fn quote_text(value: &str) -> String {
    if is_quoted_sequence(value) {
        return value.to_string();
    }

    let mut parts = Vec::new();
    let mut rest = value;
    loop {
        let mut split = rest.len().min(MAX_CHARACTER_STRING);
        while !rest.is_char_boundary(split) {
            split -= 1;
        }
        let (chunk, tail) = rest.split_at(split);
        parts.push(format!("\"{}\"", escape(chunk)));
        rest = tail;
        if rest.is_empty() {
            break;
        }
    }
    parts.join(" ")
}

/// Join the quoted character-strings of a TXT value back into one string
///
/// Unquoted input is returned as-is.
pub fn unquote_text(value: &str) -> String {
    let trimmed = value.trim();
    if !trimmed.starts_with('"') {
        return value.to_string();
    }

    let bytes = trimmed.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_quotes = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !in_quotes {
            if b == b'"' {
                in_quotes = true;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => {
                in_quotes = false;
                i += 1;
            }
            b'\\' if i + 1 < bytes.len() => {
                if i + 4 <= bytes.len()
                    && let Some(byte) = octal_byte(&bytes[i + 1..i + 4])
                {
                    out.push(byte);
                    i += 4;
                } else {
                    out.push(bytes[i + 1]);
                    i += 2;
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Whether `value` is one or more quoted strings separated by whitespace
fn is_quoted_sequence(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut i = 0;
    let mut segments = 0;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == bytes.len() {
            return segments > 0;
        }
        if bytes[i] != b'"' {
            return false;
        }
        i += 1;
        loop {
            match bytes.get(i) {
                None => return false,
                Some(b'\\') => i += 2,
                Some(b'"') => break,
                Some(_) => i += 1,
            }
        }
        i += 1;
        segments += 1;
        if i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            return false;
        }
    }
}

fn escape(chunk: &str) -> String {
    let mut out = String::with_capacity(chunk.len());
    for c in chunk.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn octal_byte(digits: &[u8]) -> Option<u8> {
    if digits.len() != 3 || !digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
        return None;
    }
    let value = digits
        .iter()
        .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
    u8::try_from(value).ok()
}
