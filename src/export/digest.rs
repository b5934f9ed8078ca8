use sha2::{Digest, Sha256};

/// Keys whose values change on every print of the same page
const VOLATILE_KEYS: &[&[u8]] = &[b"/CreationDate", b"/ModDate", b"/ID"];

const STREAM: &[u8] = b"stream";
const END_STREAM: &[u8] = b"endstream";

/// Computes the content hash of a rendered PDF
///
/// The values of `/CreationDate`, `/ModDate` and the trailer `/ID` are
/// skipped so that printing an unchanged page twice yields the same digest.
/// Everything else, including the keys themselves, is hashed verbatim. Only
/// object syntax is scanned for these keys; `stream ... endstream` bodies
/// hold page content and are always hashed as they are.
///
/// # Returns
///
/// Lowercase hex SHA-256 (64 characters)
pub fn content_digest(pdf: &[u8]) -> String {
    let mut hasher = Sha256::new();
    let mut emitted = 0;
    let mut pos = 0;

    while pos < pdf.len() {
        if pdf[pos] == b's' {
            if let Some(body_end) = stream_body_end(pdf, pos) {
                pos = body_end;
                continue;
            }
        }
        if pdf[pos] == b'/' {
            if let Some(key) = volatile_key_at(pdf, pos) {
                let key_end = pos + key.len();
                if let Some(value_end) = value_end(pdf, skip_whitespace(pdf, key_end)) {
                    hasher.update(&pdf[emitted..key_end]);
                    emitted = value_end;
                    pos = value_end;
                    continue;
                }
            }
        }
        pos += 1;
    }

    hasher.update(&pdf[emitted..]);
    hex::encode(hasher.finalize())
}

/// If a `stream` keyword opens a body at `pos`, returns where `endstream` starts
fn stream_body_end(pdf: &[u8], pos: usize) -> Option<usize> {
    if !pdf[pos..].starts_with(STREAM) {
        return None;
    }
    // Keyword must start a token, which also rules out the tail of `endstream`
    if pos > 0 && !matches!(pdf[pos - 1], b' ' | b'\t' | b'\r' | b'\n' | b'>') {
        return None;
    }

    let after = pos + STREAM.len();
    let body = match &pdf[after..] {
        [b'\r', b'\n', ..] => after + 2,
        [b'\n', ..] => after + 1,
        _ => return None,
    };

    let end = pdf[body..]
        .windows(END_STREAM.len())
        .position(|window| window == END_STREAM)
        .map_or(pdf.len(), |offset| body + offset);
    Some(end)
}

fn volatile_key_at(pdf: &[u8], pos: usize) -> Option<&'static [u8]> {
    VOLATILE_KEYS.iter().copied().find(|key| {
        pdf[pos..].starts_with(key)
            && pdf
                .get(pos + key.len())
                .map_or(true, |next| !is_name_char(*next))
    })
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-' || b == b'#'
}

fn skip_whitespace(pdf: &[u8], mut pos: usize) -> usize {
    while pos < pdf.len() && matches!(pdf[pos], b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | 0) {
        pos += 1;
    }
    pos
}

/// Returns the index just past a string, hex string or array value
fn value_end(pdf: &[u8], start: usize) -> Option<usize> {
    match pdf.get(start)? {
        b'(' => literal_string_end(pdf, start),
        b'<' if pdf.get(start + 1) != Some(&b'<') => {
            let close = pdf[start..].iter().position(|b| *b == b'>')?;
            Some(start + close + 1)
        }
        b'[' => {
            let mut depth = 0usize;
            for (i, b) in pdf[start..].iter().enumerate() {
                match b {
                    b'[' => depth += 1,
                    b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(start + i + 1);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

/// Finds the end of a `( ... )` string, honouring escapes and nesting
fn literal_string_end(pdf: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < pdf.len() {
        match pdf[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
