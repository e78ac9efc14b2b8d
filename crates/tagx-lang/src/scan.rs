//! Escape-aware scanning of paired delimiters.
//!
//! A delimiter is real unless preceded by an odd run of backslashes. Escaped
//! delimiters lose their backslash in the returned content; every other
//! backslash is kept for the consumer of the content to interpret.

/// Consume `left ... right` from the front of `input` and return the text in
/// between.
///
/// Distinct pairs nest: an inner `left` must be closed by its own `right`
/// before the outer one can terminate. Single-quoted runs inside a distinct
/// pair are copied verbatim so quoted delimiters never count. Returns `None`
/// and leaves `input` untouched when `input` does not start with `left` or no
/// matching `right` exists.
pub fn scan_paired(input: &mut &str, left: char, right: char) -> Option<String> {
    let src = *input;
    let body = src.strip_prefix(left)?;
    let mut out = String::new();
    let mut level = 0usize;
    let mut backslashes = 0usize;
    let mut chars = body.char_indices();

    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            backslashes += 1;
            out.push(c);
            continue;
        }
        let escaped = backslashes % 2 == 1;
        backslashes = 0;

        if escaped && (c == left || c == right) {
            out.pop();
            out.push(c);
            continue;
        }
        if c == right && level == 0 {
            *input = &body[idx + c.len_utf8()..];
            return Some(out);
        }
        if left != right {
            if c == left {
                level += 1;
            } else if c == right {
                level -= 1;
            } else if c == '\'' && !escaped {
                out.push(c);
                if !copy_quoted(&mut chars, &mut out) {
                    return None;
                }
                continue;
            }
        }
        out.push(c);
    }
    None
}

/// Copy a quoted run up to and including its closing quote.
fn copy_quoted(chars: &mut std::str::CharIndices<'_>, out: &mut String) -> bool {
    let mut backslashes = 0usize;
    for (_, c) in chars.by_ref() {
        out.push(c);
        if c == '\\' {
            backslashes += 1;
            continue;
        }
        let escaped = backslashes % 2 == 1;
        backslashes = 0;
        if c == '\'' && !escaped {
            return true;
        }
    }
    false
}

/// Split `content` on commas that sit outside any bracket or quoted run.
///
/// Returns an empty list for blank content; pieces are trimmed.
pub fn split_top_level(content: &str) -> Vec<&str> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut backslashes = 0usize;
    let mut start = 0usize;

    for (idx, c) in content.char_indices() {
        if c == '\\' {
            backslashes += 1;
            continue;
        }
        let escaped = backslashes % 2 == 1;
        backslashes = 0;
        if escaped {
            continue;
        }
        match c {
            '\'' => in_quote = !in_quote,
            '(' | '[' | '{' if !in_quote => depth += 1,
            ')' | ']' | '}' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                parts.push(content[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(content[start..].trim());
    parts
}
