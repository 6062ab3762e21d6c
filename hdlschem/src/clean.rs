// clean.rs — Lexical cleaner
//
// Strips comments and compiler directives out of a raw source listing and
// re-splits lines so that exactly one top-level statement occupies one
// logical line. This is the only phase that sees unprocessed source text;
// every later phase works on the cleaned corpus.

/// Strips comments/directives from `lines` and re-splits on `;` so that
/// each returned line is one logical statement (or an unterminated
/// fragment awaiting continuation).
pub fn clean(lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_block_comment = false;
    for raw in lines {
        let stripped = strip_comments(raw, &mut in_block_comment);
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.extend(split_statements(trimmed));
    }
    out
}

/// Removes `//` line comments, `` ` ``-prefixed compiler directives, and
/// `/* ... */` block comments (which may span into or out of previous/next
/// lines; `in_block_comment` persists that state across calls).
fn strip_comments(line: &str, in_block_comment: &mut bool) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if *in_block_comment {
            if chars[i] == '*' && i + 1 < chars.len() && chars[i + 1] == '/' {
                *in_block_comment = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        if chars[i] == '/' && i + 1 < chars.len() && chars[i + 1] == '/' {
            break;
        }
        if chars[i] == '`' {
            break;
        }
        if chars[i] == '/' && i + 1 < chars.len() && chars[i + 1] == '*' {
            *in_block_comment = true;
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Splits a non-empty, comment-stripped line on `;`, producing one
/// terminated logical line per `;` found, plus a trailing unterminated
/// fragment (if any) left for a later continuation line to join.
fn split_statements(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let parts: Vec<&str> = line.split(';').collect();
    let last = parts.len() - 1;
    for (idx, part) in parts.iter().enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if idx < last {
            out.push(format!("{part};"));
        } else {
            out.push(part.to_string());
        }
    }
    out
}
