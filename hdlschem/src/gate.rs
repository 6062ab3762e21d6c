// gate.rs — Expression/Gate parser
//
// Turns the token stream of a continuous assignment's right-hand side
// into a typed `Gate` tree: `&`/`|`-style multi-input gates, `~` negation,
// and the `cond ? data : N'bzzz` tri-state idiom. The only parser-level
// failure is mixing two distinct operators at one parenthesisation level
// without disambiguating parentheses; all other malformed input produces
// an undefined (but non-panicking) tree, per the error-handling design.
//
// The tokeniser never treats `(`, `)`, or `~` as delimiters, so they stay
// embedded in word tokens. This module rejoins the token slice into one
// string before peeling/grouping — no information is lost doing so, since
// whitespace between tokens was already discarded by the tokeniser, and
// it lets grouping recover parenthesisation by a plain character scan
// instead of reconstructing it from a token list.

use crate::diag::HdlError;
use crate::lexer::{tokenize_text, DELIMITERS};

/// A parsed Boolean expression tree rooted at a driving net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// A plain signal name (a tree leaf).
    Signal(String),
    /// Logical negation of a single operand.
    Not(Box<Gate>),
    /// A single binary operator applied across an ordered operand list.
    Multi { op: char, operands: Vec<Gate> },
    /// A tri-state buffer: `enable ? input : N'bzzz`.
    Tsb { input: Box<Gate>, enable: Box<Gate> },
}

/// Parses the RHS token stream of a continuous assignment into a `Gate`
/// tree.
pub fn build_gate(tokens: &[String]) -> Result<Gate, HdlError> {
    let raw = tokens.concat();
    parse(&raw, tokens)
}

/// Collects every signal-name leaf of `gate`, in source order. For a
/// `Tsb`, the enable (cond) side precedes the input (data) side, matching
/// their order of appearance in `cond ? data : hiz`.
pub fn collect_leaves(gate: &Gate) -> Vec<String> {
    match gate {
        Gate::Signal(name) => vec![name.clone()],
        Gate::Not(inner) => collect_leaves(inner),
        Gate::Multi { operands, .. } => operands.iter().flat_map(collect_leaves).collect(),
        Gate::Tsb { input, enable } => {
            let mut leaves = collect_leaves(enable);
            leaves.extend(collect_leaves(input));
            leaves
        }
    }
}

fn parse(s: &str, original_tokens: &[String]) -> Result<Gate, HdlError> {
    let (body, negate) = peel(s);

    let groups = group(&body);

    if is_tsb_shape(&groups) {
        let enable = parse(&groups[0], original_tokens)?;
        let input = parse(&groups[2], original_tokens)?;
        let gate = Gate::Tsb {
            input: Box::new(input),
            enable: Box::new(enable),
        };
        return Ok(wrap_negate(gate, negate));
    }

    let operator_chars: Vec<char> = groups
        .iter()
        .filter(|g| is_operator_group(g))
        .map(|g| g.chars().next().unwrap())
        .collect();
    let mut distinct: Vec<char> = Vec::new();
    for c in &operator_chars {
        if !distinct.contains(c) {
            distinct.push(*c);
        }
    }

    if distinct.is_empty() {
        // No operator at this level: the whole body is a single operand.
        let operand = groups.into_iter().next().unwrap_or_default();
        return Ok(wrap_negate(build_operand(&operand, original_tokens)?, negate));
    }

    if distinct.len() > 1 {
        return Err(HdlError::Parse {
            raw: original_tokens.concat(),
            tokens: original_tokens.to_vec(),
            groups,
        });
    }

    let op = distinct[0];
    let mut operands = Vec::new();
    for g in groups.iter().filter(|g| !is_operator_group(g)) {
        operands.push(build_operand(g, original_tokens)?);
    }
    Ok(wrap_negate(Gate::Multi { op, operands }, negate))
}

fn wrap_negate(gate: Gate, negate: bool) -> Gate {
    if negate {
        Gate::Not(Box::new(gate))
    } else {
        gate
    }
}

/// Builds the gate for a single group: recurse if it still contains a
/// balanced `(...)`, otherwise treat it as a plain (possibly `~`-negated)
/// signal name.
fn build_operand(group: &str, original_tokens: &[String]) -> Result<Gate, HdlError> {
    if group.contains('(') && group.contains(')') {
        return parse(group, original_tokens);
    }
    if let Some(rest) = group.strip_prefix('~') {
        return Ok(Gate::Not(Box::new(Gate::Signal(rest.to_string()))));
    }
    Ok(Gate::Signal(group.to_string()))
}

/// Peels matched outer parentheses / a leading `~(...)`, toggling a
/// negation flag each time a `~(` is stripped. Repeats until no further
/// peel applies.
fn peel(s: &str) -> (String, bool) {
    let mut cur = s.to_string();
    let mut negate = false;
    loop {
        if let Some(inner) = cur.strip_prefix("~(") {
            if matches_to_end(&cur, 1) {
                negate = !negate;
                cur = inner[..inner.len() - 1].to_string();
                continue;
            }
        }
        if cur.starts_with('(') && matches_to_end(&cur, 0) {
            cur = cur[1..cur.len() - 1].to_string();
            continue;
        }
        break;
    }
    (cur, negate)
}

/// True if the `(` at character index `open_idx` in `s` is matched by a
/// `)` that is the very last character of `s`.
fn matches_to_end(s: &str, open_idx: usize) -> bool {
    let chars: Vec<char> = s.chars().collect();
    if open_idx >= chars.len() || chars[open_idx] != '(' {
        return false;
    }
    let mut depth = 0i32;
    for (i, &c) in chars.iter().enumerate().skip(open_idx) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i == chars.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Splits `s` into operand/operator groups at top-level occurrences of a
/// tokeniser delimiter character (parenthesis depth tracked so an
/// operator inside a nested group stays part of its enclosing operand),
/// then collapses adjacent duplicate single-character operator groups
/// (`&&`, `||` reduce to one `&`/`|` group).
fn group(s: &str) -> Vec<String> {
    let mut raw = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            c if depth == 0 && DELIMITERS.contains(&c) => {
                if !current.is_empty() {
                    raw.push(current.clone());
                    current.clear();
                }
                raw.push(c.to_string());
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        raw.push(current);
    }

    let mut groups: Vec<String> = Vec::new();
    for g in raw {
        if is_operator_group(&g) {
            if let Some(last) = groups.last() {
                if is_operator_group(last) && last == &g {
                    continue;
                }
            }
        }
        groups.push(g);
    }
    groups
}

fn is_operator_group(g: &str) -> bool {
    let mut chars = g.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => DELIMITERS.contains(&c),
        _ => false,
    }
}

/// The TSB special case: at least five groups, shaped
/// `cond ? data : N'bzzz ...`, where the fifth group is a sized
/// high-impedance literal (begins with a digit, contains `'` and `z`).
fn is_tsb_shape(groups: &[String]) -> bool {
    groups.len() >= 5
        && groups[1] == "?"
        && groups[3] == ":"
        && is_hiz_literal(&groups[4])
}

fn is_hiz_literal(g: &str) -> bool {
    g.chars().next().is_some_and(|c| c.is_ascii_digit()) && g.contains('\'') && g.contains('z')
}

/// Convenience entry point: tokenise then parse a raw RHS string.
pub fn build_gate_from_text(rhs: &str) -> Result<Gate, HdlError> {
    build_gate(&tokenize_text(rhs))
}
