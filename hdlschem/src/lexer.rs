// lexer.rs — Tokeniser
//
// Splits a cleaned logical line into tokens on a fixed delimiter set.
// Each punctuation delimiter is itself emitted as a one-character token;
// everything else (including embedded `(`, `)`, and `~`, which are *not*
// delimiters) is glued into a single word token. The gate parser and the
// traversal engine's statement classifier both rely on this: parentheses
// and negation stay embedded in word tokens so the expression grammar can
// recover grouping by scanning those tokens' own text.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token {
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token(";")]
    Semicolon,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("=")]
    Equals,
    #[token(".")]
    Dot,
    #[regex(r"[^,:?;&|+\-*=.\s]+")]
    Word,
}

/// Splits one cleaned logical line into its token texts.
///
/// Every character in this grammar belongs either to a punctuation token
/// or to `Word`, so lexing never fails on well-formed input.
pub fn tokenize_text(line: &str) -> Vec<String> {
    let mut lex = Token::lexer(line);
    let mut out = Vec::new();
    while let Some(result) = lex.next() {
        if result.is_ok() {
            out.push(lex.slice().to_string());
        }
    }
    out
}

/// The one-character punctuation tokens the tokeniser treats as
/// delimiters. `gate::is_operator_group` is the one place that classifies
/// a token/group against this set.
pub const DELIMITERS: &[char] = &[',', ':', '?', ';', '&', '|', '+', '-', '*', '=', '.'];
