// diag.rs — Unified diagnostics model
//
// Provides the shared diagnostic types used across all compiler phases:
// the manifest loader, the module slicer, and the gate parser.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;
use std::path::PathBuf;

// ── Span ──────────────────────────────────────────────────────────────────

/// A location within one cleaned logical line of the corpus.
///
/// Byte offsets are relative to the *cleaned* line, not the original
/// source — source formatting is not preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Span { line, start, end }
    }

    pub fn zero() -> Self {
        Span {
            line: 0,
            start: 0,
            end: 0,
        }
    }
}

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0001`).
///
/// Codes are `&'static str` constants defined in the `codes` module. Once
/// assigned, a code must never be reassigned to a different semantic
/// meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    pub const MANIFEST_NOT_FOUND: DiagCode = DiagCode("E0001");
    pub const SOURCE_NOT_FOUND: DiagCode = DiagCode("E0002");
    pub const MODULE_NOT_FOUND: DiagCode = DiagCode("E0100");
    pub const HEADER_MULTILINE: DiagCode = DiagCode("E0101");
    pub const MIXED_OPERATORS: DiagCode = DiagCode("E0200");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A rendered diagnostic, built from an `HdlError` plus the source line it
/// points at.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub level: DiagLevel,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagLevel, code: DiagCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            level,
            span,
            message: message.into(),
            hint: None,
            source_line: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source_line(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        let level = match self.level {
            DiagLevel::Error => "error",
        };
        serde_json::json!({
            "level": level,
            "code": self.code.0,
            "message": self.message,
            "line": self.span.line,
            "start": self.span.start,
            "end": self.span.end,
            "hint": self.hint,
        })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
        };
        writeln!(f, "{level}[{}]: {}", self.code, self.message)?;
        write!(f, "  at line {}:{}", self.span.line, self.span.start)?;
        if let Some(line) = &self.source_line {
            writeln!(f)?;
            writeln!(f, "  {line}")?;
            let caret_pad = " ".repeat(2 + self.span.start);
            let caret_len = (self.span.end.saturating_sub(self.span.start)).max(1);
            write!(f, "{caret_pad}{}", "^".repeat(caret_len))?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}

// ── Fatal error kinds (spec §7) ────────────────────────────────────────────

/// The three fatal error kinds from the error-handling design. Silent
/// under-approximation of unrecognised constructs is not an error variant
/// at all — the traversal engine's statement classifier simply skips such
/// lines and produces no node/edge.
#[derive(Debug, Clone)]
pub enum HdlError {
    /// Manifest file or a listed source file could not be found/read.
    Configuration {
        code: DiagCode,
        message: String,
        path: Option<PathBuf>,
    },
    /// Top module not found, or its header spans more than one logical line.
    Structural {
        code: DiagCode,
        message: String,
        hint: String,
    },
    /// A gate expression mixes two distinct binary operators at one
    /// parenthesisation level without disambiguating parentheses.
    Parse {
        raw: String,
        tokens: Vec<String>,
        groups: Vec<String>,
    },
}

impl HdlError {
    pub fn manifest_not_found(path: PathBuf) -> Self {
        HdlError::Configuration {
            code: codes::MANIFEST_NOT_FOUND,
            message: "manifest file not found".into(),
            path: Some(path),
        }
    }

    pub fn source_not_found(path: PathBuf) -> Self {
        HdlError::Configuration {
            code: codes::SOURCE_NOT_FOUND,
            message: "listed source file not found".into(),
            path: Some(path),
        }
    }

    pub fn module_not_found(name: &str) -> Self {
        HdlError::Structural {
            code: codes::MODULE_NOT_FOUND,
            message: format!("module '{name}' not found in corpus"),
            hint: "check the module name and the files listed in the manifest".into(),
        }
    }

    pub fn header_multiline(name: &str) -> Self {
        HdlError::Structural {
            code: codes::HEADER_MULTILINE,
            message: format!("header of module '{name}' spans more than one logical line"),
            hint: "the module header (module NAME(...);) must fit on one line after cleaning"
                .into(),
        }
    }

    pub fn code(&self) -> DiagCode {
        match self {
            HdlError::Configuration { code, .. } => *code,
            HdlError::Structural { code, .. } => *code,
            HdlError::Parse { .. } => codes::MIXED_OPERATORS,
        }
    }

    /// Builds the `Diagnostic` this error renders as. This is the single
    /// place `HdlError`'s `Display` and `to_json` go through, so the
    /// span-anchored `error: … / <source line> / ^^^` presentation (and its
    /// JSON twin) is what the CLI's `fail()` actually emits, not a path this
    /// type separately reimplements.
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            HdlError::Configuration {
                code,
                message,
                path,
            } => {
                let message = match path {
                    Some(p) => format!("{message}: {}", p.display()),
                    None => message.clone(),
                };
                Diagnostic::new(DiagLevel::Error, *code, Span::zero(), message)
            }
            HdlError::Structural {
                code,
                message,
                hint,
            } => Diagnostic::new(DiagLevel::Error, *code, Span::zero(), message.clone())
                .with_hint(hint.clone()),
            HdlError::Parse { raw, groups, .. } => {
                let span = Span::new(0, 0, raw.chars().count());
                Diagnostic::new(
                    DiagLevel::Error,
                    codes::MIXED_OPERATORS,
                    span,
                    format!(
                        "mixed operators at one parenthesisation level: {}",
                        groups.join(" ")
                    ),
                )
                .with_hint("add parentheses to indicate order of operations")
                .with_source_line(raw.clone())
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.diagnostic().to_json()
    }
}

impl fmt::Display for HdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostic())
    }
}

impl std::error::Error for HdlError {}
