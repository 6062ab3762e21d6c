// slice.rs — Module slicer
//
// Given the cleaned corpus and a target module name, returns the
// contiguous slice of logical lines from the module header through its
// `endmodule` terminator.

use crate::diag::HdlError;

/// Returns the slice of `corpus` spanning `module NAME(...);` through
/// `endmodule` for the named module.
///
/// Fails with `HdlError::Structural` if no such module exists, or if its
/// header does not fit on a single logical line (the header line must
/// itself end with `;`, i.e. cleaning already closed the parameter list).
pub fn module_slice(corpus: &[String], name: &str) -> Result<Vec<String>, HdlError> {
    let header_idx = corpus
        .iter()
        .position(|line| is_header_for(line, name))
        .ok_or_else(|| HdlError::module_not_found(name))?;

    if !corpus[header_idx].trim_end().ends_with(';') {
        return Err(HdlError::header_multiline(name));
    }

    let end_idx = corpus[header_idx..]
        .iter()
        .position(|line| line.trim() == "endmodule")
        .map(|offset| header_idx + offset)
        .ok_or_else(|| HdlError::module_not_found(name))?;

    Ok(corpus[header_idx..=end_idx].to_vec())
}

/// A header line is recognised by the prefix `module ` followed by the
/// target name, itself terminated by whitespace or `(`.
fn is_header_for(line: &str, name: &str) -> bool {
    let Some(rest) = line.strip_prefix("module ") else {
        return false;
    };
    let rest = rest.trim_start();
    let Some(tail) = rest.strip_prefix(name) else {
        return false;
    };
    matches!(tail.chars().next(), Some('(') | Some(' ') | Some('\t') | None)
}
