//! Utilities.

/// Indents every line in the string.
pub fn indent(str: String, indent: usize) -> String {
    str.lines().map(|l| format!("{}{}", " ".repeat(indent), l)).collect::<Vec<_>>().join("\n")
}
