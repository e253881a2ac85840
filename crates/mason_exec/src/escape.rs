//! Argument escaping for spilled command lines.

/// An argument escape function applied to each spilled argument.
///
/// Pluggable so that callers can substitute shell- or tool-specific quoting.
pub type ArgEscape = fn(&str) -> String;

/// Default escape for POSIX-style shells.
///
/// Wraps the argument in double quotes and escapes only the characters the
/// shell interprets inside them. Characters like parentheses need no
/// escaping once quoted.
pub fn posix_escape(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for ch in arg.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
