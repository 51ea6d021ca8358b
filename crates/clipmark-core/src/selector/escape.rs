use std::fmt::Write;

/// Escape `ident` for use as a CSS identifier (`CSS.escape`).
pub fn css_escape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let first = ident.chars().next();
    let single = ident.chars().nth(1).is_none();

    for (i, c) in ident.chars().enumerate() {
        let code = c as u32;
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => {
                let _ = write!(out, "\\{:x} ", code);
            }
            '0'..='9' if i == 0 || (i == 1 && first == Some('-')) => {
                let _ = write!(out, "\\{:x} ", code);
            }
            '-' if i == 0 && single => out.push_str("\\-"),
            c if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }

    out
}
