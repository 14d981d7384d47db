//! Pure helpers for rendering C names.

use lumen_util::StringBuilder;

/// Append the mangled C name for `name` in `module`: `module_name`.
pub fn add_name(module: &str, name: &str, out: &mut StringBuilder) {
    out.push_str(module);
    out.push_char('_');
    out.push_str(name);
}

/// Append `s` uppercased with dots replaced by underscores.
///
/// Used to derive the include-guard token from the output base name.
pub fn to_capital(s: &str, out: &mut StringBuilder) {
    for c in s.chars() {
        if c == '.' {
            out.push_char('_');
        } else {
            out.push_char(c.to_ascii_uppercase());
        }
    }
}
