//! Backslash escapes in separator arguments

/// Expand `\t`, `\n`, `\r`, `\0`, `\\` and `\xHH` (ASCII only).
///
/// Lets separators such as `\x1f` or `\r\n` be passed on a command line.
pub fn unescape(input: &str) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                let byte = Some(&hex)
                    .filter(|h| h.len() == 2 && h.chars().all(|c| c.is_ascii_hexdigit()))
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .filter(u8::is_ascii)
                    .ok_or_else(|| format!("invalid escape '\\x{}' in '{}'", hex, input))?;
                out.push(char::from(byte));
            }
            Some(other) => return Err(format!("unknown escape '\\{}' in '{}'", other, input)),
            None => return Err(format!("trailing backslash in '{}'", input)),
        }
    }

    Ok(out)
}
