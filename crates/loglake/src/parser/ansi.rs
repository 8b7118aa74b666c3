//! ANSI colour escape stripping.
//!
//! Applications frequently emit colour codes even when not attached to a
//! terminal. Lines that fall through every format detector are stored as a
//! plain message, so the escapes are removed on that branch only.

use std::borrow::Cow;

/// Strips ANSI colour escapes (`ESC [` parameters `m`) from a line.
///
/// Returns `Cow::Borrowed` when the line contains no escape character, so
/// the common case does not allocate. Escape sequences other than the
/// `m`-terminated colour/style family are left untouched.
pub fn strip_ansi_codes(input: &str) -> Cow<'_, str> {
    if !input.contains('\x1b') {
        return Cow::Borrowed(input);
    }

    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            let mut j = i + 2;
            while j < bytes.len() && (bytes[j].is_ascii_digit() || bytes[j] == b';') {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'm' {
                i = j + 1;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }

    // Only whole ASCII sequences were removed, so the remainder is intact.
    Cow::Owned(String::from_utf8_lossy(&output).into_owned())
}
