//! Character classes and the SCPI short/long mnemonic matching rule.

/// SCPI program whitespace: every control character except LF, plus space.
/// LF is the one and only message terminator and is excluded on purpose.
pub(crate) fn is_program_whitespace(b: u8) -> bool {
    b <= 9 || (11..=32).contains(&b)
}

/// Characters that may appear in a header token, including the `*` common-command
/// prefix and the `?` query suffix.
pub(crate) fn is_header_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'*' || b == b'?'
}

/// Compare a header token to a short/long-form pattern like `MEASure`.
///
/// Uppercase letters, digits, `*` and `?` in the pattern are mandatory; lowercase
/// letters are optional, but once the first optional letter has been matched the
/// rest of them must follow in order, so the token must spell either the short
/// form or the complete long form, nothing in between. Comparison is
/// case-insensitive: `MEAS` and `measure` match `MEASure`, while `MEA`, `MEASUR`
/// and `MEASX` do not. A trailing literal such as the `?` of `ERRor?` stays
/// mandatory in both forms: `ERR?` and `ERROR?` match, `ERR` does not.
pub fn mnemonic_compare(pattern: &[u8], token: &[u8]) -> bool {
    compare_form(pattern, token, false) || compare_form(pattern, token, true)
}

fn compare_form(pattern: &[u8], token: &[u8], long_form: bool) -> bool {
    let mut chars = token.iter();
    for p in pattern {
        if !long_form && p.is_ascii_lowercase() {
            continue;
        }
        match chars.next() {
            Some(t) if p.eq_ignore_ascii_case(t) => {}
            _ => return false,
        }
    }
    chars.next().is_none()
}
