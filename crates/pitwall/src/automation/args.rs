//! Fallible string-to-primitive conversions for action arguments. Every
//! helper returns `None` instead of erroring; the calling action decides how
//! to report the failure.

pub(crate) fn parse_bool_arg(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub(crate) fn parse_int_arg(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

pub(crate) fn parse_float_arg(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok()
}

/// Parses an int-array literal such as `[1,2,3]`. Separators may be `,` or
/// `;` (the command grammar keeps `;` inside brackets intact), `[]` is the
/// empty array, and any unparsable element fails the whole argument.
pub(crate) fn parse_int_array_arg(raw: &str) -> Option<Vec<i32>> {
    let inner = raw.trim().trim_matches(|c| c == '[' || c == ']');
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    inner
        .split([',', ';'])
        .map(|element| element.trim().parse::<i32>().ok())
        .collect()
}
