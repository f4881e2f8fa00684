/// A config command decomposed into its function name and raw argument
/// strings. Arguments stay untyped here; each action converts them itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCall {
    pub name: String,
    pub args: Vec<String>,
}

/// Best-effort decomposition of `Name(arg1;arg2;...)` or bare `Name`.
///
/// The name is everything before the first `(`; arguments sit between the
/// first `(` and the *last* `)` and are split on `;` at bracket depth zero,
/// so an array literal like `[1;2;3]` stays one argument. Malformed input
/// (unbalanced parens) yields the name with zero arguments; parsing never
/// fails. Callers validate argument count before use.
pub fn parse_command(raw: &str) -> CommandCall {
    let name = match raw.find('(') {
        Some(open) => &raw[..open],
        None => raw,
    };
    CommandCall {
        name: name.trim().to_string(),
        args: extract_args(raw),
    }
}

fn extract_args(raw: &str) -> Vec<String> {
    let (Some(open), Some(close)) = (raw.find('('), raw.rfind(')')) else {
        return Vec::new();
    };
    if close < open {
        return Vec::new();
    }
    let body = &raw[open + 1..close];

    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for ch in body.chars() {
        match ch {
            ';' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => {
                if ch == '[' {
                    depth += 1;
                } else if ch == ']' {
                    depth -= 1;
                }
                current.push(ch);
            }
        }
    }
    if !current.is_empty() {
        args.push(current.trim().to_string());
    }
    args
}
