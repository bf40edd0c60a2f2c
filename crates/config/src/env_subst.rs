/// Expand `${NAME}` and `${NAME:-fallback}` placeholders from the process
/// environment.
///
/// A placeholder whose variable is unset and has no fallback is kept
/// verbatim, as is an unterminated `${`.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let expr = &after[..end];
        let (name, fallback) = match expr.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (expr, None),
        };
        match (lookup(name), fallback) {
            (Some(value), _) if !name.is_empty() => out.push_str(&value),
            (None, Some(fallback)) if !name.is_empty() => out.push_str(fallback),
            _ => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        (name == "IMGATE_GATE").then(|| "g1".to_string())
    }

    #[test]
    fn expands_known_variable() {
        assert_eq!(substitute_with("id = \"${IMGATE_GATE}\"", env), "id = \"g1\"");
    }

    #[test]
    fn falls_back_when_unset() {
        assert_eq!(substitute_with("${IMGATE_PORT:-8000}", env), "8000");
        assert_eq!(substitute_with("${IMGATE_GATE:-other}", env), "g1");
    }

    #[test]
    fn keeps_unresolved_and_malformed() {
        assert_eq!(substitute_with("${IMGATE_MISSING}", env), "${IMGATE_MISSING}");
        assert_eq!(substitute_with("a ${IMGATE_GATE", env), "a ${IMGATE_GATE");
        assert_eq!(substitute_with("${}", env), "${}");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
