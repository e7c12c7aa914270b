/// Parse a statement amount like `$23,230.62`, `+0.09%`, `(12.50)`.
///
/// `--` and empty cells are not numbers.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let s: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%'))
        .collect();
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return parse_plain(inner.trim()).map(|v| -v);
    }
    parse_plain(s.strip_prefix('+').unwrap_or(s))
}

fn parse_plain(s: &str) -> Option<f64> {
    // f64::from_str also takes "inf"/"NaN"
    if !s.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("961"), Some(961.0));
        assert_eq!(parse_numeric("$117.42"), Some(117.42));
        assert_eq!(parse_numeric("$100,975.73"), Some(100975.73));
        assert_eq!(parse_numeric("+0.09%"), Some(0.09));
        assert_eq!(parse_numeric("-$50.00"), Some(-50.0));
        assert_eq!(parse_numeric(" 432,087 "), Some(432087.0));
    }

    #[test]
    fn test_parse_numeric_parenthesized() {
        assert_eq!(parse_numeric("($1,234.56)"), Some(-1234.56));
    }

    #[test]
    fn test_parse_numeric_rejects() {
        assert_eq!(parse_numeric("--"), None);
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("N/A"), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("1.2.3"), None);
    }
}
