//! Glob-style domain wildcards.

/// Compile a `DOMAIN-WILDCARD` pattern into an anchored regex source.
///
/// `*` matches any run of domain characters (including dots), `?` matches a
/// single one. Everything else is matched literally.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut literal = String::new();

    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == '*' { r"[\w.-]*?" } else { r"[\w.-]" });
            }
            _ => literal.push(c),
        }
    }

    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_literal_dots_escaped() {
        assert_eq!(wildcard_to_regex("a.com"), r"^a\.com$");
    }

    #[test]
    fn test_star_and_question() {
        let re = Regex::new(&wildcard_to_regex("*.cdn?.example.com")).unwrap();
        assert!(re.is_match("img.cdn1.example.com"));
        assert!(re.is_match("a.b.cdn2.example.com"));
        assert!(!re.is_match("img.cdn12.example.com"));
        assert!(!re.is_match("img.cdn1.example.org"));
    }
}
