//! Single path component sanitization.

/// Linux NAME_MAX minus room for an extension.
const MAX_COMPONENT_BYTES: usize = 240;

/// Makes `raw` safe to use as one path component.
///
/// Separators, control characters and whitespace become `_`; runs of `_`
/// collapse; leading and trailing dots, spaces and underscores are trimmed.
/// With `fold_dots`, interior dots become `_` as well.
pub fn sanitize_component(raw: &str, fold_dots: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_underscore = false;

    for c in raw.trim().chars() {
        let replace = c == '/'
            || c == '\\'
            || c.is_control()
            || c.is_whitespace()
            || (fold_dots && c == '.');
        if replace {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = c == '_';
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_' || c == ' ');
    let mut take = trimmed.len().min(MAX_COMPONENT_BYTES);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_become_underscores() {
        assert_eq!(sanitize_component("a/b\\c", false), "a_b_c");
        assert_eq!(sanitize_component("../../etc/passwd", true), "etc_passwd");
    }

    #[test]
    fn keeps_dots_unless_folding() {
        assert_eq!(sanitize_component("feed.v2.xml", false), "feed.v2.xml");
        assert_eq!(sanitize_component("A.1", true), "A_1");
    }

    #[test]
    fn trims_and_collapses() {
        assert_eq!(sanitize_component("  ..id  42..  ", false), "id_42");
        assert_eq!(sanitize_component("x\u{0}\u{1}y", false), "x_y");
    }

    #[test]
    fn plain_identifiers_unchanged() {
        assert_eq!(sanitize_component("100234", true), "100234");
        assert_eq!(sanitize_component("SKU-7", true), "SKU-7");
    }
}
