//! Identifier to command-line name transforms.
//!
//! All functions here are pure: they never consult configuration and never
//! fail. The tree builder composes them into the default name formatters.

/// Lower-case `name` and replace underscores with hyphens.
///
/// `show_all` → `show-all`, `Sync` → `sync`.
pub fn to_kebab(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

/// Like [`to_kebab`], but camel-case boundaries also become word breaks.
///
/// Two boundaries are recognised: a lower-case letter or digit followed by an
/// upper-case letter (`subGroup` → `sub-group`), and the end of an acronym
/// followed by a title-cased word (`HTTPServer` → `http-server`).
pub fn to_group_kebab(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let lower_to_upper = prev.is_lowercase() || prev.is_ascii_digit();
            let acronym_end = prev.is_uppercase() && next_is_lower;
            if (lower_to_upper || acronym_end) && prev != '_' {
                out.push('_');
            }
        }
        out.push(c);
    }

    to_kebab(&out)
}

/// Remove one trailing escape underscore.
///
/// `import_` → `import`. Names starting with an underscore, the bare `_`,
/// and names ending in `__` are returned unchanged.
pub fn strip_trailing_escape(name: &str) -> &str {
    if name.len() > 1 && !name.starts_with('_') && name.ends_with('_') && !name.ends_with("__") {
        &name[..name.len() - 1]
    } else {
        name
    }
}

/// Key under which a parameter's parsed value is stored: the name without
/// any leading or trailing underscores.
///
/// Falls back to the full name when it consists only of underscores.
pub fn lookup_key(name: &str) -> &str {
    let trimmed = name.trim_matches('_');
    if trimmed.is_empty() { name } else { trimmed }
}

/// Public (command-line) spelling of a parameter's lookup key.
pub(crate) fn public_name(key: &str) -> String {
    key.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_table() {
        let cases = [
            ("sync", "sync"),
            ("show_all", "show-all"),
            ("Sync", "sync"),
            ("METHOD", "method"),
            ("a_b_c", "a-b-c"),
            ("SubGroup", "subgroup"),
        ];
        for (input, expected) in cases {
            assert_eq!(to_kebab(input), expected, "input: {input}");
        }
    }

    #[test]
    fn group_kebab_table() {
        let cases = [
            ("SubGroup", "sub-group"),
            ("App", "app"),
            ("HTTPServer", "http-server"),
            ("getHTTPResponseCode", "get-http-response-code"),
            ("Version2Api", "version2-api"),
            ("already_snake", "already-snake"),
            ("Mixed_CaseName", "mixed-case-name"),
            ("ABC", "abc"),
        ];
        for (input, expected) in cases {
            assert_eq!(to_group_kebab(input), expected, "input: {input}");
        }
    }

    #[test]
    fn strip_trailing_escape_table() {
        let cases = [
            ("import_", "import"),
            ("import", "import"),
            ("_", "_"),
            ("x_", "x"),
            ("_private_", "_private_"),
            ("dunder__", "dunder__"),
            ("a_b_", "a_b"),
        ];
        for (input, expected) in cases {
            assert_eq!(strip_trailing_escape(input), expected, "input: {input}");
        }
    }

    #[test]
    fn lookup_key_strips_both_ends() {
        assert_eq!(lookup_key("name_"), "name");
        assert_eq!(lookup_key("_name"), "name");
        assert_eq!(lookup_key("__name__"), "name");
        assert_eq!(lookup_key("first_name"), "first_name");
        assert_eq!(lookup_key("_"), "_");
    }

    #[test]
    fn public_name_uses_hyphens() {
        assert_eq!(public_name("dry_run"), "dry-run");
        assert_eq!(public_name("n"), "n");
    }
}
