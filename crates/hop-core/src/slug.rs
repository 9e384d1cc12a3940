/// Lower-case ASCII alphanumerics, everything else collapsed into single
/// underscores. Never empty.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let slug = out.trim_matches('_');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

/// File name for a pane id. Path separators and `..` sequences can never
/// escape the containing directory.
pub fn safe_filename(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return "unknown".to_string();
    }
    let mut out = value.replace(['/', '\\', ':'], "_");
    while out.contains("..") {
        out = out.replace("..", "__");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{safe_filename, slugify};

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("agent-turn-complete"), "agent_turn_complete");
        assert_eq!(slugify("  --Hello,,  World!! "), "hello_world");
        assert_eq!(slugify("thread/01:ab"), "thread_01_ab");
    }

    #[test]
    fn slugify_never_returns_empty() {
        assert_eq!(slugify(""), "unknown");
        assert_eq!(slugify("---"), "unknown");
        assert_eq!(slugify("Ünïcode"), "n_code");
    }

    #[test]
    fn safe_filename_prevents_escape() {
        assert_eq!(safe_filename("%12"), "%12");
        assert_eq!(safe_filename("../../etc/passwd"), "______etc_passwd");
        assert_eq!(safe_filename("a...b"), "a__.b");
        assert_eq!(safe_filename("host:1"), "host_1");
        assert_eq!(safe_filename("  "), "unknown");
    }
}
