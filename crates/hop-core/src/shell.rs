/// Shell-quote a value using POSIX single-quote escaping.
pub fn shell_quote(value: &str) -> String {
    let escaped = value.replace('\'', "'\"'\"'");
    format!("'{escaped}'")
}

pub fn shell_join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|part| shell_quote(part.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
