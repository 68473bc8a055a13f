/// Cleans text before chunking: blank lines and whitespace runs collapse
/// to a single space, ends are trimmed.
///
/// Collapsing every whitespace run to one space subsumes the blank-line pass,
/// so a single sweep produces the same output.
///
/// Whitespace is Unicode `White_Space`. The separator controls U+001C..U+001F
/// are not in that set and are kept as ordinary characters.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
