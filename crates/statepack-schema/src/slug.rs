/// Lower-case `raw` and collapse every run of non-alphanumeric characters into
/// a single `-`. Leading and trailing separators are dropped.
///
/// Only ASCII letters and digits survive; any other character, including all
/// non-ASCII characters, is treated as a separator.
pub fn normalize_slug(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}
