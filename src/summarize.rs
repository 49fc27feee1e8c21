/// Post-process transcript text for display.
///
/// Currently an identity pass-through: the page shows the full transcript as
/// its summary. Empty or absent input yields an empty string.
pub fn summarize<'a>(text: impl Into<Option<&'a str>>) -> String {
    match text.into() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => String::new(),
    }
}
