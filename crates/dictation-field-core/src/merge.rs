use crate::options::{FieldOptions, FieldType};

/// Combine the current field value with a fresh transcript.
///
/// Replace mode, or an empty current value, yields the trimmed transcript.
/// Otherwise the transcript is appended after the resolved separator. The
/// existing text is kept exactly as it was.
pub fn merge_transcript(
    current: Option<&str>,
    transcript: &str,
    options: &FieldOptions,
    field_type: FieldType,
) -> String {
    let transcript = transcript.trim();
    match current {
        Some(existing) if options.append_mode && !existing.is_empty() => {
            let separator = options.line_separator.resolve(field_type);
            let mut merged =
                String::with_capacity(existing.len() + separator.len() + transcript.len());
            merged.push_str(existing);
            merged.push_str(separator);
            merged.push_str(transcript);
            merged
        }
        _ => transcript.to_string(),
    }
}
