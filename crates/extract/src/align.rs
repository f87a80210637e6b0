use tracing::warn;

use crate::schema::{AlignmentStatus, CharInterval, Extraction};

/// Byte range of the first occurrence of `needle` at or after byte offset `from`.
pub fn locate(source: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    let start = from + source.get(from..)?.find(needle)?;
    Some((start, start + needle.len()))
}

// ASCII lowercasing keeps byte offsets stable, so ranges map back onto `source`.
fn locate_ignore_ascii_case(source: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    locate(
        &source.to_ascii_lowercase(),
        &needle.to_ascii_lowercase(),
        from,
    )
}

fn char_offset(source: &str, byte: usize) -> usize {
    source[..byte].chars().count()
}

/// Ground model output in the source text.
///
/// Each span is searched for after the previous match first, then from the
/// start of the text, then case-insensitively. Located spans take the exact
/// source slice as their text; spans that cannot be located are dropped.
/// The result is ordered by position in `source`.
pub fn align_extractions(source: &str, extractions: Vec<Extraction>) -> Vec<Extraction> {
    let mut cursor = 0;
    let mut aligned = Vec::with_capacity(extractions.len());

    for mut extraction in extractions {
        let found = {
            let needle = extraction.extraction_text.as_str();
            if needle.trim().is_empty() {
                None
            } else if let Some(range) =
                locate(source, needle, cursor).or_else(|| locate(source, needle, 0))
            {
                Some((range, AlignmentStatus::MatchExact))
            } else {
                locate_ignore_ascii_case(source, needle, cursor)
                    .or_else(|| locate_ignore_ascii_case(source, needle, 0))
                    .map(|range| (range, AlignmentStatus::MatchFuzzy))
            }
        };

        let Some(((start, end), status)) = found else {
            warn!(
                class = %extraction.extraction_class,
                text = %extraction.extraction_text,
                "Dropping extraction not found in source text"
            );
            continue;
        };

        extraction.extraction_text = source[start..end].to_string();
        extraction.char_interval = Some(CharInterval {
            start_pos: char_offset(source, start),
            end_pos: char_offset(source, end),
        });
        extraction.alignment_status = Some(status);
        cursor = end;
        aligned.push(extraction);
    }

    aligned.sort_by_key(|e| e.char_interval.map_or(0, |c| c.start_pos));
    aligned
}
