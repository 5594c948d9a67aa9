use regex::Regex;
use std::sync::LazyLock;

/// Glyph placed in front of every generated question.
pub const QUESTION_MARKER: &str = "❓";
/// Glyph that opens the line naming the entity a question is about.
pub const COMMENT_MARKER: &str = "💬";

// The same glyphs after a UTF-8 -> Windows-1252 round trip upstream
const QUESTION_MARKER_MOJIBAKE: &str = "â“";
const COMMENT_MARKER_MOJIBAKE: &str = "ðŸ’¬";

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("valid blank line pattern"));

/// Split a generated-questions block into the bare question texts.
///
/// Segments that are blank after cleanup are dropped rather than returned as
/// empty questions, so a stray blank line cannot shift positional pairing
/// with the selected entities.
pub fn clean_questions(block: &str) -> Vec<String> {
    if block.trim().is_empty() {
        return Vec::new();
    }

    BLANK_LINE
        .split(block)
        .map(clean_segment)
        .filter(|q| !q.is_empty())
        .collect()
}

fn clean_segment(segment: &str) -> String {
    let stripped = segment
        .replace(QUESTION_MARKER, "")
        .replace(QUESTION_MARKER_MOJIBAKE, "");
    let stripped = stripped.trim();

    let question = [COMMENT_MARKER, COMMENT_MARKER_MOJIBAKE]
        .iter()
        .filter_map(|marker| stripped.find(&format!("\n{marker}")))
        .min()
        .map_or(stripped, |end| &stripped[..end]);

    question.trim().to_string()
}

/// Render one question with the entity it was generated for.
pub fn format_question_block(question: &str, entity_display: &str) -> String {
    format!("{QUESTION_MARKER} {question}\n{COMMENT_MARKER} {entity_display}")
}

pub fn join_question_blocks(blocks: &[String]) -> String {
    blocks.join("\n\n")
}
