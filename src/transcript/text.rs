//! Text normalization for displayed content

use std::sync::LazyLock;

use regex::Regex;

static REASONING_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid pattern"));

// An opening marker the agent never closed (stream cut mid-thought).
static REASONING_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*\z").expect("valid pattern"));

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid pattern"));

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1f\x7f-\u{9f}]").expect("valid pattern"));

/// Placeholder shown when sanitation leaves nothing displayable.
pub const EMPTY_PLACEHOLDER: &str = "[Empty message]";

/// Remove internal reasoning markup from assistant content.
///
/// `<think>...</think>` ranges are removed case-insensitively; an
/// unterminated `<think>` strips to end of string. The result is trimmed
/// and runs of three or more newlines collapse to exactly two. Must run
/// before emptiness and dedup checks so all-reasoning deliveries do not
/// claim an id.
pub fn strip_reasoning(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let stripped = REASONING_BLOCK.replace_all(content, "");
    let stripped = REASONING_TAIL.replace_all(&stripped, "");
    let collapsed = EXCESS_NEWLINES.replace_all(&stripped, "\n\n");
    collapsed.trim().to_string()
}

/// Clean tool-formatted message text before display: drop control
/// characters, cap the length, trim. An empty result degrades to a fixed
/// placeholder rather than an invisible message.
pub fn sanitize(content: &str, max_length: usize) -> String {
    let cleaned = CONTROL_CHARS.replace_all(content, "");
    let capped: String = cleaned.chars().take(max_length).collect();
    let trimmed = capped.trim();
    if trimmed.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_removes_block() {
        assert_eq!(strip_reasoning("<think>plan</think>Hello"), "Hello");
    }

    #[test]
    fn test_strip_is_case_insensitive() {
        assert_eq!(strip_reasoning("<THINK>plan</Think>Hello"), "Hello");
    }

    #[test]
    fn test_strip_multiple_blocks() {
        assert_eq!(
            strip_reasoning("<think>a</think>one<think>b</think> two"),
            "one two"
        );
    }

    #[test]
    fn test_strip_unterminated_marker_strips_to_end() {
        assert_eq!(strip_reasoning("Answer.<think>never closed"), "Answer.");
    }

    #[test]
    fn test_strip_spans_newlines() {
        assert_eq!(
            strip_reasoning("<think>line one\nline two</think>Done"),
            "Done"
        );
    }

    #[test]
    fn test_strip_collapses_newline_runs() {
        assert_eq!(strip_reasoning("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(strip_reasoning("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_strip_trims_whitespace() {
        assert_eq!(strip_reasoning("  Hello  "), "Hello");
    }

    #[test]
    fn test_strip_empty_input_unchanged() {
        assert_eq!(strip_reasoning(""), "");
    }

    #[test]
    fn test_strip_all_reasoning_yields_empty() {
        assert_eq!(strip_reasoning("<think>only thoughts</think>"), "");
    }

    #[test]
    fn test_sanitize_drops_control_characters() {
        assert_eq!(sanitize("he\u{0}llo\u{1b}[31m", 100), "hello[31m");
    }

    #[test]
    fn test_sanitize_caps_length() {
        assert_eq!(sanitize("abcdef", 3), "abc");
    }

    #[test]
    fn test_sanitize_empty_degrades_to_placeholder() {
        assert_eq!(sanitize("  \u{7}  ", 100), EMPTY_PLACEHOLDER);
    }
}
