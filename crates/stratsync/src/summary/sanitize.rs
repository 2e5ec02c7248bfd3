//! Removal of code-fence wrapping from generated documents.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading fence, optionally tagged `html`, plus following whitespace.
static LEADING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^```(?:html)?\s*").expect("Invalid leading fence pattern"));

/// Trailing fence with surrounding whitespace.
static TRAILING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*```\s*$").expect("Invalid trailing fence pattern"));

/// Opening fence tagged with a language, e.g. ```` ```bash ````.
static TAGGED_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```([A-Za-z0-9_+-]+)").expect("Invalid tagged fence pattern"));

/// Strip a leading and a trailing code fence, if present.
///
/// Repeats until nothing changes, so `strip_code_fences(strip_code_fences(x))
/// == strip_code_fences(x)` for every input. Text that opens with a fence
/// tagged for another language is a code block, not a wrapper, and is kept
/// whole.
pub fn strip_code_fences(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let stripped = strip_once(&current);
        if stripped == current {
            return stripped;
        }
        current = stripped;
    }
}

fn strip_once(text: &str) -> String {
    if opens_foreign_block(text) {
        return text.to_string();
    }
    let without_leading = LEADING_FENCE.replace(text, "");
    TRAILING_FENCE.replace(&without_leading, "").into_owned()
}

fn opens_foreign_block(text: &str) -> bool {
    TAGGED_FENCE
        .captures(text)
        .is_some_and(|caps| !caps[1].eq_ignore_ascii_case("html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_html_fence() {
        assert_eq!(strip_code_fences("```html<p>ok</p>```"), "<p>ok</p>");
    }

    #[test]
    fn test_strips_untagged_fence_with_newlines() {
        assert_eq!(
            strip_code_fences("```\n<h1>Report</h1>\n```\n"),
            "<h1>Report</h1>"
        );
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        assert_eq!(strip_code_fences("```HTML\n<p>x</p>\n```"), "<p>x</p>");
    }

    #[test]
    fn test_unwrapped_text_is_unchanged() {
        let doc = "<p>a ``` b</p>";
        assert_eq!(strip_code_fences(doc), doc);
    }

    #[test]
    fn test_nested_code_block_survives_unwrapping() {
        assert_eq!(
            strip_code_fences("```html\n```bash\nls\n```\n```"),
            "```bash\nls\n```"
        );
    }

    #[test]
    fn test_foreign_code_block_is_unchanged() {
        let doc = "```python\nprint(1)\n```";
        assert_eq!(strip_code_fences(doc), doc);
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "```html<p>ok</p>```",
            "``````x``````",
            "```html\n```",
            "```html\n```bash\nls\n```\n```",
            "```\n```sql\nselect 1\n```\n```",
            "  ```html <p>indented</p>",
            "plain",
            "",
        ];
        for sample in samples {
            let once = strip_code_fences(sample);
            assert_eq!(strip_code_fences(&once), once, "input: {sample:?}");
        }
    }
}
