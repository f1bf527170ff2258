//! Markdown code-fence stripping.
//!
//! Generators often wrap CTM in a fenced block despite being told not to.
//! The fence is removed before any rule is checked.

use std::sync::OnceLock;

use regex::Regex;

/// Closing fence on its own line.
const FENCE_OWN_LINE: &str = r"(?is)\A```(?:ctm|txt|text|plaintext)?\s*\n(.*?)\n```\z";
/// Closing fence directly after the last line of content.
const FENCE_INLINE: &str = r"(?is)\A```(?:ctm|txt|text|plaintext)?\s*\n(.*?)```\z";

fn fence_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(FENCE_OWN_LINE).expect("fence pattern is a valid regex"),
            Regex::new(FENCE_INLINE).expect("fence pattern is a valid regex"),
        ]
    })
}

/// Return the trimmed content of `text`, unwrapped from a code fence if it
/// has one.
pub fn strip_fence(text: &str) -> &str {
    let text = text.trim();

    for pattern in fence_patterns() {
        if let Some(body) = pattern.captures(text).and_then(|c| c.get(1)) {
            return body.as_str().trim();
        }
    }

    // Unknown language tag: drop the first and last line.
    if text.starts_with("```") && text.ends_with("```") {
        if let (Some(first_nl), Some(last_nl)) = (text.find('\n'), text.rfind('\n')) {
            if first_nl < last_nl {
                return text[first_nl + 1..last_nl].trim();
            }
            return "";
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfenced_text_is_trimmed_only() {
        assert_eq!(strip_fence("  Root\n>Child \n"), "Root\n>Child");
    }

    #[test]
    fn test_tagged_fence_own_line() {
        assert_eq!(strip_fence("```ctm\nRoot\n>Child\n```"), "Root\n>Child");
        assert_eq!(strip_fence("```PlainText\nRoot\n```"), "Root");
    }

    #[test]
    fn test_untagged_fence() {
        assert_eq!(strip_fence("```\nRoot\n>Child\n```"), "Root\n>Child");
    }

    #[test]
    fn test_closing_fence_after_content() {
        assert_eq!(strip_fence("```txt\nRoot\n>Child```"), "Root\n>Child");
    }

    #[test]
    fn test_unknown_language_tag_uses_line_fallback() {
        assert_eq!(strip_fence("```markdown\nRoot\n>Child\n```"), "Root\n>Child");
    }

    #[test]
    fn test_fence_with_no_body() {
        assert_eq!(strip_fence("```\n```"), "");
    }

    #[test]
    fn test_single_line_fence_is_left_alone() {
        assert_eq!(strip_fence("```Root```"), "```Root```");
    }
}
