//! Conversion of Markdown into plain text for speech.
//!
//! Normalisation is an ordered list of regex rewrites. Order matters: images
//! are removed before links are rewritten (otherwise `![alt](url)` would be
//! read as `!` followed by a link), and fenced code blocks are removed before
//! inline code spans are unwrapped.
//!
//! Image syntax is dropped entirely, alt text included.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// One pure text rewrite in the normalisation pipeline.
pub struct RewriteStep {
    pub name: &'static str,
    pattern: Lazy<Regex>,
    replacement: &'static str,
}

impl RewriteStep {
    /// Apply this step to `text`.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, self.replacement)
    }
}

macro_rules! step {
    ($name:literal, $re:literal, $rep:literal) => {
        RewriteStep {
            name: $name,
            pattern: Lazy::new(|| Regex::new($re).unwrap()),
            replacement: $rep,
        }
    };
}

/// The normalisation steps, in the order they run.
pub static STEPS: [RewriteStep; 13] = [
    step!("headers", r"(?m)^#{1,6}\s+", ""),
    step!("images", r"!\[[^\]]*\]\([^)]*\)", ""),
    step!("links", r"\[([^\]]+)\]\([^)]+\)", "${1}"),
    step!("emphasis_asterisk", r"\*{1,2}([^*]+)\*{1,2}", "${1}"),
    step!("emphasis_underscore", r"_{1,2}([^_]+)_{1,2}", "${1}"),
    step!("code_blocks", r"```[^`]*```", ""),
    step!("inline_code", r"`([^`]+)`", "${1}"),
    step!("bullet_items", r"(?m)^\s*[-*+]\s+", ""),
    step!("numbered_items", r"(?m)^\s*\d+\.\s+", ""),
    step!("blockquotes", r"(?m)^\s*>\s+", ""),
    step!("blank_lines", r"\n\s*\n", "\n\n"),
    step!("spaces", r"[ \t]+", " "),
    step!("trim", r"\A\s+|\s+\z", ""),
];

/// Strip Markdown syntax from `text`, keeping the spoken content.
///
/// Total over any input; the empty string normalises to the empty string.
pub fn clean_markdown(text: &str) -> String {
    STEPS
        .iter()
        .fold(text.to_string(), |acc, step| step.apply(&acc).into_owned())
}

/// Look up a step by name.
pub fn step(name: &str) -> Option<&'static RewriteStep> {
    STEPS.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_step(name: &str, text: &str) -> String {
        step(name).unwrap().apply(text).into_owned()
    }

    #[test]
    fn removes_headers() {
        let text = "# Header 1\n## Header 2\n### Header 3\nRegular text";
        assert_eq!(
            clean_markdown(text),
            "Header 1\nHeader 2\nHeader 3\nRegular text"
        );
    }

    #[test]
    fn removes_images_with_alt_text() {
        let result = clean_markdown("Image: ![A photo of a cat](cat.jpg) here");
        assert_eq!(result, "Image: here");
    }

    #[test]
    fn removes_images_without_alt_text() {
        assert_eq!(clean_markdown("Before ![](image.png) after"), "Before after");
    }

    #[test]
    fn keeps_link_text() {
        assert_eq!(
            clean_markdown("Check out [this link](https://example.com) for more info"),
            "Check out this link for more info"
        );
    }

    #[test]
    fn links_step_alone_misreads_images() {
        // Which is why images must go first.
        assert_eq!(run_step("links", "![alt](img.png)"), "!alt");
        assert_eq!(run_step("images", "![alt](img.png)"), "");
    }

    #[test]
    fn removes_emphasis() {
        assert_eq!(
            clean_markdown("This is **bold** and *italic* text"),
            "This is bold and italic text"
        );
        assert_eq!(
            clean_markdown("This is __bold__ and _italic_ text"),
            "This is bold and italic text"
        );
    }

    #[test]
    fn removes_code_blocks() {
        assert_eq!(
            clean_markdown("Before\n```python\nprint('hello')\n```\nAfter"),
            "Before\n\nAfter"
        );
    }

    #[test]
    fn unwraps_inline_code() {
        assert_eq!(
            clean_markdown("Use the `print()` function here"),
            "Use the print() function here"
        );
    }

    #[test]
    fn removes_list_prefixes() {
        assert_eq!(
            clean_markdown("- Item 1\n* Item 2\n+ Item 3\n1. Numbered item"),
            "Item 1\nItem 2\nItem 3\nNumbered item"
        );
    }

    #[test]
    fn removes_blockquotes() {
        assert_eq!(
            clean_markdown("> This is a quote\n> Multi-line quote"),
            "This is a quote\nMulti-line quote"
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(
            clean_markdown("Line 1\n\n\n\nLine 2    with   spaces"),
            "Line 1\n\nLine 2 with spaces"
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_markdown(""), "");
        assert_eq!(clean_markdown("  \n\n \t"), "");
    }

    #[test]
    fn plain_text_is_a_fixed_point() {
        let plain = "Hello there.\n\nThis is plain text, nothing to strip.";
        assert_eq!(clean_markdown(plain), plain);
        assert_eq!(clean_markdown(&clean_markdown(plain)), plain);
    }

    #[test]
    fn cleans_a_complete_document() {
        let text = r#"# My Document

This is **bold** text with an image: ![Screenshot](image.png)

## Section 2

Here's a [link](https://example.com) and some `code`.

- List item 1
- List item 2

> This is a blockquote

```python
def hello():
    print("world")
```

Regular text at the end."#;

        let result = clean_markdown(text);
        for marker in ["# ", "**", "![", "](image.png)", "](https://example.com)", "`", "- ", "> ", "def hello():"] {
            assert!(!result.contains(marker), "{marker:?} left in {result:?}");
        }
        for content in [
            "My Document",
            "bold text with an image:",
            "Section 2",
            "link and some code",
            "List item 1",
            "This is a blockquote",
            "Regular text at the end.",
        ] {
            assert!(result.contains(content), "{content:?} missing from {result:?}");
        }
    }
}
