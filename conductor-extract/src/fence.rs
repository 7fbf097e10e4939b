//! Fenced-block location.

use std::sync::LazyLock;

use regex::Regex;

// The language tag is optional; models emit both ```json and bare ``` fences.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_]*[ \t]*\n?(.*?)\s*```").expect("fence regex")
});

/// A fenced block and where it sits in the source text.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FencedBlock<'a> {
    /// Byte offset of the opening fence.
    pub start: usize,
    /// Byte offset just past the closing fence.
    pub end: usize,
    /// Text between the fences, language tag and outer whitespace stripped.
    pub body: &'a str,
}

/// Locates every fenced block in order of appearance.
pub(crate) fn find_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    FENCE
        .captures_iter(text)
        .filter_map(|caps| {
            let (whole, body) = (caps.get(0)?, caps.get(1)?);
            Some(FencedBlock {
                start: whole.start(),
                end: whole.end(),
                body: body.as_str(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_blocks_in_order() {
        let text = "a\n```json\n{\"tool\": \"x\"}\n```\nb\n```json\n{\"tool\": \"y\"}\n```";
        let blocks = find_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].body, "{\"tool\": \"x\"}");
        assert_eq!(blocks[1].body, "{\"tool\": \"y\"}");
        assert!(blocks[0].start < blocks[1].start);
    }

    #[test]
    fn unterminated_fence_is_ignored() {
        assert!(find_blocks("```json\n{\"tool\": \"x\"}").is_empty());
    }

    #[test]
    fn inline_block_is_found() {
        let blocks = find_blocks("before ```json {\"tool\": \"x\"} ``` after");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{\"tool\": \"x\"}");
    }

    #[test]
    fn untagged_fence_is_found() {
        let blocks = find_blocks("```\n{\"tool\": \"x\"}\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{\"tool\": \"x\"}");
    }

    #[test]
    fn untagged_inline_fence_is_found() {
        let blocks = find_blocks("before ``` {\"tool\": \"x\"} ``` after");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{\"tool\": \"x\"}");
    }

    #[test]
    fn other_language_tags_are_stripped_from_the_body() {
        let blocks = find_blocks("```javascript\n{\"tool\": \"x\"}\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{\"tool\": \"x\"}");
    }
}
