//! Markdown to HTML conversion.

use pulldown_cmark::{html, Options, Parser};

/// Markdown processor with the extensions posts are written against
#[derive(Debug, Clone, Copy)]
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self { options }
    }

    /// Convert markdown to HTML
    pub fn convert(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_strong() {
        let html = MarkdownProcessor::new().convert("Body **text**.");
        assert_eq!(html.trim(), "<p>Body <strong>text</strong>.</p>");
    }

    #[test]
    fn test_tables_and_strikethrough() {
        let html = MarkdownProcessor::new().convert("| a | b |\n|---|---|\n| 1 | ~~2~~ |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>2</del>"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(MarkdownProcessor::new().convert(""), "");
    }
}
