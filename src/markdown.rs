//! Markdown-to-HTML conversion for page bodies.
//!
//! Views that render prose keep it in markdown files and convert at build
//! time; the resulting HTML fragment is dropped into a template binding.

use std::fs;
use std::io;
use std::path::Path;

use pulldown_cmark::{Parser, html as md_html};

/// Convert a markdown string to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

/// Read a markdown file and convert it to an HTML fragment.
pub fn markdown_file_to_html(path: &Path) -> io::Result<String> {
    let markdown = fs::read_to_string(path)?;
    Ok(markdown_to_html(&markdown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_emphasis_convert() {
        let html = markdown_to_html("# Title\n\nsome *body* text");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>body</em>"));
    }

    #[test]
    fn file_conversion_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("page.md");
        std::fs::write(&path, "## Cruises\n").unwrap();
        let html = markdown_file_to_html(&path).unwrap();
        assert!(html.contains("<h2>Cruises</h2>"));
    }
}
