//! Best-effort cleanup of stray HTML in model output.
//!
//! This is not an HTML sanitizer and must not be treated as a security
//! boundary: anything that does not look like `<name attrs>` is left alone.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Tags whose removal should not glue the surrounding words together.
const BLOCK_TAGS: &[&str] = &[
    "div", "p", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "table", "tr", "td", "th", "blockquote", "pre",
];

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"</?(\w+)[^>]*>").expect("tag pattern is valid"))
}

/// Convert `<strong>` to `**`, `<br>` to newlines, and drop every other tag
/// while keeping its contents.
pub fn sanitize(text: &str) -> String {
    let mut out = Output::with_capacity(text.len());
    let mut last = 0;

    for caps in tag_pattern().captures_iter(text) {
        let Some(tag) = caps.get(0) else { continue };
        out.push_text(&text[last..tag.start()]);
        last = tag.end();

        match tag_name(&caps).as_str() {
            "strong" => out.push_text("**"),
            "br" => out.push_newline(),
            name if BLOCK_TAGS.contains(&name) => out.pending_space = true,
            _ => {}
        }
    }
    out.push_text(&text[last..]);

    out.buf
}

fn tag_name(caps: &Captures<'_>) -> String {
    caps.get(1)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}

struct Output {
    buf: String,
    pending_space: bool,
}

impl Output {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
            pending_space: false,
        }
    }

    fn push_text(&mut self, segment: &str) {
        let Some(first) = segment.chars().next() else {
            return;
        };

        // A removed block tag only becomes a space between two words.
        if self.pending_space
            && !first.is_whitespace()
            && self.buf.chars().last().is_some_and(|c| !c.is_whitespace())
        {
            self.buf.push(' ');
        }
        self.pending_space = false;
        self.buf.push_str(segment);
    }

    fn push_newline(&mut self) {
        self.pending_space = false;
        self.buf.push('\n');
    }
}
