//! Markdown → HTML rendering
//!
//! Pure and deterministic: the output depends only on the source text and the
//! renderer's options. Supports tables, footnotes, strikethrough, heading
//! attributes, fenced code with highlight hooks, and a `[TOC]` marker that is
//! replaced by a table of contents built from the document's headings.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

const TOC_MARKER: &str = "[TOC]";

/// A heading as it appears in the table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    allow_raw_html: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self { allow_raw_html: true }
    }
}

impl MarkdownRenderer {
    /// With `allow_raw_html` off, HTML embedded in the source is escaped
    /// instead of passed through.
    pub fn new(allow_raw_html: bool) -> Self {
        Self { allow_raw_html }
    }

    /// Render a markdown fragment to HTML
    pub fn render(&self, source: &str) -> String {
        let events: Vec<Event> = Parser::new_ext(source, parser_options()).collect();
        let headings = collect_headings(&events);
        let toc = has_toc_marker(&events).then(|| toc_html(&headings));

        let events = self.rewrite(events, &headings, toc.as_deref());

        let mut out = String::with_capacity(source.len() + source.len() / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    /// Render a full HTML document titled `title`
    pub fn render_document(&self, title: &str, source: &str) -> String {
        format!(
            concat!(
                "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
                "<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n"
            ),
            escape_text(title),
            self.render(source)
        )
    }

    fn rewrite<'a>(
        &self,
        events: Vec<Event<'a>>,
        headings: &[TocEntry],
        toc: Option<&str>,
    ) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut paragraph: Option<Vec<Event<'a>>> = None;
        let mut heading_idx = 0;

        for event in events {
            if let Some(buf) = paragraph.as_mut() {
                if !matches!(event, Event::End(TagEnd::Paragraph)) {
                    buf.push(event);
                    continue;
                }

                let buf = paragraph.take().unwrap_or_default();
                match toc {
                    Some(toc) if is_marker_paragraph(&buf) => {
                        out.push(Event::Html(CowStr::from(toc.to_string())));
                    }
                    _ => {
                        out.push(Event::Start(Tag::Paragraph));
                        out.extend(buf.into_iter().map(|e| self.rewrite_event(e)));
                        out.push(Event::End(TagEnd::Paragraph));
                    }
                }
                continue;
            }

            match event {
                Event::Start(Tag::Paragraph) if toc.is_some() => {
                    paragraph = Some(Vec::new());
                }
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let anchor = headings.get(heading_idx).map(|h| h.anchor.clone());
                    heading_idx += 1;

                    // Anchor ids only when a table of contents links to them
                    let id = match toc {
                        Some(_) => anchor.map(CowStr::from).or(id),
                        None => id,
                    };
                    out.push(Event::Start(Tag::Heading {
                        level,
                        id,
                        classes,
                        attrs,
                    }));
                }
                other => out.push(self.rewrite_event(other)),
            }
        }

        out
    }

    fn rewrite_event<'a>(&self, event: Event<'a>) -> Event<'a> {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => Event::Html(CowStr::from(code_block_open(&kind))),
            Event::End(TagEnd::CodeBlock) => Event::Html(CowStr::Borrowed("</code></pre></div>\n")),
            Event::Html(raw) | Event::InlineHtml(raw) if !self.allow_raw_html => Event::Text(raw),
            other => other,
        }
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Opening markup for a code block; highlighters hook on `codehilite` and
/// the `language-*` class.
fn code_block_open(kind: &CodeBlockKind) -> String {
    let lang = match kind {
        CodeBlockKind::Fenced(info) => info
            .split_whitespace()
            .next()
            .map(|l| {
                l.chars()
                    .filter(|c| {
                        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.')
                    })
                    .collect::<String>()
            })
            .filter(|l| !l.is_empty()),
        CodeBlockKind::Indented => None,
    };

    match lang {
        Some(lang) => format!(
            "<div class=\"codehilite\" data-lang=\"{0}\"><pre><code class=\"language-{0}\">",
            lang
        ),
        None => "<div class=\"codehilite\"><pre><code>".to_string(),
    }
}

/// Headings in document order with unique anchors
pub fn collect_headings(events: &[Event]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut current: Option<(u8, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((*level as u8, id.as_ref().map(|s| s.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit, text)) = current.take() {
                    let anchor =
                        unique_anchor(&mut used, explicit.unwrap_or_else(|| slugify(&text)));
                    entries.push(TocEntry {
                        level,
                        text: text.trim().to_string(),
                        anchor,
                    });
                }
            }
            _ => {}
        }
    }

    entries
}

fn unique_anchor(used: &mut HashMap<String, usize>, slug: String) -> String {
    if !used.contains_key(&slug) {
        used.insert(slug.clone(), 0);
        return slug;
    }

    loop {
        let n = {
            let count = used.entry(slug.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let candidate = format!("{}_{}", slug, n);
        if !used.contains_key(&candidate) {
            used.insert(candidate.clone(), 0);
            return candidate;
        }
    }
}

/// Slugify heading text for use as an anchor (e.g. "What's New?" -> "whats-new")
pub fn slugify(text: &str) -> String {
    let slug = text
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '_' {
                Some(c)
            } else if c.is_whitespace() || c == '-' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-");

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn has_toc_marker(events: &[Event]) -> bool {
    let mut start = None;
    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Paragraph) => start = Some(i + 1),
            Event::End(TagEnd::Paragraph) => {
                if let Some(s) = start.take() {
                    if is_marker_paragraph(&events[s..i]) {
                        return true;
                    }
                }
            }
            _ => {}
        }
    }
    false
}

/// A paragraph consisting of nothing but the `[TOC]` marker
fn is_marker_paragraph(inner: &[Event]) -> bool {
    let mut text = String::new();
    for event in inner {
        match event {
            Event::Text(t) => text.push_str(t),
            _ => return false,
        }
    }
    text.trim() == TOC_MARKER
}

fn toc_html(entries: &[TocEntry]) -> String {
    let mut out = String::from("<div class=\"toc\">\n");
    let mut open: Vec<u8> = Vec::new();

    for entry in entries {
        match open.last().copied() {
            None => {
                out.push_str("<ul>\n");
                open.push(entry.level);
            }
            Some(top) if entry.level > top => {
                out.push_str("\n<ul>\n");
                open.push(entry.level);
            }
            Some(_) => {
                while open.len() > 1 && open.last().is_some_and(|top| entry.level < *top) {
                    out.push_str("</li>\n</ul>\n");
                    open.pop();
                }
                if open.last().is_some_and(|top| entry.level > *top) {
                    out.push_str("\n<ul>\n");
                    open.push(entry.level);
                } else {
                    out.push_str("</li>\n");
                }
            }
        }
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape_text(&entry.anchor).replace('"', "&quot;"),
            escape_text(&entry.text)
        ));
    }

    while open.pop().is_some() {
        out.push_str("</li>\n</ul>\n");
    }
    out.push_str("</div>\n");
    out
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    html::push_html(&mut out, std::iter::once(Event::Text(CowStr::Borrowed(text))));
    out
}
