//! Markdown rendering for answer bodies.
//!
//! Answers keep their raw Markdown plus three derived columns. All of them
//! come from [`derive`], which is pure and infallible: pulldown-cmark renders
//! any input, so malformed Markdown only degrades the output.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream};
use regex::Regex;
use scraper::{Html, Selector};

/// Number of leading raw lines rendered into the summary.
pub const SUMMARY_LINES: usize = 5;

/// Markdown extensions, applied in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extension {
    Tables,
    FencedCode,
    Footnotes,
    CodeHilite,
    WikiLinks,
}

pub const EXTENSIONS: [Extension; 5] = [
    Extension::Tables,
    Extension::FencedCode,
    Extension::Footnotes,
    Extension::CodeHilite,
    Extension::WikiLinks,
];

static WIKILINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([\w -]+)\]\]").expect("wikilink pattern"));
static WIKILINK_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"( +_)|(_ +)|( +)").expect("wikilink space pattern"));
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("img selector"));

impl Extension {
    fn parser_options(self) -> Options {
        match self {
            Extension::Tables => Options::ENABLE_TABLES,
            Extension::Footnotes => Options::ENABLE_FOOTNOTES,
            // Fenced blocks are CommonMark; the rest work on the event stream
            Extension::FencedCode | Extension::CodeHilite | Extension::WikiLinks => Options::empty(),
        }
    }

    fn transform<'a>(self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        match self {
            Extension::CodeHilite => highlight_code_blocks(events),
            Extension::WikiLinks => expand_wikilinks(events),
            _ => events,
        }
    }
}

/// Fields derived from an answer's raw content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedContent {
    pub content_html: String,
    pub summary: String,
    pub summary_img_url: Option<String>,
}

/// Render `raw` and everything computed from it.
pub fn derive(raw: &str) -> DerivedContent {
    let content_html = render_markdown(raw);
    let summary = render_markdown(&summary_source(raw));
    let summary_img_url = first_image_src(&content_html);

    DerivedContent {
        content_html,
        summary,
        summary_img_url,
    }
}

/// First [`SUMMARY_LINES`] newline-delimited lines of `raw`.
pub fn summary_source(raw: &str) -> String {
    raw.split('\n').take(SUMMARY_LINES).collect::<Vec<_>>().join("\n")
}

/// Render Markdown to HTML with the fixed extension list.
pub fn render_markdown(text: &str) -> String {
    let options = EXTENSIONS
        .iter()
        .fold(Options::empty(), |acc, ext| acc | ext.parser_options());

    let events: Vec<Event> = TextMergeStream::new(Parser::new_ext(text, options)).collect();
    let events = EXTENSIONS
        .iter()
        .fold(events, |events, ext| ext.transform(events));

    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// `src` of the first `img` element in document order.
pub fn first_image_src(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let src = fragment
        .select(&IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_owned);
    src
}

fn highlight_code_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let class = match kind {
                    CodeBlockKind::Fenced(lang) => language_class(&lang),
                    CodeBlockKind::Indented => String::new(),
                };
                Event::Html(CowStr::from(format!(
                    "<div class=\"codehilite\"><pre><code{}>",
                    class
                )))
            }
            Event::End(TagEnd::CodeBlock) => Event::Html(CowStr::from("</code></pre></div>\n")),
            other => other,
        })
        .collect()
}

fn language_class(info: &str) -> String {
    let lang: String = info
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect();
    if lang.is_empty() {
        String::new()
    } else {
        format!(" class=\"language-{}\"", lang)
    }
}

fn expand_wikilinks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut in_code_block = false;

    for event in events {
        match event {
            // After code highlighting, code blocks are delimited by raw HTML
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                out.push(event);
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                out.push(event);
            }
            Event::Html(ref html) if html.starts_with("<div class=\"codehilite\">") => {
                in_code_block = true;
                out.push(event);
            }
            Event::Html(ref html) if html.starts_with("</code></pre></div>") => {
                in_code_block = false;
                out.push(event);
            }
            Event::Text(text) if !in_code_block && WIKILINK.is_match(&text) => {
                split_wikilinks(&text, &mut out);
            }
            other => out.push(other),
        }
    }
    out
}

fn split_wikilinks<'a>(text: &str, out: &mut Vec<Event<'a>>) {
    let mut last = 0;
    for caps in WIKILINK.captures_iter(text) {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let label = label.as_str().trim();
        if label.is_empty() {
            continue;
        }
        if whole.start() > last {
            out.push(Event::Text(CowStr::from(text[last..whole.start()].to_string())));
        }
        let target = WIKILINK_SPACES.replace_all(label, "_");
        out.push(Event::InlineHtml(CowStr::from(format!(
            "<a class=\"wikilink\" href=\"/{}/\">{}</a>",
            target, label
        ))));
        last = whole.end();
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIX_LINES_WITH_IMAGE: &str = "# Cats\n\
        ![a cat](https://img.example.com/cat.png)\n\
        Cats are great.\n\
        They sleep a lot.\n\
        They purr.\n\
        This sixth line stays out of the summary.";

    #[test]
    fn test_derive_six_lines_with_image() {
        let derived = derive(SIX_LINES_WITH_IMAGE);

        assert!(derived
            .content_html
            .contains(r#"<img src="https://img.example.com/cat.png" alt="a cat" />"#));
        assert!(derived.content_html.contains("sixth line"));

        let first_five = SIX_LINES_WITH_IMAGE.lines().take(5).collect::<Vec<_>>().join("\n");
        assert_eq!(derived.summary, render_markdown(&first_five));
        assert!(!derived.summary.contains("sixth line"));

        assert_eq!(
            derived.summary_img_url.as_deref(),
            Some("https://img.example.com/cat.png")
        );
    }

    #[test]
    fn test_no_image_yields_no_thumbnail() {
        let derived = derive("just words\n\nand more words");
        assert_eq!(derived.summary_img_url, None);
        assert!(derived.content_html.contains("<p>just words</p>"));
    }

    #[test]
    fn test_first_image_wins_and_raw_html_counts() {
        let derived = derive("<img src=\"/first.png\">\n\n![second](/second.png)");
        assert_eq!(derived.summary_img_url.as_deref(), Some("/first.png"));
    }

    #[test]
    fn test_summary_source_takes_five_lines() {
        assert_eq!(summary_source("a\nb\nc\nd\ne\nf\ng"), "a\nb\nc\nd\ne");
        assert_eq!(summary_source("only one"), "only one");
        assert_eq!(summary_source(""), "");
    }

    #[test]
    fn test_tables_and_footnotes() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\nNote[^1]\n\n[^1]: the note\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("footnote"));
    }

    #[test]
    fn test_fenced_code_gets_highlight_wrapper() {
        let html = render_markdown("```rust\nlet x = 1 < 2;\n```\n");
        assert!(html.starts_with("<div class=\"codehilite\"><pre><code class=\"language-rust\">"));
        assert!(html.contains("let x = 1 &lt; 2;"));
        assert!(html.trim_end().ends_with("</code></pre></div>"));
    }

    #[test]
    fn test_wikilinks_outside_code_only() {
        let html = render_markdown("See [[Rust  Book]] for more.");
        assert!(html.contains(r#"<a class="wikilink" href="/Rust_Book/">Rust  Book</a>"#));
        assert!(html.contains("See "));
        assert!(html.contains(" for more."));

        let code = render_markdown("```\n[[Not A Link]]\n```\n");
        assert!(!code.contains("wikilink"));
        let inline = render_markdown("`[[Nope]]`");
        assert!(!inline.contains("wikilink"));
    }

    #[test]
    fn test_malformed_markdown_degrades() {
        let derived = derive("**unclosed *emphasis [link](\n```\nunterminated fence");
        assert!(!derived.content_html.is_empty());
        assert_eq!(derived.summary_img_url, None);
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_markdown("a < b & c");
        assert!(html.contains("a &lt; b &amp; c"));
    }
}
