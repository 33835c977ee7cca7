//! Main-content extraction from article HTML.
//!
//! Finds the article body using readability-style heuristics (`<article>`,
//! `<main>`, `[role="main"]`, then `<body>`), collects its paragraphs while
//! skipping page chrome, and returns clean text suitable for summarization.

use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Elements whose contents are never part of the article text.
const CHROME_TAGS: &[&str] = &[
    "nav", "header", "footer", "aside", "script", "style", "noscript", "svg", "iframe", "form",
    "figcaption",
];

/// Paragraphs shorter than this (in words) are treated as captions or widgets.
const MIN_PARAGRAPH_WORDS: usize = 4;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Readable content pulled from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Page title (`og:title`, then `<h1>`, then `<title>`).
    pub title: Option<String>,
    /// Article paragraphs joined by blank lines. May be empty.
    pub text: String,
}

/// Extract the title and main text from raw HTML.
pub fn extract_text(html: &str) -> PageText {
    let doc = Html::parse_document(html);
    PageText {
        title: extract_title(&doc),
        text: extract_main_text(&doc),
    }
}

fn extract_title(doc: &Html) -> Option<String> {
    let og = Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector");
    if let Some(content) = doc
        .select(&og)
        .next()
        .and_then(|el| el.value().attr("content"))
    {
        let title = collapse_whitespace(content);
        if !title.is_empty() {
            return Some(title);
        }
    }

    for sel in ["h1", "title"] {
        let selector = Selector::parse(sel).expect("title selector");
        if let Some(el) = doc.select(&selector).next() {
            let title = collapse_whitespace(&el.text().collect::<String>());
            if !title.is_empty() {
                return Some(title);
            }
        }
    }

    None
}

fn extract_main_text(doc: &Html) -> String {
    let containers = ["article", "main", r#"[role="main"]"#, "body"];
    let paragraph_sel = Selector::parse("p").expect("p selector");

    for sel_str in containers {
        let selector = Selector::parse(sel_str).expect("container selector");
        let Some(container) = doc.select(&selector).next() else {
            continue;
        };

        let paragraphs: Vec<String> = container
            .select(&paragraph_sel)
            .filter(|p| !inside_chrome(p))
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|p| p.split_whitespace().count() >= MIN_PARAGRAPH_WORDS)
            .collect();

        if !paragraphs.is_empty() {
            return paragraphs.join("\n\n");
        }

        // No usable paragraphs: fall back to the container's visible text.
        let text = visible_text(container);
        if !text.is_empty() {
            return text;
        }
    }

    String::new()
}

/// Whether an element sits inside navigation, headers, scripts and similar chrome.
fn inside_chrome(el: &ElementRef<'_>) -> bool {
    el.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| CHROME_TAGS.contains(&e.name()))
    })
}

/// All text under `root` that is not inside a chrome element, whitespace-collapsed.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| CHROME_TAGS.contains(&e.name()))
        });
        if !hidden {
            parts.push(&**text);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_article_paragraphs() {
        let html = r#"<html><head><title>Site | Story</title></head><body>
            <nav><p>Home News Sport Weather and more links here</p></nav>
            <article>
                <h1>Council approves budget</h1>
                <p>The city council approved the   annual budget on Tuesday night.</p>
                <p>Short caption</p>
                <aside><p>Related: five other stories you might like</p></aside>
                <p>Opponents said the plan cuts library funding too deeply.</p>
            </article>
            <footer><p>Copyright 2024 Example Media Group all rights</p></footer>
        </body></html>"#;

        let page = extract_text(html);
        assert_eq!(page.title.as_deref(), Some("Council approves budget"));
        assert_eq!(
            page.text,
            "The city council approved the annual budget on Tuesday night.\n\n\
             Opponents said the plan cuts library funding too deeply."
        );
    }

    #[test]
    fn prefers_og_title() {
        let html = r#"<html><head>
            <meta property="og:title" content="Rates rise again">
            <title>Example | Rates</title></head>
            <body><p>Central bank officials raised rates by a quarter point.</p></body></html>"#;
        let page = extract_text(html);
        assert_eq!(page.title.as_deref(), Some("Rates rise again"));
    }

    #[test]
    fn falls_back_to_body_paragraphs() {
        let html = r#"<html><body><div>
            <p>Researchers found the new battery lasts twice as long.</p>
        </div></body></html>"#;
        let page = extract_text(html);
        assert_eq!(
            page.text,
            "Researchers found the new battery lasts twice as long."
        );
    }

    #[test]
    fn falls_back_to_visible_text_without_script() {
        let html = r#"<html><body><main>
            <div>Markets closed higher after a volatile session.</div>
            <script>var tracking = "do not include";</script>
        </main></body></html>"#;
        let page = extract_text(html);
        assert_eq!(page.text, "Markets closed higher after a volatile session.");
    }

    #[test]
    fn empty_document_yields_empty_text() {
        let page = extract_text("");
        assert!(page.text.is_empty());
        assert!(page.title.is_none());
    }
}
