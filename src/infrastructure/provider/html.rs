//! HTML to plain text

use scraper::{ElementRef, Html, Selector};

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "br", "li", "tr", "td", "th", "section",
    "article",
];

/// Visible text of an HTML page, one block per line
pub fn html_to_text(raw: &str) -> String {
    let document = Html::parse_document(raw);

    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next());

    let text = match body {
        Some(body) => element_text(&body),
        None => element_text(&document.root_element()),
    };

    normalize_text(&text)
}

/// Heuristic: treat the payload as HTML when it opens with a tag
pub fn looks_like_html(raw: &str) -> bool {
    let head: String = raw
        .trim_start()
        .chars()
        .take(512)
        .collect::<String>()
        .to_ascii_lowercase();

    head.starts_with('<')
        && (head.starts_with("<!doctype") || head.contains("<html") || head.contains("</"))
}

fn element_text(element: &ElementRef) -> String {
    let mut text = String::new();

    for node in element.children() {
        if let Some(el) = ElementRef::wrap(node) {
            let tag = el.value().name();

            if matches!(tag, "script" | "style" | "noscript" | "head" | "template") {
                continue;
            }

            let block = BLOCK_TAGS.contains(&tag);
            if block && !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }

            text.push_str(&element_text(&el));

            if block {
                text.push('\n');
            } else if matches!(tag, "span" | "b" | "strong" | "em" | "a") {
                text.push(' ');
            }
        } else if let Some(txt) = node.value().as_text() {
            text.push_str(txt);
        }
    }

    text
}

fn normalize_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
