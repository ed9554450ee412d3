//! Turns feed summaries into plain-text previews.

use scraper::{ElementRef, Html};

/// Maximum preview length in characters, not counting the ellipsis.
pub const PREVIEW_LIMIT: usize = 150;

const ELLIPSIS: &str = "...";

/// Decoded text can still carry markup that was entity-escaped in the
/// source (`&lt;script&gt;`), so the text is re-parsed until it is stable.
/// Anything still tag-shaped after the last pass is defused.
const MAX_PASSES: usize = 8;

/// Elements whose content is never shown to a reader.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "object", "embed", "svg", "math",
    "head", "title",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p",
    "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Strip markup, collapse whitespace and cut the result down to a preview.
pub fn clean(raw: &str) -> String {
    truncate(&collapse_whitespace(&strip_markup(raw)))
}

/// Extract the visible text of an HTML fragment.
pub fn strip_markup(raw: &str) -> String {
    let mut text = fragment_text(raw);
    for _ in 1..MAX_PASSES {
        if !text.contains('<') {
            return text;
        }
        let next = fragment_text(&text);
        if next == text {
            break;
        }
        text = next;
    }
    defuse_tags(&text)
}

/// Drop every `<` that could open a tag, comment or processing instruction.
/// A lone `<` followed by a space or digit stays.
fn defuse_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?'));
        if !opens_tag {
            out.push(c);
        }
    }
    out
}

fn fragment_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let mut out = String::with_capacity(raw.len());
    collect_text(fragment.root_element(), &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push(' ');
            }
            collect_text(child_element, out);
            if block {
                out.push(' ');
            }
        }
    }
}

/// Collapse runs of whitespace (newlines and tabs included) into single
/// spaces and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
