use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use once_cell::sync::Lazy;
use pulldown_cmark::{Options, Parser, html};
use regex::Regex;

/// First ATX heading of a page, without a trailing `{#anchor}`.
static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^#{1,6}\s+(.+?)(?:\s+\{#\S+\})?\s*$").expect("heading pattern is valid")
});

pub fn extract_title(markdown: &str) -> Option<String> {
    HEADING
        .captures(markdown)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Text content of an HTML document, skipping `<script>` and `<style>`.
pub fn html_to_text(html: &str) -> String {
    let dom = get_dom(html);
    let mut out = String::new();
    walk_html(&dom.document, &mut out);
    out
}

/// What gets indexed as a page's `content`.
pub fn markdown_to_plaintext(markdown: &str) -> String {
    html_to_text(&markdown_to_html(markdown))
}

fn get_dom(html: &str) -> RcDom {
    // Reading from an in-memory cursor cannot fail.
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut std::io::Cursor::new(html))
        .unwrap_or_default()
}

fn is_skipped(local: &LocalName) -> bool {
    matches!(&**local, "script" | "style")
}

fn walk_html(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => {
            out.push_str(&contents.borrow());
        }
        NodeData::Element { name, .. } => {
            if is_skipped(&name.local) {
                return;
            }
            for child in handle.children.borrow().iter() {
                walk_html(child, out);
            }
        }
        _ => {
            for child in handle.children.borrow().iter() {
                walk_html(child, out);
            }
        }
    }
}
