//! Conversion between `scraper` trees and detached HTML values.

use digester_core::domain::{HtmlElement, HtmlSelection};
use scraper::{ElementRef, Html};

/// Parse a full document; the selection holds its root `<html>` element.
pub fn parse_document(text: &str) -> HtmlSelection {
    let document = Html::parse_document(text);
    HtmlSelection::single(detach(document.root_element()))
}

/// Re-parse a detached element so it can be queried.
///
/// A root `<html>` element is parsed as a document; anything else as a body
/// fragment. Table parts are wrapped in the ancestors the parser requires,
/// otherwise their tags would be dropped.
pub(crate) fn reparse(element: &HtmlElement) -> Html {
    if element.tag.eq_ignore_ascii_case("html") {
        return Html::parse_document(&element.html);
    }
    match table_context(&element.tag) {
        Some((open, close)) => Html::parse_fragment(&format!("{open}{}{close}", element.html)),
        None => Html::parse_fragment(&element.html),
    }
}

/// The re-parsed counterpart of `element` inside `tree`.
///
/// Falls back to the tree root for tags a fragment cannot hold, such as
/// `body`.
pub(crate) fn scope<'a>(tree: &'a Html, element: &HtmlElement) -> ElementRef<'a> {
    let root = tree.root_element();
    if element.tag.eq_ignore_ascii_case("html") {
        return root;
    }
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name().eq_ignore_ascii_case(&element.tag))
        .unwrap_or(root)
}

fn table_context(tag: &str) -> Option<(&'static str, &'static str)> {
    match tag.to_ascii_lowercase().as_str() {
        "caption" | "colgroup" | "thead" | "tbody" | "tfoot" => Some(("<table>", "</table>")),
        "col" => Some(("<table><colgroup>", "</colgroup></table>")),
        "tr" => Some(("<table><tbody>", "</tbody></table>")),
        "td" | "th" => Some(("<table><tbody><tr>", "</tr></tbody></table>")),
        _ => None,
    }
}

/// Copy what the engine needs out of a live element.
pub(crate) fn detach(element: ElementRef<'_>) -> HtmlElement {
    HtmlElement {
        tag: element.value().name().to_string(),
        id: element.value().id().map(str::to_string),
        text: normalize_whitespace(&element.text().collect::<String>()),
        html: element.html(),
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
