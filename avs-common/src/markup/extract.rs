//! Study-region text extraction
//!
//! Card templates mark the text meant for speech with a `README` class on a
//! `div`. Back templates often embed the whole front side inside a
//! `from-front` container, so the answer side can ask for those nested
//! regions to be skipped.

use serde::{Deserialize, Serialize};

use super::{parse, Element, MarkupNode};

/// Class token marking the authoritative study region
pub const STUDY_REGION_CLASS: &str = "README";

/// Class token of the container holding duplicated front-side markup
pub const EMBEDDED_FRONT_CLASS: &str = "from-front";

/// Text and language tag pulled out of a card side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub text: String,
    pub language: Option<String>,
}

/// Extract the study region's text and innermost language tag.
///
/// Falls back to the whole document's text (and no language) when no study
/// region is found. Never fails.
pub fn extract(markup: &str, exclude_embedded_front: bool) -> ExtractedContent {
    if markup.is_empty() {
        return ExtractedContent::default();
    }

    let document = parse(markup);
    let is_region = |el: &Element| el.tag == "div" && el.has_class(STUDY_REGION_CLASS);
    let is_excluded_container =
        |el: &Element| exclude_embedded_front && el.tag == "div" && el.has_class(EMBEDDED_FRONT_CLASS);

    match find_first(&document, &is_region, &is_excluded_container) {
        Some(region) => ExtractedContent {
            text: region.visible_text(),
            language: innermost_language(region),
        },
        None => ExtractedContent {
            text: document.visible_text(),
            language: None,
        },
    }
}

/// Whole-document visible text
pub fn to_text(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }
    parse(markup).visible_text()
}

/// Depth-first, document-order search for the first element satisfying
/// `matches`. Elements satisfying `prune` are still tested themselves, but
/// their descendants are never visited.
pub fn find_first<'a>(
    element: &'a Element,
    matches: &dyn Fn(&Element) -> bool,
    prune: &dyn Fn(&Element) -> bool,
) -> Option<&'a Element> {
    if matches(element) {
        return Some(element);
    }
    if prune(element) {
        return None;
    }
    element
        .child_elements()
        .find_map(|child| find_first(child, matches, prune))
}

/// Language of the most deeply nested element carrying `lang`, relative to
/// `region` (depth 0). Ties go to the first one in document order.
fn innermost_language(region: &Element) -> Option<String> {
    let mut deepest: Option<(usize, &str)> = None;
    visit_langs(region, 0, &mut deepest);
    deepest
        .map(|(_, lang)| lang)
        .or_else(|| region.lang())
        .map(str::to_string)
}

fn visit_langs<'a>(element: &'a Element, depth: usize, deepest: &mut Option<(usize, &'a str)>) {
    if let Some(lang) = element.lang() {
        let is_deeper = deepest.map_or(true, |(best_depth, _)| depth > best_depth);
        if is_deeper {
            *deepest = Some((depth, lang));
        }
    }
    for child in &element.children {
        if let MarkupNode::Element(inner) = child {
            visit_langs(inner, depth + 1, deepest);
        }
    }
}
