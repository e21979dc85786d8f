//! Tolerant markup tree
//!
//! Card HTML is frequently malformed (unclosed `<br>`, stray end tags,
//! unquoted attributes). [`parse`] never fails: it builds the best tree it
//! can and keeps whatever it could not tokenize as plain text.
//!
//! The XML tokenizer underneath is stricter than HTML, so the input is first
//! passed through [`escape_raw_text`]: a `<` that cannot open a tag, and the
//! bodies of `script`/`style`/`template`, are escaped to `&lt;` so they reach
//! the tree as text instead of swallowing what follows them.

mod extract;

pub use extract::{
    extract, find_first, to_text, ExtractedContent, EMBEDDED_FRONT_CLASS, STUDY_REGION_CLASS,
};

use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::debug;

/// Tag name given to the synthetic root that holds top-level nodes
pub const DOCUMENT_TAG: &str = "#document";

/// Elements that never have children or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose contents are not visible text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template"];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>?").expect("valid tag regex"));

/// A node in the markup tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(Element),
    Text(String),
}

/// An element with its tag, attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name
    pub tag: String,
    /// Attributes in source order, names lowercased, values entity-decoded
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attribute value by (case-insensitive) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// True when the whitespace-separated `class` attribute contains `token`
    pub fn has_class(&self, token: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == token))
            .unwrap_or(false)
    }

    /// Non-empty `lang` attribute
    pub fn lang(&self) -> Option<&str> {
        self.attr("lang").map(str::trim).filter(|lang| !lang.is_empty())
    }

    /// Child elements, skipping text nodes
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            MarkupNode::Element(element) => Some(element),
            MarkupNode::Text(_) => None,
        })
    }

    /// Visible text: every text node trimmed, empty ones dropped, the rest
    /// joined with single spaces. Script and style contents are skipped.
    pub fn visible_text(&self) -> String {
        let mut pieces = Vec::new();
        collect_text(self, &mut pieces);
        pieces.join(" ")
    }
}

fn collect_text<'a>(element: &'a Element, pieces: &mut Vec<&'a str>) {
    if HIDDEN_ELEMENTS.contains(&element.tag.as_str()) {
        return;
    }
    for child in &element.children {
        match child {
            MarkupNode::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    pieces.push(trimmed);
                }
            }
            MarkupNode::Element(inner) => collect_text(inner, pieces),
        }
    }
}

/// Parse markup into a tree rooted at a synthetic [`DOCUMENT_TAG`] element
pub fn parse(markup: &str) -> Element {
    let escaped = escape_raw_text(markup);
    let markup: &str = &escaped;
    let mut reader = Reader::from_str(markup);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.check_comments = false;
    }

    let mut builder = TreeBuilder::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let element = element_from(&start);
                if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    builder.append(MarkupNode::Element(element));
                } else {
                    builder.open(element);
                }
            }
            Ok(Event::Empty(start)) => builder.append(MarkupNode::Element(element_from(&start))),
            Ok(Event::End(end)) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                builder.close(&name);
            }
            Ok(Event::Text(text)) => {
                let raw = String::from_utf8_lossy(&text);
                builder.text(html_escape::decode_html_entities(&raw).into_owned());
            }
            Ok(Event::CData(data)) => {
                builder.text(String::from_utf8_lossy(&data).into_owned());
            }
            Ok(Event::Eof) => break,
            // Comments, doctype, declarations, processing instructions
            Ok(_) => {}
            Err(err) => {
                let consumed = usize::try_from(reader.buffer_position()).unwrap_or(markup.len());
                debug!(error = %err, position = consumed, "Markup tokenizer gave up; keeping rest as text");
                if let Some(rest) = markup.get(consumed..) {
                    builder.text(strip_tags(rest));
                }
                break;
            }
        }
    }

    builder.finish()
}

/// Remove anything tag-shaped and decode entities
pub fn strip_tags(markup: &str) -> String {
    let without_tags = TAG_RE.replace_all(markup, " ");
    html_escape::decode_html_entities(&without_tags).into_owned()
}

/// Escape every `<` the tokenizer would misread as a tag start: those not
/// followed by `[A-Za-z/!?]`, and any inside a raw-text element body
pub fn escape_raw_text(markup: &str) -> Cow<'_, str> {
    if !markup.contains('<') {
        return Cow::Borrowed(markup);
    }

    let bytes = markup.as_bytes();
    let mut out = String::with_capacity(markup.len() + 16);
    let mut pos = 0;
    while let Some(offset) = markup[pos..].find('<') {
        let start = pos + offset;
        out.push_str(&markup[pos..start]);

        let opens_tag = matches!(
            bytes.get(start + 1),
            Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?')
        );
        if !opens_tag {
            out.push_str("&lt;");
            pos = start + 1;
            continue;
        }

        let end = if markup[start..].starts_with("<!--") {
            markup[start..].find("-->").map(|i| start + i + 3)
        } else {
            tag_end(bytes, start)
        };
        let Some(end) = end else {
            // Unterminated tag; the tokenizer's own fallback handles the rest
            pos = start;
            break;
        };

        let tag = &markup[start..end];
        out.push_str(tag);
        pos = end;

        if let Some(name) = raw_text_element(tag) {
            let close = find_end_tag(markup, pos, name).unwrap_or(markup.len());
            out.push_str(&markup[pos..close].replace('<', "&lt;"));
            pos = close;
        }
    }
    out.push_str(&markup[pos..]);
    Cow::Owned(out)
}

/// Index just past the `>` closing the tag at `start`, skipping quoted values
fn tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(start + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i + 1),
            None => {}
        }
    }
    None
}

/// Name of a hidden element opened (not self-closed) by `tag`
fn raw_text_element(tag: &str) -> Option<&'static str> {
    if tag.starts_with("</") || tag.ends_with("/>") {
        return None;
    }
    let name: String = tag[1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    HIDDEN_ELEMENTS.iter().copied().find(|hidden| *hidden == name)
}

/// Start of the first `</name` at or after `from`, case-insensitive
fn find_end_tag(markup: &str, from: usize, name: &str) -> Option<usize> {
    let haystack = markup[from..].to_ascii_lowercase();
    let needle = format!("</{}", name);
    let mut search = 0;
    while let Some(i) = haystack[search..].find(&needle) {
        let at = search + i;
        let after = haystack.as_bytes().get(at + needle.len());
        if !matches!(after, Some(b) if b.is_ascii_alphanumeric()) {
            return Some(from + at);
        }
        search = at + needle.len();
    }
    None
}

fn element_from(start: &BytesStart<'_>) -> Element {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let attributes = start
        .html_attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = html_escape::decode_html_entities(&raw).into_owned();
            (key, value)
        })
        .collect();
    Element {
        tag,
        attributes,
        children: Vec::new(),
    }
}

/// Stack of open elements; index 0 is the document root
struct TreeBuilder {
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Element::new(DOCUMENT_TAG)],
        }
    }

    fn open(&mut self, element: Element) {
        self.stack.push(element);
    }

    fn append(&mut self, node: MarkupNode) {
        if let Some(top) = self.stack.last_mut() {
            top.children.push(node);
        }
    }

    fn text(&mut self, text: String) {
        if !text.is_empty() {
            self.append(MarkupNode::Text(text));
        }
    }

    /// Close the nearest open element named `tag`, implicitly closing
    /// anything opened after it. Stray end tags are ignored.
    fn close(&mut self, tag: &str) {
        let Some(index) = self.stack.iter().rposition(|open| open.tag == tag) else {
            return;
        };
        if index == 0 {
            return;
        }
        while self.stack.len() > index {
            self.pop_into_parent();
        }
    }

    fn pop_into_parent(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.append(MarkupNode::Element(element));
        }
    }

    fn finish(mut self) -> Element {
        while self.stack.len() > 1 {
            self.pop_into_parent();
        }
        self.stack
            .pop()
            .unwrap_or_else(|| Element::new(DOCUMENT_TAG))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(root: &Element) -> &Element {
        root.child_elements().next().expect("has element")
    }

    #[test]
    fn test_parse_nested_elements() {
        let root = parse(r#"<div class="a b"><span lang="en-US">hi</span></div>"#);
        assert_eq!(root.tag, DOCUMENT_TAG);

        let div = first_element(&root);
        assert_eq!(div.tag, "div");
        assert!(div.has_class("a"));
        assert!(div.has_class("b"));
        assert!(!div.has_class("a b"));

        let span = first_element(div);
        assert_eq!(span.lang(), Some("en-US"));
        assert_eq!(span.visible_text(), "hi");
    }

    #[test]
    fn test_void_elements_do_not_swallow_siblings() {
        let root = parse("<div>one<br>two<img src=x.png>three</div>");
        let div = first_element(&root);
        assert_eq!(div.visible_text(), "one two three");
        assert_eq!(div.child_elements().count(), 2);
    }

    #[test]
    fn test_unclosed_and_stray_end_tags_are_tolerated() {
        let root = parse("<div><p>first<p>second</div></span>tail");
        assert_eq!(root.visible_text(), "first second tail");
    }

    #[test]
    fn test_unquoted_and_uppercase_attributes() {
        let root = parse("<DIV CLASS=README LANG=es-ES>hola</DIV>");
        let div = first_element(&root);
        assert_eq!(div.tag, "div");
        assert!(div.has_class("README"));
        assert_eq!(div.lang(), Some("es-ES"));
    }

    #[test]
    fn test_entities_are_decoded() {
        let root = parse("<p>Tom &amp; Jerry&nbsp;&lt;3</p>");
        assert_eq!(root.visible_text(), "Tom & Jerry\u{a0}<3");
    }

    #[test]
    fn test_script_and_style_are_not_visible() {
        let root = parse("<style>.x{color:red}</style><p>shown</p><script>var a = 1;</script>");
        assert_eq!(root.visible_text(), "shown");
    }

    #[test]
    fn test_empty_lang_counts_as_absent() {
        let root = parse(r#"<span lang="">x</span>"#);
        assert_eq!(first_element(&root).lang(), None);
    }

    #[test]
    fn test_escape_raw_text() {
        assert_eq!(escape_raw_text("<p>plain</p>"), "<p>plain</p>");
        assert_eq!(escape_raw_text("5 < 6"), "5 &lt; 6");
        assert_eq!(escape_raw_text("a <3"), "a &lt;3");
        assert_eq!(
            escape_raw_text("<STYLE>a<b{}</STYLE><i>x</i>"),
            "<STYLE>a&lt;b{}</STYLE><i>x</i>"
        );
        assert_eq!(
            escape_raw_text(r#"<a title="1 > 0">x</a> < y"#),
            r#"<a title="1 > 0">x</a> &lt; y"#
        );
        assert_eq!(escape_raw_text("<!-- a < b -->c"), "<!-- a < b -->c");
    }

    #[test]
    fn test_unclosed_script_hides_only_itself() {
        let root = parse("<p>seen</p><script>if (a<b) {");
        assert_eq!(root.visible_text(), "seen");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>bold</b> &amp; plain").trim(), "bold  & plain");
    }
}
