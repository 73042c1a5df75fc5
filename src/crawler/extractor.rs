//! Structured content extraction
//!
//! Reduces a fetched page to two things:
//! - a set of content strings (heading sections and labeled entities)
//! - the absolute links the page points at
//!
//! Content strings take one of two shapes:
//!
//! ```text
//! Team:
//! We build crawlers.
//! Ask us anything.
//!
//! Email: contact@example.com
//! ```

use super::patterns::{categorize_link, find_emails, find_phone_numbers};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};
use url::Url;

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3"];

/// Elements whose text never reaches the reader
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Result of extracting one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Section blocks and labeled entities, deduplicated by value
    pub contents: BTreeSet<String>,

    /// Absolute http(s) links in document order, without duplicates
    pub links: Vec<String>,
}

/// Turns page markup into an [`Extraction`]
///
/// The extractor holds no per-page state and can be shared by every unit of
/// a crawl. Identical input always yields an identical extraction.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    headings: Option<Selector>,
    anchors: Option<Selector>,
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self {
            headings: compile_selector("h1, h2, h3"),
            anchors: compile_selector("a[href]"),
        }
    }

    /// Extracts sections, entities and links from `markup`
    ///
    /// Relative hrefs are resolved against `base_url`, which should be the
    /// URL the page was finally served from.
    ///
    /// # Example
    ///
    /// ```
    /// use sitesift::crawler::ContentExtractor;
    /// use url::Url;
    ///
    /// let html = r#"<h2>Contact</h2><p>Mail contact@example.com or meet <a href="/team">the team</a></p>"#;
    /// let base = Url::parse("https://example.com/").unwrap();
    /// let extraction = ContentExtractor::new().extract(html, &base);
    ///
    /// assert!(extraction.contents.contains("Contact:\nMail contact@example.com or meet the team"));
    /// assert!(extraction.contents.contains("Email: contact@example.com"));
    /// assert_eq!(extraction.links, vec!["https://example.com/team".to_string()]);
    /// ```
    pub fn extract(&self, markup: &str, base_url: &Url) -> Extraction {
        let document = Html::parse_document(markup);
        let mut contents = BTreeSet::new();

        self.collect_sections(&document, &mut contents);

        let page_text = visible_text(document.root_element());
        collect_text_entities(&page_text, &mut contents);

        let links = self.collect_anchors(&document, base_url, &mut contents);

        debug!(
            url = %base_url,
            contents = contents.len(),
            links = links.len(),
            "Extracted page"
        );

        Extraction { contents, links }
    }

    fn collect_sections(&self, document: &Html, contents: &mut BTreeSet<String>) {
        let Some(headings) = &self.headings else {
            return;
        };

        for heading in document.select(headings) {
            let title = visible_text(heading);
            let body = section_body(heading);
            if !body.is_empty() {
                contents.insert(format!("{}:\n{}", title, body));
            }
        }
    }

    /// Scans anchors for contact hrefs and category links, returning the
    /// links worth following
    fn collect_anchors(
        &self,
        document: &Html,
        base_url: &Url,
        contents: &mut BTreeSet<String>,
    ) -> Vec<String> {
        let Some(anchors) = &self.anchors else {
            return Vec::new();
        };

        let mut links = Vec::new();
        let mut seen = HashSet::new();

        for element in document.select(anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();

            if let Some(address) = strip_scheme(href, "mailto:") {
                for email in find_emails(address) {
                    contents.insert(format!("Email: {}", email));
                }
                continue;
            }
            if let Some(number) = strip_scheme(href, "tel:") {
                for phone in find_phone_numbers(number) {
                    contents.insert(format!("Phone number: {}", phone));
                }
                continue;
            }

            let Some(absolute) = resolve_link(href, base_url) else {
                continue;
            };

            for label in categorize_link(absolute.as_str()) {
                contents.insert(format!("{}: {}", label, absolute));
            }

            if element.value().attr("download").is_some() {
                continue;
            }
            if seen.insert(absolute.to_string()) {
                links.push(absolute.to_string());
            }
        }

        links
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_selector(source: &str) -> Option<Selector> {
    match Selector::parse(source) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(selector = source, error = ?e, "Skipping unparseable selector");
            None
        }
    }
}

/// Text of the siblings following a heading, one line per sibling, up to the
/// next h1-h3 sibling
fn section_body(heading: ElementRef<'_>) -> String {
    let mut lines = Vec::new();

    for sibling in heading.next_siblings() {
        match sibling.value() {
            Node::Element(element) if HEADING_TAGS.contains(&element.name()) => break,
            Node::Element(element) if HIDDEN_TAGS.contains(&element.name()) => {}
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(sibling) {
                    let line = visible_text(element);
                    if !line.is_empty() {
                        lines.push(line);
                    }
                }
            }
            Node::Text(text) => {
                let line = collapse_whitespace(text);
                if !line.is_empty() {
                    lines.push(line);
                }
            }
            _ => {}
        }
    }

    lines.join("\n")
}

fn collect_text_entities(text: &str, contents: &mut BTreeSet<String>) {
    for phone in find_phone_numbers(text) {
        contents.insert(format!("Phone number: {}", phone));
    }
    for email in find_emails(text) {
        contents.insert(format!("Email: {}", email));
    }
}

/// Rendered text of an element with whitespace collapsed to single spaces
fn visible_text(element: ElementRef<'_>) -> String {
    let mut buffer = String::new();
    push_text(element, &mut buffer);
    collapse_whitespace(&buffer)
}

fn push_text(element: ElementRef<'_>, buffer: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                buffer.push_str(text);
                buffer.push(' ');
            }
            Node::Element(inner) if HIDDEN_TAGS.contains(&inner.name()) => {}
            Node::Element(_) => {
                if let Some(inner) = ElementRef::wrap(child) {
                    push_text(inner, buffer);
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the part after `scheme` (case-insensitive), without any query
fn strip_scheme<'a>(href: &'a str, scheme: &str) -> Option<&'a str> {
    let prefix = href.get(..scheme.len())?;
    if !prefix.eq_ignore_ascii_case(scheme) {
        return None;
    }
    let rest = &href[scheme.len()..];
    Some(rest.split('?').next().unwrap_or(rest))
}

/// Resolves a link href to an absolute URL worth looking at
///
/// Returns None for:
/// - empty and fragment-only hrefs
/// - `javascript:` and `data:` URIs
/// - unparseable hrefs
/// - non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "data:", "mailto:", "tel:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}
