//! Document handling on top of `scraper`.
//!
//! Parsed documents are not `Send`, so they only ever live inside
//! synchronous sections. An item anchor leaves the listing as an
//! [`AnchorSnapshot`]: the shared raw listing plus the anchor's position
//! among the item selector's matches. The item task parses the listing
//! again on its own and finds the anchor by that position.

use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, OnceLock};

fn body_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("body").expect("body selector is valid"))
}

/// Parses a CSS selector, reporting the parser's complaint as text.
///
/// # Errors
///
/// Returns the parse error message.
pub fn parse_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| e.to_string())
}

/// Parses a full document.
#[must_use]
pub fn parse(raw: &str) -> Html {
    Html::parse_document(raw)
}

/// The `body` of a document, or its root element if there is none.
#[must_use]
pub fn body(document: &Html) -> ElementRef<'_> {
    document
        .select(body_selector())
        .next()
        .unwrap_or_else(|| document.root_element())
}

/// Applies `selector` to the descendants of `scope`. An empty selector
/// targets `scope` itself.
///
/// # Errors
///
/// Returns the parse error message if the selector is invalid.
pub fn select_targets<'a>(scope: ElementRef<'a>, selector: &str) -> Result<Vec<ElementRef<'a>>, String> {
    if selector.trim().is_empty() {
        return Ok(vec![scope]);
    }
    let selector = parse_selector(selector)?;
    Ok(scope.select(&selector).collect())
}

/// Parses `listing` and returns one snapshot per element matching
/// `selector`, in document order.
///
/// # Errors
///
/// Returns the parse error message if the selector is invalid.
pub fn find_anchors(listing: Arc<str>, selector: &str) -> Result<Vec<AnchorSnapshot>, String> {
    let selector = Arc::new(parse_selector(selector)?);
    let count = parse(&listing).select(&selector).count();

    Ok((0..count)
        .map(|index| AnchorSnapshot {
            listing: Arc::clone(&listing),
            selector: Arc::clone(&selector),
            index,
        })
        .collect())
}

/// An owned, thread-safe handle on one item anchor of a listing.
#[derive(Debug, Clone)]
pub struct AnchorSnapshot {
    listing: Arc<str>,
    selector: Arc<Selector>,
    index: usize,
}

impl AnchorSnapshot {
    /// The raw listing the anchor belongs to.
    #[must_use]
    pub fn listing(&self) -> &str {
        &self.listing
    }

    /// Position of the anchor among the item selector's matches.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parses the listing.
    #[must_use]
    pub fn parse(&self) -> AnchorDocument {
        AnchorDocument {
            html: parse(&self.listing),
            selector: Arc::clone(&self.selector),
            index: self.index,
        }
    }
}

/// A parsed listing with one of its anchors picked out.
#[derive(Debug)]
pub struct AnchorDocument {
    html: Html,
    selector: Arc<Selector>,
    index: usize,
}

impl AnchorDocument {
    /// The whole listing document.
    #[must_use]
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The anchor element, falling back to the document body.
    #[must_use]
    pub fn anchor(&self) -> ElementRef<'_> {
        self.html
            .select(&self.selector)
            .nth(self.index)
            .unwrap_or_else(|| body(&self.html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><head><title>Top Rated</title></head><body>
          <table class="chart"><tbody>
            <tr><td class="titleColumn"><a href="/title/tt001/">The Matrix</a></td></tr>
            <tr><td class="titleColumn"><a href="/title/tt002/?a=1&amp;b=&quot;2&quot;">Heat</a></td></tr>
          </tbody></table>
        </body></html>
    "#;

    fn anchors(selector: &str) -> Vec<AnchorSnapshot> {
        find_anchors(Arc::from(LISTING), selector).unwrap()
    }

    #[test]
    fn test_find_anchors_in_order() {
        let anchors = anchors(".chart tbody tr");
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[1].index(), 1);

        let first = anchors[0].parse();
        assert_eq!(first.anchor().value().name(), "tr");
        assert!(first.anchor().text().collect::<String>().contains("The Matrix"));

        let second = anchors[1].parse();
        assert!(second.anchor().text().collect::<String>().contains("Heat"));
    }

    #[test]
    fn test_anchor_document_is_the_whole_listing() {
        let anchors = anchors("tr");
        let doc = anchors[1].parse();

        let rows = parse_selector("tr").unwrap();
        assert_eq!(doc.html().select(&rows).count(), 2);

        let title = parse_selector("head title").unwrap();
        let text: String = doc.html().select(&title).flat_map(|t| t.text()).collect();
        assert_eq!(text, "Top Rated");
        assert_eq!(anchors[0].listing(), LISTING);
    }

    #[test]
    fn test_anchor_scope_keeps_ancestors_reachable() {
        let anchors = anchors("tr");
        let doc = anchors[0].parse();

        let targets = select_targets(doc.anchor(), "td.titleColumn a").unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].value().attr("href"), Some("/title/tt001/"));
        assert!(doc.anchor().ancestors().filter_map(ElementRef::wrap).any(|e| e.value().name() == "table"));
    }

    #[test]
    fn test_attributes_are_decoded() {
        let anchors = anchors("tr");
        let doc = anchors[1].parse();

        let targets = select_targets(doc.anchor(), "a").unwrap();
        assert_eq!(targets[0].value().attr("href"), Some("/title/tt002/?a=1&b=\"2\""));
    }

    #[test]
    fn test_empty_selector_targets_scope() {
        let anchors = anchors("a");
        let doc = anchors[0].parse();

        let targets = select_targets(doc.anchor(), "").unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].value().name(), "a");
    }

    #[test]
    fn test_void_anchor() {
        let anchors = find_anchors(Arc::from("<div><img src=\"/a.png\"><p>x</p></div>"), "img").unwrap();
        let doc = anchors[0].parse();
        assert_eq!(doc.anchor().value().attr("src"), Some("/a.png"));
    }

    #[test]
    fn test_body_scope() {
        let doc = parse("<html><body><div class=\"summary\">Plot</div></body></html>");
        let targets = select_targets(body(&doc), ".summary").unwrap();
        assert_eq!(targets[0].text().collect::<String>(), "Plot");
    }

    #[test]
    fn test_invalid_selector() {
        assert!(parse_selector("tr[").is_err());
        assert!(find_anchors(Arc::from(LISTING), ":::").is_err());
    }

    #[test]
    fn test_snapshot_is_send() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnchorSnapshot>();
    }
}
