//! HTML parsing: title, readable body text, outbound links

use scraper::{Html, Selector};

/// Extracted content of one HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Document title, empty when absent
    pub title: String,

    /// Whitespace-normalized text of the body element
    pub body: String,

    /// Raw href values of `<a>` elements, unresolved
    pub links: Vec<String>,
}

/// Parses an HTML document into title, body text and links
///
/// Link hrefs are returned verbatim; resolving them against the page URL
/// and filtering them for admissibility is the caller's job.
pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        body: extract_body_text(&document),
        links: extract_hrefs(&document),
    }
}

fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Collects the body's text nodes, collapsing runs of whitespace
fn extract_body_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };

    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let raw: String = body.text().collect::<Vec<_>>().join(" ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}
