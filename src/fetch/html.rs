// src/fetch/html.rs
// =============================================================================
// This module extracts crawlable links from HTML pages.
//
// We use the `scraper` crate to parse the page and select every <a href>,
// and the `url` crate to resolve relative hrefs against the page URL.
//
// Only http/https links survive. Anchors, mailto:, tel: and javascript:
// hrefs are dropped, and the #fragment of a resolved link is removed so
// `/docs#intro` and `/docs` name the same page.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// Extracts all crawlable links from HTML content
//
// Parameters:
//   html: the page body
//   page_url: the URL the body was fetched from (base for relative links)
//   same_host: when Some(host), links on any other host are dropped
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   page_url = "https://example.com/page"
//   result = ["https://example.com/docs"]
pub fn extract_links(html: &str, page_url: &str, same_host: Option<&str>) -> Vec<String> {
    let mut links = Vec::new();

    let base = match Url::parse(page_url) {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(url = page_url, "cannot resolve links against an invalid page URL");
            return links;
        }
    };

    let document = Html::parse_document(html);
    // The selector is a constant, parsing it cannot fail
    let selector = Selector::parse("a[href]").expect("static selector is valid");

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve_link(&base, href) else {
            continue;
        };

        if let Some(host) = same_host {
            if link.host_str() != Some(host) {
                continue;
            }
        }

        links.push(link.to_string());
    }

    links
}

// Resolves a possibly-relative href to an absolute http(s) URL
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    // join() handles both absolute and relative hrefs
    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);

    Some(url)
}
