//! Field extraction from a detail page.
//!
//! Layout convention:
//!
//! ```text
//! .event-page.editorial-content          container (required)
//!   h1                                   title
//!   p.preamble                           preamble
//!   .text-body.editorial-html p          body paragraphs, joined with '\n'
//!   time.date[datetime]                  publication timestamp
//!   .published-container span            second span is the author
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::domain::DetailEntry;

/// Extract the structured fields of one detail document.
///
/// Returns `None` when the document has no event container. Individual
/// missing fields are left as `None`.
pub fn parse_detail_document(html: &str) -> Option<DetailEntry> {
    let document = Html::parse_document(html);
    let container = document.select(&selector(".event-page.editorial-content")?).next()?;

    let title = first_text(container, "h1");
    let preamble = first_text(container, "p.preamble");

    let body = container
        .select(&selector(".text-body.editorial-html")?)
        .next()
        .and_then(|body| {
            let paragraphs = selector("p")?;
            Some(
                body.select(&paragraphs)
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        });

    let published_datetime = container
        .select(&selector("time.date")?)
        .next()
        .and_then(|time| time.value().attr("datetime"))
        .map(str::to_string)
        .filter(|value| !value.is_empty());

    let author = container
        .select(&selector(".published-container span")?)
        .nth(1)
        .map(element_text);

    Some(DetailEntry {
        title,
        preamble,
        body,
        published_datetime,
        author,
    })
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css)?;
    scope.select(&sel).next().map(element_text)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
