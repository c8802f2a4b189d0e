use nf_core::{Error, Result};
use scraper::{Html, Selector};

/// Paragraphs at or below this many characters are treated as boilerplate.
const MIN_PARAGRAPH_CHARS: usize = 40;
const MAX_PARAGRAPHS: usize = 8;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Extraction(format!("Invalid selector {}: {}", css, e)))
}

fn first_text(document: &Html, css: &str) -> Result<String> {
    Ok(document
        .select(&selector(css)?)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default())
}

fn meta_content(document: &Html, css: &str) -> Result<String> {
    Ok(document
        .select(&selector(css)?)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default())
}

/// Pulls the readable part out of an HTML page: the headline, the description
/// and the first few substantial paragraphs, separated by blank lines.
pub fn extract_readable_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    let title = first_text(&document, "head > title")?;
    let og_title = meta_content(&document, r#"meta[property="og:title"]"#)?;
    let mut description = meta_content(&document, r#"meta[name="description"]"#)?;
    if description.is_empty() {
        description = meta_content(&document, r#"meta[property="og:description"]"#)?;
    }

    let paragraphs: Vec<String> = document
        .select(&selector("p")?)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .take(MAX_PARAGRAPHS)
        .collect();
    let body = paragraphs.join("\n\n");

    let headline = if og_title.is_empty() { &title } else { &og_title };
    let combined = [headline.as_str(), description.as_str(), body.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if !combined.is_empty() {
        return Ok(combined);
    }
    Ok(if title.is_empty() { description } else { title })
}
