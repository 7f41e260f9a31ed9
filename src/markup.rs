//! Thin query layer over `scraper` with DOM-style lookups.

use scraper::{ElementRef, Html, Selector};

use crate::error::{CrawlError, Result};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CrawlError::Parse(format!("bad selector {:?}: {:?}", css, e)))
}

pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        let sel = selector(&format!(r#"[id="{}"]"#, id)).ok()?;
        self.html.select(&sel).next()
    }

    pub fn select_first(&self, css: &str) -> Result<Option<ElementRef<'_>>> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).next())
    }
}

pub fn select_first_in<'a>(el: ElementRef<'a>, css: &str) -> Result<Option<ElementRef<'a>>> {
    let sel = selector(css)?;
    Ok(el.select(&sel).next())
}

pub fn select_all_in<'a>(el: ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>> {
    let sel = selector(css)?;
    Ok(el.select(&sel).collect())
}

/// Concatenated text of the element and its descendants, like `textContent`.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Element children only, skipping text and comment nodes.
pub fn child_elements(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap).collect()
}
