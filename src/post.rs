//! What the publishing side needs from a [`Title`]: link, cover and post text.
//! Nothing here talks to the network.

use serde::Serialize;

use crate::crawler::book_url;
use crate::models::Title;

pub fn cover_url(id: u64) -> String {
    format!("https://img.ridicdn.net/cover/{}/xxlarge?dpi=xhdpi", id)
}

/// Groups digits by thousands, e.g. `12000` -> `"12,000"`.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub text: String,
    pub link: String,
    pub link_title: String,
    pub cover_url: String,
}

impl PostDraft {
    pub fn from_title(title: &Title, base_url: &str) -> Self {
        Self {
            text: format!(
                "《{}》\n{} | {}원",
                title.title,
                title.sub_text,
                format_price(title.price)
            ),
            link: book_url(base_url, title.id),
            link_title: title.title.clone(),
            cover_url: cover_url(title.id),
        }
    }
}
