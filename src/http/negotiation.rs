//! Accept-header content negotiation by substring containment.
//!
//! Quality weights are not parsed. Several predicates may hold at once;
//! the caller picks the priority.

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_PLAIN: &str = "text/plain";

/// View over a (trimmed) `Accept` header value.
#[derive(Debug, Clone, Copy)]
pub struct Accept<'a>(&'a str);

impl<'a> Accept<'a> {
    pub fn new(value: &'a str) -> Self {
        Self(value)
    }

    pub fn contains(&self, media_type: &str) -> bool {
        self.0.contains(media_type)
    }

    pub fn wants_json(&self) -> bool {
        self.contains(APPLICATION_JSON)
    }

    pub fn wants_html(&self) -> bool {
        self.contains(TEXT_HTML)
    }

    pub fn wants_plain_text(&self) -> bool {
        self.contains(TEXT_PLAIN)
    }
}
