use serde::{Deserialize, Serialize};

/// CSS selectors describing the forum markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One element per story on a listing page
    pub story: String,

    /// Header block inside a story element that holds the link
    pub story_head: String,

    /// Link to the story page, searched inside `story_head`
    pub story_link: String,

    /// Element whose text is used as the change marker
    pub update_marker: String,

    /// Pager block; its last non-empty child is the page count
    pub pager: String,

    /// Glyph separating the story title from the site name in `<title>`
    pub title_delimiter: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            story: ".shortstory".to_string(),
            story_head: ".shortstoryHead".to_string(),
            story_link: "a[href]".to_string(),
            update_marker: ".staticInfoLeftData".to_string(),
            pager: ".block_4".to_string(),
            title_delimiter: "»".to_string(),
        }
    }
}
