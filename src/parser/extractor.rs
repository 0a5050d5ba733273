use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::Story;
use crate::parser::{DetailEntry, ListingEntry, SelectorConfig, StructureError};

/// Compiled selectors plus the base URL used to resolve relative links.
#[derive(Debug, Clone)]
pub struct PageParser {
    base_url: Url,
    story: Selector,
    story_head: Selector,
    story_link: Selector,
    update_marker: Selector,
    pager: Selector,
    title: Selector,
    config: SelectorConfig,
}

impl PageParser {
    pub fn new(config: SelectorConfig, base_url: Url) -> Result<Self, StructureError> {
        Ok(Self {
            base_url,
            story: compile(&config.story)?,
            story_head: compile(&config.story_head)?,
            story_link: compile(&config.story_link)?,
            update_marker: compile(&config.update_marker)?,
            pager: compile(&config.pager)?,
            title: compile("title")?,
            config,
        })
    }

    /// Extract every story entry of a listing page, in page order.
    pub fn parse_listing(&self, body: &str) -> Result<Vec<ListingEntry>, StructureError> {
        let document = Html::parse_document(body);

        document
            .select(&self.story)
            .map(|story| self.parse_story(story))
            .collect()
    }

    fn parse_story(&self, story: ElementRef<'_>) -> Result<ListingEntry, StructureError> {
        let head = story
            .select(&self.story_head)
            .next()
            .ok_or_else(|| StructureError::MissingElement(self.config.story_head.clone()))?;

        let link = head
            .select(&self.story_link)
            .next()
            .ok_or_else(|| StructureError::MissingElement(self.config.story_link.clone()))?;

        let href = link
            .value()
            .attr("href")
            .ok_or_else(|| StructureError::MissingAttribute {
                element: self.config.story_link.clone(),
                attribute: "href",
            })?;

        let url = self
            .base_url
            .join(href)
            .map_err(|_| StructureError::InvalidLink(href.to_string()))?;

        let update_marker = story
            .select(&self.update_marker)
            .next()
            .ok_or_else(|| StructureError::MissingElement(self.config.update_marker.clone()))?;

        Ok(ListingEntry {
            id: Story::id_from_url(url.as_str())?,
            title: text_of(link).trim().to_string(),
            update_marker: text_of(update_marker),
            url: url.into(),
        })
    }

    /// Extract the current title and marker from a story's own page.
    pub fn parse_detail(&self, body: &str) -> Result<DetailEntry, StructureError> {
        let document = Html::parse_document(body);

        let title = document
            .select(&self.title)
            .next()
            .ok_or_else(|| StructureError::MissingElement("title".to_string()))?;
        let title = text_of(title);
        let title = title
            .split(self.config.title_delimiter.as_str())
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let update_marker = document
            .select(&self.update_marker)
            .next()
            .ok_or_else(|| StructureError::MissingElement(self.config.update_marker.clone()))?;

        Ok(DetailEntry {
            title,
            update_marker: text_of(update_marker),
        })
    }

    /// Number of listing pages, read from the last non-empty pager child.
    pub fn page_count(&self, body: &str) -> Result<u32, StructureError> {
        let document = Html::parse_document(body);

        let pager = document
            .select(&self.pager)
            .next()
            .ok_or_else(|| StructureError::MissingElement(self.config.pager.clone()))?;

        let last = pager
            .children()
            .filter_map(|node| match ElementRef::wrap(node) {
                Some(element) => Some(text_of(element)),
                None => node.value().as_text().map(|t| t.text.to_string()),
            })
            .filter(|text| !text.trim().is_empty())
            .last()
            .ok_or_else(|| StructureError::InvalidPageCount(String::new()))?;

        last.trim()
            .parse::<u32>()
            .map_err(|_| StructureError::InvalidPageCount(last.trim().to_string()))
    }
}

fn compile(selector: &str) -> Result<Selector, StructureError> {
    Selector::parse(selector).map_err(|e| StructureError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}
