// src/services/tour.rs

//! Tour page extractor.
//!
//! Date elements are found by class keyword or, failing that, by month
//! name. Location and venue are read positionally from the nodes that
//! follow the date inside the same parent, counting every child node
//! including the whitespace between tags. Nothing checks that those nodes
//! really hold a city and a venue; pretty-printed or reordered markup
//! yields shifted fields rather than an error.

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::Result;
use crate::models::{ExtractionConfig, TourEntry, UNKNOWN_LOCATION, UNKNOWN_VENUE, parse_selector};

use super::strategy::{first_match, non_empty, text_of};

/// Ways of finding date elements, in priority order.
#[derive(Debug, Clone)]
enum DateStrategy {
    /// Elements whose class list contains one of the keywords
    ClassKeyword {
        selector: Selector,
        keywords: Vec<String>,
    },
    /// Elements whose text mentions a month
    MonthName {
        selector: Selector,
        months: Vec<String>,
    },
}

impl DateStrategy {
    fn locate<'a>(&self, document: &'a Html) -> Option<Vec<ElementRef<'a>>> {
        let found = match self {
            Self::ClassKeyword { selector, keywords } => document
                .select(selector)
                .filter(|el| {
                    let classes = el.value().classes().collect::<Vec<_>>().join(" ");
                    keywords.iter().any(|k| classes.contains(k.as_str()))
                })
                .collect(),
            Self::MonthName { selector, months } => document
                .select(selector)
                .filter(|el| {
                    let text = text_of(*el);
                    months.iter().any(|m| text.contains(m.as_str()))
                })
                .collect(),
        };
        non_empty(found)
    }
}

/// Extracts [`TourEntry`]s from the tour page.
#[derive(Debug, Clone)]
pub struct TourExtractor {
    strategies: Vec<DateStrategy>,
}

impl TourExtractor {
    /// Build an extractor, parsing every configured selector up front.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            strategies: vec![
                DateStrategy::ClassKeyword {
                    selector: parse_selector(&config.tour_container_selector)?,
                    keywords: config.tour_class_keywords.clone(),
                },
                DateStrategy::MonthName {
                    selector: parse_selector(&config.month_selector)?,
                    months: config.month_names.clone(),
                },
            ],
        })
    }

    /// Extract every tour date found in `html`.
    pub fn extract(&self, html: &str) -> Vec<TourEntry> {
        let document = Html::parse_document(html);
        let dates = first_match(&self.strategies, |s| s.locate(&document)).unwrap_or_default();
        log::debug!("Found {} tour date element(s)", dates.len());

        dates.into_iter().map(entry_from).collect()
    }
}

/// An empty date element still counts as an entry.
fn entry_from(date_el: ElementRef<'_>) -> TourEntry {
    let (location, venue) = following_texts(date_el);
    TourEntry {
        date: text_of(date_el).trim().to_string(),
        location: location.unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        venue: venue.unwrap_or_else(|| UNKNOWN_VENUE.to_string()),
    }
}

/// Text of the first and second sibling nodes after `element`.
///
/// Every child of the parent counts, so the newline between two tags is a
/// sibling whose trimmed text is `""`. Comments count but yield `None`.
fn following_texts(element: ElementRef<'_>) -> (Option<String>, Option<String>) {
    let Some(parent) = element.parent() else {
        return (None, None);
    };

    let siblings: Vec<_> = parent
        .children()
        .map(|node| {
            let text = match node.value() {
                Node::Text(t) => Some(t.trim().to_string()),
                Node::Element(_) => ElementRef::wrap(node).map(|el| text_of(el).trim().to_string()),
                _ => None,
            };
            (node.id(), text)
        })
        .collect();

    let Some(pos) = siblings.iter().position(|(id, _)| *id == element.id()) else {
        return (None, None);
    };
    let nth = |offset: usize| siblings.get(pos + offset).and_then(|(_, text)| text.clone());
    (nth(1), nth(2))
}
