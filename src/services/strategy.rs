// src/services/strategy.rs

//! Building blocks shared by the extractors.
//!
//! Storefront markup drifts, so every lookup is an ordered list of
//! strategies. Each one returns `Option`; the first `Some` wins. Field
//! lookups end in a placeholder, so a located element always yields a record.

use scraper::{ElementRef, Selector};

/// Try `strategies` in order and return the first result.
pub fn first_match<S, T>(strategies: &[S], attempt: impl FnMut(&S) -> Option<T>) -> Option<T> {
    strategies.iter().find_map(attempt)
}

/// A strategy that found nothing did not match.
pub fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

/// Concatenated text of an element and all its descendants.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// First descendant matching `selector` whose text contains `needle`.
pub fn first_containing<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    needle: &str,
) -> Option<ElementRef<'a>> {
    scope
        .select(selector)
        .find(|el| text_of(*el).contains(needle))
}

/// Trimmed text of the first descendant containing `needle`, or `fallback`.
pub fn text_containing_or(
    scope: ElementRef<'_>,
    selector: &Selector,
    needle: &str,
    fallback: &str,
) -> String {
    first_containing(scope, selector, needle)
        .map(|el| text_of(el).trim().to_string())
        .unwrap_or_else(|| fallback.to_string())
}
