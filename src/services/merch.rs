// src/services/merch.rs

//! Merch page extractor.
//!
//! Locates product containers, then pulls a title, price, stock flag and
//! link out of each one. Every field has a placeholder so a located
//! container always becomes an item.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{ExtractionConfig, MerchItem, UNKNOWN_PRICE, UNKNOWN_TITLE, parse_selector};
use crate::utils::absolutize;

use super::strategy::{first_containing, first_match, non_empty, text_containing_or};

/// Ways of finding product containers, in priority order.
#[derive(Debug, Clone)]
enum ContainerStrategy {
    /// Elements matching a known container selector
    Selector(Selector),
    /// Parents of any element whose text carries the product marker
    MarkerAncestor,
}

/// Extracts [`MerchItem`]s from the collection page.
#[derive(Debug, Clone)]
pub struct MerchExtractor {
    /// Scheme and host that relative links are appended to
    origin: String,
    containers: Vec<ContainerStrategy>,
    title_sel: Selector,
    price_sel: Selector,
    sold_out_sel: Selector,
    link_sel: Selector,
    marker: String,
    currency: String,
    sold_out_phrase: String,
}

impl MerchExtractor {
    /// Build an extractor, parsing every configured selector up front.
    pub fn new(config: &ExtractionConfig, base_url: &str) -> Result<Self> {
        let mut containers = config
            .container_selectors
            .iter()
            .map(|s| parse_selector(s).map(ContainerStrategy::Selector))
            .collect::<Result<Vec<_>>>()?;
        containers.push(ContainerStrategy::MarkerAncestor);

        Ok(Self {
            origin: Url::parse(base_url)?.origin().ascii_serialization(),
            containers,
            title_sel: parse_selector(&config.title_selector)?,
            price_sel: parse_selector(&config.price_selector)?,
            sold_out_sel: parse_selector(&config.sold_out_selector)?,
            link_sel: parse_selector(&config.link_selector)?,
            marker: config.product_marker.clone(),
            currency: config.currency_symbol.clone(),
            sold_out_phrase: config.sold_out_phrase.clone(),
        })
    }

    /// Extract every product found in `html`.
    pub fn extract(&self, html: &str) -> Vec<MerchItem> {
        let document = Html::parse_document(html);
        let containers = self.locate_containers(&document);
        log::debug!("Found {} product container(s)", containers.len());

        containers
            .into_iter()
            .map(|container| self.extract_item(container))
            .collect()
    }

    fn locate_containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        first_match(&self.containers, |strategy| match strategy {
            ContainerStrategy::Selector(selector) => {
                non_empty(document.select(selector).collect())
            }
            ContainerStrategy::MarkerAncestor => non_empty(self.marker_ancestors(document)),
        })
        .unwrap_or_default()
    }

    /// Distinct parents of marker-bearing elements, in document order.
    fn marker_ancestors<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let mut seen = HashSet::new();
        document
            .select(&self.title_sel)
            .filter(|el| el.text().collect::<String>().contains(&self.marker))
            .filter_map(|el| el.parent().and_then(ElementRef::wrap))
            .filter(|parent| seen.insert(parent.id()))
            .collect()
    }

    fn extract_item(&self, container: ElementRef<'_>) -> MerchItem {
        let title = text_containing_or(container, &self.title_sel, &self.marker, UNKNOWN_TITLE);
        let price = text_containing_or(container, &self.price_sel, &self.currency, UNKNOWN_PRICE);
        let sold_out =
            first_containing(container, &self.sold_out_sel, &self.sold_out_phrase).is_some();

        let url = match container
            .select(&self.link_sel)
            .next()
            .and_then(|link| link.value().attr("href"))
        {
            Some(href) if !href.is_empty() => absolutize(&self.origin, href),
            _ => String::new(),
        };

        MerchItem {
            title,
            price,
            url,
            sold_out,
        }
    }
}
