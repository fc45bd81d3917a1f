// src/services/tables.rs

//! Enchantment table extraction.
//!
//! The enchantment page keeps one table per category, each under its own
//! heading. One pass over the page yields two datasets: every enchantment,
//! and one Record per category describing its section.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{Dataset, Record, TableSection, TableSourceConfig};
use crate::utils::{clean_text, element_text, normalize, parse_selector, slug};

/// Missing-tag for a category whose heading is not on the page.
pub const SECTION_MISSING: &str = "section_missing";
/// Missing-tag for a category heading with no table after it.
pub const TABLE_MISSING: &str = "table_missing";
/// Missing-tag for an enchantment row without effect text.
pub const EFFECT_MISSING: &str = "effect";

/// Both datasets read from the enchantment page.
#[derive(Debug, Default)]
pub struct TableDatasets {
    pub enchantments: Dataset,
    pub categories: Dataset,
}

/// A located category section.
struct Section<'a> {
    table: Option<ElementRef<'a>>,
    relic: Option<String>,
    description: Option<String>,
}

pub struct TableExtractor {
    sections: Vec<TableSection>,
    row: Selector,
    list_item: Selector,
}

impl TableExtractor {
    pub fn new(config: &TableSourceConfig) -> Result<Self> {
        Ok(Self {
            sections: config.sections.clone(),
            row: parse_selector("tr")?,
            list_item: parse_selector("li")?,
        })
    }

    /// Read every configured section of the page.
    ///
    /// An enchantment listed in more than one section keeps its first
    /// position and takes the later section's data.
    pub fn extract(&self, html: &str, url: &str) -> TableDatasets {
        let document = Html::parse_document(html);
        let mut out = TableDatasets::default();

        for config in &self.sections {
            let Some(section) = locate_section(&document, &config.heading) else {
                log::warn!("Section '{}' not found on {}", config.heading, url);
                out.categories.insert(
                    config.key.clone(),
                    Record::stub(&config.key, &config.heading, url, SECTION_MISSING),
                );
                continue;
            };

            let mut category = Record::new(&config.key, &config.heading, url);
            let Some(table) = section.table else {
                log::warn!("Section '{}' has no table on {}", config.heading, url);
                category.add_missing(TABLE_MISSING);
                out.categories.insert(config.key.clone(), category);
                continue;
            };

            let enchants = self.read_table(&table, &config.key, url);
            let names: Vec<String> = enchants.iter().map(|r| r.name.clone()).collect();
            log::debug!("Section '{}': {} enchantments", config.heading, names.len());

            for record in enchants {
                out.enchantments.insert(record.id.clone(), record);
            }

            if names.is_empty() {
                category.add_missing("enchants");
            } else {
                category.insert("enchants", names);
            }
            if let Some(relic) = section.relic {
                category.insert("relic", relic);
            }
            if let Some(description) = section.description {
                category.insert("description", description);
            }
            out.categories.insert(config.key.clone(), category);
        }

        out
    }

    /// Body rows with at least two cells; the first row is the header.
    fn read_table(&self, table: &ElementRef<'_>, category: &str, url: &str) -> Vec<Record> {
        table
            .select(&self.row)
            .skip(1)
            .filter_map(|row| {
                let cells: Vec<ElementRef<'_>> = row
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| matches!(c.value().name(), "td" | "th"))
                    .collect();
                if cells.len() < 2 {
                    return None;
                }

                let name = element_text(&cells[0]);
                let key = slug(&name);
                if key.is_empty() {
                    return None;
                }

                let mut record = Record::new(key, name, url);
                record.insert("category", category);

                let effect = self
                    .list_items(&cells[1])
                    .unwrap_or_else(|| split_effects(&element_text(&cells[1])));
                if effect.is_empty() {
                    record.add_missing(EFFECT_MISSING);
                }
                record.insert("effect", effect);

                let tips = match cells.get(2) {
                    Some(cell) => self.list_items(cell).unwrap_or_else(|| text_lines(cell)),
                    None => Vec::new(),
                };
                record.insert("tips", tips);

                Some(record)
            })
            .collect()
    }

    fn list_items(&self, cell: &ElementRef<'_>) -> Option<Vec<String>> {
        let items: Vec<String> = cell
            .select(&self.list_item)
            .map(|li| element_text(&li))
            .filter(|s| !s.is_empty())
            .collect();
        (!items.is_empty()).then_some(items)
    }
}

fn heading_level(element: &ElementRef<'_>) -> Option<u8> {
    match element.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        _ => None,
    }
}

/// Find the first h2-h4 containing `heading`, then scan forward to its table.
///
/// The scan ends at the first table or at the next heading of the same or a
/// higher level, whichever comes first.
fn locate_section<'a>(document: &'a Html, heading: &str) -> Option<Section<'a>> {
    let needle = normalize(heading);
    let mut elements = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap);

    let found = elements.by_ref().find(|el| {
        heading_level(el).is_some_and(|l| (2..=4).contains(&l))
            && normalize(&element_text(el)).contains(&needle)
    })?;
    let level = heading_level(&found)?;

    let mut section = Section {
        table: None,
        relic: None,
        description: None,
    };

    for el in elements {
        if el.ancestors().any(|a| a.id() == found.id()) {
            continue;
        }
        if heading_level(&el).is_some_and(|l| l <= level) {
            break;
        }
        match el.value().name() {
            "table" => {
                section.table = Some(el);
                break;
            }
            "p" if section.description.is_none() => {
                let text = element_text(&el);
                if !text.is_empty() {
                    section.description = Some(text);
                }
            }
            "a" if section.relic.is_none() => {
                let text = element_text(&el);
                if text.contains("Relic") {
                    section.relic = Some(text);
                }
            }
            _ => {}
        }
    }

    Some(section)
}

/// Split effect text into sentences at `.` or `,` followed by whitespace.
///
/// Punctuation right after a digit never splits, so `1.5x` survives.
pub fn split_effects(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let boundary = matches!(c, '.' | ',')
            && !prev.is_some_and(|p| p.is_ascii_digit())
            && chars.peek().is_some_and(|n| n.is_whitespace());
        if boundary {
            parts.push(clean_text(&current));
            current.clear();
        } else {
            current.push(c);
        }
        prev = Some(c);
    }
    parts.push(clean_text(&current));

    parts.retain(|p| !p.is_empty());
    parts
}

/// Non-empty lines of a cell, with `<br>` and block elements breaking lines.
fn text_lines(cell: &ElementRef<'_>) -> Vec<String> {
    let mut raw = String::new();
    for node in cell.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(el) if matches!(el.name(), "br" | "p" | "div") => raw.push('\n'),
            _ => {}
        }
    }
    raw.lines()
        .map(clean_text)
        .filter(|line| !line.is_empty())
        .collect()
}
