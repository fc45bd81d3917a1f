// src/services/extractor.rs

//! Infobox field extraction.
//!
//! Reads whatever heading/value pairs the page's infobox holds. Field names
//! are not fixed: the key is the normalized heading exactly as the page wrote
//! it, so a renamed heading shows up as a new field instead of being dropped.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{FieldValue, ListSection, Record};
use crate::utils::{clean_text, element_text, normalize, parse_selector};

/// Missing-tag for a page without an infobox.
pub const PANEL_MISSING: &str = "infobox_missing";

const PANEL: &str = "div.infobox";
const ROW: &str = "div.infobox-datarow";
const HEADING: &str = ".data-heading";
const CONTENT: &str = ".data-content";
const LIST_ITEM: &str = "li";
const TAB_PANEL_CLASS: &str = "tabber__panel";

/// Attributes a tab panel may carry its title in, in preference order.
const TAB_TITLE_ATTRS: [&str; 3] = ["data-mw-tabber-title", "data-title", "title"];

/// Turns entity page markup into a Record.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    panel: Selector,
    row: Selector,
    heading: Selector,
    content: Selector,
    list_item: Selector,
    list_sections: Vec<(Selector, String)>,
    units: Regex,
    open_paren: Regex,
    close_paren: Regex,
}

impl FieldExtractor {
    /// Create an extractor with optional extra list sections.
    pub fn new(list_sections: &[ListSection]) -> Result<Self> {
        let list_sections = list_sections
            .iter()
            .map(|s| Ok((parse_selector(&s.selector)?, s.field.clone())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            panel: parse_selector(PANEL)?,
            row: parse_selector(ROW)?,
            heading: parse_selector(HEADING)?,
            content: parse_selector(CONTENT)?,
            list_item: parse_selector(LIST_ITEM)?,
            list_sections,
            // Compound rates first so `C$/kg` goes as one unit.
            units: Regex::new(r"(?i)C\$\s*/\s*kg|kg\s*/\s*C\$|kg\b|C\$")?,
            open_paren: Regex::new(r"\(\s+")?,
            close_paren: Regex::new(r"\s+\)")?,
        })
    }

    /// Extract a Record from page markup. Never fails.
    ///
    /// Without an infobox the Record is tagged `infobox_missing` and holds
    /// only what the list sections found.
    pub fn extract(&self, html: &str, id: &str, name: &str, url: &str) -> Record {
        let document = Html::parse_document(html);
        let mut record = Record::new(id, name, url);

        match document.select(&self.panel).next() {
            Some(panel) => self.read_panel(&panel, &mut record),
            None => {
                log::debug!("No infobox on {}", url);
                record.add_missing(PANEL_MISSING);
            }
        }

        self.read_list_sections(&document, &mut record);
        record
    }

    /// Read every data row of the panel in document order, tab panels included.
    fn read_panel(&self, panel: &ElementRef<'_>, record: &mut Record) {
        for row in panel.select(&self.row) {
            let (Some(heading), Some(content)) = (
                row.select(&self.heading).next(),
                row.select(&self.content).next(),
            ) else {
                continue;
            };

            let key = Record::field_key(normalize(&element_text(&heading)));
            if key.is_empty() {
                continue;
            }

            let Some(value) = self.read_value(&content) else {
                continue;
            };

            let key = match (record.get(&key), tab_title(&row, panel)) {
                (None, _) => key,
                (Some(_), Some(tab)) => format!("{key} ({})", normalize(&tab)),
                (Some(_), None) => {
                    log::debug!("Duplicate heading '{}' on {}", key, record.url);
                    continue;
                }
            };
            if record.get(&key).is_none() {
                record.insert(key, value);
            }
        }
    }

    /// List when the content holds list items, scalar text otherwise.
    fn read_value(&self, content: &ElementRef<'_>) -> Option<FieldValue> {
        let items: Vec<String> = content
            .select(&self.list_item)
            .map(|li| self.tidy_parens(&element_text(&li)))
            .filter(|s| !s.is_empty())
            .collect();

        if !items.is_empty() {
            return Some(FieldValue::List(items));
        }

        let text = self.tidy_parens(&self.strip_units(&element_text(content)));
        (!text.is_empty()).then_some(FieldValue::Text(text))
    }

    /// Strip `kg` / `C$` decorations when what remains is a number or range.
    pub fn strip_units(&self, value: &str) -> String {
        let stripped = clean_text(&self.units.replace_all(value, " "));
        if is_numeric_like(&stripped) {
            stripped
        } else {
            value.to_string()
        }
    }

    /// Remove whitespace just inside parentheses: `( 5 )` becomes `(5)`.
    pub fn tidy_parens(&self, value: &str) -> String {
        let opened = self.open_paren.replace_all(value, "(");
        self.close_paren.replace_all(&opened, ")").into_owned()
    }

    fn read_list_sections(&self, document: &Html, record: &mut Record) {
        for (selector, field) in &self.list_sections {
            let items: Vec<String> = document
                .select(selector)
                .flat_map(|container| container.select(&self.list_item))
                .map(|li| element_text(&li))
                .filter(|s| !s.is_empty())
                .collect();

            if !items.is_empty() {
                record.insert(field.clone(), items);
            }
        }
    }
}

/// Title of the tab panel holding `row`, if it sits inside one below `panel`.
fn tab_title(row: &ElementRef<'_>, panel: &ElementRef<'_>) -> Option<String> {
    let tab = row
        .ancestors()
        .take_while(|node| node.id() != panel.id())
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().classes().any(|c| c == TAB_PANEL_CLASS))?;

    TAB_TITLE_ATTRS
        .iter()
        .find_map(|attr| tab.value().attr(attr))
        .map(str::to_string)
        .or_else(|| {
            tab.value()
                .id()
                .map(|id| id.trim_start_matches("tabber-").replace('_', " "))
        })
        .filter(|t| !t.trim().is_empty())
}

fn is_numeric_like(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || " .,-+~%x/".contains(c))
}
