//! Dataset categories and crawl targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A named dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Creatures,
    Tools,
    Enchantments,
    EnchantmentCategories,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Creatures,
        Category::Tools,
        Category::Enchantments,
        Category::EnchantmentCategories,
    ];

    /// Canonical dataset name.
    pub fn name(self) -> &'static str {
        match self {
            Category::Creatures => "creatures",
            Category::Tools => "tools",
            Category::Enchantments => "enchantments",
            Category::EnchantmentCategories => "enchantment-categories",
        }
    }

    /// File name of the persisted dataset.
    pub fn file_name(self) -> &'static str {
        match self {
            Category::Creatures => "bestiary.json",
            Category::Tools => "rods.json",
            Category::Enchantments => "enchants.json",
            Category::EnchantmentCategories => "enchant_categories.json",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "creatures" | "bestiary" | "fish" => Ok(Category::Creatures),
            "tools" | "rods" => Ok(Category::Tools),
            "enchantments" | "enchants" | "enchant" => Ok(Category::Enchantments),
            "enchantment-categories" | "enchant-categories" | "categories"
            | "enchantmentcategory" => Ok(Category::EnchantmentCategories),
            _ => Err(AppError::unknown_dataset(s)),
        }
    }
}

/// What a single crawl run fetches.
///
/// The enchantment page yields two datasets at once, so targets and
/// categories are not one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlTarget {
    Creatures,
    Tools,
    Enchantments,
}

impl CrawlTarget {
    pub const ALL: [CrawlTarget; 3] = [
        CrawlTarget::Creatures,
        CrawlTarget::Tools,
        CrawlTarget::Enchantments,
    ];
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlTarget::Creatures => "creatures",
            CrawlTarget::Tools => "tools",
            CrawlTarget::Enchantments => "enchantments",
        };
        f.write_str(name)
    }
}
