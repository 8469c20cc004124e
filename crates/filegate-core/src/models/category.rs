use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Coarse file classification used for size limits and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Document,
    Image,
    Archive,
    Data,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Document,
        Category::Image,
        Category::Archive,
        Category::Data,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Image => "image",
            Category::Archive => "archive",
            Category::Data => "data",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" => Ok(Category::Document),
            "image" => Ok(Category::Image),
            "archive" => Ok(Category::Archive),
            "data" => Ok(Category::Data),
            _ => Err(anyhow::anyhow!("Invalid file category: {}", s)),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
