//! Catalog loading
//!
//! The catalog is a CSV file with a header row. Row order defines the item
//! identifiers: the first data row is item 0, the second item 1, and so on.
//! Those indices are what the rotation queue and exclusion list refer to, so
//! reordering the file reshuffles identities; appending is the safe edit.

use std::path::Path;

use serde::Deserialize;

use crate::error::{CatalogError, Result};

/// Columns every catalog row must provide. Extra columns are ignored.
const REQUIRED_COLUMNS: [&str; 3] = ["title", "date", "image_url"];

/// One catalog entry. Immutable once loaded; identity is its position in the
/// catalog, not a field.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub title: String,
    pub date: String,
    pub image_url: String,
}

impl Item {
    /// The caption published alongside the rendered image.
    pub fn caption(&self) -> String {
        format!("{}, {}", self.title, self.date).to_lowercase()
    }
}

/// The full, ordered item list.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    /// Read the catalog from a CSV file.
    ///
    /// Fails if the file is missing, unreadable, lacks one of the required
    /// header columns, or contains no data rows. No side effects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(CatalogError::ReadError)?;
        Self::parse(&content)
    }

    /// Parse catalog CSV content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(content.as_bytes());

        let headers = reader.headers().map_err(CatalogError::Malformed)?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(CatalogError::MissingColumn(column.to_string()).into());
            }
        }

        let mut items = Vec::new();
        for record in reader.deserialize() {
            let item: Item = record.map_err(CatalogError::Malformed)?;
            items.push(item);
        }

        if items.is_empty() {
            return Err(CatalogError::Empty.into());
        }

        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
title,date,image_url
Old Mill,1922,https://assets.example/0.tif
Stone Bridge,1934,https://assets.example/1.tif
Water Tower,ca. 1940,https://assets.example/2.tif
";

    #[test]
    fn test_parse_indexes_by_row_order() {
        let catalog = Catalog::parse(SAMPLE).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(0).unwrap().title, "Old Mill");
        assert_eq!(catalog.get(1).unwrap().title, "Stone Bridge");
        assert_eq!(catalog.get(2).unwrap().date, "ca. 1940");
        assert!(catalog.get(3).is_none());
    }

    #[test]
    fn test_parse_ignores_extra_columns() {
        let content = "\
id,title,date,image_url,notes
a,Old Mill,1922,https://assets.example/0.tif,damaged negative
";
        let catalog = Catalog::parse(content).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().image_url, "https://assets.example/0.tif");
    }

    #[test]
    fn test_parse_missing_column() {
        let content = "title,date\nOld Mill,1922\n";
        let result = Catalog::parse(content);
        match result {
            Err(crate::error::RotacastError::Catalog(CatalogError::MissingColumn(col))) => {
                assert_eq!(col, "image_url");
            }
            other => panic!("Expected missing column error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_catalog() {
        let content = "title,date,image_url\n";
        let result = Catalog::parse(content);
        assert!(matches!(
            result,
            Err(crate::error::RotacastError::Catalog(CatalogError::Empty))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load("/nonexistent/items.csv");
        assert!(matches!(
            result,
            Err(crate::error::RotacastError::Catalog(CatalogError::ReadError(_)))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_caption_is_title_comma_date_lowercased() {
        let item = Item {
            title: "Stone Bridge".to_string(),
            date: "Ca. 1934".to_string(),
            image_url: "https://assets.example/1.tif".to_string(),
        };
        assert_eq!(item.caption(), "stone bridge, ca. 1934");
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let content = "\
title,date,image_url
\"Mill, Old\",1922,https://assets.example/0.tif
";
        let catalog = Catalog::parse(content).unwrap();
        assert_eq!(catalog.get(0).unwrap().title, "Mill, Old");
        assert_eq!(catalog.get(0).unwrap().caption(), "mill, old, 1922");
    }
}
