use crate::csv_format::{self, Table};
use crate::error::Result;
use crate::models::bookmark::{BookmarkRecord, METADATA_COLUMNS};
use crate::models::resolved::ResolvedCollection;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

pub const COLLECTIONS_FILE: &str = "collections.csv";
pub const BOOKMARKS_FILE: &str = "bookmarks.csv";

pub const COLLECTION_COLUMNS: [&str; 7] = [
    "id",
    "title",
    "parentId",
    "collectionPath",
    "fullPath",
    "rootCollection",
    "group",
];

/// One row per resolved collection
pub fn collections_table(collections: &[ResolvedCollection]) -> Table {
    Table {
        header: COLLECTION_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: collections
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.title.clone(),
                    c.parent_id.as_ref().map(|p| p.to_string()).unwrap_or_default(),
                    c.path.clone(),
                    c.full_path.clone(),
                    c.root_title.clone(),
                    c.group.clone(),
                ]
            })
            .collect(),
    }
}

/// Bookmark-native columns in first-seen order, then the metadata columns
pub fn bookmark_columns(records: &[BookmarkRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for column in record.columns() {
            if !METADATA_COLUMNS.contains(&column) && !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    columns.extend(METADATA_COLUMNS.iter().map(|c| c.to_string()));
    columns
}

pub fn bookmarks_table(records: &[BookmarkRecord]) -> Table {
    let header = bookmark_columns(records);
    let rows = records
        .iter()
        .map(|record| {
            header
                .iter()
                .map(|column| record.get(column).unwrap_or_default().to_string())
                .collect()
        })
        .collect();
    Table { header, rows }
}

pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, csv_format::format_table(table))?;
    Ok(())
}

/// Write `collections.csv` into `dir`
pub fn write_collections(collections: &[ResolvedCollection], dir: &Path) -> Result<PathBuf> {
    let path = dir.join(COLLECTIONS_FILE);
    write_table(&collections_table(collections), &path)?;
    info!("Wrote {} collections to {:?}", collections.len(), path);
    Ok(path)
}

/// Write `bookmarks.csv` into `dir`; nothing is written for an empty set
pub fn write_bookmarks(records: &[BookmarkRecord], dir: &Path) -> Result<Option<PathBuf>> {
    if records.is_empty() {
        info!("No bookmarks to write");
        return Ok(None);
    }
    let path = dir.join(BOOKMARKS_FILE);
    write_table(&bookmarks_table(records), &path)?;
    info!("Wrote {} bookmarks to {:?}", records.len(), path);
    Ok(Some(path))
}
