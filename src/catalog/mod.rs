//! Document index.
//!
//! Turns a materialised document collection into the ordered catalog the
//! presentation layer browses and the search index is built from.

mod collection;

pub use collection::*;

use serde::Serialize;

use crate::codec::split_metadata_and_body;
use crate::errors::AppError;
use crate::models::{Category, DocumentItem};

/// Sort key of documents without an explicit order.
pub const UNORDERED: i64 = i64::MAX;

/// One raw document of the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    /// Collection-relative path with `/` separators
    pub path: String,
    pub raw: String,
}

impl CollectionEntry {
    pub fn new(path: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw: raw.into(),
        }
    }
}

/// Parse and order a collection.
///
/// Entries without a recognized category are left out. Ordering is ascending
/// by `order`, unordered documents last, ties in encounter order.
pub fn build_catalog(entries: &[CollectionEntry]) -> Vec<DocumentItem> {
    let mut documents: Vec<DocumentItem> = entries
        .iter()
        .filter_map(|entry| {
            let (metadata, body) = split_metadata_and_body(&entry.raw);
            let Some(category) = metadata.recognized_category() else {
                tracing::debug!("Skipping {}: no recognized category", entry.path);
                return None;
            };
            let priority = metadata.recognized_priority();

            Some(DocumentItem {
                id: entry.path.clone(),
                title: metadata
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| fallback_title(&entry.path)),
                category,
                body,
                order: metadata.order,
                priority,
            })
        })
        .collect();

    // sort_by_key is stable, which keeps encounter order for equal keys.
    documents.sort_by_key(|d| (d.order.unwrap_or(UNORDERED), d.order.is_none()));
    documents
}

fn fallback_title(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
    if stem.trim().is_empty() {
        "Untitled".to_string()
    } else {
        stem.to_string()
    }
}

/// Lowercase a title and collapse everything outside `[a-z0-9]` into single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Collection-relative identifier of a new document.
pub fn new_document_id(category: Category, title: &str) -> Result<String, AppError> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(AppError::Validation(format!(
            "Title {:?} does not produce a usable file name",
            title
        )));
    }
    Ok(format!("{}/{}.md", category.as_str(), slug))
}

/// Catalog entry count per category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: Category,
    pub label: &'static str,
    pub count: usize,
}

/// The ordered catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    documents: Vec<DocumentItem>,
}

impl Catalog {
    pub fn build(entries: &[CollectionEntry]) -> Self {
        Self {
            documents: build_catalog(entries),
        }
    }

    pub fn documents(&self) -> &[DocumentItem] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DocumentItem> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &DocumentItem> {
        self.documents.iter().filter(move |d| d.category == category)
    }

    pub fn summaries(&self) -> Vec<CategorySummary> {
        Category::ALL
            .into_iter()
            .map(|category| CategorySummary {
                id: category,
                label: category.label(),
                count: self.in_category(category).count(),
            })
            .collect()
    }
}
