//! Document model and the closed category/priority vocabularies.

use serde::{Deserialize, Serialize};

/// Fixed set of categories a document can belong to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Documentation,
    CurrentPlan,
    FuturePlans,
    Tasks,
    HabitTracker,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Documentation,
        Category::CurrentPlan,
        Category::FuturePlans,
        Category::Tasks,
        Category::HabitTracker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Documentation => "documentation",
            Category::CurrentPlan => "current-plan",
            Category::FuturePlans => "future-plans",
            Category::Tasks => "tasks",
            Category::HabitTracker => "habit-tracker",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Documentation => "Documentation",
            Category::CurrentPlan => "Current Plan",
            Category::FuturePlans => "Future Plans",
            Category::Tasks => "Tasks",
            Category::HabitTracker => "Habit Tracker",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.as_str() == s.trim())
    }
}

/// Optional priority tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// The recognized keys of a document's metadata block.
///
/// Values are kept as written so that a document with an unknown category
/// or priority still round-trips through the codec unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl DocumentMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.order.is_none()
            && self.priority.is_none()
    }

    pub fn recognized_category(&self) -> Option<Category> {
        self.category.as_deref().and_then(Category::from_slug)
    }

    pub fn recognized_priority(&self) -> Option<Priority> {
        self.priority.as_deref().and_then(Priority::from_slug)
    }
}

/// One markdown document in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    /// Collection-relative path, e.g. `documentation/intro.md`
    pub id: String,
    pub title: String,
    pub category: Category,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// A document opened for editing: split content plus the hash to write against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDraft {
    pub path: String,
    pub metadata: DocumentMetadata,
    pub body: String,
    pub hash: String,
}

/// Request body for creating a document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for updating a document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    pub path: String,
    /// Content hash observed when the document was opened
    pub hash: String,
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for deleting a document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentRequest {
    pub path: String,
    pub hash: String,
    /// Used for the default commit message
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
