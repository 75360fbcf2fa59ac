//! List model: lists own their items and categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::RecordId;

/// Selection animation used when picking a random item from a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    /// Spinning wheel
    #[default]
    #[serde(alias = "roleta", alias = "wheel")]
    Roulette,
    /// Rolling cube
    #[serde(alias = "cubo", alias = "dice")]
    Cube,
}

impl AnimationKind {
    /// Label used by the markdown export template
    #[must_use]
    pub const fn template_label(self) -> &'static str {
        match self {
            Self::Roulette => "roleta",
            Self::Cube => "cubo",
        }
    }

    /// Parse a label from the markdown template or foreign JSON
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "roleta" | "roulette" | "wheel" => Some(Self::Roulette),
            "cubo" | "cube" | "dice" => Some(Self::Cube),
            _ => None,
        }
    }
}

/// A run of text sharing one style inside an item's rich text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StyledRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A single entry inside a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique within the owning list
    pub id: RecordId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Vec<StyledRun>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Weak reference to a category of the owning list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<RecordId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a plain item with the given text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        ItemDraft::new(text).into_item()
    }

    /// Copy of this item with a fresh id and fresh timestamps
    #[must_use]
    pub fn cloned_fresh(&self) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Whether the item references the given category, by either field
    #[must_use]
    pub fn references_category(&self, category_id: &RecordId) -> bool {
        self.category.as_ref() == Some(category_id)
            || self
                .categories
                .as_ref()
                .is_some_and(|ids| ids.contains(category_id))
    }
}

/// Fields for a new item; id and timestamps are assigned on creation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemDraft {
    pub text: String,
    pub rich_text: Option<Vec<StyledRun>>,
    pub description: Option<String>,
    pub category: Option<RecordId>,
    pub categories: Option<Vec<RecordId>>,
    pub tags: Option<Vec<String>>,
    pub priority: Option<f64>,
    pub due_date: Option<String>,
    pub completed: bool,
}

impl ItemDraft {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn into_item(self) -> Item {
        let now = Utc::now();
        Item {
            id: RecordId::new(),
            text: self.text,
            rich_text: self.rich_text,
            description: self.description,
            category: self.category,
            categories: self.categories,
            tags: self.tags,
            priority: self.priority,
            due_date: self.due_date,
            completed: self.completed,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an item; every `Some` field replaces the stored one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemPatch {
    pub text: Option<String>,
    pub rich_text: Option<Vec<StyledRun>>,
    pub description: Option<String>,
    pub category: Option<RecordId>,
    pub categories: Option<Vec<RecordId>>,
    pub tags: Option<Vec<String>>,
    pub priority: Option<f64>,
    pub due_date: Option<String>,
    pub completed: Option<bool>,
}

impl ItemPatch {
    pub(crate) fn apply(self, item: &mut Item) {
        if let Some(text) = self.text {
            item.text = text;
        }
        if let Some(rich_text) = self.rich_text {
            item.rich_text = Some(rich_text);
        }
        if let Some(description) = self.description {
            item.description = Some(description);
        }
        if let Some(category) = self.category {
            item.category = Some(category);
        }
        if let Some(categories) = self.categories {
            item.categories = Some(categories);
        }
        if let Some(tags) = self.tags {
            item.tags = Some(tags);
        }
        if let Some(priority) = self.priority {
            item.priority = Some(priority);
        }
        if let Some(due_date) = self.due_date {
            item.due_date = Some(due_date);
        }
        if let Some(completed) = self.completed {
            item.completed = completed;
        }
        item.updated_at = crate::util::next_updated_at(item.updated_at);
    }
}

/// A category owned by a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            color: None,
        }
    }
}

/// Partial update for a category
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl CategoryPatch {
    pub(crate) fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(color) = self.color {
            category.color = Some(color);
        }
    }
}

/// Top-level list aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub allows_random_pick: bool,
    #[serde(
        default,
        rename = "animationType",
        skip_serializing_if = "Option::is_none"
    )]
    pub animation_kind: Option<AnimationKind>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl List {
    /// Find a category by id
    #[must_use]
    pub fn category(&self, id: &RecordId) -> Option<&Category> {
        self.categories.iter().find(|category| &category.id == id)
    }

    /// Refresh `updated_at` without moving it backwards
    pub fn touch(&mut self) {
        self.updated_at = crate::util::next_updated_at(self.updated_at);
    }

    /// Regenerate item ids that repeat inside this list
    pub(crate) fn dedupe_item_ids(&mut self) {
        let mut seen = HashSet::new();
        for item in &mut self.items {
            while !seen.insert(item.id.clone()) {
                item.id = RecordId::new();
            }
        }
        let mut seen = HashSet::new();
        for category in &mut self.categories {
            while !seen.insert(category.id.clone()) {
                category.id = RecordId::new();
            }
        }
    }
}

/// Fields for a new list; id and timestamps are assigned on creation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListDraft {
    pub name: String,
    pub description: Option<String>,
    pub rich_description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub items: Vec<Item>,
    pub categories: Vec<Category>,
    pub allows_random_pick: bool,
    pub animation_kind: Option<AnimationKind>,
}

impl ListDraft {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Materialize the draft with a fresh id and timestamps
    #[must_use]
    pub fn into_list(self) -> List {
        let now = Utc::now();
        let mut list = List {
            id: RecordId::new(),
            name: self.name,
            description: self.description,
            rich_description: self.rich_description,
            color: self.color,
            icon: self.icon,
            items: self.items,
            categories: self.categories,
            allows_random_pick: self.allows_random_pick,
            animation_kind: self.animation_kind,
            created_at: now,
            updated_at: now,
        };
        list.dedupe_item_ids();
        list
    }
}

impl From<List> for ListDraft {
    fn from(list: List) -> Self {
        Self {
            name: list.name,
            description: list.description,
            rich_description: list.rich_description,
            color: list.color,
            icon: list.icon,
            items: list.items,
            categories: list.categories,
            allows_random_pick: list.allows_random_pick,
            animation_kind: list.animation_kind,
        }
    }
}

/// Partial update for a list; every `Some` field replaces the stored one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rich_description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub items: Option<Vec<Item>>,
    pub categories: Option<Vec<Category>>,
    pub allows_random_pick: Option<bool>,
    pub animation_kind: Option<AnimationKind>,
}

impl ListPatch {
    pub(crate) fn apply(self, list: &mut List) {
        if let Some(name) = self.name {
            list.name = name;
        }
        if let Some(description) = self.description {
            list.description = Some(description);
        }
        if let Some(rich_description) = self.rich_description {
            list.rich_description = Some(rich_description);
        }
        if let Some(color) = self.color {
            list.color = Some(color);
        }
        if let Some(icon) = self.icon {
            list.icon = Some(icon);
        }
        if let Some(items) = self.items {
            list.items = items;
        }
        if let Some(categories) = self.categories {
            list.categories = categories;
        }
        if let Some(allows_random_pick) = self.allows_random_pick {
            list.allows_random_pick = allows_random_pick;
        }
        if let Some(animation_kind) = self.animation_kind {
            list.animation_kind = Some(animation_kind);
        }
        list.dedupe_item_ids();
        list.touch();
    }
}
