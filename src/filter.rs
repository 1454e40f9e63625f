//! Search-and-category projection over master collections.
//!
//! Filtering runs before pagination: the filtered result is what gets
//! paginated, and a change of [`FilterQuery`] sends the view back to page 1.

use crate::model::{CertificationDefinition, Employee, Report};

/// Something that can be matched by free-text search and a category.
pub trait Searchable {
    /// Fields the search term is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Value compared for equality against the category filter.
    fn category(&self) -> &str;
}

impl Searchable for Employee {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.position.as_str(),
        ]
    }

    fn category(&self) -> &str {
        &self.department
    }
}

impl Searchable for CertificationDefinition {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.category.as_str()];
        if let Some(description) = &self.description {
            fields.push(description);
        }
        fields
    }

    fn category(&self) -> &str {
        &self.category
    }
}

impl Searchable for Report {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.report_type.as_str()]
    }

    fn category(&self) -> &str {
        self.status.as_str()
    }
}

/// Search term plus optional exact category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub search: String,
    pub category: Option<String>,
}

impl FilterQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// True when the query lets every item through.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.category_filter().is_none()
    }

    fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn matches<T: Searchable>(&self, item: &T) -> bool {
        if let Some(category) = self.category_filter()
            && item.category() != category
        {
            return false;
        }

        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        item.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Returns the items of `items` matching `query`, in their original order.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &FilterQuery) -> Vec<&'a T> {
    items.iter().filter(|item| query.matches(*item)).collect()
}
