//! Device filters
//!
//! Predicate values evaluated against [`DeviceRecord`]s. Filters are plain
//! data so they can be loaded from configuration, logged and combined; they
//! only ever read a record.

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeValue;
use crate::record::DeviceRecord;
use crate::types::DeviceSource;

/// Filter over presence flags, the core schema and pass-through attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceFilter {
    /// Matches every record.
    #[default]
    All,

    /// Match records whose presence flag for `source` equals `present`.
    Flag { source: DeviceSource, present: bool },

    /// Match records whose home collection is `source`.
    Origin { source: DeviceSource },

    /// Match records whose name equals `value`.
    Name {
        value: String,
        #[serde(default)]
        ignore_case: bool,
    },

    /// Match records carrying a non-empty secondary identifier.
    HasSecondaryId,

    /// Match records where attribute equals value.
    Equals {
        attribute: String,
        value: String,
        #[serde(default)]
        ignore_case: bool,
    },

    /// Match records where attribute contains value (case-insensitive).
    Contains { attribute: String, value: String },

    /// Match records where attribute starts with value (case-insensitive).
    StartsWith { attribute: String, value: String },

    /// Match records where attribute exists with a non-null value.
    Present { attribute: String },

    /// Logical AND of multiple filters.
    And { filters: Vec<DeviceFilter> },

    /// Logical OR of multiple filters.
    Or { filters: Vec<DeviceFilter> },

    /// Logical NOT of a filter.
    Not { filter: Box<DeviceFilter> },
}

impl DeviceFilter {
    /// Match records present in `source`.
    pub fn present_in(source: DeviceSource) -> Self {
        DeviceFilter::Flag {
            source,
            present: true,
        }
    }

    /// Match records absent from `source`.
    pub fn absent_from(source: DeviceSource) -> Self {
        DeviceFilter::Flag {
            source,
            present: false,
        }
    }

    /// Create a case-sensitive equals filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        DeviceFilter::Equals {
            attribute: attribute.into(),
            value: value.into(),
            ignore_case: false,
        }
    }

    /// Create a case-insensitive equals filter.
    pub fn eq_ignore_case(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        DeviceFilter::Equals {
            attribute: attribute.into(),
            value: value.into(),
            ignore_case: true,
        }
    }

    /// Create a contains filter.
    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        DeviceFilter::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a starts-with filter.
    pub fn starts_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        DeviceFilter::StartsWith {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a present (attribute exists) filter.
    pub fn present(attribute: impl Into<String>) -> Self {
        DeviceFilter::Present {
            attribute: attribute.into(),
        }
    }

    /// Create an AND filter.
    pub fn and(filters: Vec<DeviceFilter>) -> Self {
        DeviceFilter::And { filters }
    }

    /// Create an OR filter.
    pub fn or(filters: Vec<DeviceFilter>) -> Self {
        DeviceFilter::Or { filters }
    }

    /// Create a NOT filter (negation).
    pub fn negate(filter: DeviceFilter) -> Self {
        DeviceFilter::Not {
            filter: Box::new(filter),
        }
    }

    /// Combine this filter with another using AND.
    #[must_use]
    pub fn and_with(self, other: DeviceFilter) -> Self {
        match self {
            DeviceFilter::All => other,
            DeviceFilter::And { mut filters } => {
                filters.push(other);
                DeviceFilter::And { filters }
            }
            _ => DeviceFilter::And {
                filters: vec![self, other],
            },
        }
    }

    /// Evaluate the filter against a record.
    pub fn matches(&self, record: &DeviceRecord) -> bool {
        match self {
            DeviceFilter::All => true,
            DeviceFilter::Flag { source, present } => {
                record.flags().is_present(*source) == *present
            }
            DeviceFilter::Origin { source } => record.origin() == *source,
            DeviceFilter::Name { value, ignore_case } => {
                text_eq(&record.name, value, *ignore_case)
            }
            DeviceFilter::HasSecondaryId => record.secondary_id().is_some(),
            DeviceFilter::Equals {
                attribute,
                value,
                ignore_case,
            } => any_text(record, attribute, |text| text_eq(text, value, *ignore_case)),
            DeviceFilter::Contains { attribute, value } => {
                let needle = value.to_lowercase();
                any_text(record, attribute, |text| {
                    text.to_lowercase().contains(&needle)
                })
            }
            DeviceFilter::StartsWith { attribute, value } => {
                let prefix = value.to_lowercase();
                any_text(record, attribute, |text| {
                    text.to_lowercase().starts_with(&prefix)
                })
            }
            DeviceFilter::Present { attribute } => record.attributes.has(attribute),
            DeviceFilter::And { filters } => filters.iter().all(|f| f.matches(record)),
            DeviceFilter::Or { filters } => filters.iter().any(|f| f.matches(record)),
            DeviceFilter::Not { filter } => !filter.matches(record),
        }
    }
}

fn text_eq(left: &str, right: &str, ignore_case: bool) -> bool {
    if ignore_case {
        left.to_lowercase() == right.to_lowercase()
    } else {
        left == right
    }
}

/// Apply `pred` to the textual form of an attribute; arrays match if any
/// element does. Missing and null attributes never match.
fn any_text<F>(record: &DeviceRecord, attribute: &str, pred: F) -> bool
where
    F: Fn(&str) -> bool,
{
    match record.attributes.get_ignore_case(attribute) {
        None | Some(AttributeValue::Null) => false,
        Some(AttributeValue::Array(items)) => items.iter().any(|v| pred(&v.to_string())),
        Some(value) => pred(&value.to_string()),
    }
}
