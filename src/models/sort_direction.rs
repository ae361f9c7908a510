use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ranking direction for filter stages
///
/// Determines whether the largest or the smallest metric comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest value first
    #[serde(alias = "asc")]
    Ascending,

    /// Largest value first (default)
    #[serde(alias = "desc")]
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Descending
    }
}

impl SortDirection {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, AppError> {
        match s.trim().to_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortDirection::Ascending),
            "descending" | "desc" => Ok(SortDirection::Descending),
            _ => Err(AppError::Config(format!(
                "Invalid sort direction: '{}'. Valid values: ascending, descending",
                s
            ))),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }

    /// Order two metrics according to this direction.
    ///
    /// Uses `total_cmp`, so NaN never panics a sort.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match self {
            SortDirection::Ascending => a.total_cmp(&b),
            SortDirection::Descending => b.total_cmp(&a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_default() {
        assert_eq!(SortDirection::default(), SortDirection::Descending);
    }

    #[test]
    fn test_sort_direction_from_str() {
        assert_eq!(SortDirection::from_str("ascending").unwrap(), SortDirection::Ascending);
        assert_eq!(SortDirection::from_str("ASC").unwrap(), SortDirection::Ascending);
        assert_eq!(SortDirection::from_str("descending").unwrap(), SortDirection::Descending);
        assert_eq!(SortDirection::from_str("desc").unwrap(), SortDirection::Descending);
        assert!(matches!(
            SortDirection::from_str("sideways"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_compare() {
        assert_eq!(SortDirection::Ascending.compare(1.0, 2.0), Ordering::Less);
        assert_eq!(SortDirection::Descending.compare(1.0, 2.0), Ordering::Greater);
        assert_eq!(SortDirection::Descending.compare(3.0, 3.0), Ordering::Equal);
    }

    #[test]
    fn test_sort_direction_serde() {
        assert_eq!(
            serde_json::to_string(&SortDirection::Ascending).unwrap(),
            r#""ascending""#
        );
        let d: SortDirection = serde_json::from_str(r#""desc""#).unwrap();
        assert_eq!(d, SortDirection::Descending);
    }
}
