//! Column transforms applied as columns land in a table

use crate::models::Column;

/// Key and nullability override for produced columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTransform {
    Unchanged,
    /// Key column, never nullable
    PrimaryKey,
    /// Not a key, not nullable
    NotNull,
    /// Not a key, nullable
    Nullable,
    /// Apply the inner transform, then force nullable
    MakeNull(Box<ColumnTransform>),
}

impl ColumnTransform {
    pub fn make_null(inner: ColumnTransform) -> Self {
        Self::MakeNull(Box::new(inner))
    }

    pub fn apply(&self, mut column: Column) -> Column {
        match self {
            Self::Unchanged => column,
            Self::PrimaryKey => {
                column.is_part_of_primary_key = true;
                column.is_nullable = false;
                column
            }
            Self::NotNull => {
                column.is_part_of_primary_key = false;
                column.is_nullable = false;
                column
            }
            Self::Nullable => column.nullable(),
            Self::MakeNull(inner) => inner.apply(column).nullable(),
        }
    }

    pub fn apply_all(&self, columns: Vec<Column>) -> Vec<Column> {
        columns.into_iter().map(|c| self.apply(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnDataType;

    #[test]
    fn test_make_null_overrides_primary_key() {
        let column = Column::new("SchoolId", ColumnDataType::Integer);
        let transformed = ColumnTransform::make_null(ColumnTransform::PrimaryKey).apply(column);
        assert!(transformed.is_nullable);
        assert!(!transformed.is_part_of_primary_key);
    }

    #[test]
    fn test_not_null_clears_key() {
        let column = Column::new("SchoolId", ColumnDataType::Integer).primary_key();
        let transformed = ColumnTransform::NotNull.apply(column);
        assert!(!transformed.is_nullable);
        assert!(!transformed.is_part_of_primary_key);
    }

    #[test]
    fn test_unchanged_keeps_flags() {
        let column = Column::new("SchoolId", ColumnDataType::Integer).nullable();
        let transformed = ColumnTransform::Unchanged.apply(column.clone());
        assert_eq!(transformed, column);
    }
}
