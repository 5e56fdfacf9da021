// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Expression types
//!
//! A deliberately small structural type system. It does not try to model
//! coercions; it only answers "do these two types fit together" for set
//! operations and VALUES lists, and "what is the type of this member" for
//! composite values.

use std::fmt;

use sqlmodel_catalog::{DataKind, DataType};

use crate::data_context::DataContext;

/// Type of a value expression or result column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprType {
    /// Type could not be determined
    Unknown,
    /// Compatible with everything (no metadata available)
    Any,
    /// Type known only by kind, e.g. a numeric literal
    Predefined(DataKind),
    /// A catalog scalar type
    Simple(DataType),
    /// Named type with named members
    Composite {
        name: String,
        members: Vec<(String, ExprType)>,
    },
    /// Array-like type
    Indexable { element: Box<ExprType> },
    /// Anonymous row, e.g. the value of `t.*`
    Row { members: Vec<(String, ExprType)> },
    /// Type named in the query but not known to the type system
    Explicit { name: String },
}

#[derive(PartialEq, Eq)]
enum ScalarKind {
    Unknown,
    Known(DataKind),
}

impl ExprType {
    /// Type of a catalog attribute
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Any => ExprType::Any,
            DataType::Array(element) => ExprType::Indexable {
                element: Box::new(ExprType::from_data_type(element)),
            },
            other => ExprType::Simple(other.clone()),
        }
    }

    /// Type of a scalar subquery: the type of its first column
    pub fn for_scalar_subquery(result: &DataContext) -> Self {
        result
            .columns()
            .first()
            .map_or(ExprType::Unknown, |c| c.ty.clone())
    }

    /// Type of a CAST target or other explicit type reference
    pub fn for_type_name(name: &str) -> Self {
        let upper = name.trim().to_uppercase();
        let base = upper.split('(').next().unwrap_or_default().trim();
        let data_type = match base {
            "INT" | "INTEGER" | "INT4" => DataType::Integer,
            "BIGINT" | "INT8" => DataType::BigInt,
            "SMALLINT" | "INT2" => DataType::SmallInt,
            "TINYINT" => DataType::TinyInt,
            "DECIMAL" | "NUMERIC" => DataType::Decimal,
            "FLOAT" | "REAL" | "FLOAT4" => DataType::Float,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => DataType::Double,
            "VARCHAR" | "CHARACTER VARYING" => DataType::Varchar(None),
            "CHAR" | "CHARACTER" => DataType::Char(None),
            "TEXT" => DataType::Text,
            "DATE" => DataType::Date,
            "TIME" => DataType::Time,
            "DATETIME" => DataType::DateTime,
            "TIMESTAMP" => DataType::Timestamp,
            "BOOL" | "BOOLEAN" => DataType::Boolean,
            "JSON" | "JSONB" => DataType::Json,
            "UUID" => DataType::Uuid,
            _ => {
                return ExprType::Explicit {
                    name: name.trim().to_string(),
                };
            }
        };
        ExprType::Simple(data_type)
    }

    /// Common type of `a` and `b`, or `None` if they are incompatible
    ///
    /// `Any` absorbs the other side. Scalars match by kind, composites by
    /// name, indexables by element type. On a match the left type is
    /// returned. Callers turn `None` into [`ExprType::Unknown`].
    pub fn combine(a: &ExprType, b: &ExprType) -> Option<ExprType> {
        match (a, b) {
            (ExprType::Any, _) => Some(a.clone()),
            (_, ExprType::Any) => Some(b.clone()),
            (ExprType::Composite { name: x, .. }, ExprType::Composite { name: y, .. }) => {
                (x == y).then(|| a.clone())
            }
            (ExprType::Indexable { element: x }, ExprType::Indexable { element: y }) => {
                ExprType::combine(x, y).map(|_| a.clone())
            }
            (ExprType::Row { members: x }, ExprType::Row { members: y }) => {
                let matches = x.len() == y.len()
                    && x
                        .iter()
                        .zip(y)
                        .all(|((_, l), (_, r))| ExprType::combine(l, r).is_some());
                matches.then(|| a.clone())
            }
            _ => match (a.scalar_kind(), b.scalar_kind()) {
                (Some(x), Some(y)) if x == y => Some(a.clone()),
                _ => None,
            },
        }
    }

    /// [`combine`](Self::combine), falling back to `Unknown`
    pub fn combine_or_unknown(a: &ExprType, b: &ExprType) -> ExprType {
        ExprType::combine(a, b).unwrap_or(ExprType::Unknown)
    }

    fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            ExprType::Unknown | ExprType::Explicit { .. } => Some(ScalarKind::Unknown),
            ExprType::Predefined(kind) => Some(ScalarKind::Known(*kind)),
            ExprType::Simple(data_type) => Some(ScalarKind::Known(data_type.kind())),
            _ => None,
        }
    }

    /// Type of `value.member`
    pub fn find_named_member_type(&self, member: &str) -> Option<ExprType> {
        match self {
            ExprType::Any => Some(ExprType::Any),
            ExprType::Composite { members, .. } | ExprType::Row { members } => members
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(member))
                .map(|(_, ty)| ty.clone()),
            _ => None,
        }
    }

    /// Type of `value[i]...` with `depth` subscripts
    pub fn find_indexed_item_type(&self, depth: usize) -> Option<ExprType> {
        if depth == 0 {
            return Some(self.clone());
        }
        match self {
            ExprType::Any => Some(ExprType::Any),
            ExprType::Indexable { element } => element.find_indexed_item_type(depth - 1),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ExprType::Unknown)
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprType::Unknown => write!(f, "?"),
            ExprType::Any => write!(f, "ANY"),
            ExprType::Predefined(kind) => write!(f, "{}", format!("{:?}", kind).to_uppercase()),
            ExprType::Simple(data_type) => write!(f, "{}", data_type),
            ExprType::Composite { name, .. } | ExprType::Explicit { name } => write!(f, "{}", name),
            ExprType::Indexable { element } => write!(f, "{}[]", element),
            ExprType::Row { members } => {
                write!(f, "ROW(")?;
                for (i, (name, ty)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", name, ty)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_same_kind() {
        let int = ExprType::Simple(DataType::Integer);
        let big = ExprType::Simple(DataType::BigInt);
        assert_eq!(ExprType::combine(&int, &big), Some(int.clone()));

        let numeric = ExprType::Predefined(DataKind::Numeric);
        assert_eq!(ExprType::combine(&numeric, &big), Some(numeric));
    }

    #[test]
    fn test_combine_mismatch() {
        let int = ExprType::Simple(DataType::Integer);
        let text = ExprType::Simple(DataType::Text);
        assert_eq!(ExprType::combine(&int, &text), None);
        assert_eq!(ExprType::combine_or_unknown(&int, &text), ExprType::Unknown);
        assert_eq!(ExprType::combine(&int, &ExprType::Unknown), None);
    }

    #[test]
    fn test_combine_any_absorbs() {
        let text = ExprType::Simple(DataType::Text);
        assert_eq!(ExprType::combine(&ExprType::Any, &text), Some(ExprType::Any));
        assert_eq!(ExprType::combine(&text, &ExprType::Any), Some(ExprType::Any));
    }

    #[test]
    fn test_combine_composites_by_name() {
        let point = ExprType::Composite {
            name: "point".to_string(),
            members: vec![("x".to_string(), ExprType::Simple(DataType::Double))],
        };
        let other = ExprType::Composite {
            name: "address".to_string(),
            members: vec![],
        };
        assert_eq!(ExprType::combine(&point, &point), Some(point.clone()));
        assert_eq!(ExprType::combine(&point, &other), None);
    }

    #[test]
    fn test_from_data_type() {
        assert_eq!(ExprType::from_data_type(&DataType::Any), ExprType::Any);
        assert_eq!(
            ExprType::from_data_type(&DataType::Array(Box::new(DataType::Integer))),
            ExprType::Indexable {
                element: Box::new(ExprType::Simple(DataType::Integer))
            }
        );
    }

    #[test]
    fn test_member_and_index_lookup() {
        let point = ExprType::Composite {
            name: "point".to_string(),
            members: vec![("x".to_string(), ExprType::Simple(DataType::Double))],
        };
        assert_eq!(
            point.find_named_member_type("X"),
            Some(ExprType::Simple(DataType::Double))
        );
        assert_eq!(point.find_named_member_type("z"), None);
        assert_eq!(
            ExprType::Any.find_named_member_type("whatever"),
            Some(ExprType::Any)
        );

        let matrix = ExprType::from_data_type(&DataType::Array(Box::new(DataType::Array(
            Box::new(DataType::Integer),
        ))));
        assert_eq!(
            matrix.find_indexed_item_type(2),
            Some(ExprType::Simple(DataType::Integer))
        );
        assert_eq!(matrix.find_indexed_item_type(3), None);
    }

    #[test]
    fn test_for_type_name() {
        assert_eq!(
            ExprType::for_type_name("varchar(20)"),
            ExprType::Simple(DataType::Varchar(None))
        );
        assert_eq!(
            ExprType::for_type_name("my_domain"),
            ExprType::Explicit {
                name: "my_domain".to_string()
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ExprType::Unknown.to_string(), "?");
        assert_eq!(ExprType::Predefined(DataKind::Numeric).to_string(), "NUMERIC");
        assert_eq!(
            ExprType::Row {
                members: vec![("id".to_string(), ExprType::Simple(DataType::BigInt))]
            }
            .to_string(),
            "ROW(id BIGINT)"
        );
    }
}
