//! Window definitions: `PARTITION BY`, `ORDER BY` and frames.

use std::fmt;

use super::{Expression, OrderByExpression, OrderItem};
use crate::error::Result;
use crate::value::Field;

/// The frame unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Rows,
    Range,
    Groups,
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rows => "ROWS",
            Self::Range => "RANGE",
            Self::Groups => "GROUPS",
        })
    }
}

/// Direction of a frame bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDirection {
    Preceding,
    Following,
}

impl fmt::Display for FrameDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preceding => "PRECEDING",
            Self::Following => "FOLLOWING",
        })
    }
}

/// Offset of a frame bound. `Rows(0)` is `CURRENT ROW`.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOffset {
    Unbounded,
    Rows(u64),
    Expr(Box<Expression>),
}

impl From<u64> for FrameOffset {
    fn from(rows: u64) -> Self {
        Self::Rows(rows)
    }
}

impl From<Option<u64>> for FrameOffset {
    fn from(rows: Option<u64>) -> Self {
        rows.map_or(Self::Unbounded, Self::Rows)
    }
}

impl From<Expression> for FrameOffset {
    fn from(expr: Expression) -> Self {
        Self::Expr(Box::new(expr))
    }
}

/// A frame bound.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBound {
    pub offset: FrameOffset,
    pub direction: FrameDirection,
}

/// `{ROWS|RANGE|GROUPS} BETWEEN start AND end`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    pub frame_type: FrameType,
    pub start: FrameBound,
    pub end: FrameBound,
}

/// A window specification.
///
/// A window holding only a name is *named-only* and is referenced as
/// `OVER name` instead of `OVER (...)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowExpression {
    name: Option<Box<Expression>>,
    partitions: Vec<Expression>,
    order: Option<Box<Expression>>,
    frame: Option<FrameSpec>,
    exclusion: Option<String>,
}

impl WindowExpression {
    /// An empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A reference to a named window.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().name(name)
    }

    /// Sets the window (or base window) name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Box::new(Expression::identifier(name)));
        self
    }

    /// Adds `PARTITION BY` entries; names become identifiers.
    #[must_use]
    pub fn partition<I, F>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.partitions
            .extend(partitions.into_iter().map(|p| match p.into() {
                Field::Name(name) => Expression::identifier(name),
                Field::Expr(expr) => *expr,
            }));
        self
    }

    /// Adds `ORDER BY` entries.
    pub fn order<I, O>(mut self, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderItem>,
    {
        let mut order = match self.order.take().map(|b| *b) {
            Some(Expression::OrderBy(order)) => order,
            _ => OrderByExpression::new(),
        };
        order.append(fields)?;
        self.order = Some(Box::new(Expression::OrderBy(order)));
        Ok(self)
    }

    /// Sets a frame.
    #[must_use]
    pub fn frame(
        mut self,
        frame_type: FrameType,
        start: impl Into<FrameOffset>,
        start_direction: FrameDirection,
        end: impl Into<FrameOffset>,
        end_direction: FrameDirection,
    ) -> Self {
        self.frame = Some(FrameSpec {
            frame_type,
            start: FrameBound {
                offset: start.into(),
                direction: start_direction,
            },
            end: FrameBound {
                offset: end.into(),
                direction: end_direction,
            },
        });
        self
    }

    /// `ROWS BETWEEN start PRECEDING AND end FOLLOWING`.
    #[must_use]
    pub fn rows(self, start: impl Into<FrameOffset>, end: impl Into<FrameOffset>) -> Self {
        self.frame(
            FrameType::Rows,
            start,
            FrameDirection::Preceding,
            end,
            FrameDirection::Following,
        )
    }

    /// `RANGE BETWEEN start PRECEDING AND end FOLLOWING`.
    #[must_use]
    pub fn range(self, start: impl Into<FrameOffset>, end: impl Into<FrameOffset>) -> Self {
        self.frame(
            FrameType::Range,
            start,
            FrameDirection::Preceding,
            end,
            FrameDirection::Following,
        )
    }

    /// `GROUPS BETWEEN start PRECEDING AND end FOLLOWING`.
    #[must_use]
    pub fn groups(self, start: impl Into<FrameOffset>, end: impl Into<FrameOffset>) -> Self {
        self.frame(
            FrameType::Groups,
            start,
            FrameDirection::Preceding,
            end,
            FrameDirection::Following,
        )
    }

    /// `EXCLUDE CURRENT ROW`.
    #[must_use]
    pub fn exclude_current(mut self) -> Self {
        self.exclusion = Some(String::from("CURRENT ROW"));
        self
    }

    /// `EXCLUDE GROUP`.
    #[must_use]
    pub fn exclude_group(mut self) -> Self {
        self.exclusion = Some(String::from("GROUP"));
        self
    }

    /// `EXCLUDE TIES`.
    #[must_use]
    pub fn exclude_ties(mut self) -> Self {
        self.exclusion = Some(String::from("TIES"));
        self
    }

    /// The name, if any.
    #[must_use]
    pub fn window_name(&self) -> Option<&Expression> {
        self.name.as_deref()
    }

    /// The partitions.
    #[must_use]
    pub fn partitions(&self) -> &[Expression] {
        &self.partitions
    }

    /// The ordering.
    #[must_use]
    pub fn order_by(&self) -> Option<&Expression> {
        self.order.as_deref()
    }

    /// The frame.
    #[must_use]
    pub const fn frame_spec(&self) -> Option<&FrameSpec> {
        self.frame.as_ref()
    }

    /// The frame exclusion.
    #[must_use]
    pub fn exclusion(&self) -> Option<&str> {
        self.exclusion.as_deref()
    }

    /// Returns `true` when the window is only a name.
    #[must_use]
    pub fn is_named_only(&self) -> bool {
        self.name.is_some()
            && self.partitions.is_empty()
            && self.order.is_none()
            && self.frame.is_none()
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut out: Vec<&Expression> = self.name.as_deref().into_iter().collect();
        out.extend(self.partitions.iter());
        out.extend(self.order.as_deref());
        if let Some(frame) = &self.frame {
            for bound in [&frame.start, &frame.end] {
                if let FrameOffset::Expr(e) = &bound.offset {
                    out.push(e);
                }
            }
        }
        out
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Expression> {
        let mut out: Vec<&mut Expression> = self.name.as_deref_mut().into_iter().collect();
        out.extend(self.partitions.iter_mut());
        out.extend(self.order.as_deref_mut());
        if let Some(frame) = &mut self.frame {
            for bound in [&mut frame.start, &mut frame.end] {
                if let FrameOffset::Expr(e) = &mut bound.offset {
                    out.push(e.as_mut());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_only() {
        assert!(WindowExpression::named("w").is_named_only());
        assert!(!WindowExpression::named("w").partition(["a"]).is_named_only());
        assert!(!WindowExpression::new().is_named_only());
    }

    #[test]
    fn test_rows_frame() {
        let window = WindowExpression::new().rows(None::<u64>, 0_u64).exclude_ties();
        let frame = window.frame_spec().unwrap();
        assert_eq!(frame.frame_type, FrameType::Rows);
        assert_eq!(frame.start.offset, FrameOffset::Unbounded);
        assert_eq!(frame.end.offset, FrameOffset::Rows(0));
        assert_eq!(window.exclusion(), Some("TIES"));
    }

    #[test]
    fn test_children_include_frame_expressions() {
        let window = WindowExpression::named("w")
            .partition(["a", "b"])
            .order(["c"])
            .unwrap()
            .range(Expression::raw("INTERVAL '1' DAY"), 0_u64);
        // name, two partitions, order, start offset
        assert_eq!(window.children().len(), 5);
    }
}
