use std::fmt::{Display, Write};
use std::hash::{Hash, Hasher};

/// How a segment is spelled when a path is rendered: `.x` or `[x]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Accessor {
    Object,
    Array,
}

/// One step of a JSON path.
///
/// Concrete paths attached to tokens only ever contain `Root`, `Member` and
/// `Index`. Patterns may use every variant.
#[derive(Clone, Debug)]
pub enum Segment {
    Root,
    Member(String),
    Index(u64),
    /// Indices in `start..end`. An `end` of `None` is unbounded.
    Slice { start: u64, end: Option<u64> },
    /// Indices in `start..end` whose distance from `start` is a multiple of `step`.
    Step {
        start: u64,
        end: Option<u64>,
        step: u64,
    },
    /// Any of the contained array-shaped segments.
    Union(Vec<Segment>),
    Wildcard(Accessor),
    Recursive,
}

impl Segment {
    pub fn member(name: impl Into<String>) -> Self {
        Segment::Member(name.into())
    }

    /// Builds a union, collapsing a single member into that member.
    pub fn union(mut members: Vec<Segment>) -> Option<Segment> {
        match members.len() {
            0 => None,
            1 => members.pop(),
            _ => Some(Segment::Union(members)),
        }
    }

    pub fn accessor(&self) -> Accessor {
        match self {
            Segment::Root | Segment::Recursive => Accessor::Object,
            Segment::Member(name) => {
                if is_identifier(name) {
                    Accessor::Object
                } else {
                    Accessor::Array
                }
            }
            Segment::Wildcard(accessor) => *accessor,
            Segment::Index(_)
            | Segment::Slice { .. }
            | Segment::Step { .. }
            | Segment::Union(_) => Accessor::Array,
        }
    }

    pub(crate) fn is_array_shaped(&self) -> bool {
        matches!(
            self,
            Segment::Index(_) | Segment::Slice { .. } | Segment::Step { .. }
        )
    }

    /// Segments that select exactly one location.
    pub(crate) fn is_fixed(&self) -> bool {
        matches!(self, Segment::Root | Segment::Member(_) | Segment::Index(_))
    }

    /// Whether an array-shaped pattern selects the concrete index `index`.
    pub(crate) fn selects_index(&self, index: u64) -> bool {
        match self {
            Segment::Index(i) => *i == index,
            Segment::Slice { start, end } => {
                *start <= index && end.map_or(true, |end| index < end)
            }
            Segment::Step { start, end, step } => {
                index >= *start
                    && (index - start).checked_rem(*step) == Some(0)
                    && end.map_or(true, |end| index < end)
            }
            Segment::Union(members) => members.iter().any(|member| member.selects_index(index)),
            _ => false,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        match self {
            Segment::Slice {
                start,
                end: Some(end),
            }
            | Segment::Step {
                start,
                end: Some(end),
                ..
            } if start >= end => Err("start must be before end"),
            Segment::Step { step: 0, .. } => Err("step must be a positive integer"),
            Segment::Union(members) => {
                if members.len() < 2 {
                    return Err("a union needs at least two members");
                }
                for member in members {
                    if !member.is_array_shaped() {
                        return Err("a union may only contain indices, slices and steps");
                    }
                    member.validate()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The body of an array-shaped segment, without brackets.
    fn write_array_body(&self, f: &mut impl Write) -> std::fmt::Result {
        match self {
            Segment::Index(index) => write!(f, "{index}"),
            Segment::Slice { start, end } => {
                write_bound(f, *start)?;
                f.write_char(':')?;
                write_end(f, *end)
            }
            Segment::Step { start, end, step } => {
                write_bound(f, *start)?;
                f.write_char(':')?;
                write_end(f, *end)?;
                write!(f, ":{step}")
            }
            Segment::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    member.write_array_body(f)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Renders this segment. `next` is needed because recursive descent is
    /// spelled differently depending on what follows it.
    pub(crate) fn write_fragment(
        &self,
        next: Option<&Segment>,
        f: &mut impl Write,
    ) -> std::fmt::Result {
        match self {
            Segment::Root => f.write_char('$'),
            Segment::Member(name) => {
                if is_identifier(name) {
                    write!(f, ".{name}")
                } else {
                    f.write_str("['")?;
                    for ch in name.chars() {
                        match ch {
                            '\'' => f.write_str("\\'")?,
                            '\\' => f.write_str("\\\\")?,
                            ch => f.write_char(ch)?,
                        }
                    }
                    f.write_str("']")
                }
            }
            Segment::Wildcard(Accessor::Object) => f.write_str(".*"),
            Segment::Wildcard(Accessor::Array) => f.write_str("[*]"),
            Segment::Recursive => match next {
                None => f.write_str("..*"),
                Some(next) if next.accessor() == Accessor::Object => f.write_char('.'),
                Some(_) => f.write_str(".."),
            },
            array => {
                f.write_char('[')?;
                array.write_array_body(f)?;
                f.write_char(']')
            }
        }
    }
}

fn write_bound(f: &mut impl Write, start: u64) -> std::fmt::Result {
    if start != 0 {
        write!(f, "{start}")?;
    }
    Ok(())
}

fn write_end(f: &mut impl Write, end: Option<u64>) -> std::fmt::Result {
    if let Some(end) = end {
        write!(f, "{end}")?;
    }
    Ok(())
}

/// `[a-zA-Z_$][a-zA-Z0-9_$]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => chars.all(is_name_char),
        _ => false,
    }
}

pub(crate) fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

pub(crate) fn is_name_char(ch: char) -> bool {
    is_name_start(ch) || ch.is_ascii_digit()
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Segment::Root, Segment::Root) => true,
            (Segment::Member(a), Segment::Member(b)) => a == b,
            (Segment::Index(a), Segment::Index(b)) => a == b,
            (
                Segment::Slice { start, end },
                Segment::Slice {
                    start: other_start,
                    end: other_end,
                },
            ) => start == other_start && end == other_end,
            (
                Segment::Step { start, end, step },
                Segment::Step {
                    start: other_start,
                    end: other_end,
                    step: other_step,
                },
            ) => start == other_start && end == other_end && step == other_step,
            (Segment::Union(a), Segment::Union(b)) => a == b,
            // `.*` and `[*]` select the same thing.
            (Segment::Wildcard(_), Segment::Wildcard(_)) => true,
            (Segment::Recursive, Segment::Recursive) => true,
            _ => false,
        }
    }
}

impl Eq for Segment {}

impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Segment::Member(name) => name.hash(state),
            Segment::Index(index) => index.hash(state),
            Segment::Slice { start, end } => {
                start.hash(state);
                end.hash(state);
            }
            Segment::Step { start, end, step } => {
                start.hash(state);
                end.hash(state);
                step.hash(state);
            }
            Segment::Union(members) => members.hash(state),
            Segment::Root | Segment::Wildcard(_) | Segment::Recursive => {}
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_fragment(None, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_selects_half_open_range() {
        let slice = Segment::Slice {
            start: 3,
            end: Some(6),
        };
        assert!(!slice.selects_index(2));
        assert!(slice.selects_index(3));
        assert!(slice.selects_index(5));
        assert!(!slice.selects_index(6));
    }

    #[test]
    fn step_selects_every_nth_index() {
        let step = Segment::Step {
            start: 6,
            end: Some(21),
            step: 3,
        };
        let selected = (0..30).filter(|i| step.selects_index(*i)).collect::<Vec<_>>();
        assert_eq!(vec![6, 9, 12, 15, 18], selected);
    }

    #[test]
    fn union_selects_any_member() {
        let union = Segment::union(vec![
            Segment::Index(1),
            Segment::Slice {
                start: 5,
                end: None,
            },
        ])
        .unwrap();
        assert!(union.selects_index(1));
        assert!(!union.selects_index(2));
        assert!(union.selects_index(500));
    }

    #[test]
    fn single_member_union_collapses() {
        assert_eq!(Some(Segment::Index(4)), Segment::union(vec![Segment::Index(4)]));
        assert_eq!(None, Segment::union(Vec::new()));
    }

    #[test]
    fn validate_rejects_empty_ranges() {
        assert!(Segment::Slice {
            start: 4,
            end: Some(4)
        }
        .validate()
        .is_err());
        assert!(Segment::Step {
            start: 0,
            end: None,
            step: 0
        }
        .validate()
        .is_err());
        assert!(Segment::Union(vec![Segment::Index(1), Segment::member("a")])
            .validate()
            .is_err());
    }

    #[test]
    fn wildcards_are_equal_in_either_spelling() {
        assert_eq!(
            Segment::Wildcard(Accessor::Object),
            Segment::Wildcard(Accessor::Array)
        );
        assert_ne!(Segment::Index(1), Segment::member("1"));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("_a$1"));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier(""));
    }
}
