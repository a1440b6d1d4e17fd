use super::Segment;

/// Matches `pattern` against the front of `concrete`, returning how many
/// concrete segments the match consumed.
///
/// A pattern that runs out before the concrete path still matches: tokens
/// nested below a selected location belong to that location's subtree.
pub(crate) fn match_len(pattern: &[Segment], concrete: &[Segment]) -> Option<usize> {
    match_from(pattern, concrete, 0)
}

fn match_from(pattern: &[Segment], concrete: &[Segment], consumed: usize) -> Option<usize> {
    let Some((head, rest)) = pattern.split_first() else {
        return Some(consumed);
    };

    if let Segment::Recursive = head {
        if rest.is_empty() {
            return Some(consumed);
        }

        // shallowest depth first
        return (0..concrete.len())
            .find_map(|skipped| match_from(rest, &concrete[skipped..], consumed + skipped));
    }

    let (candidate, remaining) = concrete.split_first()?;
    if segment_matches(head, candidate) {
        match_from(rest, remaining, consumed + 1)
    } else {
        None
    }
}

fn segment_matches(pattern: &Segment, candidate: &Segment) -> bool {
    match pattern {
        Segment::Root => matches!(candidate, Segment::Root),
        Segment::Member(name) => matches!(candidate, Segment::Member(other) if other == name),
        Segment::Index(index) => matches!(candidate, Segment::Index(other) if other == index),
        Segment::Slice { .. } | Segment::Step { .. } | Segment::Union(_) => {
            pattern == candidate
                || matches!(candidate, Segment::Index(index) if pattern.selects_index(*index))
        }
        Segment::Wildcard(_) => true,
        Segment::Recursive => false,
    }
}
