use crate::Location;

/// Pairs every character pulled from the source with its 1-based location.
pub(crate) struct CharLocations<CharIndices, PassThroughErr>
where
    CharIndices: Iterator<Item = Result<char, PassThroughErr>>,
{
    done: bool,
    source: Option<CharIndices>,
    line: usize,
    col: usize,
    previous_was_new_line: bool,
}

impl<CharIndices, PassThroughErr> CharLocations<CharIndices, PassThroughErr>
where
    CharIndices: Iterator<Item = Result<char, PassThroughErr>>,
{
    pub(crate) fn new(source: CharIndices) -> Self {
        Self {
            done: false,
            source: Some(source),
            line: 1,
            col: 0,
            previous_was_new_line: false,
        }
    }

    /// The location of the most recently pulled character, or of the
    /// position just past the end once the source is exhausted.
    pub(crate) fn location(&self) -> Location {
        if self.done {
            Location::new(self.line, self.col).incremented()
        } else {
            Location::new(self.line, self.col.max(1))
        }
    }

    /// Gives the column of the most recently pulled character back, for a
    /// character that is skipped rather than read.
    pub(crate) fn uncount(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    /// Drops the upstream source. No further characters are pulled.
    pub(crate) fn close(&mut self) {
        self.done = true;
        self.source = None;
    }
}

impl<CharIndices, PassThroughErr> Iterator for CharLocations<CharIndices, PassThroughErr>
where
    CharIndices: Iterator<Item = Result<char, PassThroughErr>>,
{
    type Item = (Location, Result<char, PassThroughErr>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let next = match self.source.as_mut().and_then(|source| source.next()) {
            None => {
                self.done = true;
                return None;
            }
            Some(next) => next,
        };

        if self.previous_was_new_line {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }

        match next {
            Ok(next) => {
                self.previous_was_new_line = next == '\n';
                Some((Location::new(self.line, self.col), Ok(next)))
            }
            Err(err) => Some((Location::new(self.line, self.col), Err(err))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::CharLocations;

    #[test]
    fn counts_lines_and_columns_from_one() {
        let locations = CharLocations::new("ab\ncd".chars().map(Ok::<_, Infallible>))
            .map(|(location, _)| (location.line(), location.col()))
            .collect::<Vec<_>>();
        assert_eq!(vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2)], locations);
    }

    #[test]
    fn location_after_end_points_past_last_char() {
        let mut chars = CharLocations::new("ab".chars().map(Ok::<_, Infallible>));
        while chars.next().is_some() {}
        assert_eq!((1, 3), (chars.location().line(), chars.location().col()));
    }

    #[test]
    fn uncounted_char_takes_no_column() {
        let mut chars = CharLocations::new("\u{FEFF}ab".chars().map(Ok::<_, Infallible>));
        chars.next();
        chars.uncount();
        let locations = chars
            .map(|(location, _)| (location.line(), location.col()))
            .collect::<Vec<_>>();
        assert_eq!(vec![(1, 1), (1, 2)], locations);
    }

    #[test]
    fn close_stops_pulling() {
        let mut pulled = 0;
        let source = "abc".chars().inspect(|_| pulled += 1).map(Ok::<_, Infallible>);
        let mut chars = CharLocations::new(source);
        chars.next();
        chars.close();
        assert!(chars.next().is_none());
        drop(chars);
        assert_eq!(1, pulled);
    }
}
