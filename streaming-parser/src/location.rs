use std::fmt::Display;

/// A 1-based line and column in the character input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    line: usize,
    col: usize,
}

impl Location {
    pub(crate) fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub(crate) fn incremented(&self) -> Self {
        Self::new(self.line, self.col + 1)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self { line: 1, col: 1 }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {0} column {1}", self.line, self.col)
    }
}
