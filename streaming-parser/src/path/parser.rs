use tracing::trace;

use super::segment::{is_name_char, is_name_start, Accessor, Segment};
use super::Path;
use crate::error::PathSyntaxError;

const NAME_START: &str = "[a-zA-Z_$]";
const DIGIT: &str = "[0-9]";

pub(crate) fn parse(text: &str) -> Result<Path, PathSyntaxError> {
    if text.is_empty() {
        return Err(PathSyntaxError::at(0, None, "Empty path"));
    }

    let mut parser = PathParser {
        chars: text.chars().collect(),
        position: 0,
        segments: Vec::new(),
    };

    parser.skip_whitespace();
    parser.read_root()?;
    while parser.in_bounds() {
        parser.read_next_segment()?;
    }

    trace!(path = text, segments = parser.segments.len(), "parsed path");
    Ok(Path::from_parsed(parser.segments))
}

struct PathParser {
    chars: Vec<char>,
    position: usize,
    segments: Vec<Segment>,
}

impl PathParser {
    fn in_bounds(&self) -> bool {
        self.position < self.chars.len()
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn current_is(&self, ch: char) -> bool {
        self.current() == Some(ch)
    }

    fn next_is(&self, ch: char) -> bool {
        self.chars.get(self.position + 1) == Some(&ch)
    }

    /// Length of a `*` or `[*]` wildcard at the current position.
    fn wildcard_len(&self) -> Option<usize> {
        if self.current_is('*') {
            Some(1)
        } else if self.current_is('[')
            && self.next_is('*')
            && self.chars.get(self.position + 2) == Some(&']')
        {
            Some(3)
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn illegal(&self, expected: &[&'static str]) -> PathSyntaxError {
        match self.current() {
            Some(found) => PathSyntaxError::illegal_char(self.position, found, expected),
            None => self.unexpected_end(),
        }
    }

    fn unexpected_end(&self) -> PathSyntaxError {
        PathSyntaxError::at(self.position, None, "Unexpected end of path")
    }

    fn error(&self, message: &str) -> PathSyntaxError {
        PathSyntaxError::at(self.position, self.current(), message)
    }

    fn read_root(&mut self) -> Result<(), PathSyntaxError> {
        if !self.current_is('$') {
            return Err(self.illegal(&["$"]));
        }
        self.position += 1;
        self.segments.push(Segment::Root);
        Ok(())
    }

    fn read_next_segment(&mut self) -> Result<(), PathSyntaxError> {
        match self.current() {
            Some('.') => self.read_dot_segment(),
            Some('[') => self.read_bracket_segment(),
            _ => Err(self.illegal(&[".", "["])),
        }
    }

    fn read_dot_segment(&mut self) -> Result<(), PathSyntaxError> {
        if self.next_is('.') {
            self.position += 2;
            if let Some(len) = self.wildcard_len() {
                // `$..*` selects the same tokens as `$`
                if self.segments.len() == 1 && self.position + len == self.chars.len() {
                    self.position += len;
                    return Ok(());
                }
                return Err(self.error(
                    "Recursive wildcard may only follow the root and must end the path",
                ));
            }

            self.segments.push(Segment::Recursive);
            match self.current() {
                None => return Err(self.unexpected_end()),
                Some('[') => return self.read_bracket_segment(),
                Some(_) => {}
            }
        } else {
            self.position += 1;
        }

        match self.current() {
            None => Err(self.unexpected_end()),
            Some('*') => {
                self.position += 1;
                self.segments.push(Segment::Wildcard(Accessor::Object));
                Ok(())
            }
            Some(ch) if is_name_start(ch) => {
                let start = self.position;
                while self.current().is_some_and(is_name_char) {
                    self.position += 1;
                }
                let name = self.chars[start..self.position].iter().collect::<String>();
                self.segments.push(Segment::Member(name));
                Ok(())
            }
            Some(_) => Err(self.illegal(&["*", NAME_START])),
        }
    }

    fn read_bracket_segment(&mut self) -> Result<(), PathSyntaxError> {
        self.position += 1;
        match self.current() {
            None => Err(self.error("Unclosed bracket expression")),
            Some('*') => {
                self.position += 1;
                self.expect_close_bracket()?;
                self.segments.push(Segment::Wildcard(Accessor::Array));
                Ok(())
            }
            Some(quote @ ('"' | '\'')) => {
                self.position += 1;
                let name = self.read_quoted_name(quote)?;
                self.expect_close_bracket()?;
                self.segments.push(Segment::Member(name));
                Ok(())
            }
            Some(ch) if ch.is_ascii_digit() || ch == ':' => self.read_array_segment(),
            Some(_) => Err(self.illegal(&[DIGIT, "'", "\"", ":", "*"])),
        }
    }

    fn expect_close_bracket(&mut self) -> Result<(), PathSyntaxError> {
        match self.current() {
            Some(']') => {
                self.position += 1;
                Ok(())
            }
            None => Err(self.error("Unclosed bracket expression")),
            Some(_) => Err(self.illegal(&["]"])),
        }
    }

    fn read_quoted_name(&mut self, quote: char) -> Result<String, PathSyntaxError> {
        let mut name = String::new();
        let mut high_surrogate: Option<(usize, u32)> = None;

        loop {
            let ch = match self.current() {
                None => return Err(self.error("Unclosed string expression")),
                Some(ch) => ch,
            };

            if ch != '\\' {
                if let Some((offset, _)) = high_surrogate {
                    return Err(PathSyntaxError::at(
                        offset,
                        Some('u'),
                        "Invalid unicode escape sequence",
                    ));
                }
                self.position += 1;
                if ch == quote {
                    return Ok(name);
                }
                name.push(ch);
                continue;
            }

            self.position += 1;
            let escape_start = self.position;
            let escaped = match self.current() {
                None => return Err(self.error("Unclosed string expression")),
                Some(escaped) => escaped,
            };
            self.position += 1;

            let decoded = match escaped {
                't' => '\t',
                'b' => '\u{0008}',
                'n' | '\n' => '\n',
                'r' => '\r',
                'f' => '\u{000C}',
                '\'' | '"' | '\\' | '/' => escaped,
                'u' => {
                    let code = self.read_hex_quad(escape_start)?;
                    match (high_surrogate.take(), code) {
                        (None, 0xD800..=0xDBFF) => {
                            high_surrogate = Some((escape_start, code));
                            continue;
                        }
                        (Some((_, high)), 0xDC00..=0xDFFF) => {
                            let combined = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
                            char::from_u32(combined).ok_or_else(|| {
                                PathSyntaxError::at(
                                    escape_start,
                                    Some('u'),
                                    "Invalid unicode escape sequence",
                                )
                            })?
                        }
                        (high, code) => match (high, char::from_u32(code)) {
                            (None, Some(decoded)) => decoded,
                            _ => {
                                return Err(PathSyntaxError::at(
                                    escape_start,
                                    Some('u'),
                                    "Invalid unicode escape sequence",
                                ))
                            }
                        },
                    }
                }
                _ => {
                    return Err(PathSyntaxError::at(
                        escape_start,
                        Some(escaped),
                        "Invalid escape sequence",
                    ))
                }
            };

            if let Some((offset, _)) = high_surrogate {
                return Err(PathSyntaxError::at(
                    offset,
                    Some('u'),
                    "Invalid unicode escape sequence",
                ));
            }
            name.push(decoded);
        }
    }

    fn read_hex_quad(&mut self, escape_start: usize) -> Result<u32, PathSyntaxError> {
        let mut code = 0;
        for _ in 0..4 {
            match self.current().and_then(|ch| ch.to_digit(16)) {
                Some(digit) => {
                    code = (code << 4) | digit;
                    self.position += 1;
                }
                None => {
                    return Err(PathSyntaxError::at(
                        escape_start,
                        Some('u'),
                        "Invalid unicode escape sequence",
                    ))
                }
            }
        }
        Ok(code)
    }

    /// `[1]`, `[1:4]`, `[:4:2]`, `[1,3,5:]` and so on.
    fn read_array_segment(&mut self) -> Result<(), PathSyntaxError> {
        let mut members = Vec::new();
        let mut parts: Vec<Option<u64>> = Vec::with_capacity(3);
        let mut number: Option<u64> = None;

        while let Some(ch) = self.current() {
            match ch {
                ']' | ',' => {
                    parts.push(number.take());
                    members.push(self.array_member(&parts)?);
                    parts.clear();
                    self.position += 1;

                    if ch == ']' {
                        return match Segment::union(members) {
                            Some(segment) => {
                                self.segments.push(segment);
                                Ok(())
                            }
                            None => Err(self.error("Illegal array accessor")),
                        };
                    }
                }
                ':' => {
                    if parts.len() == 2 {
                        return Err(self.illegal(&[DIGIT, ",", "]"]));
                    }
                    parts.push(number.take());
                    self.position += 1;
                }
                '0'..='9' => {
                    let digit = u64::from(ch as u8 - b'0');
                    let value = number
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|value| value.checked_add(digit))
                        .ok_or_else(|| self.error("Array index out of range"))?;
                    number = Some(value);
                    self.position += 1;
                }
                _ => return Err(self.illegal(&[DIGIT, ":", ",", "]"])),
            }
        }

        Err(self.error("Unclosed array expression"))
    }

    fn array_member(&self, parts: &[Option<u64>]) -> Result<Segment, PathSyntaxError> {
        let segment = match *parts {
            [Some(index)] => Segment::Index(index),
            [start, end] if start.is_some() || end.is_some() => Segment::Slice {
                start: start.unwrap_or(0),
                end,
            },
            [start, end, Some(step)] => Segment::Step {
                start: start.unwrap_or(0),
                end,
                step,
            },
            _ => return Err(self.error("Illegal array accessor")),
        };

        segment
            .validate()
            .map_err(|message| self.error(&capitalized(message)))?;
        Ok(segment)
    }
}

fn capitalized(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::path::{Accessor, Path, Segment};

    fn segments(text: &str) -> Vec<Segment> {
        Path::parse(text).unwrap().segments().to_vec()
    }

    #[test]
    fn parses_members_and_indices() {
        assert_eq!(
            vec![
                Segment::Root,
                Segment::member("store"),
                Segment::member("book"),
                Segment::Index(0),
                Segment::member("a b"),
            ],
            segments("  $.store['book'][0][\"a b\"]")
        );
    }

    #[test]
    fn parses_array_forms() {
        assert_eq!(
            vec![
                Segment::Root,
                Segment::Slice {
                    start: 0,
                    end: Some(4)
                },
                Segment::Slice {
                    start: 2,
                    end: None
                },
                Segment::Step {
                    start: 0,
                    end: None,
                    step: 2
                },
                Segment::Union(vec![
                    Segment::Index(1),
                    Segment::Step {
                        start: 3,
                        end: Some(9),
                        step: 3
                    },
                ]),
            ],
            segments("$[:4][2:][::2][1,3:9:3]")
        );
    }

    #[test]
    fn parses_wildcards_and_recursion() {
        assert_eq!(
            vec![
                Segment::Root,
                Segment::Recursive,
                Segment::member("a"),
                Segment::Wildcard(Accessor::Object),
                Segment::Recursive,
                Segment::Index(1),
                Segment::Wildcard(Accessor::Array),
            ],
            segments("$..a.*..[1][*]")
        );
        assert_eq!(vec![Segment::Root], segments("$..*"));
        assert_eq!(vec![Segment::Root], segments("$..[*]"));
    }

    #[test]
    fn decodes_escapes_in_quoted_names() {
        assert_eq!(
            vec![Segment::Root, Segment::member("it's\t\u{20AC}\u{1F600}\"")],
            segments(r#"$['it\'s\t\u20ac\uD83D\uDE00"']"#)
        );
    }

    #[rstest]
    #[case("$")]
    #[case("$.a.b")]
    #[case("$['a b']")]
    #[case("$['it\\'s']")]
    #[case("$[1]")]
    #[case("$[:4]")]
    #[case("$[2:]")]
    #[case("$[1:3:2]")]
    #[case("$[::2]")]
    #[case("$[1,4:,6::2]")]
    #[case("$.*[*]")]
    #[case("$..a")]
    #[case("$..[0]")]
    #[case("$..['a b']")]
    fn renders_canonically(#[case] text: &str) {
        assert_eq!(text, Path::parse(text).unwrap().to_string());
    }

    #[test]
    fn quoted_identifiers_render_with_dots() {
        assert_eq!("$.a.b", Path::parse("$.a[\"b\"]").unwrap().to_string());
    }

    #[rstest]
    #[case("", 0)]
    #[case("a", 0)]
    #[case("$a", 1)]
    #[case("$.", 2)]
    #[case("$..", 3)]
    #[case("$.a..", 5)]
    #[case("$.a...b", 5)]
    #[case("$.a..*", 5)]
    #[case("$..*.a", 3)]
    #[case("$.a..[*]", 5)]
    #[case("$..[*][0]", 3)]
    #[case("$.[*]", 2)]
    #[case("$[", 2)]
    #[case("$[*", 3)]
    #[case("$[-1]", 2)]
    #[case("$[?(@.a)]", 2)]
    #[case("$[(@.length-1)]", 2)]
    #[case("$[,]", 2)]
    #[case("$[,1]", 2)]
    #[case("$[1,]", 4)]
    #[case("$[:]", 3)]
    #[case("$[1:1]", 5)]
    #[case("$[4:2]", 5)]
    #[case("$[1:2:]", 6)]
    #[case("$[::0]", 5)]
    #[case("$[1:2:3:4]", 7)]
    #[case("$[1", 3)]
    #[case("$['a", 4)]
    #[case("$['a'", 5)]
    #[case("$['a'x", 5)]
    #[case("$['\\x']", 4)]
    #[case("$['\\u12']", 4)]
    #[case("$['\\ud800']", 4)]
    #[case("$.a b", 3)]
    fn rejects(#[case] text: &str, #[case] offset: usize) {
        let err = Path::parse(text).unwrap_err();
        assert_eq!(offset, err.offset(), "{text}: {err}");
    }

    #[test]
    fn illegal_char_lists_alternatives() {
        let err = Path::parse("$.a?").unwrap_err();
        assert_eq!(
            "Illegal character '?' at position 3, expected '.' or '['",
            err.to_string()
        );
        assert_eq!(Some('?'), err.found());
        assert_eq!(&[".", "["], err.expected());
    }
}
