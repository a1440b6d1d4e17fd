use rand::{
    rngs::{StdRng, ThreadRng},
    Rng, SeedableRng,
};

/// An endless supply of random, mostly-JSON documents, including the lenient
/// extensions (comments, single quotes, bare words, `;` and `=>`).
pub fn fuzz() -> JsonFuzzer<ThreadRng> {
    JsonFuzzer::new(rand::rng())
}

/// Like [`fuzz`], but reproducible.
pub fn fuzz_seeded(seed: u64) -> JsonFuzzer<StdRng> {
    JsonFuzzer::new(StdRng::seed_from_u64(seed))
}

/// An endless supply of random, mostly-JSONPath expressions.
pub fn fuzz_paths_seeded(seed: u64) -> PathFuzzer<StdRng> {
    PathFuzzer(StdRng::seed_from_u64(seed))
}

pub struct JsonFuzzer<R: Rng> {
    rng: R,
    pieces: usize,
}

impl<R: Rng> JsonFuzzer<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            pieces: 10_000,
        }
    }

    /// Number of random pieces that make up each document.
    pub fn with_pieces(mut self, pieces: usize) -> Self {
        self.pieces = pieces;
        self
    }

    fn next_char(&mut self) -> char {
        self.rng.random()
    }

    fn next_escape_sequence(&mut self) -> String {
        match self.rng.random_range(0..18) {
            0 => "\\\"".to_string(),
            1 => "\\\\".to_string(),
            2 => "\\/".to_string(),
            3 => "\\b".to_string(),
            4 => "\\f".to_string(),
            5 => "\\n".to_string(),
            6 => "\\r".to_string(),
            7 => "\\t".to_string(),
            8 => "\\'".to_string(),
            9 => format!("\\{}", self.next_char()),
            _ => {
                let mut result = String::with_capacity(6);
                result.push_str("\\u");
                // occasionally too short, to exercise the error path
                let digits = if self.rng.random_bool(0.05) {
                    self.rng.random_range(0..4)
                } else {
                    4
                };
                for _ in 0..digits {
                    let digit = self.rng.random_range(0..16u32);
                    let ch = char::from_digit(digit, 16).unwrap_or('0');
                    result.push(if self.rng.random_bool(0.5) {
                        ch.to_ascii_uppercase()
                    } else {
                        ch
                    });
                }
                result
            }
        }
    }

    fn push_quoted(&mut self, string: &mut String, quote: char) {
        string.push(quote);
        for _ in 0..self.rng.random_range(0..100) {
            match self.next_char() {
                '\\' => string.push_str(&self.next_escape_sequence()),
                ch if ch == quote => {
                    string.push('\\');
                    string.push(ch);
                }
                ch => string.push(ch),
            }
        }
        if self.rng.random_bool(0.99) {
            string.push(quote);
        }
    }

    fn push_digits(&mut self, string: &mut String) {
        for _ in 0..self.rng.random_range(0..100) {
            string.push(char::from(b'0' + self.rng.random_range(0..10u8)));
        }
    }

    fn push_number(&mut self, string: &mut String) {
        if self.rng.random_bool(0.3) {
            string.push('-');
        }
        self.push_digits(string);

        let num_type = self.rng.random_range(0..3);
        if num_type > 0 {
            string.push('.');
            self.push_digits(string);
        }
        if num_type > 1 {
            string.push(if self.rng.random_bool(0.5) { 'e' } else { 'E' });
            match self.rng.random_range(0..3) {
                0 => string.push('+'),
                1 => string.push('-'),
                _ => {}
            }
            self.push_digits(string);
        }

        if self.rng.random_bool(0.1) {
            for _ in 0..self.rng.random_range(0..10) {
                string.push(self.next_char());
            }
        }
    }

    fn push_comment(&mut self, string: &mut String) {
        let (open, close) = match self.rng.random_range(0..3) {
            0 => ("//", "\n"),
            1 => ("#", "\n"),
            _ => ("/*", "*/"),
        };
        string.push_str(open);
        for _ in 0..self.rng.random_range(0..20) {
            match self.next_char() {
                '\n' | '*' => {}
                ch => string.push(ch),
            }
        }
        if self.rng.random_bool(0.95) {
            string.push_str(close);
        }
    }
}

impl<R: Rng> Iterator for JsonFuzzer<R> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let mut string = String::new();
        if self.rng.random_bool(0.05) {
            string.push_str(")]}'\n");
        }
        if self.rng.random_bool(0.05) {
            string.push('\u{FEFF}');
        }

        for _ in 0..self.pieces {
            match self.rng.random_range(0..32) {
                0 => string.push('{'),
                1 => string.push('}'),
                2 => string.push('['),
                3 => string.push(']'),
                4 | 5 => string.push(','),
                6 => string.push(':'),
                7 => string.push_str(&self.next_escape_sequence()),
                8 | 9 => self.push_quoted(&mut string, '"'),
                10 => self.push_quoted(&mut string, '\''),
                11 | 12 => self.push_number(&mut string),
                13 => string.push_str("null"),
                14 => string.push_str("true"),
                15 => string.push_str("false"),
                16 => string.push_str(match self.rng.random_range(0..4) {
                    0 => "NaN",
                    1 => "Infinity",
                    2 => "-Infinity",
                    _ => "TRUE",
                }),
                17 => string.push(';'),
                18 => string.push_str(if self.rng.random_bool(0.5) { "=" } else { "=>" }),
                19 => self.push_comment(&mut string),
                20 => {
                    for _ in 0..self.rng.random_range(1..10) {
                        string.push(self.rng.random_range('a'..='z'));
                    }
                }
                21 => string.push(self.next_char()),
                _ => string.push(match self.rng.random_range(0..4) {
                    0 => ' ',
                    1 => '\n',
                    2 => '\r',
                    _ => '\t',
                }),
            }
        }

        Some(string)
    }
}

pub struct PathFuzzer<R: Rng>(R);

impl<R: Rng> Iterator for PathFuzzer<R> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let mut path = String::new();
        if self.0.random_bool(0.95) {
            path.push('$');
        }

        for _ in 0..self.0.random_range(0..12) {
            match self.0.random_range(0..20) {
                0..=2 => {
                    path.push('.');
                    for _ in 0..self.0.random_range(0..6) {
                        path.push(self.0.random_range('a'..='z'));
                    }
                }
                3 => path.push_str(".*"),
                4 => path.push_str("[*]"),
                5 => path.push_str(".."),
                6 | 7 => path.push_str(&format!("[{}]", self.0.random_range(0..50))),
                8 => path.push_str(&format!(
                    "[{}:{}]",
                    self.0.random_range(0..20),
                    self.0.random_range(0..20)
                )),
                9 => path.push_str(&format!(
                    "[{}:{}:{}]",
                    self.0.random_range(0..20),
                    self.0.random_range(0..40),
                    self.0.random_range(0..5)
                )),
                10 => path.push_str(&format!(
                    "[{},{}:{}]",
                    self.0.random_range(0..10),
                    self.0.random_range(0..10),
                    self.0.random_range(0..20)
                )),
                11 => path.push_str("['a b']"),
                12 => path.push_str("[\"\\u00e9\\n\"]"),
                13 => path.push_str("[?(@.a)]"),
                14 => path.push('-'),
                15 => path.push(self.0.random()),
                16 => path.push(match self.0.random_range(0..6) {
                    0 => '[',
                    1 => ']',
                    2 => ':',
                    3 => ',',
                    4 => '\'',
                    _ => '\\',
                }),
                _ => path.push_str(&self.0.random_range(0..1000).to_string()),
            }
        }

        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use crate::{fuzz, fuzz_paths_seeded, fuzz_seeded};

    #[test]
    fn seeded_output_is_reproducible() {
        let first = fuzz_seeded(7).with_pieces(100).take(3).collect::<Vec<_>>();
        let second = fuzz_seeded(7).with_pieces(100).take(3).collect::<Vec<_>>();
        assert_eq!(first, second);

        let paths = fuzz_paths_seeded(7).take(20).collect::<Vec<_>>();
        assert_eq!(paths, fuzz_paths_seeded(7).take(20).collect::<Vec<_>>());
    }

    #[test]
    fn produces_text() {
        for document in fuzz().with_pieces(50).take(10) {
            assert!(!document.is_empty());
        }
    }
}
