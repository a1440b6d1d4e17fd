use crate::token::Token;

/// Lazily renders a sequence of tokens as compact JSON text.
///
/// Each item is one fragment of the output; concatenating them yields the
/// document. Separators are inserted where the grammar needs them, and
/// consecutive top-level values are written one per line.
pub struct TokenWriter<Iter>
where
    Iter: IntoIterator<Item = Token>,
{
    state: TokenWriterState,
    depth: usize,
    iter: Iter::IntoIter,
    queued: Option<Result<String, serde_json::Error>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenWriterState {
    /// An object or array just opened, a name was written, or nothing was.
    ValueExpected,
    AfterValue,
}

impl<Iter> TokenWriter<Iter>
where
    Iter: IntoIterator<Item = Token>,
{
    pub(crate) fn new(tokens: Iter) -> TokenWriter<Iter> {
        Self {
            state: TokenWriterState::ValueExpected,
            depth: 0,
            iter: tokens.into_iter(),
            queued: None,
        }
    }

    fn render(&mut self, token: Token) -> Result<String, serde_json::Error> {
        let rendered = match token {
            Token::ObjectStart | Token::ArrayStart => {
                self.depth += 1;
                self.state = TokenWriterState::ValueExpected;
                return Ok(if token == Token::ObjectStart { "{" } else { "[" }.to_string());
            }
            Token::ObjectEnd | Token::ArrayEnd => {
                self.depth = self.depth.saturating_sub(1);
                if token == Token::ObjectEnd { "}" } else { "]" }.to_string()
            }
            Token::Name(name) => {
                self.state = TokenWriterState::ValueExpected;
                let mut rendered = serde_json::to_string(&name)?;
                rendered.push(':');
                return Ok(rendered);
            }
            Token::String(value) => serde_json::to_string(&value)?,
            Token::Number(value) => value,
            Token::Boolean(value) => value.to_string(),
            Token::Null => "null".to_string(),
            Token::DocumentEnd => {
                self.depth = 0;
                self.state = TokenWriterState::ValueExpected;
                return Ok("\n".to_string());
            }
        };

        self.state = TokenWriterState::AfterValue;
        Ok(rendered)
    }

    fn separator(&self, token: &Token) -> Option<&'static str> {
        if self.state != TokenWriterState::AfterValue
            || token.is_end()
            || *token == Token::DocumentEnd
        {
            return None;
        }
        Some(if self.depth == 0 { "\n" } else { "," })
    }
}

impl<Iter> Iterator for TokenWriter<Iter>
where
    Iter: IntoIterator<Item = Token>,
{
    type Item = Result<String, serde_json::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let queued = std::mem::take(&mut self.queued);
        if queued.is_some() {
            return queued;
        }

        let token = self.iter.next()?;
        match self.separator(&token) {
            Some(separator) => {
                self.queued = Some(self.render(token));
                Some(Ok(separator.to_string()))
            }
            None => Some(self.render(token)),
        }
    }
}
