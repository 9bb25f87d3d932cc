use std::iter::Peekable;
use std::str::CharIndices;

use super::{escapes, is_quote, LexError, Token};

/// Lazy whitespace split of one stage into [`Token`]s.
pub struct Words<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Words<'a> {
    pub fn new(input: &'a str) -> Self {
        Words {
            chars: input.char_indices().peekable(),
        }
    }
}

impl Iterator for Words<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
        self.chars.peek()?;

        let mut text = String::new();
        let mut quoted = false;
        let mut quote: Option<(char, usize)> = None;

        while let Some((pos, ch)) = self.chars.next() {
            let active = quote.map(|(q, _)| q);
            match ch {
                c if active.is_none() && c.is_whitespace() => break,
                '\\' => match self.chars.peek() {
                    Some(&(_, next)) if escapes(active, next) => {
                        text.push(next);
                        self.chars.next();
                    }
                    _ => text.push('\\'),
                },
                c if is_quote(c) => match active {
                    None => {
                        quote = Some((c, pos));
                        quoted = true;
                    }
                    Some(q) if q == c => quote = None,
                    Some(_) => text.push(c),
                },
                c => text.push(c),
            }
        }

        if let Some((quote, pos)) = quote {
            return Some(Err(LexError::UnbalancedQuote { quote, pos }));
        }
        Some(Ok(Token { text, quoted }))
    }
}
