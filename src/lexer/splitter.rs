use super::{escapes, is_quote, LexError};

/// Lazy split of a line into raw stage strings on `|` outside quotes.
pub struct PipeSplit<'a> {
    input: &'a str,
    pos: usize,
    index: usize,
    done: bool,
}

impl<'a> PipeSplit<'a> {
    pub fn new(input: &'a str) -> Self {
        PipeSplit {
            input,
            pos: 0,
            index: 0,
            done: false,
        }
    }

    fn finish_stage(&mut self, stage: &'a str) -> Result<&'a str, LexError> {
        let index = self.index;
        self.index += 1;
        if stage.trim().is_empty() {
            self.done = true;
            return Err(LexError::EmptyPipelineStage { index });
        }
        Ok(stage)
    }
}

impl<'a> Iterator for PipeSplit<'a> {
    type Item = Result<&'a str, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.input[self.pos..];
        let mut quote: Option<(char, usize)> = None;
        let mut chars = rest.char_indices().peekable();

        while let Some((i, ch)) = chars.next() {
            match ch {
                '\\' => {
                    if let Some(&(_, next)) = chars.peek() {
                        if escapes(quote.map(|(q, _)| q), next) {
                            chars.next();
                        }
                    }
                }
                c if is_quote(c) => match quote {
                    None => quote = Some((c, self.pos + i)),
                    Some((q, _)) if q == c => quote = None,
                    Some(_) => {}
                },
                '|' if quote.is_none() => {
                    let stage = &rest[..i];
                    self.pos += i + 1;
                    return Some(self.finish_stage(stage));
                }
                _ => {}
            }
        }

        self.done = true;
        if let Some((quote, pos)) = quote {
            return Some(Err(LexError::UnbalancedQuote { quote, pos }));
        }
        let index = self.index;
        self.index += 1;
        if rest.trim().is_empty() {
            return Some(Err(LexError::EmptyPipelineStage { index }));
        }
        Some(Ok(rest))
    }
}
