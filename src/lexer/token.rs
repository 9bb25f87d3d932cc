/// One argument after quote removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Set when any part of the token was delimited by quotes.
    pub quoted: bool,
}

impl Token {
    pub fn quoted(text: &str) -> Self {
        Token {
            text: text.to_string(),
            quoted: true,
        }
    }

    pub fn unquoted(text: &str) -> Self {
        Token {
            text: text.to_string(),
            quoted: false,
        }
    }
}
