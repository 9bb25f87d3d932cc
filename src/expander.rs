use nix::unistd::{getuid, User};

use crate::environment::VarLookup;
use crate::lexer::{escapes, is_quote, Token};

/// Letters, digits and underscore, not starting with a digit.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace every `${NAME}` in `input` with its value from `vars`.
///
/// Undefined variables become the empty string. Names that are not valid
/// identifiers are left as written. An odd run of backslashes in front of
/// `${` escapes the reference: one backslash is consumed and the reference is
/// kept literally. Each pair in the run collapses to a single backslash.
/// Substituted values are never scanned again.
///
/// The result is final text. Use [`substitute_for_lexer`] when the result
/// will be tokenized afterwards.
pub fn substitute<L: VarLookup + ?Sized>(input: &str, vars: &L) -> String {
    expand_references(input, vars, false)
}

/// Same rules as [`substitute`], for text that [`Lexer::split_words`] reads next.
///
/// Backslashes that survive a run in front of `${` are written so that the
/// tokenizer turns them back into exactly that many literal backslashes, given
/// the quote they sit in.
///
/// [`Lexer::split_words`]: crate::lexer::Lexer::split_words
pub fn substitute_for_lexer<L: VarLookup + ?Sized>(input: &str, vars: &L) -> String {
    expand_references(input, vars, true)
}

fn expand_references<L: VarLookup + ?Sized>(input: &str, vars: &L, for_lexer: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        let unslashed = rest.trim_start_matches('\\');
        let slashes = rest.len() - unslashed.len();

        if unslashed.starts_with("${") {
            let Some(close) = unslashed[2..].find('}') else {
                // no closing brace, nothing more can match
                break;
            };
            let name = &unslashed[2..2 + close];
            let reference = &unslashed[..close + 3];

            // the tokenizer only unescapes `\\` outside single quotes
            let width = if for_lexer && quote != Some('\'') { 2 } else { 1 };
            out.push_str(&"\\".repeat(slashes / 2 * width));
            if slashes % 2 == 1 || !is_valid_name(name) {
                out.push_str(reference);
            } else {
                log::trace!("substituting ${{{}}}", name);
                out.push_str(vars.lookup(name).unwrap_or(""));
            }
            rest = &unslashed[close + 3..];
            continue;
        }

        if slashes > 0 {
            out.push_str(&rest[..slashes]);
            rest = unslashed;
            // a quote escaped by the run's last backslash neither opens nor closes
            let last_is_free = slashes % 2 == 1 || quote == Some('\'');
            if let Some(next) = rest.chars().next() {
                if last_is_free && escapes(quote, next) {
                    out.push(next);
                    rest = &rest[next.len_utf8()..];
                }
            }
            continue;
        }

        if is_quote(ch) {
            quote = match quote {
                None => Some(ch),
                Some(q) if q == ch => None,
                open => open,
            };
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out.push_str(rest);
    out
}

/// Expand a leading `~` or `~user` to a home directory.
///
/// Words whose home cannot be determined are returned unchanged.
pub fn expand_tilde<L: VarLookup + ?Sized>(word: &str, vars: &L) -> String {
    let Some(rest) = word.strip_prefix('~') else {
        return word.to_string();
    };
    let (user, tail) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };

    let home = if user.is_empty() {
        vars.lookup("HOME").map(|h| h.to_string()).or_else(|| {
            User::from_uid(getuid())
                .ok()
                .flatten()
                .map(|u| u.dir.to_string_lossy().into_owned())
        })
    } else {
        User::from_name(user)
            .ok()
            .flatten()
            .map(|u| u.dir.to_string_lossy().into_owned())
    };

    match home {
        Some(home) => {
            let home = home.trim_end_matches('/');
            if home.is_empty() && tail.is_empty() {
                "/".to_string()
            } else {
                format!("{}{}", home, tail)
            }
        }
        None => word.to_string(),
    }
}

/// Turn tokens into argv strings, expanding `~` in unquoted tokens only.
pub fn expand_words<L: VarLookup + ?Sized>(tokens: Vec<Token>, vars: &L) -> Vec<String> {
    tokens
        .into_iter()
        .map(|t| {
            if t.quoted {
                t.text
            } else {
                expand_tilde(&t.text, vars)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("FOO"));
        assert!(is_valid_name("_x1"));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a-b"));
        assert!(!is_valid_name("a b"));
    }

    #[test]
    fn test_substitute_defined_and_undefined() {
        let env = vars(&[("FOO", "bar")]);
        assert_eq!(substitute("${FOO}baz", &env), "barbaz");
        assert_eq!(substitute("${UNDEFINED}", &env), "");
        assert_eq!(substitute("echo ${FOO} ${FOO}", &env), "echo bar bar");
    }

    #[test]
    fn test_escaped_reference_is_literal() {
        let defined = vars(&[("FOO", "bar")]);
        let undefined = vars(&[]);
        assert_eq!(substitute(r"\${FOO}", &defined), "${FOO}");
        assert_eq!(substitute(r"\${FOO}", &undefined), "${FOO}");
        assert_eq!(substitute(r"echo \${FOO} ${FOO}", &defined), "echo ${FOO} bar");
    }

    #[test]
    fn test_backslash_runs() {
        let env = vars(&[("FOO", "bar")]);
        assert_eq!(substitute(r"\\${FOO}", &env), r"\bar");
        assert_eq!(substitute(r"\\\${FOO}", &env), r"\${FOO}");
        assert_eq!(substitute(r"\\\\${FOO}", &env), r"\\bar");
        // backslashes elsewhere are left for the tokenizer
        assert_eq!(substitute(r"a\\b ${FOO}", &env), r"a\\b bar");
    }

    #[test]
    fn test_lexer_form_keeps_surviving_backslashes() {
        let env = vars(&[("FOO", "bar")]);
        assert_eq!(substitute_for_lexer(r"\\${FOO}", &env), r"\\bar");
        assert_eq!(substitute_for_lexer(r"\\\${FOO}", &env), r"\\${FOO}");
        assert_eq!(substitute_for_lexer(r"\${FOO}", &env), "${FOO}");
        assert_eq!(substitute_for_lexer(r#""\\${FOO}""#, &env), r#""\\bar""#);
        // single quotes keep backslashes as they are
        assert_eq!(substitute_for_lexer(r"'\\${FOO}'", &env), r"'\bar'");
    }

    #[test]
    fn test_escaped_quote_does_not_open_a_quote() {
        let env = vars(&[("FOO", "bar")]);
        assert_eq!(substitute_for_lexer(r"it\'s \\${FOO}", &env), r"it\'s \\bar");
        assert_eq!(substitute_for_lexer(r"'a\' \\${FOO}'", &env), r"'a\' \bar'");
    }

    #[test]
    fn test_invalid_name_passes_through() {
        let env = vars(&[("FOO", "bar")]);
        assert_eq!(substitute("${1FOO}", &env), "${1FOO}");
        assert_eq!(substitute("${}", &env), "${}");
        assert_eq!(substitute("${A-B} ${FOO}", &env), "${A-B} bar");
    }

    #[test]
    fn test_unterminated_reference() {
        let env = vars(&[("FOO", "bar")]);
        assert_eq!(substitute("${FOO} ${FOO", &env), "bar ${FOO");
        assert_eq!(substitute(r"\${FOO", &env), r"\${FOO");
    }

    #[test]
    fn test_no_rescan_of_values() {
        let env = vars(&[("A", "${B}"), ("B", "oops")]);
        assert_eq!(substitute("${A}", &env), "${B}");
    }

    #[test]
    fn test_dollar_without_brace() {
        let env = vars(&[("FOO", "bar")]);
        assert_eq!(substitute("$FOO costs $5", &env), "$FOO costs $5");
    }

    #[test]
    fn test_tilde() {
        let env = vars(&[("HOME", "/home/me")]);
        assert_eq!(expand_tilde("~", &env), "/home/me");
        assert_eq!(expand_tilde("~/src", &env), "/home/me/src");
        assert_eq!(expand_tilde("a~b", &env), "a~b");
        assert_eq!(
            expand_tilde("~no_such_user_zz9", &env),
            "~no_such_user_zz9"
        );

        let root = vars(&[("HOME", "/")]);
        assert_eq!(expand_tilde("~", &root), "/");
        assert_eq!(expand_tilde("~/etc", &root), "/etc");
    }

    #[test]
    fn test_quoted_tilde_is_kept() {
        let env = vars(&[("HOME", "/home/me")]);
        let words = expand_words(vec![Token::unquoted("~"), Token::quoted("~")], &env);
        assert_eq!(words, vec!["/home/me", "~"]);
    }
}
