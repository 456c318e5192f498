use crate::render::RenderError;

/// Annotations written after the language of a fenced code block:
///
/// ````text
/// ```rust title="src/main.rs" {2,4-5} showLineNumbers noCopy
/// ````
#[derive(Debug, Clone, PartialEq)]
pub struct CodeMeta {
    pub title: Option<String>,
    pub copy_enabled: bool,
    pub show_line_numbers: bool,
    /// 1-based inclusive line ranges.
    pub highlight: Vec<(usize, usize)>,
}

impl Default for CodeMeta {
    fn default() -> Self {
        CodeMeta {
            title: None,
            copy_enabled: true,
            show_line_numbers: false,
            highlight: vec![],
        }
    }
}

impl CodeMeta {
    pub fn parse(meta: Option<&str>) -> Result<CodeMeta, RenderError> {
        let mut res = CodeMeta::default();
        let Some(meta) = meta else {
            return Ok(res);
        };

        for token in tokenize(meta)? {
            match token {
                Token::Pair(key, value) if key == "title" => res.title = Some(value),
                Token::Pair(_, _) => {}
                Token::Word(word) if word.starts_with('{') && word.ends_with('}') => {
                    res.highlight.extend(parse_ranges(meta, &word[1..word.len() - 1])?);
                }
                Token::Word(word) => match word.as_str() {
                    "noCopy" | "nocopy" | "no-copy" => res.copy_enabled = false,
                    "showLineNumbers" | "lineNumbers" => res.show_line_numbers = true,
                    _ => {}
                },
            }
        }

        Ok(res)
    }

    pub fn is_highlighted(&self, line_number: usize) -> bool {
        self.highlight.iter().any(|(from, to)| line_number >= *from && line_number <= *to)
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Pair(String, String),
}

fn invalid(meta: &str, message: &str) -> RenderError {
    RenderError::InvalidCodeMeta {
        meta: meta.to_string(),
        message: message.to_string(),
    }
}

fn tokenize(meta: &str) -> Result<Vec<Token>, RenderError> {
    let mut tokens = vec![];
    let mut chars = meta.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut word = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
            word.push(c);
        }

        if chars.next_if_eq(&'=').is_none() {
            tokens.push(Token::Word(word));
            continue;
        }

        let value = match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(invalid(meta, &format!("unterminated quote in `{}` value", word)));
                }
                value
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
                value
            }
        };
        tokens.push(Token::Pair(word, value));
    }

    Ok(tokens)
}

fn parse_ranges(meta: &str, ranges: &str) -> Result<Vec<(usize, usize)>, RenderError> {
    let parse = |s: &str| -> Result<usize, RenderError> {
        s.trim().parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| invalid(meta, &format!("invalid line number `{}`", s)))
    };

    ranges.split(',')
        .filter(|r| !r.trim().is_empty())
        .map(|r| match r.split_once('-') {
            Some((from, to)) => {
                let (from, to) = (parse(from)?, parse(to)?);
                if from > to {
                    return Err(invalid(meta, &format!("empty line range `{}`", r)));
                }
                Ok((from, to))
            }
            None => parse(r).map(|n| (n, n)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_meta() {
        assert_eq!(CodeMeta::parse(None).unwrap(), CodeMeta::default());
        assert_eq!(CodeMeta::parse(Some("   ")).unwrap(), CodeMeta::default());
    }

    #[test]
    fn test_full_meta() {
        let meta = CodeMeta::parse(Some(r#"title="src/main file.rs" {1,3-4} showLineNumbers noCopy"#)).unwrap();
        assert_eq!(meta.title.as_deref(), Some("src/main file.rs"));
        assert!(!meta.copy_enabled);
        assert!(meta.show_line_numbers);
        assert_eq!(meta.highlight, vec![(1, 1), (3, 4)]);
        assert!(meta.is_highlighted(4));
        assert!(!meta.is_highlighted(2));
    }

    #[test]
    fn test_unquoted_and_single_quoted_titles() {
        let meta = CodeMeta::parse(Some("title=Cargo.toml")).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Cargo.toml"));
        let meta = CodeMeta::parse(Some("title='a b'")).unwrap();
        assert_eq!(meta.title.as_deref(), Some("a b"));
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let meta = CodeMeta::parse(Some("wrap caption=\"x\"")).unwrap();
        assert_eq!(meta, CodeMeta::default());
    }

    #[test]
    fn test_unterminated_quote() {
        let err = CodeMeta::parse(Some(r#"title="oops"#)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidCodeMeta { .. }));
    }

    #[test]
    fn test_bad_ranges() {
        assert!(CodeMeta::parse(Some("{0}")).is_err());
        assert!(CodeMeta::parse(Some("{5-2}")).is_err());
        assert!(CodeMeta::parse(Some("{a}")).is_err());
    }
}
