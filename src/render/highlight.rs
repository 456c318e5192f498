use lazy_static::lazy_static;
use regex::Regex;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::render::code_meta::CodeMeta;
use crate::render::{CodeBlock, CodeLine, LineMarker, RenderError};

pub const PLAIN_TEXT: &str = "plaintext";
pub const PLAIN_TEXT_LABEL: &str = "Terminal/Plain Text";

lazy_static! {
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
    static ref CODE_ANNOTATION: Regex = Regex::new(
        r"\s*(?://|#|--|/\*|<!--)?\s*\[!code (\+\+|--)\]\s*(?:\*/|-->)?\s*$"
    ).unwrap();
}

pub fn has_theme(name: &str) -> bool {
    THEME_SET.themes.contains_key(name)
}

/// Display label for a fence language, `None` when the language is not known.
pub fn language_label(lang: &str) -> Option<&'static str> {
    let label = match lang.to_ascii_lowercase().as_str() {
        "js" | "javascript" | "mjs" | "cjs" => "JavaScript",
        "jsx" => "JSX",
        "ts" | "typescript" => "TypeScript",
        "tsx" => "TSX",
        "rs" | "rust" => "Rust",
        "py" | "python" => "Python",
        "go" | "golang" => "Go",
        "java" => "Java",
        "kt" | "kotlin" => "Kotlin",
        "c" => "C",
        "cpp" | "c++" | "cc" => "C++",
        "cs" | "csharp" => "C#",
        "rb" | "ruby" => "Ruby",
        "php" => "PHP",
        "swift" => "Swift",
        "html" => "HTML",
        "css" => "CSS",
        "scss" => "SCSS",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "xml" => "XML",
        "sql" => "SQL",
        "md" | "markdown" => "Markdown",
        "mdx" => "MDX",
        "graphql" | "gql" => "GraphQL",
        "dockerfile" | "docker" => "Dockerfile",
        "diff" => "Diff",
        "sh" | "bash" | "shell" | "zsh" | "console" => "Terminal",
        _ => return None,
    };
    Some(label)
}

/// Splits `diff-<lang>` into its base language.
fn diff_base(lang: &str) -> Option<&str> {
    lang.strip_prefix("diff-").filter(|base| !base.is_empty())
}

/// Strips diff notation from the source and returns the clean lines with
/// their markers.
pub fn extract_markers(code: &str, lang: Option<&str>) -> Vec<(String, LineMarker)> {
    let prefixed = lang.is_some_and(|l| l == "diff" || diff_base(l).is_some());
    let strip_prefix = lang.is_some_and(|l| diff_base(l).is_some());

    code.lines()
        .map(|line| {
            if let Some(caps) = CODE_ANNOTATION.captures(line) {
                let marker = if &caps[1] == "++" { LineMarker::Added } else { LineMarker::Removed };
                let start = caps.get(0).map_or(line.len(), |m| m.start());
                return (line[..start].to_string(), marker);
            }

            if prefixed {
                let marker = match line.chars().next() {
                    Some('+') => LineMarker::Added,
                    Some('-') => LineMarker::Removed,
                    _ => LineMarker::None,
                };
                if strip_prefix && marker != LineMarker::None {
                    return (line[1..].to_string(), marker);
                }
                return (line.to_string(), marker);
            }

            (line.to_string(), LineMarker::None)
        })
        .collect()
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    let alias = match lowercase.as_str() {
        "ts" | "typescript" | "tsx" | "jsx" | "mjs" | "cjs" => "js",
        "shell" | "zsh" | "console" => "sh",
        "yml" => "yaml",
        "golang" => "go",
        "c++" => "cpp",
        other => other,
    };
    syntax_set
        .find_syntax_by_token(alias)
        .or_else(|| syntax_set.find_syntax_by_name(alias))
        .or_else(|| syntax_set.find_syntax_by_extension(alias))
}

fn to_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

/// Background and optional foreground of a theme as `#rrggbb`. The
/// background is required.
pub fn theme_colours(theme: &Theme, theme_name: &str) -> Result<(String, Option<String>), RenderError> {
    let background = theme.settings.background.ok_or_else(|| RenderError::MissingThemeAttribute {
        theme: theme_name.to_string(),
        attribute: "background".to_string(),
    })?;
    Ok((to_hex(background), theme.settings.foreground.map(to_hex)))
}

/// Highlights one fenced code block with the named theme.
///
/// Every block carries the theme background. A theme that does not exist or
/// lacks a background colour fails the whole document.
pub fn highlight_code(
    code: &str,
    lang: Option<&str>,
    meta: &CodeMeta,
    theme_name: &str,
) -> Result<CodeBlock, RenderError> {
    let theme = THEME_SET.themes.get(theme_name).ok_or_else(|| RenderError::UnknownTheme {
        theme: theme_name.to_string(),
    })?;
    let (background, foreground) = theme_colours(theme, theme_name)?;

    let lang = lang.map(|l| l.trim().to_ascii_lowercase()).filter(|l| !l.is_empty());
    let base_lang = lang.as_deref().map(|l| diff_base(l).unwrap_or(l));
    let found_syntax = base_lang.and_then(|l| find_syntax(&SYNTAX_SET, l));
    let label = base_lang.and_then(language_label);

    // A language neither syntect nor the label table knows is plain text
    let language = match base_lang {
        Some(l) if found_syntax.is_some() || label.is_some() => l.to_string(),
        _ => PLAIN_TEXT.to_string(),
    };
    let title = meta.title.clone()
        .unwrap_or_else(|| label.unwrap_or(PLAIN_TEXT_LABEL).to_string());
    let syntax = found_syntax.unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

    let marked = extract_markers(code, lang.as_deref());
    let mut source = marked.iter().map(|(line, _)| line.as_str()).collect::<Vec<_>>().join("\n");
    source.push('\n');

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut lines = Vec::with_capacity(marked.len());
    for (idx, line) in LinesWithEndings::from(source.as_str()).enumerate() {
        let ranges = highlighter.highlight_line(line, &SYNTAX_SET).map_err(|e| RenderError::Highlighting {
            language: language.clone(),
            message: e.to_string(),
        })?;
        let html = styled_line_to_highlighted_html(&ranges[..], IncludeBackground::No).map_err(|e| RenderError::Highlighting {
            language: language.clone(),
            message: e.to_string(),
        })?;

        let marker = marked.get(idx).map_or(LineMarker::None, |(_, m)| *m);
        lines.push(CodeLine {
            number: idx + 1,
            html: html.trim_end_matches('\n').to_string(),
            marker,
            highlighted: meta.is_highlighted(idx + 1),
        });
    }

    Ok(CodeBlock {
        language,
        title,
        background,
        foreground,
        copy_enabled: meta.copy_enabled,
        show_line_numbers: meta.show_line_numbers,
        source: source.trim_end_matches('\n').to_string(),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const THEME: &str = "InspiredGitHub";

    #[test]
    fn test_title_from_language() {
        let block = highlight_code("fn main() {}", Some("rust"), &CodeMeta::default(), THEME).unwrap();
        assert_eq!(block.title, "Rust");
        assert_eq!(block.language, "rust");
        assert_eq!(block.lines.len(), 1);
        assert!(block.lines[0].html.contains("<span style="));
        assert!(block.background.starts_with('#'));
        assert!(block.copy_enabled);
    }

    #[test]
    fn test_explicit_title_wins() {
        let meta = CodeMeta { title: Some("src/main.rs".to_string()), ..CodeMeta::default() };
        let block = highlight_code("fn main() {}", Some("rust"), &meta, THEME).unwrap();
        assert_eq!(block.title, "src/main.rs");
    }

    #[test]
    fn test_plain_text_fallback() {
        let block = highlight_code("just text", None, &CodeMeta::default(), THEME).unwrap();
        assert_eq!(block.title, PLAIN_TEXT_LABEL);
        assert_eq!(block.language, PLAIN_TEXT);

        let block = highlight_code("???", Some("klingon"), &CodeMeta::default(), THEME).unwrap();
        assert_eq!(block.title, PLAIN_TEXT_LABEL);
        assert_eq!(block.language, PLAIN_TEXT);

        let block = highlight_code("+ q'plah", Some("diff-klingon"), &CodeMeta::default(), THEME).unwrap();
        assert_eq!(block.language, PLAIN_TEXT);
        assert_eq!(block.lines[0].marker, LineMarker::Added);
    }

    #[test]
    fn test_diff_language() {
        let code = "fn main() {\n-    old();\n+    new();\n }";
        let block = highlight_code(code, Some("diff-rust"), &CodeMeta::default(), THEME).unwrap();
        let markers: Vec<LineMarker> = block.lines.iter().map(|l| l.marker).collect();
        assert_eq!(markers, [LineMarker::None, LineMarker::Removed, LineMarker::Added, LineMarker::None]);
        assert_eq!(block.title, "Rust");
        assert_eq!(block.source, "fn main() {\n    old();\n    new();\n }");
    }

    #[test]
    fn test_code_annotations() {
        let code = "let a = 1; // [!code --]\nlet a = 2; // [!code ++]\nlet b = 3;";
        let marked = extract_markers(code, Some("js"));
        assert_eq!(marked, vec![
            ("let a = 1;".to_string(), LineMarker::Removed),
            ("let a = 2;".to_string(), LineMarker::Added),
            ("let b = 3;".to_string(), LineMarker::None),
        ]);
    }

    #[test]
    fn test_no_markers_without_notation() {
        let marked = extract_markers("-1\n+2", Some("python"));
        assert!(marked.iter().all(|(_, m)| *m == LineMarker::None));
    }

    #[test]
    fn test_unknown_theme() {
        let err = highlight_code("x", Some("rust"), &CodeMeta::default(), "no-such-theme").unwrap_err();
        assert!(matches!(err, RenderError::UnknownTheme { .. }));
    }

    #[test]
    fn test_theme_without_background() {
        let err = theme_colours(&Theme::default(), "bare").unwrap_err();
        assert!(matches!(err, RenderError::MissingThemeAttribute { ref attribute, .. } if attribute == "background"));

        let theme = &THEME_SET.themes[THEME];
        let (background, _) = theme_colours(theme, THEME).unwrap();
        assert_eq!(background.len(), 7);
    }

    #[test]
    fn test_highlighted_lines() {
        let meta = CodeMeta { highlight: vec![(2, 2)], ..CodeMeta::default() };
        let block = highlight_code("a\nb\nc", Some("txt"), &meta, THEME).unwrap();
        let highlighted: Vec<bool> = block.lines.iter().map(|l| l.highlighted).collect();
        assert_eq!(highlighted, [false, true, false]);
    }
}
