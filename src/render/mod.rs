//! Turns the body of a content file into a typed tree of rendered nodes.
//!
//! The markup is parsed into an mdast tree and walked once. Fenced code is
//! highlighted, headings get unique anchors, math goes through KaTeX and
//! diagram fences are kept as source for the browser. Component tags in MDX
//! documents become widget nodes that `view::components` resolves by name.

use std::collections::HashMap;

use markdown::mdast::{AlignKind, AttributeContent, AttributeValue, Node};
use markdown::{Constructs, ParseOptions};
use spdlog::debug;
use thiserror::Error;

use crate::content::content_file::ContentFormat;
use crate::render::code_meta::CodeMeta;
use crate::render::highlight::highlight_code;
use crate::render::inline::{plain_text, render_inline, Definition, Definitions};
use crate::render::math::render_math;
use crate::render::slugger::Slugger;

pub mod code_meta;
pub mod highlight;
pub mod inline;
pub mod math;
pub mod slugger;

pub const DEFAULT_CODE_THEME: &str = "InspiredGitHub";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("error parsing document: {message}")]
    Parse { message: String },

    #[error("unknown code theme `{theme}`")]
    UnknownTheme { theme: String },

    #[error("code theme `{theme}` does not define a {attribute} colour")]
    MissingThemeAttribute { theme: String, attribute: String },

    #[error("error highlighting {language} code: {message}")]
    Highlighting { language: String, message: String },

    #[error("invalid code block annotation `{meta}`: {message}")]
    InvalidCodeMeta { meta: String, message: String },

    #[error("invalid math expression `{expression}`: {message}")]
    Math { expression: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMarker {
    None,
    Added,
    Removed,
}

impl LineMarker {
    pub fn css_class(&self) -> &'static str {
        match self {
            LineMarker::None => "",
            LineMarker::Added => "diff add",
            LineMarker::Removed => "diff remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeLine {
    pub number: usize,
    pub html: String,
    pub marker: LineMarker,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Resolved language, `plaintext` when the fence has none.
    pub language: String,
    pub title: String,
    /// Theme background, `#rrggbb`.
    pub background: String,
    pub foreground: Option<String>,
    pub copy_enabled: bool,
    pub show_line_numbers: bool,
    pub source: String,
    pub lines: Vec<CodeLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_style(&self) -> Option<&'static str> {
        match self {
            Align::None => None,
            Align::Left => Some("left"),
            Align::Center => Some("center"),
            Align::Right => Some("right"),
        }
    }
}

impl From<&AlignKind> for Align {
    fn from(value: &AlignKind) -> Self {
        match value {
            AlignKind::Left => Align::Left,
            AlignKind::Right => Align::Right,
            AlignKind::Center => Align::Center,
            AlignKind::None => Align::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub checked: Option<bool>,
    pub children: Vec<RenderedNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedNode {
    Paragraph { html: String },
    Heading { depth: u8, id: String, html: String, text: String },
    CodeBlock(CodeBlock),
    Math { html: String },
    Diagram { source: String },
    Table { align: Vec<Align>, header: Vec<String>, rows: Vec<Vec<String>> },
    List { ordered: bool, start: Option<u32>, items: Vec<ListEntry> },
    Blockquote { children: Vec<RenderedNode> },
    Widget { name: String, props: Vec<(String, String)>, children: Vec<RenderedNode> },
    Footnote { id: String, children: Vec<RenderedNode> },
    ThematicBreak,
    Html { html: String },
}

/// Key of the component dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Paragraph,
    Heading,
    CodeBlock,
    Math,
    Diagram,
    Table,
    List,
    Blockquote,
    Widget,
    Footnote,
    ThematicBreak,
    Html,
}

impl RenderedNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            RenderedNode::Paragraph { .. } => NodeKind::Paragraph,
            RenderedNode::Heading { .. } => NodeKind::Heading,
            RenderedNode::CodeBlock(_) => NodeKind::CodeBlock,
            RenderedNode::Math { .. } => NodeKind::Math,
            RenderedNode::Diagram { .. } => NodeKind::Diagram,
            RenderedNode::Table { .. } => NodeKind::Table,
            RenderedNode::List { .. } => NodeKind::List,
            RenderedNode::Blockquote { .. } => NodeKind::Blockquote,
            RenderedNode::Widget { .. } => NodeKind::Widget,
            RenderedNode::Footnote { .. } => NodeKind::Footnote,
            RenderedNode::ThematicBreak => NodeKind::ThematicBreak,
            RenderedNode::Html { .. } => NodeKind::Html,
        }
    }

    /// Nested block nodes, empty for leaves.
    pub fn children(&self) -> Vec<&RenderedNode> {
        match self {
            RenderedNode::Blockquote { children }
            | RenderedNode::Widget { children, .. }
            | RenderedNode::Footnote { children, .. } => children.iter().collect(),
            RenderedNode::List { items, .. } => items.iter().flat_map(|i| i.children.iter()).collect(),
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingOutline {
    pub depth: u8,
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedDocument {
    pub nodes: Vec<RenderedNode>,
    pub headings: Vec<HeadingOutline>,
}

impl RenderedDocument {
    /// Every node of the tree, depth first.
    pub fn walk(&self) -> Vec<&RenderedNode> {
        let mut res = vec![];
        let mut stack: Vec<&RenderedNode> = self.nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            res.push(node);
            stack.extend(node.children().into_iter().rev());
        }
        res
    }

    pub fn code_blocks(&self) -> Vec<&CodeBlock> {
        self.walk().into_iter()
            .filter_map(|n| match n {
                RenderedNode::CodeBlock(block) => Some(block),
                _ => None,
            })
            .collect()
    }

    pub fn has_kind(&self, kind: NodeKind) -> bool {
        self.walk().iter().any(|n| n.kind() == kind)
    }
}

/// Stateless renderer, one per configured code theme.
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    pub theme_name: String,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        RenderPipeline::new(DEFAULT_CODE_THEME)
    }
}

impl RenderPipeline {
    pub fn new(theme_name: &str) -> Self {
        RenderPipeline {
            theme_name: theme_name.to_string(),
        }
    }

    pub fn render(&self, body: &str, format: ContentFormat) -> Result<RenderedDocument, RenderError> {
        let tree = markdown::to_mdast(body, &parse_options(format))
            .map_err(|e| RenderError::Parse { message: e.reason })?;

        let mut walker = Walker {
            theme_name: &self.theme_name,
            slugger: Slugger::new(),
            headings: vec![],
            definitions: collect_definitions(&tree),
        };

        let mut nodes = vec![];
        if let Some(children) = tree.children() {
            walker.blocks(children, &mut nodes)?;
        }
        debug!("Rendered document with {} top level nodes", nodes.len());

        Ok(RenderedDocument {
            nodes,
            headings: walker.headings,
        })
    }
}

fn parse_options(format: ContentFormat) -> ParseOptions {
    let mut constructs = match format {
        ContentFormat::Mdx => Constructs::mdx(),
        ContentFormat::Markdown => Constructs::gfm(),
    };
    constructs.gfm_table = true;
    constructs.gfm_strikethrough = true;
    constructs.gfm_task_list_item = true;
    constructs.gfm_footnote_definition = true;
    constructs.gfm_label_start_footnote = true;
    constructs.math_flow = true;
    constructs.math_text = true;

    ParseOptions {
        constructs,
        math_text_single_dollar: true,
        ..ParseOptions::default()
    }
}

fn collect_definitions(tree: &Node) -> Definitions {
    let mut definitions = HashMap::new();
    let mut stack = vec![tree];
    while let Some(node) = stack.pop() {
        if let Node::Definition(def) = node {
            definitions.entry(def.identifier.clone()).or_insert_with(|| Definition {
                url: def.url.clone(),
                title: def.title.clone(),
            });
        }
        if let Some(children) = node.children() {
            stack.extend(children.iter());
        }
    }
    definitions
}

struct Walker<'a> {
    theme_name: &'a str,
    slugger: Slugger,
    headings: Vec<HeadingOutline>,
    definitions: Definitions,
}

impl Walker<'_> {
    fn blocks(&mut self, nodes: &[Node], out: &mut Vec<RenderedNode>) -> Result<(), RenderError> {
        for node in nodes {
            self.block(node, out)?;
        }
        Ok(())
    }

    fn children(&mut self, nodes: &[Node]) -> Result<Vec<RenderedNode>, RenderError> {
        let mut out = vec![];
        self.blocks(nodes, &mut out)?;
        Ok(out)
    }

    fn block(&mut self, node: &Node, out: &mut Vec<RenderedNode>) -> Result<(), RenderError> {
        match node {
            Node::Paragraph(p) => {
                let html = render_inline(&p.children, &self.definitions)?;
                if !html.trim().is_empty() {
                    out.push(RenderedNode::Paragraph { html });
                }
            }
            Node::Heading(h) => {
                let text = plain_text(&h.children);
                let id = self.slugger.slug(&text);
                let html = render_inline(&h.children, &self.definitions)?;
                self.headings.push(HeadingOutline {
                    depth: h.depth,
                    id: id.clone(),
                    text: text.clone(),
                });
                out.push(RenderedNode::Heading { depth: h.depth, id, html, text });
            }
            Node::Code(code) => out.push(self.code(&code.value, code.lang.as_deref(), code.meta.as_deref())?),
            Node::Math(math) => out.push(RenderedNode::Math { html: render_math(&math.value, true)? }),
            Node::Table(table) => {
                let mut rows = vec![];
                for row in table.children.iter() {
                    let mut cells = vec![];
                    for cell in row.children().map(|c| c.as_slice()).unwrap_or_default() {
                        let content = cell.children().map(|c| c.as_slice()).unwrap_or_default();
                        cells.push(render_inline(content, &self.definitions)?);
                    }
                    rows.push(cells);
                }
                let header = if rows.is_empty() { vec![] } else { rows.remove(0) };
                out.push(RenderedNode::Table {
                    align: table.align.iter().map(Align::from).collect(),
                    header,
                    rows,
                });
            }
            Node::List(list) => {
                let mut items = vec![];
                for child in list.children.iter() {
                    match child {
                        Node::ListItem(li) => items.push(ListEntry {
                            checked: li.checked,
                            children: self.children(&li.children)?,
                        }),
                        other => items.push(ListEntry {
                            checked: None,
                            children: self.children(std::slice::from_ref(other))?,
                        }),
                    }
                }
                out.push(RenderedNode::List {
                    ordered: list.ordered,
                    start: list.start,
                    items,
                });
            }
            Node::Blockquote(quote) => {
                let children = self.children(&quote.children)?;
                out.push(RenderedNode::Blockquote { children });
            }
            Node::MdxJsxFlowElement(el) => {
                let children = self.children(&el.children)?;
                match &el.name {
                    // fragments `<>...</>` only group their children
                    None => out.extend(children),
                    Some(name) => out.push(RenderedNode::Widget {
                        name: name.clone(),
                        props: widget_props(&el.attributes),
                        children,
                    }),
                }
            }
            Node::FootnoteDefinition(def) => {
                let children = self.children(&def.children)?;
                out.push(RenderedNode::Footnote { id: def.identifier.clone(), children });
            }
            Node::ThematicBreak(_) => out.push(RenderedNode::ThematicBreak),
            Node::Html(html) => out.push(RenderedNode::Html { html: html.value.clone() }),
            Node::Definition(_)
            | Node::MdxjsEsm(_)
            | Node::MdxFlowExpression(_)
            | Node::Yaml(_)
            | Node::Toml(_) => {}
            other => {
                let html = render_inline(std::slice::from_ref(other), &self.definitions)?;
                if !html.trim().is_empty() {
                    out.push(RenderedNode::Paragraph { html });
                }
            }
        }
        Ok(())
    }

    fn code(&mut self, value: &str, lang: Option<&str>, meta: Option<&str>) -> Result<RenderedNode, RenderError> {
        let normalized = lang.map(|l| l.to_ascii_lowercase());
        match normalized.as_deref() {
            Some("mermaid") => Ok(RenderedNode::Diagram { source: value.to_string() }),
            Some("math" | "latex" | "katex" | "tex") => Ok(RenderedNode::Math { html: render_math(value, true)? }),
            _ => {
                let meta = CodeMeta::parse(meta)?;
                Ok(RenderedNode::CodeBlock(highlight_code(value, lang, &meta, self.theme_name)?))
            }
        }
    }
}

/// Literal attributes keep their value, bare attributes become `"true"`.
/// Expression attributes are dropped.
fn widget_props(attributes: &[AttributeContent]) -> Vec<(String, String)> {
    attributes.iter()
        .filter_map(|attr| match attr {
            AttributeContent::Property(prop) => match &prop.value {
                None => Some((prop.name.clone(), "true".to_string())),
                Some(AttributeValue::Literal(value)) => Some((prop.name.clone(), value.clone())),
                Some(_) => None,
            },
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::content::front_matter::split_content;
    use crate::content::repository::DEFAULT_EXCERPT_SEPARATOR;
    use crate::render::highlight::PLAIN_TEXT_LABEL;
    use crate::test_data::POST_DATA_MDX;

    use super::*;

    fn render_mdx(body: &str) -> RenderedDocument {
        RenderPipeline::default().render(body, ContentFormat::Mdx).unwrap()
    }

    #[test]
    fn test_render_post() {
        let split = split_content(POST_DATA_MDX, DEFAULT_EXCERPT_SEPARATOR);
        let doc = render_mdx(&split.body);

        let ids: Vec<&str> = doc.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["why", "why-1"]);

        let blocks = doc.code_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].title, "main.rs");
        assert_eq!(blocks[0].language, "rust");
        assert!(matches!(&doc.nodes[0], RenderedNode::Paragraph { html } if html.contains("short story")));
    }

    #[test]
    fn test_code_titles() {
        let doc = render_mdx("```ts\nconst a = 1;\n```\n\n```\nplain\n```\n\n```sh noCopy\nls -la\n```\n");
        let blocks = doc.code_blocks();
        let titles: Vec<&str> = blocks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["TypeScript", PLAIN_TEXT_LABEL, "Terminal"]);
        assert_eq!(blocks[1].language, "plaintext");
        assert!(blocks[0].copy_enabled);
        assert!(!blocks[2].copy_enabled);
    }

    #[test]
    fn test_math_and_diagrams() {
        let doc = render_mdx("$$\nx^2\n$$\n\n```mermaid\ngraph TD; A-->B;\n```\n\nInline $a+b$ math.\n");
        assert!(doc.has_kind(NodeKind::Math));
        assert!(matches!(&doc.nodes[1], RenderedNode::Diagram { source } if source.contains("A-->B")));
        assert!(matches!(&doc.nodes[2], RenderedNode::Paragraph { html } if html.contains("katex")));
    }

    #[test]
    fn test_widgets() {
        let doc = render_mdx("<Callout type=\"warning\" dismissible>\n\nCareful **now**.\n\n</Callout>\n");
        match &doc.nodes[0] {
            RenderedNode::Widget { name, props, children } => {
                assert_eq!(name, "Callout");
                assert_eq!(props, &vec![
                    ("type".to_string(), "warning".to_string()),
                    ("dismissible".to_string(), "true".to_string()),
                ]);
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected a widget, got {:?}", other),
        }
    }

    #[test]
    fn test_expressions_are_skipped() {
        let doc = render_mdx("{/* draft notes */}\n\n# Title\n");
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.headings[0].id, "title");
    }

    #[test]
    fn test_tables_and_lists() {
        let doc = RenderPipeline::default()
            .render("| a | b |\n|:--|--:|\n| 1 | 2 |\n\n- [x] done\n- [ ] todo\n", ContentFormat::Markdown)
            .unwrap();
        match &doc.nodes[0] {
            RenderedNode::Table { align, header, rows } => {
                assert_eq!(align, &vec![Align::Left, Align::Right]);
                assert_eq!(header, &vec!["a".to_string(), "b".to_string()]);
                assert_eq!(rows.len(), 1);
            }
            other => panic!("expected a table, got {:?}", other),
        }
        match &doc.nodes[1] {
            RenderedNode::List { ordered, items, .. } => {
                assert!(!ordered);
                assert_eq!(items[0].checked, Some(true));
                assert_eq!(items[1].checked, Some(false));
            }
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_theme_aborts_document() {
        let err = RenderPipeline::new("missing-theme")
            .render("text\n\n```rust\nfn main() {}\n```\n", ContentFormat::Mdx)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownTheme { .. }));
    }

    #[test]
    fn test_bad_code_meta_aborts_document() {
        let err = RenderPipeline::default()
            .render("```rust title=\"oops\nfn main() {}\n```\n", ContentFormat::Mdx)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidCodeMeta { .. }));
    }
}
