use std::collections::HashMap;

use quick_xml::escape::escape;

use crate::render::{CodeBlock, ListEntry, NodeKind, RenderedDocument, RenderedNode};

pub type ComponentFn = fn(&RenderedNode, &ComponentTable) -> String;
pub type WidgetFn = fn(&str, &[(String, String)], &str) -> String;

/// Dispatch table from node kind to HTML renderer.
///
/// Kinds without an entry go through `passthrough`, which emits the node's
/// own HTML (if any) followed by its children.
pub struct ComponentTable {
    components: HashMap<NodeKind, ComponentFn>,
    widgets: HashMap<String, WidgetFn>,
}

impl Default for ComponentTable {
    fn default() -> Self {
        let mut table = ComponentTable::empty();
        table.register(NodeKind::Paragraph, paragraph);
        table.register(NodeKind::Heading, heading);
        table.register(NodeKind::CodeBlock, code_block);
        table.register(NodeKind::Math, math);
        table.register(NodeKind::Diagram, diagram);
        table.register(NodeKind::Table, table_node);
        table.register(NodeKind::List, list);
        table.register(NodeKind::Blockquote, blockquote);
        table.register(NodeKind::Widget, widget);
        table.register(NodeKind::Footnote, footnote);
        table.register(NodeKind::ThematicBreak, |_, _| "<hr />".to_string());
        table.register_widget("Callout", callout);
        table.register_widget("YouTube", youtube);
        table
    }
}

impl ComponentTable {
    pub fn empty() -> Self {
        ComponentTable {
            components: HashMap::new(),
            widgets: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: NodeKind, component: ComponentFn) -> &mut Self {
        self.components.insert(kind, component);
        self
    }

    pub fn register_widget(&mut self, name: &str, widget: WidgetFn) -> &mut Self {
        self.widgets.insert(name.to_string(), widget);
        self
    }

    pub fn render_node(&self, node: &RenderedNode) -> String {
        match self.components.get(&node.kind()) {
            Some(component) => component(node, self),
            None => passthrough(node, self),
        }
    }

    pub fn render_nodes(&self, nodes: &[RenderedNode]) -> String {
        nodes.iter().map(|n| self.render_node(n)).collect::<Vec<_>>().join("\n")
    }

    pub fn render_document(&self, doc: &RenderedDocument) -> String {
        self.render_nodes(&doc.nodes)
    }

    fn render_widget(&self, name: &str, props: &[(String, String)], children: &str) -> String {
        match self.widgets.get(name) {
            Some(widget) => widget(name, props, children),
            None => generic_widget(name, props, children),
        }
    }
}

pub fn passthrough(node: &RenderedNode, table: &ComponentTable) -> String {
    let own = match node {
        RenderedNode::Paragraph { html }
        | RenderedNode::Heading { html, .. }
        | RenderedNode::Math { html }
        | RenderedNode::Html { html } => html.clone(),
        RenderedNode::CodeBlock(block) => format!("<pre><code>{}</code></pre>", escape(block.source.as_str())),
        RenderedNode::Diagram { source } => format!("<pre>{}</pre>", escape(source.as_str())),
        _ => String::new(),
    };
    let children: Vec<String> = node.children().into_iter().map(|c| table.render_node(c)).collect();
    [own, children.join("\n")].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join("\n")
}

fn paragraph(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::Paragraph { html } => format!("<p>{}</p>", html),
        other => passthrough(other, table),
    }
}

fn heading(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::Heading { depth, id, html, .. } => {
            let id = escape(id.as_str());
            format!("<h{d} id=\"{id}\"><a class=\"anchor\" href=\"#{id}\">#</a>{html}</h{d}>", d = depth, id = id, html = html)
        }
        other => passthrough(other, table),
    }
}

fn code_block(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::CodeBlock(block) => render_code_block(block),
        other => passthrough(other, table),
    }
}

pub fn render_code_block(block: &CodeBlock) -> String {
    let mut buf = String::new();
    let style = match block.foreground {
        Some(ref fg) => format!("background-color:{};color:{}", block.background, fg),
        None => format!("background-color:{}", block.background),
    };
    buf.push_str(&format!(
        "<figure class=\"code-block\" data-language=\"{}\" style=\"{}\">",
        escape(block.language.as_str()), style));
    buf.push_str(&format!("<figcaption><span class=\"code-title\">{}</span>", escape(block.title.as_str())));
    if block.copy_enabled {
        buf.push_str(&format!(
            "<button class=\"copy\" data-code=\"{}\">Copy</button>", escape(block.source.as_str())));
    }
    buf.push_str("</figcaption>");

    let pre_class = if block.show_line_numbers { " class=\"line-numbers\"" } else { "" };
    buf.push_str(&format!("<pre{}><code>", pre_class));
    for line in block.lines.iter() {
        let mut classes = vec!["line"];
        if !line.marker.css_class().is_empty() {
            classes.push(line.marker.css_class());
        }
        if line.highlighted {
            classes.push("highlighted");
        }
        buf.push_str(&format!(
            "<span class=\"{}\" data-line=\"{}\">{}</span>\n", classes.join(" "), line.number, line.html));
    }
    buf.push_str("</code></pre></figure>");
    buf
}

fn math(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::Math { html } => format!("<div class=\"math\">{}</div>", html),
        other => passthrough(other, table),
    }
}

fn diagram(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::Diagram { source } => format!("<pre class=\"mermaid\">{}</pre>", escape(source.as_str())),
        other => passthrough(other, table),
    }
}

fn table_node(node: &RenderedNode, table: &ComponentTable) -> String {
    let RenderedNode::Table { align, header, rows } = node else {
        return passthrough(node, table);
    };

    let cell = |tag: &str, idx: usize, html: &str| -> String {
        match align.get(idx).and_then(|a| a.as_style()) {
            Some(a) => format!("<{tag} style=\"text-align:{a}\">{html}</{tag}>", tag = tag, a = a, html = html),
            None => format!("<{tag}>{html}</{tag}>", tag = tag, html = html),
        }
    };

    let mut buf = String::from("<table><thead><tr>");
    for (idx, html) in header.iter().enumerate() {
        buf.push_str(&cell("th", idx, html));
    }
    buf.push_str("</tr></thead><tbody>");
    for row in rows.iter() {
        buf.push_str("<tr>");
        for (idx, html) in row.iter().enumerate() {
            buf.push_str(&cell("td", idx, html));
        }
        buf.push_str("</tr>");
    }
    buf.push_str("</tbody></table>");
    buf
}

fn list_item(entry: &ListEntry, table: &ComponentTable) -> String {
    let checkbox = match entry.checked {
        Some(true) => "<input type=\"checkbox\" checked disabled /> ",
        Some(false) => "<input type=\"checkbox\" disabled /> ",
        None => "",
    };
    format!("<li>{}{}</li>", checkbox, table.render_nodes(&entry.children))
}

fn list(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::List { ordered, start, items } => {
            let items: Vec<String> = items.iter().map(|i| list_item(i, table)).collect();
            match (ordered, start) {
                (true, Some(start)) if *start != 1 => format!("<ol start=\"{}\">{}</ol>", start, items.join("")),
                (true, _) => format!("<ol>{}</ol>", items.join("")),
                (false, _) => format!("<ul>{}</ul>", items.join("")),
            }
        }
        other => passthrough(other, table),
    }
}

fn blockquote(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::Blockquote { children } => format!("<blockquote>{}</blockquote>", table.render_nodes(children)),
        other => passthrough(other, table),
    }
}

fn footnote(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::Footnote { id, children } => format!(
            "<div class=\"footnote\" id=\"fn-{}\">{}</div>", escape(id.as_str()), table.render_nodes(children)),
        other => passthrough(other, table),
    }
}

fn widget(node: &RenderedNode, table: &ComponentTable) -> String {
    match node {
        RenderedNode::Widget { name, props, children } => {
            let children = table.render_nodes(children);
            table.render_widget(name, props, &children)
        }
        other => passthrough(other, table),
    }
}

fn prop<'a>(props: &'a [(String, String)], name: &str) -> Option<&'a str> {
    props.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

fn generic_widget(name: &str, props: &[(String, String)], children: &str) -> String {
    let json: serde_json::Map<String, serde_json::Value> = props.iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    let json = serde_json::Value::Object(json).to_string();
    format!("<div data-widget=\"{}\" data-props=\"{}\">{}</div>", escape(name), escape(json.as_str()), children)
}

fn callout(_name: &str, props: &[(String, String)], children: &str) -> String {
    let kind = prop(props, "type").unwrap_or("note");
    let title = prop(props, "title")
        .map(|t| format!("<p class=\"callout-title\">{}</p>", escape(t)))
        .unwrap_or_default();
    format!("<aside class=\"callout callout-{}\">{}{}</aside>", escape(kind), title, children)
}

fn youtube(name: &str, props: &[(String, String)], children: &str) -> String {
    let Some(id) = prop(props, "id") else {
        return generic_widget(name, props, children);
    };
    format!(
        "<div class=\"video\"><iframe src=\"https://www.youtube-nocookie.com/embed/{}\" allowfullscreen loading=\"lazy\"></iframe></div>",
        escape(id))
}

#[cfg(test)]
mod tests {
    use crate::content::content_file::ContentFormat;
    use crate::render::RenderPipeline;

    use super::*;

    fn render(src: &str) -> String {
        let doc = RenderPipeline::default().render(src, ContentFormat::Mdx).unwrap();
        ComponentTable::default().render_document(&doc)
    }

    #[test]
    fn test_heading_anchor() {
        assert_eq!(render("## Hello there"),
                   "<h2 id=\"hello-there\"><a class=\"anchor\" href=\"#hello-there\">#</a>Hello there</h2>");
    }

    #[test]
    fn test_code_block_markup() {
        let html = render("```rust title=\"lib.rs\" noCopy\nfn a() {}\n```");
        assert!(html.starts_with("<figure class=\"code-block\" data-language=\"rust\" style=\"background-color:#"));
        assert!(html.contains("<span class=\"code-title\">lib.rs</span>"));
        assert!(!html.contains("class=\"copy\""));
    }

    #[test]
    fn test_known_widgets() {
        let html = render("<Callout type=\"tip\">\n\nHi\n\n</Callout>");
        assert_eq!(html, "<aside class=\"callout callout-tip\"><p>Hi</p></aside>");

        let html = render("<YouTube id=\"abc123\" />");
        assert!(html.contains("embed/abc123"));
    }

    #[test]
    fn test_unknown_widget_is_generic() {
        let html = render("<Chart kind=\"bar\" />");
        assert_eq!(html, "<div data-widget=\"Chart\" data-props=\"{&quot;kind&quot;:&quot;bar&quot;}\"></div>");
    }

    #[test]
    fn test_unregistered_kind_falls_back_to_passthrough() {
        let table = ComponentTable::empty();
        let node = RenderedNode::Blockquote {
            children: vec![RenderedNode::Paragraph { html: "quoted".to_string() }],
        };
        assert_eq!(table.render_node(&node), "quoted");
    }

    #[test]
    fn test_overriding_a_component() {
        let mut table = ComponentTable::default();
        table.register(NodeKind::ThematicBreak, |_, _| "<hr class=\"fancy\" />".to_string());
        assert_eq!(table.render_node(&RenderedNode::ThematicBreak), "<hr class=\"fancy\" />");
    }
}
