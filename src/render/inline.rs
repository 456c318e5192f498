use std::collections::HashMap;

use markdown::mdast::{AttributeContent, AttributeValue, Node};
use quick_xml::escape::escape;

use crate::render::math::render_math;
use crate::render::RenderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub url: String,
    pub title: Option<String>,
}

/// Link reference definitions by normalized identifier.
pub type Definitions = HashMap<String, Definition>;

/// Renders phrasing content to an HTML fragment.
pub fn render_inline(nodes: &[Node], definitions: &Definitions) -> Result<String, RenderError> {
    let mut buf = String::new();
    for node in nodes {
        write_inline(node, definitions, &mut buf)?;
    }
    Ok(buf)
}

/// Text content without any markup, used for anchors and outlines.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut buf = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => buf.push_str(&t.value),
            Node::InlineCode(c) => buf.push_str(&c.value),
            Node::InlineMath(m) => buf.push_str(&m.value),
            Node::Image(img) => buf.push_str(&img.alt),
            other => {
                if let Some(children) = other.children() {
                    buf.push_str(&plain_text(children));
                }
            }
        }
    }
    buf
}

fn attr(name: &str, value: &str) -> String {
    format!(" {}=\"{}\"", name, escape(value))
}

fn title_attr(title: &Option<String>) -> String {
    title.as_deref().map(|t| attr("title", t)).unwrap_or_default()
}

fn wrap(tag: &str, children: &[Node], definitions: &Definitions, buf: &mut String) -> Result<(), RenderError> {
    buf.push_str(&format!("<{}>", tag));
    buf.push_str(&render_inline(children, definitions)?);
    buf.push_str(&format!("</{}>", tag));
    Ok(())
}

fn write_inline(node: &Node, definitions: &Definitions, buf: &mut String) -> Result<(), RenderError> {
    match node {
        Node::Text(t) => buf.push_str(&escape(t.value.as_str())),
        Node::Emphasis(e) => wrap("em", &e.children, definitions, buf)?,
        Node::Strong(s) => wrap("strong", &s.children, definitions, buf)?,
        Node::Delete(d) => wrap("del", &d.children, definitions, buf)?,
        Node::InlineCode(c) => {
            buf.push_str("<code>");
            buf.push_str(&escape(c.value.as_str()));
            buf.push_str("</code>");
        }
        Node::InlineMath(m) => buf.push_str(&render_math(&m.value, false)?),
        Node::Break(_) => buf.push_str("<br />"),
        Node::Link(link) => {
            buf.push_str(&format!("<a{}{}>", attr("href", &link.url), title_attr(&link.title)));
            buf.push_str(&render_inline(&link.children, definitions)?);
            buf.push_str("</a>");
        }
        Node::LinkReference(link) => match definitions.get(&link.identifier) {
            Some(def) => {
                buf.push_str(&format!("<a{}{}>", attr("href", &def.url), title_attr(&def.title)));
                buf.push_str(&render_inline(&link.children, definitions)?);
                buf.push_str("</a>");
            }
            None => {
                buf.push('[');
                buf.push_str(&render_inline(&link.children, definitions)?);
                buf.push(']');
            }
        },
        Node::Image(img) => {
            buf.push_str(&format!("<img{}{}{} />", attr("src", &img.url), attr("alt", &img.alt), title_attr(&img.title)));
        }
        Node::ImageReference(img) => match definitions.get(&img.identifier) {
            Some(def) => buf.push_str(&format!(
                "<img{}{}{} />", attr("src", &def.url), attr("alt", &img.alt), title_attr(&def.title))),
            None => buf.push_str(&escape(img.alt.as_str())),
        },
        Node::FootnoteReference(note) => {
            let id = escape(note.identifier.as_str());
            buf.push_str(&format!(
                "<sup id=\"fnref-{id}\"><a href=\"#fn-{id}\" class=\"footnote-ref\">{id}</a></sup>", id = id));
        }
        Node::Html(html) => buf.push_str(&html.value),
        Node::MdxJsxTextElement(el) => match &el.name {
            None => buf.push_str(&render_inline(&el.children, definitions)?),
            Some(name) => {
                let props: serde_json::Map<String, serde_json::Value> = el.attributes.iter()
                    .filter_map(|a| match a {
                        AttributeContent::Property(prop) => match &prop.value {
                            None => Some((prop.name.clone(), serde_json::Value::Bool(true))),
                            Some(AttributeValue::Literal(v)) => Some((prop.name.clone(), serde_json::Value::String(v.clone()))),
                            Some(_) => None,
                        },
                        _ => None,
                    })
                    .collect();
                let props = serde_json::Value::Object(props).to_string();
                buf.push_str(&format!("<span{}{}>", attr("data-widget", name), attr("data-props", &props)));
                buf.push_str(&render_inline(&el.children, definitions)?);
                buf.push_str("</span>");
            }
        },
        Node::MdxTextExpression(_) | Node::MdxjsEsm(_) => {}
        other => {
            if let Some(children) = other.children() {
                buf.push_str(&render_inline(children, definitions)?);
            }
        }
    }
    Ok(())
}
