use std::io::{self, Write};

use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, Options};

use crate::markdown::elements::{
    Element, CODE_BLOCK_CODE_CLASS, CODE_BLOCK_WRAPPER_CLASS, CODE_LANGUAGE_BADGE_CLASS,
    ROOT_CLASS, TABLE_WRAPPER_CLASS,
};

/// Renders GitHub-flavoured markdown to styled HTML.
///
/// Stateless: the same input always yields the same output. Raw HTML in the
/// source is escaped rather than passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Renders `markdown` inside a prose container. `extra_class` is appended
    /// to the container's class list.
    pub fn render(&self, markdown: &str, extra_class: Option<&str>) -> String {
        let arena = Arena::new();
        let mut options = Options::default();
        options.extension.table = true;
        options.extension.strikethrough = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;

        let root = parse_document(&arena, markdown, &options);

        let mut out = String::with_capacity(markdown.len() * 2);
        let class = match extra_class.map(str::trim).filter(|c| !c.is_empty()) {
            Some(extra) => format!("{ROOT_CLASS} {extra}"),
            None => ROOT_CLASS.to_string(),
        };
        out.push_str(&format!("<div class=\"{}\">", escape_html(&class)));
        render_children(root, &mut out);
        out.push_str("</div>");
        out
    }
}

fn render_children<'a>(node: &'a AstNode<'a>, out: &mut String) {
    for child in node.children() {
        render_node(child, out);
    }
}

fn render_node<'a>(node: &'a AstNode<'a>, out: &mut String) {
    let value = node.data.borrow().value.clone();

    match value {
        NodeValue::Heading(heading) => wrap(Element::Heading(heading.level), node, out),
        NodeValue::Paragraph => {
            if in_tight_list(node) {
                render_children(node, out);
            } else {
                wrap(Element::Paragraph, node, out);
            }
        }
        NodeValue::List(list) => wrap(
            Element::List {
                ordered: matches!(list.list_type, ListType::Ordered),
                start: list.start,
            },
            node,
            out,
        ),
        NodeValue::Item(_) => wrap(Element::ListItem, node, out),
        NodeValue::TaskItem(checked) => {
            open(&Element::ListItem, out);
            out.push_str(if checked.is_some() {
                "<input type=\"checkbox\" checked disabled /> "
            } else {
                "<input type=\"checkbox\" disabled /> "
            });
            render_children(node, out);
            close(&Element::ListItem, out);
        }
        NodeValue::Table(..) => render_table(node, out),
        NodeValue::TableRow(header) => render_row(node, header, out),
        NodeValue::BlockQuote => wrap(Element::BlockQuote, node, out),
        NodeValue::Link(link) => wrap(
            Element::Link {
                href: safe_url(&link.url).to_string(),
                title: link.title,
            },
            node,
            out,
        ),
        NodeValue::Image(link) => {
            let mut alt = String::new();
            collect_text(node, &mut alt);
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" />",
                escape_url(safe_url(&link.url)),
                escape_html(&alt)
            ));
        }
        NodeValue::Emph => wrap(Element::Emphasis, node, out),
        NodeValue::Strong => wrap(Element::Strong, node, out),
        NodeValue::Strikethrough => wrap(Element::Strikethrough, node, out),
        NodeValue::Code(code) => {
            open(&Element::InlineCode, out);
            out.push_str(&escape_html(&code.literal));
            close(&Element::InlineCode, out);
        }
        NodeValue::CodeBlock(block) => {
            render_code_block(&code_language(&block.info), &block.literal, out)
        }
        NodeValue::ThematicBreak => out.push_str("<hr />"),
        NodeValue::Text(text) => out.push_str(&escape_html(&text)),
        NodeValue::SoftBreak => out.push('\n'),
        NodeValue::LineBreak => out.push_str("<br />\n"),
        NodeValue::HtmlInline(raw) => out.push_str(&escape_html(&raw)),
        NodeValue::HtmlBlock(block) => {
            out.push_str(&escape_html(&block.literal));
        }
        _ => render_children(node, out),
    }
}

fn wrap<'a>(element: Element, node: &'a AstNode<'a>, out: &mut String) {
    open(&element, out);
    render_children(node, out);
    close(&element, out);
}

fn open(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(element.tag());

    match element {
        Element::List {
            ordered: true,
            start,
        } if *start != 1 => out.push_str(&format!(" start=\"{start}\"")),
        Element::Link { href, title } => {
            out.push_str(&format!(" href=\"{}\"", escape_url(href)));
            if !title.is_empty() {
                out.push_str(&format!(" title=\"{}\"", escape_html(title)));
            }
            out.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
        }
        _ => {}
    }

    if let Some(class) = element.class() {
        out.push_str(&format!(" class=\"{class}\""));
    }
    out.push('>');
}

fn close(element: &Element, out: &mut String) {
    out.push_str("</");
    out.push_str(element.tag());
    out.push('>');
}

/// Header rows go in `<thead>`, the rest in `<tbody>`, all inside a
/// scrolling wrapper.
fn render_table<'a>(node: &'a AstNode<'a>, out: &mut String) {
    let (head, body): (Vec<_>, Vec<_>) = node
        .children()
        .partition(|row| matches!(row.data.borrow().value, NodeValue::TableRow(true)));

    out.push_str(&format!("<div class=\"{TABLE_WRAPPER_CLASS}\">"));
    open(&Element::Table, out);
    for (section, rows) in [(Element::TableHead, head), (Element::TableBody, body)] {
        if rows.is_empty() {
            continue;
        }
        open(&section, out);
        for row in rows {
            render_node(row, out);
        }
        close(&section, out);
    }
    close(&Element::Table, out);
    out.push_str("</div>");
}

fn render_row<'a>(node: &'a AstNode<'a>, header: bool, out: &mut String) {
    let cell = if header {
        Element::TableHeaderCell
    } else {
        Element::TableCell
    };
    open(&Element::TableRow, out);
    for child in node.children() {
        wrap(cell.clone(), child, out);
    }
    close(&Element::TableRow, out);
}

fn render_code_block(language: &str, literal: &str, out: &mut String) {
    let code = literal.strip_suffix('\n').unwrap_or(literal);

    out.push_str(&format!("<div class=\"{CODE_BLOCK_WRAPPER_CLASS}\">"));
    if !language.is_empty() {
        out.push_str(&format!(
            "<div class=\"{CODE_LANGUAGE_BADGE_CLASS}\">{}</div>",
            escape_html(language)
        ));
    }
    open(&Element::CodeBlock, out);
    out.push_str(&format!(
        "<code class=\"{CODE_BLOCK_CODE_CLASS}\">{}</code>",
        escape_html(code)
    ));
    close(&Element::CodeBlock, out);
    out.push_str("</div>");
}

/// Language tag of a fenced block: the leading word characters of the
/// info string's first token (`rust,ignore` → `rust`).
pub fn code_language(info: &str) -> String {
    info.split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn in_tight_list<'a>(paragraph: &'a AstNode<'a>) -> bool {
    paragraph
        .parent()
        .and_then(|item| item.parent())
        .map(|list| matches!(&list.data.borrow().value, NodeValue::List(l) if l.tight))
        .unwrap_or(false)
}

fn collect_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            _ => {}
        }
        collect_text(child, out);
    }
}

/// Keeps relative URLs and the http(s), irc(s), mailto and xmpp schemes;
/// anything else (e.g. `javascript:`) becomes an empty string.
pub fn safe_url(url: &str) -> &str {
    let Some(colon) = url.find(':') else {
        return url;
    };
    let before = |c: char| url.find(c).is_some_and(|i| i < colon);
    if before('/') || before('?') || before('#') {
        return url;
    }

    let scheme = url[..colon].to_ascii_lowercase();
    match scheme.as_str() {
        "http" | "https" | "irc" | "ircs" | "mailto" | "xmpp" => url,
        _ => "",
    }
}

/// Escapes text and attribute values.
pub fn escape_html(s: &str) -> String {
    write_escaped(s, comrak::html::escape)
}

/// Escapes a URL for an `href` or `src` attribute, percent-encoding bytes
/// that are not URL-safe.
pub fn escape_url(url: &str) -> String {
    write_escaped(url, comrak::html::escape_href)
}

fn write_escaped(s: &str, escape: fn(&mut dyn Write, &[u8]) -> io::Result<()>) -> String {
    let mut out = Vec::with_capacity(s.len() + s.len() / 8);
    // Writes into a Vec do not fail.
    escape(&mut out, s.as_bytes())
        .map(|()| String::from_utf8_lossy(&out).into_owned())
        .unwrap_or_default()
}
