//! Fixed node-type → output-element mapping.
//!
//! Each markdown construct the renderer styles is one `Element` variant;
//! `tag()` and `class()` dispatch on the variant. Classes are utility-class
//! strings for the host page's stylesheet.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Heading(u8),
    Paragraph,
    List { ordered: bool, start: usize },
    ListItem,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableHeaderCell,
    TableCell,
    BlockQuote,
    Link { href: String, title: String },
    Emphasis,
    Strong,
    Strikethrough,
    InlineCode,
    /// The `<pre>` of a fenced or indented code block.
    CodeBlock,
}

impl Element {
    pub fn tag(&self) -> &'static str {
        match self {
            Element::Heading(level) => match level {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            Element::Paragraph => "p",
            Element::List { ordered: true, .. } => "ol",
            Element::List { ordered: false, .. } => "ul",
            Element::ListItem => "li",
            Element::Table => "table",
            Element::TableHead => "thead",
            Element::TableBody => "tbody",
            Element::TableRow => "tr",
            Element::TableHeaderCell => "th",
            Element::TableCell => "td",
            Element::BlockQuote => "blockquote",
            Element::Link { .. } => "a",
            Element::Emphasis => "em",
            Element::Strong => "strong",
            Element::Strikethrough => "del",
            Element::InlineCode => "code",
            Element::CodeBlock => "pre",
        }
    }

    /// Style for the element; `None` leaves it to the surrounding prose styles.
    pub fn class(&self) -> Option<&'static str> {
        let class = match self {
            Element::Heading(1) => "text-xl font-bold mb-2",
            Element::Heading(2) => "text-lg font-semibold mb-2",
            Element::Heading(3) => "text-base font-medium mb-1",
            Element::Heading(_) => return None,
            Element::Paragraph => "mb-2 leading-relaxed",
            Element::List { ordered: false, .. } => "list-disc list-inside mb-2 space-y-1",
            Element::List { ordered: true, .. } => "list-decimal list-inside mb-2 space-y-1",
            Element::ListItem => "leading-relaxed",
            Element::Table => "min-w-full border-collapse border border-border",
            Element::TableHead => "bg-muted/50",
            Element::TableBody => return None,
            Element::TableRow => "border-b border-border",
            Element::TableHeaderCell => "border border-border px-3 py-2 text-left font-semibold",
            Element::TableCell => "border border-border px-3 py-2",
            Element::BlockQuote => "border-l-4 border-muted-foreground/20 pl-4 italic my-2",
            Element::Link { .. } => "text-primary underline hover:no-underline",
            Element::Emphasis => "font-bold not-italic",
            Element::Strong | Element::Strikethrough => return None,
            Element::InlineCode => "bg-muted px-1 py-0.5 rounded text-sm font-mono",
            Element::CodeBlock => "bg-muted/50 border rounded-lg p-4 overflow-x-auto",
        };
        Some(class)
    }
}

/// Wrapper placed around a table so wide tables scroll instead of overflowing.
pub const TABLE_WRAPPER_CLASS: &str = "overflow-x-auto my-4";
/// Positioning container around a code block; hosts the language badge.
pub const CODE_BLOCK_WRAPPER_CLASS: &str = "relative";
pub const CODE_LANGUAGE_BADGE_CLASS: &str =
    "absolute top-2 right-2 text-xs text-muted-foreground bg-muted px-2 py-1 rounded";
/// The `<code>` inside a code block's `<pre>`.
pub const CODE_BLOCK_CODE_CLASS: &str = "text-sm font-mono text-foreground";
pub const ROOT_CLASS: &str = "prose prose-sm max-w-none dark:prose-invert";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels_map_to_tags() {
        assert_eq!(Element::Heading(1).tag(), "h1");
        assert_eq!(Element::Heading(3).tag(), "h3");
        assert_eq!(Element::Heading(6).tag(), "h6");
    }

    #[test]
    fn test_only_first_three_headings_are_styled() {
        assert!(Element::Heading(1).class().is_some());
        assert!(Element::Heading(3).class().is_some());
        assert!(Element::Heading(4).class().is_none());
    }

    #[test]
    fn test_list_kind_selects_tag_and_style() {
        let ordered = Element::List { ordered: true, start: 1 };
        let bullet = Element::List { ordered: false, start: 1 };
        assert_eq!(ordered.tag(), "ol");
        assert_eq!(bullet.tag(), "ul");
        assert!(ordered.class().unwrap().contains("list-decimal"));
        assert!(bullet.class().unwrap().contains("list-disc"));
    }

    #[test]
    fn test_emphasis_renders_bold() {
        assert_eq!(Element::Emphasis.class(), Some("font-bold not-italic"));
    }
}
