//! Minimal style cascade used to check what a decorated page shows.
//!
//! This is not a layout engine. It resolves enough of CSS to answer the
//! questions decoration cares about: which elements are hidden, what a
//! `::before` pseudo-element paints, and how an element is positioned.
//! Selector matching is delegated to `scraper` over a serialized copy of the
//! tree in which every element carries its arena id.

use std::collections::HashMap;

use log::debug;
use scraper::{Html, Selector};

use crate::dom::{parse_inline_style, DocumentTree, MemoryDocument, NodeId, NODE_ID_ATTR};
use crate::stylesheet::css_unquote;

/// Elements whose content is never painted
const NON_RENDERED: &[&str] = &["head", "style", "script", "title", "template", "noscript"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoElement {
    Before,
    After,
}

/// A parsed style rule with a single selector
#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    /// Selector without any pseudo-element suffix
    pub selector: String,
    pub pseudo: Option<PseudoElement>,
    /// `(property, value, important)`
    pub declarations: Vec<(String, String, bool)>,
    pub specificity: (u32, u32, u32),
}

/// Parse a stylesheet into one `CssRule` per selector. At-rules are skipped.
pub fn parse_stylesheet(css: &str) -> Vec<CssRule> {
    let css = strip_comments(css);
    let mut rules = Vec::new();
    let mut rest = css.as_str();

    while let Some(open) = rest.find('{') {
        let prelude = rest[..open].trim();
        let Some(close) = matching_brace(rest, open) else {
            debug!("Unterminated CSS block after {:?}", prelude);
            break;
        };
        let body = &rest[open + 1..close];
        rest = &rest[close + 1..];

        if prelude.starts_with('@') {
            debug!("Skipping at-rule {:?}", prelude);
            continue;
        }

        let declarations = parse_declarations(body);
        for selector in prelude.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (selector, pseudo) = split_pseudo(selector);
            rules.push(CssRule {
                specificity: specificity(&selector),
                selector,
                pseudo,
                declarations: declarations.clone(),
            });
        }
    }
    rules
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = css.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            out.push(c);
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if css[i + 1..].starts_with('*') => match css[i + 2..].find("*/") {
                Some(end) => {
                    let resume = i + 2 + end + 2;
                    while chars.peek().map_or(false, |(j, _)| *j < resume) {
                        chars.next();
                    }
                }
                None => return out,
            },
            c => out.push(c),
        }
    }
    out
}

fn matching_brace(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a declaration block on `;`, honouring quoted strings
fn parse_declarations(body: &str) -> Vec<(String, String, bool)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in body.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None if c == ';' => parts.push(std::mem::take(&mut current)),
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                current.push(c);
            }
        }
    }
    parts.push(current);

    parts
        .iter()
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let mut value = value.trim();
            if prop.is_empty() || value.is_empty() {
                return None;
            }
            let important = value.to_ascii_lowercase().ends_with("!important");
            if important {
                value = value[..value.len() - "!important".len()].trim_end();
            }
            Some((prop, value.to_string(), important))
        })
        .collect()
}

fn split_pseudo(selector: &str) -> (String, Option<PseudoElement>) {
    for (suffix, pseudo) in [
        ("::before", PseudoElement::Before),
        (":before", PseudoElement::Before),
        ("::after", PseudoElement::After),
        (":after", PseudoElement::After),
    ] {
        if let Some(base) = selector.strip_suffix(suffix) {
            let base = base.trim();
            let base = if base.is_empty() { "*" } else { base };
            return (base.to_string(), Some(pseudo));
        }
    }
    (selector.to_string(), None)
}

/// `(ids, classes/attributes/pseudo-classes, types)`
fn specificity(selector: &str) -> (u32, u32, u32) {
    let (mut a, mut b, mut c) = (0, 0, 0);
    for compound in selector.split(|ch: char| ch.is_whitespace() || ch == '>' || ch == '+' || ch == '~') {
        if compound.is_empty() {
            continue;
        }
        if compound.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
            c += 1;
        }
        let mut chars = compound.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '#' => a += 1,
                '.' | '[' => b += 1,
                ':' if chars.peek() != Some(&':') => b += 1,
                _ => {}
            }
        }
    }
    (a, b, c)
}

// (important, inline, specificity, source order)
type Precedence = (bool, bool, (u32, u32, u32), usize);

#[derive(Debug, Default)]
struct Cascaded {
    values: HashMap<String, (Precedence, String)>,
}

impl Cascaded {
    fn apply(&mut self, property: &str, value: &str, precedence: Precedence) {
        let wins = self
            .values
            .get(property)
            .map(|(existing, _)| precedence >= *existing)
            .unwrap_or(true);
        if wins {
            self.values
                .insert(property.to_string(), (precedence, value.to_string()));
        }
    }

    fn get(&self, property: &str) -> Option<&str> {
        self.values.get(property).map(|(_, v)| v.as_str())
    }
}

/// Cascaded property values for every element of a document
#[derive(Debug, Default)]
pub struct ComputedStyles {
    elements: HashMap<NodeId, Cascaded>,
    before: HashMap<NodeId, Cascaded>,
    after: HashMap<NodeId, Cascaded>,
}

impl ComputedStyles {
    /// Apply every `<style>` block (document order) and inline `style`
    /// attribute of `doc`
    pub fn compute(doc: &MemoryDocument) -> Self {
        let rules: Vec<CssRule> = doc
            .elements_by_tag("style")
            .into_iter()
            .filter_map(|n| doc.text_content(n))
            .flat_map(|css| parse_stylesheet(&css))
            .collect();

        let tagged = Html::parse_document(&doc.to_tagged_html());
        let mut styles = ComputedStyles::default();

        for (order, rule) in rules.iter().enumerate() {
            let selector = match Selector::parse(&rule.selector) {
                Ok(s) => s,
                Err(_) => {
                    debug!("Unsupported selector {:?}; rule ignored", rule.selector);
                    continue;
                }
            };
            for el in tagged.select(&selector) {
                let Some(id) = el
                    .value()
                    .attr(NODE_ID_ATTR)
                    .and_then(|v| v.parse::<usize>().ok())
                    .map(NodeId::from_index)
                else {
                    continue;
                };
                let target = match rule.pseudo {
                    None => styles.elements.entry(id).or_default(),
                    Some(PseudoElement::Before) => styles.before.entry(id).or_default(),
                    Some(PseudoElement::After) => styles.after.entry(id).or_default(),
                };
                for (prop, value, important) in &rule.declarations {
                    target.apply(prop, value, (*important, false, rule.specificity, order));
                }
            }
        }

        for node in doc.descendants(doc.root()) {
            let Some(inline) = doc.attribute(node, "style") else {
                continue;
            };
            let target = styles.elements.entry(node).or_default();
            for (prop, value) in parse_inline_style(&inline) {
                let important = value.to_ascii_lowercase().ends_with("!important");
                let value = if important {
                    value[..value.len() - "!important".len()].trim_end().to_string()
                } else {
                    value
                };
                target.apply(&prop, &value, (important, true, (0, 0, 0), usize::MAX));
            }
        }

        styles
    }

    /// Cascaded value of `property` on an element, if any rule set it
    pub fn get(&self, node: NodeId, property: &str) -> Option<&str> {
        self.elements.get(&node)?.get(property)
    }

    /// Cascaded value of `property` on a pseudo-element
    pub fn get_pseudo(&self, node: NodeId, pseudo: PseudoElement, property: &str) -> Option<&str> {
        let map = match pseudo {
            PseudoElement::Before => &self.before,
            PseudoElement::After => &self.after,
        };
        map.get(&node)?.get(property)
    }

    /// Whether the element itself or one of its ancestors has `display: none`
    pub fn is_hidden(&self, doc: &MemoryDocument, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.get(n, "display") == Some("none") {
                return true;
            }
            cur = doc.parent(n);
        }
        false
    }

    /// Text generated by a pseudo-element, `None` when it produces no box
    pub fn pseudo_content(&self, node: NodeId, pseudo: PseudoElement) -> Option<String> {
        if self.get_pseudo(node, pseudo, "display") == Some("none") {
            return None;
        }
        let content = self.get_pseudo(node, pseudo, "content")?;
        match content.trim() {
            "none" | "normal" => None,
            c => Some(css_unquote(c)),
        }
    }

    pub fn before_content(&self, node: NodeId) -> Option<String> {
        self.pseudo_content(node, PseudoElement::Before)
    }

    /// Visible text of `node` and its subtree, whitespace collapsed
    pub fn visible_text(&self, doc: &MemoryDocument, node: NodeId) -> String {
        let mut pieces = Vec::new();
        if !self.is_hidden(doc, node) {
            self.collect_text(doc, node, &mut pieces);
        }
        pieces
            .iter()
            .flat_map(|p| p.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn collect_text(&self, doc: &MemoryDocument, node: NodeId, pieces: &mut Vec<String>) {
        // `true` marks an element whose `::after` is still pending
        let mut stack: Vec<(NodeId, bool)> = vec![(node, false)];
        while let Some((node, closing)) = stack.pop() {
            if closing {
                if let Some(after) = self.pseudo_content(node, PseudoElement::After) {
                    pieces.push(after);
                }
                continue;
            }
            match doc.tag_name(node) {
                Some(tag) => {
                    if NON_RENDERED.contains(&tag.as_str()) || self.get(node, "display") == Some("none") {
                        continue;
                    }
                    if let Some(before) = self.before_content(node) {
                        pieces.push(before);
                    }
                    stack.push((node, true));
                    for child in doc.children(node).into_iter().rev() {
                        stack.push((child, false));
                    }
                }
                None => {
                    if let Some(crate::dom::NodeData::Text(text)) = doc.data(node) {
                        pieces.push(text.clone());
                    }
                }
            }
        }
    }

    /// Positioned, visible element with the highest integer `z-index`
    pub fn top_stacking_element(&self, doc: &MemoryDocument) -> Option<(NodeId, i64)> {
        doc.descendants(doc.root())
            .into_iter()
            .filter(|n| {
                matches!(
                    self.get(*n, "position"),
                    Some("absolute" | "relative" | "fixed" | "sticky")
                ) && !self.is_hidden(doc, *n)
            })
            .filter_map(|n| Some((n, self.get(n, "z-index")?.trim().parse::<i64>().ok()?)))
            .max_by_key(|(n, z)| (*z, std::cmp::Reverse(*n)))
    }
}

/// A textual rendering of a page
#[derive(Debug, Clone, PartialEq)]
pub struct TextSnapshot {
    pub title: String,
    /// Visible body text, whitespace collapsed
    pub text: String,
}

/// Render the visible text of `doc` after applying its stylesheets
pub fn render_text_snapshot(doc: &MemoryDocument) -> TextSnapshot {
    let styles = ComputedStyles::compute(doc);
    let title = doc
        .elements_by_tag("title")
        .first()
        .and_then(|t| doc.text_content(*t))
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    let text = doc
        .body()
        .map(|b| styles.visible_text(doc, b))
        .unwrap_or_default();
    TextSnapshot { title, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stylesheet_splits_selector_lists() {
        let rules = parse_stylesheet(
            "/* c */ a, b.c { color: red; content: \"x;y\" } @media print { a { color: blue } } #z::before { content: 'q' }",
        );
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].selector, "a");
        assert_eq!(rules[1].selector, "b.c");
        assert_eq!(rules[1].declarations[1].1, "\"x;y\"");
        assert_eq!(rules[2].selector, "#z");
        assert_eq!(rules[2].pseudo, Some(PseudoElement::Before));
    }

    #[test]
    fn comment_markers_inside_strings_are_kept() {
        let css = "a::before { content: \"a /* b */ c\" } /* real */ b::before { content: 'open /* only' }";
        let rules = parse_stylesheet(css);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].declarations[0].1, "\"a /* b */ c\"");
        assert_eq!(rules[1].declarations[0].1, "'open /* only'");
        assert_eq!(strip_comments("x /* y */ z /* open"), "x  z ");
    }

    #[test]
    fn footer_text_with_comment_markers_renders_verbatim() {
        for text in ["a /* b */ c", "open /* only"] {
            let mut cfg = crate::DecorConfig::default();
            cfg.overrides.footer_text = text.to_string();
            let mut doc =
                MemoryDocument::parse("<footer class=\"inner\"><p>old</p></footer>").unwrap();
            crate::PageDecorator::new(&cfg)
                .unwrap()
                .apply_decoration(&mut doc)
                .unwrap();
            let footer = doc.elements_by_tag("footer")[0];
            let styles = ComputedStyles::compute(&doc);
            assert_eq!(styles.before_content(footer).as_deref(), Some(text));
        }
    }

    #[test]
    fn visible_text_handles_deep_nesting() {
        let depth = 20_000;
        let html = format!("{}deep{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let doc = MemoryDocument::parse(&html).unwrap();
        let body = doc.body().unwrap();
        let styles = ComputedStyles::default();
        assert_eq!(styles.visible_text(&doc, body), "deep");
    }

    #[test]
    fn specificity_counts() {
        assert_eq!(specificity("#forkme_banner"), (1, 0, 0));
        assert_eq!(specificity("footer.inner .copyright"), (0, 2, 1));
        assert_eq!(specificity("footer.inner p"), (0, 1, 2));
        assert_eq!(specificity("ul > li:first-child"), (0, 1, 2));
    }

    #[test]
    fn important_flag_is_stripped() {
        let rules = parse_stylesheet("p { display: none !important }");
        assert_eq!(
            rules[0].declarations[0],
            ("display".to_string(), "none".to_string(), true)
        );
    }

    #[test]
    fn cascade_order_and_specificity() {
        let doc = MemoryDocument::parse(
            "<html><head><style>#a { color: red } p { color: blue } p { color: green }</style></head>\
             <body><p id=a>x</p><p>y</p></body></html>",
        )
        .unwrap();
        let styles = ComputedStyles::compute(&doc);
        let ps = doc.elements_by_tag("p");
        assert_eq!(styles.get(ps[0], "color"), Some("red"));
        assert_eq!(styles.get(ps[1], "color"), Some("green"));
    }

    #[test]
    fn inline_style_beats_stylesheet() {
        let doc = MemoryDocument::parse(
            "<html><head><style>div { top: 5px }</style></head><body><div style=\"top: 0\">x</div></body></html>",
        )
        .unwrap();
        let styles = ComputedStyles::compute(&doc);
        let div = doc.elements_by_tag("div")[0];
        assert_eq!(styles.get(div, "top"), Some("0"));
    }

    #[test]
    fn snapshot_skips_hidden_and_emits_before() {
        let doc = MemoryDocument::parse(
            "<html><head><title> T </title><style>.h { display: none } main::before { content: \"Hi\" }</style></head>\
             <body><main>one <span class=h>two</span> three</main></body></html>",
        )
        .unwrap();
        let snap = render_text_snapshot(&doc);
        assert_eq!(snap.title, "T");
        assert_eq!(snap.text, "Hi one three");
    }

    #[test]
    fn top_stacking_requires_position() {
        let doc = MemoryDocument::parse(
            "<body><div style=\"z-index: 50\">a</div><div style=\"position: absolute; z-index: 7\">b</div></body>",
        )
        .unwrap();
        let styles = ComputedStyles::compute(&doc);
        let (node, z) = styles.top_stacking_element(&doc).unwrap();
        assert_eq!(z, 7);
        assert_eq!(doc.text_content(node).unwrap(), "b");
    }
}
