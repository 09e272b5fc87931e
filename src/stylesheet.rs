//! Stylesheet override descriptor: hides the banner and the stock footer
//! content, then paints the replacement footer line through `::before`.

use std::fmt;

use crate::config::OverrideConfig;
use crate::dom::{DocumentTree, NodeId};
use crate::Result;

/// One CSS rule: a selector list and its ordered declarations
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub selectors: Vec<String>,
    pub declarations: Vec<(String, String)>,
}

impl RuleSet {
    pub fn new(selectors: &[&str], declarations: &[(&str, &str)]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            declarations: declarations
                .iter()
                .map(|(p, v)| (p.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn declaration(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.selectors.join(",\n"))?;
        for (p, v) in &self.declarations {
            writeln!(f, "  {}: {};", p, v)?;
        }
        write!(f, "}}")
    }
}

/// The full override block injected into the page head
#[derive(Debug, Clone, PartialEq)]
pub struct StyleOverride {
    pub rules: Vec<RuleSet>,
}

impl StyleOverride {
    pub fn from_config(cfg: &OverrideConfig) -> Self {
        let footer = cfg.footer_selector.trim();
        let hide = [("display", "none")];
        let banner = format!("#{}", cfg.banner_id);
        let copyright = format!("{} .copyright", footer);
        let paragraphs = format!("{} p", footer);
        let before = format!("{}::before", footer);
        let content = css_string(&cfg.footer_text);

        let rules = vec![
            RuleSet::new(&[banner.as_str()], &hide),
            RuleSet::new(&[copyright.as_str(), paragraphs.as_str()], &hide),
            RuleSet::new(
                &[before.as_str()],
                &[
                    ("content", content.as_str()),
                    ("color", cfg.footer_color.as_str()),
                    ("display", "block"),
                    ("text-align", "center"),
                    ("font-size", "1.2em"),
                    ("font-weight", "bold"),
                    ("margin-top", "20px"),
                ],
            ),
        ];
        Self { rules }
    }

    /// Rendered CSS text
    pub fn css(&self) -> String {
        self.to_string()
    }

    /// Create the detached `<style>` element carrying the CSS text
    pub fn build<D: DocumentTree + ?Sized>(&self, doc: &mut D) -> Result<NodeId> {
        let style = doc.create_element("style");
        doc.set_text_content(style, &format!("\n{}\n", self.css()))?;
        Ok(style)
    }
}

impl Default for StyleOverride {
    fn default() -> Self {
        Self::from_config(&OverrideConfig::default())
    }
}

impl fmt::Display for StyleOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}

/// Quote `text` as a CSS string literal
pub fn css_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            // A closing tag inside <style> would end the element early.
            '<' => out.push_str("\\3c "),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Inverse of `css_string`; unquoted input is returned trimmed
pub fn css_unquote(value: &str) -> String {
    let value = value.trim();
    let inner = match (value.chars().next(), value.chars().last()) {
        (Some(q @ ('"' | '\'')), Some(end)) if value.len() >= 2 && end == q => {
            &value[1..value.len() - 1]
        }
        _ => return value.to_string(),
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut hex = String::new();
        while let Some(h) = chars.peek().copied().filter(|h| h.is_ascii_hexdigit()) {
            if hex.len() == 6 {
                break;
            }
            hex.push(h);
            chars.next();
        }
        if hex.is_empty() {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            if chars.peek() == Some(&' ') {
                chars.next();
            }
            if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                out.push(ch);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FOOTER_TEXT;

    #[test]
    fn default_css_contains_three_rule_sets() {
        let css = StyleOverride::default().css();
        assert!(css.contains("#forkme_banner {\n  display: none;\n}"));
        assert!(css.contains("footer.inner .copyright,\nfooter.inner p {\n  display: none;\n}"));
        assert!(css.contains(
            "footer.inner::before {\n  content: \"418 I'm a teapot (HTCPCP/1.0) | Contact Us | Copyright 2025\";"
        ));
        assert!(css.contains("  margin-top: 20px;\n}"));
    }

    #[test]
    fn before_rule_declarations() {
        let overrides = StyleOverride::default();
        let before = &overrides.rules[2];
        assert_eq!(before.declaration("display"), Some("block"));
        assert_eq!(before.declaration("text-align"), Some("center"));
        assert_eq!(before.declaration("font-weight"), Some("bold"));
        assert_eq!(before.declaration("font-size"), Some("1.2em"));
        assert_eq!(before.declaration("color"), Some("rgb(242, 242, 242)"));
        assert_eq!(
            css_unquote(before.declaration("content").unwrap()),
            DEFAULT_FOOTER_TEXT
        );
    }

    #[test]
    fn css_string_escapes() {
        assert_eq!(css_string(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(css_unquote(&css_string("</style> \"x\"")), "</style> \"x\"");
        assert_eq!(css_unquote("'single'"), "single");
        assert_eq!(css_unquote("none"), "none");
    }

    #[test]
    fn configured_selectors() {
        let cfg = OverrideConfig {
            banner_id: "ribbon".into(),
            footer_selector: "#site-footer".into(),
            ..Default::default()
        };
        let overrides = StyleOverride::from_config(&cfg);
        assert_eq!(overrides.rules[0].selectors, vec!["#ribbon"]);
        assert_eq!(
            overrides.rules[1].selectors,
            vec!["#site-footer .copyright", "#site-footer p"]
        );
        assert_eq!(overrides.rules[2].selectors, vec!["#site-footer::before"]);
    }
}
