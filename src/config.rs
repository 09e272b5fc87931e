//! Decoration configuration
//!
//! The defaults are the Teapot AI branding: the logo at `./assets/logo.gif`
//! pinned to the top-right corner, the fork-me banner hidden, and the footer
//! replaced with the HTCPCP status line. A JSON file may override any field.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_LOGO_SRC: &str = "./assets/logo.gif";
pub const DEFAULT_LOGO_ALT: &str = "Teapot AI Logo";
pub const DEFAULT_BANNER_ID: &str = "forkme_banner";
pub const DEFAULT_FOOTER_SELECTOR: &str = "footer.inner";
pub const DEFAULT_FOOTER_TEXT: &str = "418 I'm a teapot (HTCPCP/1.0) | Contact Us | Copyright 2025";
pub const DEFAULT_FOOTER_COLOR: &str = "rgb(242, 242, 242)";
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-teapot-decor";

/// Top-level decoration configuration
///
/// ```
/// let cfg = teapot_decor::DecorConfig::default();
/// assert_eq!(cfg.logo.src, "./assets/logo.gif");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorConfig {
    pub logo: LogoConfig,
    pub overrides: OverrideConfig,
    /// Attribute stamped on injected nodes by `apply_decoration`
    pub marker_attribute: String,
}

/// Logo image settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    pub src: String,
    pub alt: String,
    /// Inline style declarations, in emission order
    pub style: Vec<(String, String)>,
}

/// Stylesheet override settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Id of the banner element to hide
    pub banner_id: String,
    /// Selector of the footer whose content is replaced
    pub footer_selector: String,
    pub footer_text: String,
    pub footer_color: String,
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            logo: LogoConfig::default(),
            overrides: OverrideConfig::default(),
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
        }
    }
}

impl Default for LogoConfig {
    fn default() -> Self {
        let style = [
            ("min-width", "100px"),
            ("width", "5vw"),
            ("border", "none"),
            ("box-shadow", "none"),
            ("position", "fixed"),
            ("top", "0"),
            ("right", "10px"),
            ("z-index", "1000"),
        ]
        .iter()
        .map(|(p, v)| (p.to_string(), v.to_string()))
        .collect();

        Self {
            src: DEFAULT_LOGO_SRC.to_string(),
            alt: DEFAULT_LOGO_ALT.to_string(),
            style,
        }
    }
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            banner_id: DEFAULT_BANNER_ID.to_string(),
            footer_selector: DEFAULT_FOOTER_SELECTOR.to_string(),
            footer_text: DEFAULT_FOOTER_TEXT.to_string(),
            footer_color: DEFAULT_FOOTER_COLOR.to_string(),
        }
    }
}

impl DecorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: DecorConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&data)
    }

    /// Reject settings that would produce a broken stylesheet or markup
    pub fn validate(&self) -> Result<()> {
        if self.logo.src.trim().is_empty() {
            return Err(Error::ConfigError("logo.src must not be empty".into()));
        }
        if self.overrides.banner_id.is_empty()
            || self.overrides.banner_id.chars().any(char::is_whitespace)
        {
            return Err(Error::ConfigError(format!(
                "overrides.banner_id is not a valid id: {:?}",
                self.overrides.banner_id
            )));
        }
        if self.overrides.footer_selector.trim().is_empty() {
            return Err(Error::ConfigError(
                "overrides.footer_selector must not be empty".into(),
            ));
        }
        check_css_fragment("overrides.banner_id", &self.overrides.banner_id)?;
        check_css_fragment("overrides.footer_selector", &self.overrides.footer_selector)?;
        check_css_fragment("overrides.footer_color", &self.overrides.footer_color)?;
        check_selector("overrides.banner_id", &format!("#{}", self.overrides.banner_id))?;
        check_selector("overrides.footer_selector", &self.overrides.footer_selector)?;
        if self.marker_attribute.is_empty()
            || self
                .marker_attribute
                .chars()
                .any(|c| c.is_whitespace() || c == '=' || c == '"')
        {
            return Err(Error::ConfigError(format!(
                "marker_attribute is not a valid attribute name: {:?}",
                self.marker_attribute
            )));
        }
        for (prop, _) in &self.logo.style {
            if prop.trim().is_empty() || prop.contains([':', ';']) {
                return Err(Error::ConfigError(format!(
                    "logo.style has an invalid property name: {:?}",
                    prop
                )));
            }
        }
        Ok(())
    }
}

/// Values pasted verbatim into the override stylesheet must not be able to
/// close a rule block, a declaration or the `<style>` element.
fn check_css_fragment(field: &str, value: &str) -> Result<()> {
    match value.chars().find(|c| matches!(c, '<' | '{' | '}' | ';')) {
        Some(c) => Err(Error::ConfigError(format!(
            "{} must not contain {:?}: {:?}",
            field, c, value
        ))),
        None => Ok(()),
    }
}

/// A single selector (no top-level selector list) that `scraper` accepts
fn check_selector(field: &str, selector: &str) -> Result<()> {
    let mut depth = 0i32;
    for c in selector.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                return Err(Error::ConfigError(format!(
                    "{} must be a single selector, not a list: {:?}",
                    field, selector
                )))
            }
            _ => {}
        }
    }
    scraper::Selector::parse(selector).map_err(|_| {
        Error::ConfigError(format!("{} is not a valid selector: {:?}", field, selector))
    })?;
    Ok(())
}
