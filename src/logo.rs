//! Logo descriptor: the fixed-position image pinned to the page corner.

use crate::config::LogoConfig;
use crate::dom::{format_inline_style, DocumentTree, NodeId};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct LogoDescriptor {
    pub src: String,
    pub alt: String,
    pub style: Vec<(String, String)>,
}

impl LogoDescriptor {
    pub fn from_config(cfg: &LogoConfig) -> Self {
        Self {
            src: cfg.src.clone(),
            alt: cfg.alt.clone(),
            style: cfg.style.clone(),
        }
    }

    /// Inline `style` attribute value
    pub fn style_attribute(&self) -> String {
        format_inline_style(&self.style)
    }

    /// Create the detached `<img>` element. Styles go through
    /// `set_style_property` one by one, the way a script sets `el.style.*`.
    pub fn build<D: DocumentTree + ?Sized>(&self, doc: &mut D) -> Result<NodeId> {
        let img = doc.create_element("img");
        doc.set_attribute(img, "src", &self.src)?;
        for (property, value) in &self.style {
            doc.set_style_property(img, property, value)?;
        }
        doc.set_attribute(img, "alt", &self.alt)?;
        Ok(img)
    }
}

impl Default for LogoDescriptor {
    fn default() -> Self {
        Self::from_config(&LogoConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    #[test]
    fn default_style_attribute() {
        let logo = LogoDescriptor::default();
        assert_eq!(
            logo.style_attribute(),
            "min-width: 100px; width: 5vw; border: none; box-shadow: none; \
             position: fixed; top: 0; right: 10px; z-index: 1000;"
        );
    }

    #[test]
    fn build_sets_attributes_without_attaching() {
        let mut doc = MemoryDocument::with_containers();
        let logo = LogoDescriptor::default();
        let img = logo.build(&mut doc).unwrap();
        assert_eq!(doc.tag_name(img).as_deref(), Some("img"));
        assert_eq!(doc.attribute(img, "src").unwrap(), "./assets/logo.gif");
        assert_eq!(doc.attribute(img, "alt").unwrap(), "Teapot AI Logo");
        assert_eq!(doc.attribute(img, "style").unwrap(), logo.style_attribute());
        assert_eq!(doc.parent(img), None);
    }
}
