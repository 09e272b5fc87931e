//! Teapot Page Decorator
//!
//! Adds the Teapot AI branding to an already-rendered HTML page: a logo image
//! pinned to the top-right corner of the body, and a style block in the head
//! that hides the fork-me banner and swaps the footer text for the
//! `418 I'm a teapot` status line.
//!
//! # Features
//!
//! - **Tree-agnostic**: decoration runs against any `DocumentTree`
//!   implementation; `MemoryDocument` is the bundled HTML-backed one
//! - **Idempotent entry point**: `PageDecorator::apply_decoration` marks the
//!   nodes it injects and skips already-decorated pages
//! - **Inspectable output**: `rendering` resolves the injected CSS so the
//!   visible result can be asserted without a browser
//! - **Remote pages** (`fetch` feature, default): load a page over HTTP
//!
//! # Example
//!
//! ```
//! use teapot_decor::{DecorConfig, MemoryDocument, PageDecorator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = MemoryDocument::parse("<footer class=\"inner\"><p>old</p></footer>")?;
//! let decorator = PageDecorator::new(&DecorConfig::default())?;
//! decorator.apply_decoration(&mut doc)?;
//!
//! let snapshot = teapot_decor::render_text_snapshot(&doc);
//! assert!(snapshot.text.contains("418 I'm a teapot"));
//! assert!(!snapshot.text.contains("old"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decorator;
pub mod dom;
pub mod error;
pub mod logo;
pub mod rendering;
pub mod stylesheet;

// HTTP loading of pages to decorate
#[cfg(feature = "fetch")]
pub mod fetch;

pub use config::DecorConfig;
pub use decorator::{Decoration, Outcome, PageDecorator};
pub use dom::{Container, DocumentTree, MemoryDocument, NodeId};
pub use error::{Error, Result};
pub use rendering::{render_text_snapshot, ComputedStyles, TextSnapshot};

/// Parse `html`, decorate it once and serialize it back.
///
/// With `allow_duplicates` the unguarded `decorate` path is used, so a page
/// that was already decorated gains a second logo and style block.
pub fn decorate_html(html: &str, config: &DecorConfig, allow_duplicates: bool) -> Result<String> {
    let decorator = PageDecorator::new(config)?;
    let mut doc = MemoryDocument::parse(html)?;
    if allow_duplicates {
        decorator.decorate(&mut doc)?;
    } else {
        decorator.apply_decoration(&mut doc)?;
    }
    Ok(doc.to_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorate_html_once() {
        let cfg = DecorConfig::default();
        let once = decorate_html("<p>x</p>", &cfg, false).unwrap();
        let twice = decorate_html(&once, &cfg, false).unwrap();
        assert_eq!(once.matches("<img ").count(), 1);
        assert_eq!(twice.matches("<img ").count(), 1);
        assert_eq!(twice.matches("<style ").count(), 1);
    }

    #[test]
    fn test_decorate_html_allow_duplicates() {
        let cfg = DecorConfig::default();
        let once = decorate_html("<p>x</p>", &cfg, true).unwrap();
        let twice = decorate_html(&once, &cfg, true).unwrap();
        assert_eq!(twice.matches("<img ").count(), 2);
        assert_eq!(twice.matches("<style>").count(), 2);
    }
}
