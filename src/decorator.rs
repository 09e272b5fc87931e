//! The page decorator: appends the logo to the body and the override
//! stylesheet to the head.

use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::config::DecorConfig;
use crate::dom::{Container, DocumentTree, NodeId};
use crate::logo::LogoDescriptor;
use crate::stylesheet::StyleOverride;
use crate::{Error, Result};

/// Node ids of one decoration pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    pub logo: NodeId,
    pub style: NodeId,
}

/// Result of `PageDecorator::apply_decoration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nodes were injected
    Applied(Decoration),
    /// A marked node was already present; the document was left unchanged
    AlreadyDecorated,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }
}

#[derive(Debug, Clone)]
pub struct PageDecorator {
    logo: LogoDescriptor,
    overrides: StyleOverride,
    marker_attribute: String,
    fingerprint: String,
}

impl PageDecorator {
    pub fn new(config: &DecorConfig) -> Result<Self> {
        config.validate()?;
        let logo = LogoDescriptor::from_config(&config.logo);
        let overrides = StyleOverride::from_config(&config.overrides);
        let fingerprint = fingerprint(&logo, &overrides);
        Ok(Self {
            logo,
            overrides,
            marker_attribute: config.marker_attribute.clone(),
            fingerprint,
        })
    }

    pub fn logo(&self) -> &LogoDescriptor {
        &self.logo
    }

    pub fn overrides(&self) -> &StyleOverride {
        &self.overrides
    }

    /// Short content hash stamped into the marker attribute
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn marker_attribute(&self) -> &str {
        &self.marker_attribute
    }

    /// Inject the logo and stylesheet unconditionally.
    ///
    /// Every call appends a fresh pair of nodes; calling it twice leaves two
    /// logos and two style blocks. Use `apply_decoration` for the guarded
    /// variant. Both containers are resolved before any node is created, so
    /// a missing container leaves the document untouched.
    pub fn decorate<D: DocumentTree + ?Sized>(&self, doc: &mut D) -> Result<Decoration> {
        self.inject(doc, false)
    }

    /// Inject the logo and stylesheet once.
    ///
    /// Injected nodes carry the marker attribute; when any element in the
    /// document already carries it the call is a no-op.
    pub fn apply_decoration<D: DocumentTree + ?Sized>(&self, doc: &mut D) -> Result<Outcome> {
        let existing = doc.elements_with_attribute(&self.marker_attribute);
        if let Some(first) = existing.first() {
            let stamp = doc.attribute(*first, &self.marker_attribute).unwrap_or_default();
            if stamp != self.fingerprint {
                warn!(
                    "Document already decorated with a different configuration ({} != {}); leaving it unchanged",
                    stamp, self.fingerprint
                );
            } else {
                debug!("Document already decorated ({} marked nodes)", existing.len());
            }
            return Ok(Outcome::AlreadyDecorated);
        }
        self.inject(doc, true).map(Outcome::Applied)
    }

    fn inject<D: DocumentTree + ?Sized>(&self, doc: &mut D, mark: bool) -> Result<Decoration> {
        let body = doc
            .container(Container::Body)
            .ok_or(Error::MissingContainer(Container::Body))?;
        let head = doc
            .container(Container::Head)
            .ok_or(Error::MissingContainer(Container::Head))?;

        let logo = self.logo.build(doc)?;
        if mark {
            doc.set_attribute(logo, &self.marker_attribute, &self.fingerprint)?;
        }
        doc.append_child(body, logo)?;
        debug!("Appended logo {} to body", self.logo.src);

        let style = self.overrides.build(doc)?;
        if mark {
            doc.set_attribute(style, &self.marker_attribute, &self.fingerprint)?;
        }
        doc.append_child(head, style)?;
        debug!("Appended {} override rules to head", self.overrides.rules.len());

        info!("Page decorated (fingerprint {})", self.fingerprint);
        Ok(Decoration { logo, style })
    }
}

fn fingerprint(logo: &LogoDescriptor, overrides: &StyleOverride) -> String {
    let mut hasher = Sha256::new();
    hasher.update(logo.src.as_bytes());
    hasher.update([0u8]);
    hasher.update(logo.alt.as_bytes());
    hasher.update([0u8]);
    hasher.update(logo.style_attribute().as_bytes());
    hasher.update([0u8]);
    hasher.update(overrides.css().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
