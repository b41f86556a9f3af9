//! The closed set of overlay fields and the rule that applies each one.

use harmonizer_markup::Element;
use harmonizer_shared::vocab::{attrs, tags};
use harmonizer_shared::{HarmonizerError, Result};

/// Signature of a field application rule: edit the record root with a value.
pub type OverlayRule = fn(&mut Element, &str) -> Result<()>;

/// Overlay keys the merge engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayField {
    Doi,
    ExternalId,
    AuthorityId,
    Gender,
    Biography,
}

impl OverlayField {
    /// All fields, in application order.
    pub const ALL: [OverlayField; 5] = [
        Self::Doi,
        Self::ExternalId,
        Self::AuthorityId,
        Self::Gender,
        Self::Biography,
    ];

    /// Key as written in overlay files.
    pub fn key(self) -> &'static str {
        match self {
            Self::Doi => "doi",
            Self::ExternalId => "eoebl_id",
            Self::AuthorityId => "vaw_PND",
            Self::Gender => "oebl_Geschlecht",
            Self::Biography => "oebl_Biographie",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// The transform that applies this field to a record.
    pub fn rule(self) -> OverlayRule {
        match self {
            Self::Doi => set_doi,
            Self::ExternalId => set_external_id,
            Self::AuthorityId => set_authority_id,
            Self::Gender => append_gender,
            Self::Biography => set_biography,
        }
    }
}

impl std::fmt::Display for OverlayField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

fn set_doi(root: &mut Element, value: &str) -> Result<()> {
    root.set_attr(attrs::DOI, value);
    Ok(())
}

fn set_external_id(root: &mut Element, value: &str) -> Result<()> {
    root.set_attr(attrs::EXTERNAL_ID, value);
    Ok(())
}

fn set_authority_id(root: &mut Element, value: &str) -> Result<()> {
    root.set_attr(attrs::AUTHORITY_ID, value);
    Ok(())
}

fn set_biography(root: &mut Element, value: &str) -> Result<()> {
    root.set_attr(attrs::BIOGRAPHY, value);
    Ok(())
}

fn append_gender(root: &mut Element, value: &str) -> Result<()> {
    let article = root.child_mut(tags::ARTICLE).ok_or_else(|| {
        HarmonizerError::structure(format!("no <{}> to attach gender to", tags::ARTICLE))
    })?;
    article
        .children
        .push(Element::new(tags::GENDER).with_attr(attrs::TYPE, value));
    Ok(())
}
