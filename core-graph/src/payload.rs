//! JSON:API document parsing.
//!
//! The wire shape is a primary `data` object plus a flat `included` list.
//! Relationships arrive as `{ "data": linkage }` where linkage is `null`,
//! one identifier or a list of identifiers; they become reference stubs that
//! the resolver later swaps for side-loaded copies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::attributes::Attributes;
use crate::error::Result;
use crate::kind::ResourceKind;
use crate::relations::{Cardinality, RelationKind, RelationSet};
use crate::resource::Resource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub data: WireResource,
    #[serde(default)]
    pub included: Vec<WireResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub attributes: Option<Attributes>,
    #[serde(default)]
    pub relationships: BTreeMap<String, WireRelationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRelationship {
    #[serde(default)]
    pub data: Option<Linkage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    One(Identifier),
    Many(Vec<Identifier>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A primary resource with its flat side-load pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub datum: Resource,
    pub included: Vec<Resource>,
}

impl Payload {
    pub fn new(datum: Resource, included: Vec<Resource>) -> Self {
        Self { datum, included }
    }

    /// Parse a JSON:API document.
    ///
    /// Fails when the document is not valid JSON:API or names a resource
    /// type outside [`ResourceKind`].
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Document = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let document: Document = serde_json::from_value(value)?;
        Self::from_document(document)
    }

    pub fn from_document(document: Document) -> Result<Self> {
        let datum = document.data.into_resource()?;
        let included = document
            .included
            .into_iter()
            .map(WireResource::into_resource)
            .collect::<Result<Vec<_>>>()?;
        debug!(
            id = datum.id.as_deref().unwrap_or("-"),
            included = included.len(),
            "Parsed payload"
        );
        Ok(Self { datum, included })
    }
}

impl WireResource {
    pub fn into_resource(self) -> Result<Resource> {
        let kind = self.kind.as_deref().map(str::parse::<ResourceKind>).transpose()?;

        let mut relations = RelationSet::new();
        for (name, relationship) in self.relationships {
            let Some(relation) = RelationKind::from_wire_name(&name) else {
                debug!(relationship = %name, "Ignoring unknown relationship");
                continue;
            };
            let Some(linkage) = relationship.data else {
                continue;
            };

            let mut references = match linkage {
                Linkage::One(identifier) => vec![identifier.into_reference()?],
                Linkage::Many(identifiers) => identifiers
                    .into_iter()
                    .map(Identifier::into_reference)
                    .collect::<Result<Vec<_>>>()?,
            };

            relations = match relation.cardinality() {
                Cardinality::Many => relations.with_list(relation, Some(references)),
                Cardinality::Single => {
                    let first = if references.is_empty() {
                        None
                    } else {
                        Some(references.swap_remove(0))
                    };
                    relations.with_single(relation, first)
                }
            };
        }

        Ok(Resource {
            id: self.id,
            kind,
            attributes: self.attributes,
            relations: (!relations.is_empty()).then_some(relations),
            local_state: None,
        })
    }
}

impl Identifier {
    fn into_reference(self) -> Result<Resource> {
        let kind = self.kind.parse::<ResourceKind>()?;
        Ok(Resource {
            id: self.id,
            kind: Some(kind),
            ..Default::default()
        })
    }
}
