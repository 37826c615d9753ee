//! Entity metadata and remote entity representations
//!
//! [`EntityMetadata`] is the subset of a document's front matter that the
//! sync understands. [`EntityResponse`] is the server's view of an entity:
//! the fields the sync reads are typed, everything else is carried in a
//! side-channel map so the metadata projection stays total.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use serde_yaml::Value as YamlValue;

use super::{
    document::FrontMatter,
    errors::DomainError,
    newtypes::RemoteId,
};

/// Front matter key holding the entity type discriminant
pub const ENTITY_TYPE_KEY: &str = "EntityType";

// ============================================================================
// EntityType
// ============================================================================

/// Kind of remote entity a document maps to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Sentinel for documents that are not synced
    #[default]
    #[serde(rename = "UNDEFINED")]
    Undefined,
    Entity,
    Character,
    Creature,
    Event,
    Family,
    Item,
    Journal,
    Location,
    Note,
    Organisation,
    Post,
    Quest,
    Race,
    Tag,
}

impl EntityType {
    /// All syncable types (everything except the sentinel)
    pub const ALL: [EntityType; 14] = [
        EntityType::Entity,
        EntityType::Character,
        EntityType::Creature,
        EntityType::Event,
        EntityType::Family,
        EntityType::Item,
        EntityType::Journal,
        EntityType::Location,
        EntityType::Note,
        EntityType::Organisation,
        EntityType::Post,
        EntityType::Quest,
        EntityType::Race,
        EntityType::Tag,
    ];

    /// Returns true for the "undefined" sentinel
    pub fn is_undefined(self) -> bool {
        matches!(self, EntityType::Undefined)
    }

    /// Front matter spelling of this type
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Undefined => "UNDEFINED",
            EntityType::Entity => "entity",
            EntityType::Character => "character",
            EntityType::Creature => "creature",
            EntityType::Event => "event",
            EntityType::Family => "family",
            EntityType::Item => "item",
            EntityType::Journal => "journal",
            EntityType::Location => "location",
            EntityType::Note => "note",
            EntityType::Organisation => "organisation",
            EntityType::Post => "post",
            EntityType::Quest => "quest",
            EntityType::Race => "race",
            EntityType::Tag => "tag",
        }
    }

    /// REST collection name for this type
    ///
    /// Returns `None` for the sentinel, which has no remote counterpart.
    pub fn collection(self) -> Option<&'static str> {
        let route = match self {
            EntityType::Undefined => return None,
            EntityType::Entity => "entities",
            EntityType::Character => "characters",
            EntityType::Creature => "creatures",
            EntityType::Event => "events",
            EntityType::Family => "families",
            EntityType::Item => "items",
            EntityType::Journal => "journals",
            EntityType::Location => "locations",
            EntityType::Note => "notes",
            EntityType::Organisation => "organisations",
            EntityType::Post => "posts",
            EntityType::Quest => "quests",
            EntityType::Race => "races",
            EntityType::Tag => "tags",
        };
        Some(route)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == EntityType::Undefined.as_str() {
            return Ok(EntityType::Undefined);
        }
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownEntityType(s.to_string()))
    }
}

// ============================================================================
// EntityMetadata
// ============================================================================

/// Sync-relevant view of a document's front matter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Kind of remote entity
    pub entity_type: EntityType,
    /// Remote id of the typed record (character, location, ...)
    pub id: Option<RemoteId>,
    /// Remote id of the generic entity wrapper that owns posts
    pub entity_id: Option<RemoteId>,
    /// Display name
    pub name: Option<String>,
    pub is_private: Option<bool>,
    pub is_template: Option<bool>,
    /// Tag names as written by the user
    pub tags: Vec<String>,
    /// Resolved tag ids; derived during sync, never read from front matter
    pub tag_ids: Vec<RemoteId>,
}

impl EntityMetadata {
    /// Extracts the metadata from front matter
    ///
    /// A missing or null `EntityType` yields the undefined sentinel.
    ///
    /// # Errors
    /// Returns `DomainError` when a known field has a shape that cannot be
    /// interpreted, or the entity type is not a known discriminant.
    pub fn from_front_matter(front_matter: &FrontMatter) -> Result<Self, DomainError> {
        let entity_type = match front_matter.get(ENTITY_TYPE_KEY) {
            None | Some(YamlValue::Null) => EntityType::Undefined,
            Some(YamlValue::String(s)) => s.parse()?,
            Some(other) => return Err(invalid_field(ENTITY_TYPE_KEY, "expected a string", other)),
        };

        Ok(Self {
            entity_type,
            id: remote_id_field(front_matter, "id")?,
            entity_id: remote_id_field(front_matter, "entity_id")?,
            name: scalar_string(front_matter.get("name")),
            is_private: bool_field(front_matter, "is_private")?,
            is_template: bool_field(front_matter, "is_template")?,
            tags: tags_field(front_matter)?,
            tag_ids: Vec::new(),
        })
    }

    /// Folds the identifiers and flags of a server response into this record
    pub fn absorb(&mut self, response: &EntityResponse) {
        if let Some(id) = response.id {
            self.id = Some(id);
        }
        if let Some(entity_id) = response.entity_id {
            self.entity_id = Some(entity_id);
        }
        if let Some(name) = &response.name {
            self.name = Some(name.clone());
        }
        if let Some(is_private) = response.is_private {
            self.is_private = Some(is_private);
        }
        if let Some(is_template) = response.is_template {
            self.is_template = Some(is_template);
        }
    }

    /// Builds the create/update request body for the entity
    ///
    /// Unset fields are left out of the body rather than sent as null.
    pub fn to_payload(&self, entry: &str) -> Value {
        let mut body = Map::new();
        if let Some(name) = &self.name {
            body.insert("name".into(), json!(name));
        }
        body.insert("entry".into(), json!(entry));
        if let Some(is_private) = self.is_private {
            body.insert("is_private".into(), json!(is_private));
        }
        if let Some(is_template) = self.is_template {
            body.insert("is_template".into(), json!(is_template));
        }
        body.insert("tags".into(), json!(self.tag_ids));
        Value::Object(body)
    }
}

fn invalid_field(field: &str, message: &str, value: &YamlValue) -> DomainError {
    DomainError::InvalidField {
        field: field.to_string(),
        message: format!("{message}, found {value:?}"),
    }
}

fn scalar_string(value: Option<&YamlValue>) -> Option<String> {
    match value? {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn remote_id_field(front_matter: &FrontMatter, key: &str) -> Result<Option<RemoteId>, DomainError> {
    let value = match front_matter.get(key) {
        None | Some(YamlValue::Null) => return Ok(None),
        Some(value) => value,
    };
    let parsed = match value {
        YamlValue::Number(n) => n.as_u64().map(RemoteId::new),
        YamlValue::String(s) if s.trim().is_empty() => return Ok(None),
        YamlValue::String(s) => Some(s.trim().parse::<RemoteId>()),
        _ => None,
    };
    match parsed {
        Some(Ok(id)) => Ok(Some(id)),
        _ => Err(invalid_field(key, "expected a positive integer", value)),
    }
}

fn bool_field(front_matter: &FrontMatter, key: &str) -> Result<Option<bool>, DomainError> {
    match front_matter.get(key) {
        None | Some(YamlValue::Null) => Ok(None),
        Some(YamlValue::Bool(b)) => Ok(Some(*b)),
        Some(YamlValue::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(YamlValue::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(invalid_field(key, "expected a boolean", other)),
    }
}

fn tags_field(front_matter: &FrontMatter) -> Result<Vec<String>, DomainError> {
    match front_matter.get("tags") {
        None | Some(YamlValue::Null) => Ok(Vec::new()),
        Some(YamlValue::Sequence(items)) => items
            .iter()
            .map(|item| {
                scalar_string(Some(item))
                    .ok_or_else(|| invalid_field("tags", "expected scalar tag names", item))
            })
            .collect(),
        Some(single) => scalar_string(Some(single))
            .map(|tag| vec![tag])
            .ok_or_else(|| invalid_field("tags", "expected a list of tag names", single)),
    }
}

// ============================================================================
// EntityResponse
// ============================================================================

/// Server representation of an entity, post or tag
///
/// Fields the sync reads are typed; all remaining fields are preserved in
/// `extra` so that the metadata projection can still reach them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<RemoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
    /// Fields the sync does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityResponse {
    /// Flattens the response back into a single key/value bag
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = self.extra;
        if let Some(id) = self.id {
            fields.insert("id".into(), json!(id.get()));
        }
        if let Some(entity_id) = self.entity_id {
            fields.insert("entity_id".into(), json!(entity_id.get()));
        }
        if let Some(name) = self.name {
            fields.insert("name".into(), Value::String(name));
        }
        if let Some(is_private) = self.is_private {
            fields.insert("is_private".into(), Value::Bool(is_private));
        }
        if let Some(is_template) = self.is_template {
            fields.insert("is_template".into(), Value::Bool(is_template));
        }
        fields
    }
}
