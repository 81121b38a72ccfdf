use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::arch::Architecture;
use crate::error::{DecodeError, SchemaError};
use crate::types::{TypeTag, MAX_FIELD_WIDTH};

/// One named, typed field of a [`Schema`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub tag: TypeTag,
}

/// Position of a field within its schema. Resolve it once with [`Schema::field_id`] and use it to
/// index any record decoded with that schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldId(pub(crate) usize);

impl FieldId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct SchemaInner {
    name: String,
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
}

/// Ordered, validated description of a packed binary record.
///
/// Fields are laid out back to back in declaration order with no implicit padding. Cloning is
/// cheap; decoded records keep a clone to resolve names.
#[derive(Clone, Debug)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.name == other.inner.name && self.inner.fields == other.inner.fields)
    }
}

impl Eq for Schema {}

impl Schema {
    /// Builds a schema, rejecting empty field lists and duplicate names.
    pub fn new<I, N>(name: impl Into<String>, fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (N, TypeTag)>,
        N: Into<String>,
    {
        let name = name.into();
        let fields: Vec<Field> = fields
            .into_iter()
            .map(|(field, tag)| Field {
                name: field.into(),
                tag,
            })
            .collect();

        if fields.is_empty() {
            return Err(SchemaError::Empty { schema: name });
        }

        let mut by_name = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateField {
                    schema: name,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self {
            inner: Arc::new(SchemaInner {
                name,
                fields,
                by_name,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.inner.fields
    }

    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    /// True for a schema with no fields, which construction never produces.
    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.inner.by_name.get(name).copied().map(FieldId)
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.inner.fields[id.0]
    }

    /// Resolves every field's offset (relative to the record start) and width.
    pub fn layout(&self, arch: Option<&Architecture>) -> Result<Layout, DecodeError> {
        let mut fields = Vec::with_capacity(self.len());
        let mut cursor = 0u64;
        for field in self.fields() {
            let width = field
                .tag
                .width(arch)
                .ok_or_else(|| DecodeError::UnresolvedWidth {
                    field: field.name.clone(),
                    tag: field.tag,
                })?;
            if width > MAX_FIELD_WIDTH {
                return Err(DecodeError::UnsupportedWidth {
                    field: field.name.clone(),
                    tag: field.tag,
                    width,
                });
            }
            fields.push(FieldLayout {
                offset: cursor,
                width,
            });
            cursor += width as u64;
        }
        Ok(Layout {
            fields,
            span: cursor,
        })
    }

    /// Total byte width of one record; the distance between consecutive records of an array.
    pub fn stride(&self, arch: Option<&Architecture>) -> Result<u64, DecodeError> {
        Ok(self.layout(arch)?.span)
    }

    pub fn to_def(&self) -> SchemaDef {
        SchemaDef {
            name: self.name().to_string(),
            fields: self
                .fields()
                .iter()
                .map(|f| FieldDef {
                    name: f.name.clone(),
                    tag: f.tag.name().to_string(),
                })
                .collect(),
        }
    }
}

/// Resolved position of one field relative to the start of its record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub offset: u64,
    pub width: usize,
}

/// A schema's layout for one architecture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub fields: Vec<FieldLayout>,
    pub span: u64,
}

/// Textual schema description, as stored in JSON schema files.
///
/// ```json
/// { "name": "Pair", "fields": [ { "name": "a", "type": "uint32_t" }, { "name": "b", "type": "handle" } ] }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub tag: String,
}

impl TryFrom<SchemaDef> for Schema {
    type Error = SchemaError;

    fn try_from(def: SchemaDef) -> Result<Self, Self::Error> {
        let mut fields = Vec::with_capacity(def.fields.len());
        for field in def.fields {
            let Some(tag) = TypeTag::from_name(&field.tag) else {
                return Err(SchemaError::UnknownTypeTag {
                    schema: def.name,
                    field: field.name,
                    tag: field.tag,
                });
            };
            fields.push((field.name, tag));
        }
        Schema::new(def.name, fields)
    }
}
