use super::field::FieldInfo;
use super::types::ParamType;
use indexmap::IndexMap;

/// One field of a [`ModelSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelField {
    pub ty: ParamType,
    pub info: FieldInfo,
}

impl ModelField {
    /// JSON key of the field: its alias, or `name`.
    pub fn key<'a>(&'a self, name: &'a str) -> &'a str {
        self.info.alias.as_deref().unwrap_or(name)
    }
}

/// Named, ordered set of typed fields.
///
/// Used for JSON body payloads, nested objects and dependency classes.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, ModelField>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field. Redeclaring a name replaces the earlier field in place.
    pub fn field(mut self, name: impl Into<String>, ty: ParamType, info: FieldInfo) -> Self {
        self.fields.insert(name.into(), ModelField { ty, info });
        self
    }

    /// Names of fields without a default, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, f)| f.info.is_required())
            .map(|(name, _)| name.as_str())
    }
}

/// Rust types that describe themselves as a [`ModelSchema`].
///
/// Implement this for request payload structs; pair it with `serde::Deserialize`
/// to read the bound value back with [`crate::binder::BoundArgs::get`].
pub trait Model {
    fn model_schema() -> ModelSchema;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields_in_order() {
        let m = ModelSchema::new("Pet")
            .field("name", ParamType::String, FieldInfo::required())
            .field("tag", ParamType::String, FieldInfo::optional(serde_json::Value::Null))
            .field("age", ParamType::Integer, FieldInfo::required());
        let req: Vec<_> = m.required_fields().collect();
        assert_eq!(req, vec!["name", "age"]);
    }
}
