use super::field::Param;
use super::model::Model;
use super::model::ModelSchema;
use super::types::ParamType;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Ordered handler signature.
pub type Signature = Vec<Arg>;

/// Default slot of a declared argument.
#[derive(Debug, Clone)]
pub enum ArgDefault {
    /// No default: a required query parameter unless the rule names it.
    Required,
    /// Plain default value: an optional query parameter.
    Value(Value),
    /// Explicit source marker.
    Param(Param),
    /// Nested dependency whose own arguments are flattened into the endpoint.
    Depends(Depends),
}

/// One declared handler argument.
#[derive(Debug, Clone)]
pub struct Arg {
    pub name: String,
    pub ty: ParamType,
    pub default: ArgDefault,
}

impl Arg {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: ArgDefault::Required,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }

    pub fn model<T: Model>(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::model::<T>())
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = ArgDefault::Value(value.into());
        self
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.default = ArgDefault::Param(param);
        self
    }

    #[must_use]
    pub fn depends(mut self, depends: Depends) -> Self {
        self.default = ArgDefault::Depends(depends);
        self
    }
}

/// Types whose arguments can be injected as a dependency.
pub trait Dependency {
    fn signature() -> Signature;
}

/// Dependency marker.
///
/// With a target, the target's signature is flattened into the endpoint. Without
/// one, the fields of the argument's model annotation are used.
#[derive(Clone, Default)]
pub struct Depends {
    target: Option<Arc<dyn Fn() -> Signature + Send + Sync>>,
}

impl Depends {
    /// Resolve from the argument's model annotation.
    pub fn annotated() -> Self {
        Self { target: None }
    }

    /// Resolve from an explicit signature.
    pub fn on(signature: Signature) -> Self {
        Self {
            target: Some(Arc::new(move || signature.clone())),
        }
    }

    /// Resolve from a [`Dependency`] implementation.
    pub fn of<D: Dependency + 'static>() -> Self {
        Self {
            target: Some(Arc::new(D::signature)),
        }
    }

    /// Arguments contributed by this dependency, or `None` when it cannot be
    /// resolved from either source.
    #[must_use]
    pub fn resolve(&self, annotation: &ParamType) -> Option<Signature> {
        if let Some(target) = &self.target {
            return Some(target());
        }
        annotation.as_model().map(|m| model_signature(m))
    }
}

impl fmt::Debug for Depends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Depends")
            .field("target", &self.target.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Each model field becomes an argument defaulting to its field default.
fn model_signature(model: &ModelSchema) -> Signature {
    model
        .fields
        .iter()
        .map(|(name, field)| {
            let mut arg = Arg::new(name.clone(), field.ty.clone());
            arg.default = match &field.info.default {
                Some(v) => ArgDefault::Value(v.clone()),
                None => ArgDefault::Required,
            };
            arg
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::FieldInfo;
    use serde_json::json;

    struct Paging;

    impl Model for Paging {
        fn model_schema() -> ModelSchema {
            ModelSchema::new("Paging")
                .field("page", ParamType::Integer, FieldInfo::optional(1))
                .field("cursor", ParamType::String, FieldInfo::required())
        }
    }

    #[test]
    fn test_annotated_depends_uses_model_fields() {
        let sig = Depends::annotated()
            .resolve(&ParamType::model::<Paging>())
            .unwrap();
        assert_eq!(sig.len(), 2);
        assert!(matches!(&sig[0].default, ArgDefault::Value(v) if *v == json!(1)));
        assert!(matches!(sig[1].default, ArgDefault::Required));
    }

    #[test]
    fn test_unresolvable_depends() {
        assert!(Depends::annotated().resolve(&ParamType::String).is_none());
    }

    #[test]
    fn test_explicit_target_wins() {
        let d = Depends::on(vec![Arg::string("token")]);
        let sig = d.resolve(&ParamType::model::<Paging>()).unwrap();
        assert_eq!(sig.len(), 1);
        assert_eq!(sig[0].name, "token");
    }
}
