use super::types::ParamSource;
use indexmap::IndexMap;
use serde_json::Value;

/// Validation and documentation metadata attached to a parameter or model field.
///
/// A `default` of `None` means the value is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInfo {
    pub default: Option<Value>,
    pub alias: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub gt: Option<f64>,
    pub ge: Option<f64>,
    pub lt: Option<f64>,
    pub le: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub example: Option<Value>,
    pub examples: Option<IndexMap<String, Value>>,
    pub deprecated: bool,
}

impl FieldInfo {
    /// Required field without constraints.
    pub fn required() -> Self {
        Self::default()
    }

    /// Optional field falling back to `value`.
    pub fn optional(value: impl Into<Value>) -> Self {
        Self {
            default: Some(value.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Builder methods shared by [`FieldInfo`] and [`Param`].
pub trait FieldBuilder: Sized {
    fn info_mut(&mut self) -> &mut FieldInfo;

    fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.info_mut().default = Some(value.into());
        self
    }

    fn alias(mut self, alias: impl Into<String>) -> Self {
        self.info_mut().alias = Some(alias.into());
        self
    }

    fn title(mut self, title: impl Into<String>) -> Self {
        self.info_mut().title = Some(title.into());
        self
    }

    fn description(mut self, description: impl Into<String>) -> Self {
        self.info_mut().description = Some(description.into());
        self
    }

    fn gt(mut self, bound: f64) -> Self {
        self.info_mut().gt = Some(bound);
        self
    }

    fn ge(mut self, bound: f64) -> Self {
        self.info_mut().ge = Some(bound);
        self
    }

    fn lt(mut self, bound: f64) -> Self {
        self.info_mut().lt = Some(bound);
        self
    }

    fn le(mut self, bound: f64) -> Self {
        self.info_mut().le = Some(bound);
        self
    }

    fn min_length(mut self, len: usize) -> Self {
        self.info_mut().min_length = Some(len);
        self
    }

    fn max_length(mut self, len: usize) -> Self {
        self.info_mut().max_length = Some(len);
        self
    }

    fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.info_mut().pattern = Some(pattern.into());
        self
    }

    fn example(mut self, example: impl Into<Value>) -> Self {
        self.info_mut().example = Some(example.into());
        self
    }

    fn examples<I, K>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.info_mut().examples = Some(examples.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    fn deprecated(mut self, deprecated: bool) -> Self {
        self.info_mut().deprecated = deprecated;
        self
    }
}

impl FieldBuilder for FieldInfo {
    fn info_mut(&mut self) -> &mut FieldInfo {
        self
    }
}

/// Parameter-source marker: a [`FieldInfo`] tagged with exactly one source.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub source: ParamSource,
    pub info: FieldInfo,
}

impl Param {
    pub fn new(source: ParamSource) -> Self {
        Self {
            source,
            info: FieldInfo::required(),
        }
    }

    pub fn path() -> Self {
        Self::new(ParamSource::Path)
    }

    pub fn query() -> Self {
        Self::new(ParamSource::Query)
    }

    pub fn header() -> Self {
        Self::new(ParamSource::Header)
    }

    pub fn body() -> Self {
        Self::new(ParamSource::Body)
    }

    pub fn form() -> Self {
        Self::new(ParamSource::Form)
    }

    pub fn form_urlencoded() -> Self {
        Self::new(ParamSource::FormUrlEncoded)
    }

    pub fn file() -> Self {
        Self::new(ParamSource::File)
    }

    /// Same metadata, different source.
    #[must_use]
    pub fn with_source(mut self, source: ParamSource) -> Self {
        self.source = source;
        self
    }
}

impl FieldBuilder for Param {
    fn info_mut(&mut self) -> &mut FieldInfo {
        &mut self.info
    }
}
