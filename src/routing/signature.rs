//! Handler signature extraction.
//!
//! Turns a declared [`Signature`] into one [`ParameterSpec`] per argument,
//! deciding the source of each and flattening nested dependencies.

use crate::error::ConfigError;
use crate::params::{Arg, ArgDefault, Param, ParamSource, ParamType};
use indexmap::IndexMap;

/// Dependencies nested deeper than this are treated as cyclic.
const MAX_DEPENDENCY_DEPTH: usize = 16;

/// One resolved request input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub ty: ParamType,
    pub param: Param,
}

impl ParameterSpec {
    /// Name the value travels under on the wire: the alias if set.
    pub fn wire_name(&self) -> &str {
        self.param.info.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn source(&self) -> ParamSource {
        self.param.source
    }

    /// Path parameters are required whatever their declared default.
    pub fn is_required(&self) -> bool {
        self.param.source == ParamSource::Path || self.param.info.is_required()
    }
}

/// Placeholder found in a route rule.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    start: usize,
    end: usize,
    name: String,
}

/// Scan `rule` for `{name}`, `<name>` and `<converter:name>` placeholders.
fn scan_placeholders(rule: &str) -> Result<Vec<Placeholder>, ConfigError> {
    let opens = rule.matches(['{', '<']).count();
    let closes = rule.matches(['}', '>']).count();
    if opens != closes {
        return Err(ConfigError::InvalidRule {
            rule: rule.to_string(),
        });
    }

    let mut found = Vec::new();
    let mut open: Option<(usize, char)> = None;
    for (idx, ch) in rule.char_indices() {
        match (ch, open) {
            ('{' | '<', None) => open = Some((idx, ch)),
            ('}', Some((start, '{'))) | ('>', Some((start, '<'))) => {
                let inner = &rule[start + 1..idx];
                let name = inner.rsplit(':').next().unwrap_or(inner).trim();
                if name.is_empty() {
                    return Err(ConfigError::InvalidRule {
                        rule: rule.to_string(),
                    });
                }
                found.push(Placeholder {
                    start,
                    end: idx + 1,
                    name: name.to_string(),
                });
                open = None;
            }
            ('/', Some((start, _))) => {
                // The segment ended while the placeholder was still open.
                let name = rule[start + 1..idx].to_string();
                return Err(ConfigError::UnclosedPlaceholder {
                    rule: rule.to_string(),
                    name,
                });
            }
            ('{' | '<' | '}' | '>', _) => {
                return Err(ConfigError::InvalidRule {
                    rule: rule.to_string(),
                })
            }
            _ => {}
        }
    }
    Ok(found)
}

/// Names of the placeholders in `rule`, in order.
///
/// # Errors
///
/// [`ConfigError::InvalidRule`] for unbalanced or misordered delimiters and
/// [`ConfigError::UnclosedPlaceholder`] when a placeholder runs into the
/// next path segment.
pub fn placeholder_names(rule: &str) -> Result<Vec<String>, ConfigError> {
    Ok(scan_placeholders(rule)?.into_iter().map(|p| p.name).collect())
}

/// Rule as published in the OpenAPI document: every placeholder rewritten as
/// `{name}`.
///
/// ```
/// use brrtkit::routing::openapi_rule;
///
/// assert_eq!(openapi_rule("/pets/<int:pet_id>").unwrap(), "/pets/{pet_id}");
/// assert!(openapi_rule("/pets/{pet_id").is_err());
/// ```
pub fn openapi_rule(rule: &str) -> Result<String, ConfigError> {
    let placeholders = scan_placeholders(rule)?;
    let mut out = String::with_capacity(rule.len());
    let mut cursor = 0;
    for p in placeholders {
        out.push_str(&rule[cursor..p.start]);
        out.push('{');
        out.push_str(&p.name);
        out.push('}');
        cursor = p.end;
    }
    out.push_str(&rule[cursor..]);
    Ok(out)
}

/// Resolve `signature` against `rule`.
///
/// - A [`ArgDefault::Param`] marker is kept as declared.
/// - A plain default, or no default, makes a query parameter.
/// - An argument named like a rule placeholder becomes a path parameter,
///   keeping the rest of its metadata.
/// - A [`ArgDefault::Depends`] marker is replaced by the dependency's own
///   arguments, resolved recursively into the same map. Later declarations
///   overwrite earlier ones with the same name.
///
/// # Errors
///
/// Rule errors from [`placeholder_names`], and
/// [`ConfigError::UnresolvedDependency`] for a dependency that has no target
/// and no model annotation, or that nests without end.
pub fn extract_signature(
    rule: &str,
    signature: &[Arg],
) -> Result<IndexMap<String, ParameterSpec>, ConfigError> {
    let path_names = placeholder_names(rule)?;
    let mut params = IndexMap::new();
    collect(&path_names, signature, &mut params, 0)?;
    Ok(params)
}

fn collect(
    path_names: &[String],
    signature: &[Arg],
    out: &mut IndexMap<String, ParameterSpec>,
    depth: usize,
) -> Result<(), ConfigError> {
    for arg in signature {
        let param = match &arg.default {
            ArgDefault::Depends(dep) => {
                let nested = match dep.resolve(&arg.ty) {
                    Some(sig) if depth < MAX_DEPENDENCY_DEPTH => sig,
                    _ => {
                        return Err(ConfigError::UnresolvedDependency {
                            name: arg.name.clone(),
                        })
                    }
                };
                collect(path_names, &nested, out, depth + 1)?;
                continue;
            }
            ArgDefault::Param(p) => p.clone(),
            ArgDefault::Value(v) => {
                let mut p = Param::query();
                p.info.default = Some(v.clone());
                p
            }
            ArgDefault::Required => Param::query(),
        };
        let param = if path_names.iter().any(|n| *n == arg.name) {
            param.with_source(ParamSource::Path)
        } else {
            param
        };
        out.insert(
            arg.name.clone(),
            ParameterSpec {
                name: arg.name.clone(),
                ty: arg.ty.clone(),
                param,
            },
        );
    }
    Ok(())
}
