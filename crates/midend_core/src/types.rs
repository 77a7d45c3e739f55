//! Operation type descriptors and phase classification.
//!
//! An async operation is identified by a base string and three derived
//! phase strings (`BASE/BEGIN`, `BASE/SUCCESS`, `BASE/FAIL`). Classification
//! is purely lexical: any string ending in `/BEGIN` is a begin type, whether
//! or not it was produced by this module.

use crate::error::{ConfigError, ConfigResult};
use std::collections::{BTreeMap, HashSet};

/// Suffix of begin-phase types.
pub const BEGIN_SUFFIX: &str = "/BEGIN";
/// Suffix of success-phase types.
pub const SUCCESS_SUFFIX: &str = "/SUCCESS";
/// Suffix of fail-phase types.
pub const FAIL_SUFFIX: &str = "/FAIL";

/// The four type strings of an async operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsyncType {
    /// Base type string.
    pub base: String,
    /// `BASE/BEGIN`.
    pub begin: String,
    /// `BASE/SUCCESS`.
    pub success: String,
    /// `BASE/FAIL`.
    pub fail: String,
}

impl AsyncType {
    /// Derives the phase strings from a base.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            begin: format!("{base}{BEGIN_SUFFIX}"),
            success: format!("{base}{SUCCESS_SUFFIX}"),
            fail: format!("{base}{FAIL_SUFFIX}"),
            base,
        }
    }

    /// Returns the type string for a phase.
    pub fn phase(&self, phase: Phase) -> &str {
        match phase {
            Phase::Begin => &self.begin,
            Phase::Success => &self.success,
            Phase::Fail => &self.fail,
        }
    }

    fn strings(&self) -> [&str; 4] {
        [&self.base, &self.begin, &self.success, &self.fail]
    }
}

/// Descriptor of one logical operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationType {
    /// A single type string, dispatched synchronously.
    Simple(String),
    /// A begin/success/fail quadruple.
    Async(AsyncType),
}

impl OperationType {
    /// Returns the simple type string, if this is a simple type.
    pub fn as_simple(&self) -> Option<&str> {
        match self {
            OperationType::Simple(s) => Some(s),
            OperationType::Async(_) => None,
        }
    }

    /// Returns the async quadruple, if this is an async type.
    pub fn as_async(&self) -> Option<&AsyncType> {
        match self {
            OperationType::Async(t) => Some(t),
            OperationType::Simple(_) => None,
        }
    }

    /// Returns the base string: the simple type itself, or the async base.
    pub fn base(&self) -> &str {
        match self {
            OperationType::Simple(s) => s,
            OperationType::Async(t) => &t.base,
        }
    }
}

/// How a registry entry should be materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// `<prefix/>name`.
    Simple,
    /// The quadruple derived from `<prefix/>name`.
    Async,
    /// Passed through unchanged, without prefixing.
    Literal(OperationType),
}

impl From<&str> for TypeSpec {
    fn from(literal: &str) -> Self {
        TypeSpec::Literal(OperationType::Simple(literal.to_string()))
    }
}

/// `true` is the shorthand for [`TypeSpec::Simple`]; `false` selects
/// [`TypeSpec::Async`].
impl From<bool> for TypeSpec {
    fn from(simple: bool) -> Self {
        if simple {
            TypeSpec::Simple
        } else {
            TypeSpec::Async
        }
    }
}

impl From<AsyncType> for TypeSpec {
    fn from(literal: AsyncType) -> Self {
        TypeSpec::Literal(OperationType::Async(literal))
    }
}

/// Lifecycle phase of a type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Operation started.
    Begin,
    /// Operation resolved.
    Success,
    /// Operation rejected.
    Fail,
}

impl Phase {
    /// Classifies a type string by suffix.
    pub fn of(kind: &str) -> Option<Phase> {
        if is_begin(kind) {
            Some(Phase::Begin)
        } else if is_success(kind) {
            Some(Phase::Success)
        } else if is_fail(kind) {
            Some(Phase::Fail)
        } else {
            None
        }
    }

    /// Returns true for success and fail.
    pub fn is_completion(self) -> bool {
        matches!(self, Phase::Success | Phase::Fail)
    }
}

/// Returns true if `kind` ends in `/BEGIN`.
pub fn is_begin(kind: &str) -> bool {
    kind.ends_with(BEGIN_SUFFIX)
}

/// Returns true if `kind` ends in `/SUCCESS`.
pub fn is_success(kind: &str) -> bool {
    kind.ends_with(SUCCESS_SUFFIX)
}

/// Returns true if `kind` ends in `/FAIL`.
pub fn is_fail(kind: &str) -> bool {
    kind.ends_with(FAIL_SUFFIX)
}

/// Returns true if `kind` is `base` or lies under `base/`.
pub fn is_of_base(kind: &str, base: &str) -> bool {
    kind.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Named operation types produced by [`create_types`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: BTreeMap<String, OperationType>,
}

impl TypeRegistry {
    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&OperationType> {
        self.types.get(name)
    }

    /// Looks up a simple entry by name.
    pub fn simple(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OperationType::as_simple)
    }

    /// Looks up an async entry by name.
    pub fn async_type(&self, name: &str) -> Option<&AsyncType> {
        self.get(name).and_then(OperationType::as_async)
    }

    /// Iterates entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OperationType)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builds operation types from names, with an optional prefix.
///
/// `Simple` entries become `"<prefix>/<name>"`, `Async` entries the derived
/// quadruple with that base, and `Literal` entries pass through untouched.
///
/// # Errors
///
/// Returns an error for empty names, repeated names, or two entries that
/// produce the same type string.
pub fn create_types<I, K>(prefix: Option<&str>, specs: I) -> ConfigResult<TypeRegistry>
where
    I: IntoIterator<Item = (K, TypeSpec)>,
    K: Into<String>,
{
    let prefix = match prefix {
        Some(p) if !p.is_empty() => format!("{p}/"),
        _ => String::new(),
    };

    let mut types = BTreeMap::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (name, spec) in specs {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::invalid_type_name(name, "name is empty"));
        }

        let base = format!("{prefix}{name}");
        let resolved = match spec {
            TypeSpec::Simple => OperationType::Simple(base),
            TypeSpec::Async => OperationType::Async(AsyncType::new(base)),
            TypeSpec::Literal(literal) => literal,
        };

        let strings: Vec<&str> = match &resolved {
            OperationType::Simple(s) => vec![s.as_str()],
            OperationType::Async(t) => t.strings().to_vec(),
        };
        for value in strings {
            if !seen.insert(value.to_string()) {
                return Err(ConfigError::DuplicateType {
                    name,
                    value: value.to_string(),
                });
            }
        }

        if types.insert(name.clone(), resolved).is_some() {
            return Err(ConfigError::DuplicateType {
                value: name.clone(),
                name,
            });
        }
    }

    Ok(TypeRegistry { types })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_simple_types() {
        let types = create_types(None, [("X", TypeSpec::Simple), ("Y", TypeSpec::Simple)]).unwrap();
        assert_eq!(types.simple("X"), Some("X"));
        assert_eq!(types.simple("Y"), Some("Y"));
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn true_is_simple_shorthand() {
        let types = create_types(Some("dogs"), [("X", TypeSpec::from(true)), ("Y", false.into())])
            .unwrap();
        assert_eq!(types.simple("X"), Some("dogs/X"));
        assert_eq!(types.async_type("Y").unwrap().begin, "dogs/Y/BEGIN");
    }

    #[test]
    fn creates_async_types() {
        let types = create_types(None, [("X", TypeSpec::Async)]).unwrap();
        let x = types.async_type("X").unwrap();
        assert_eq!(x.base, "X");
        assert_eq!(x.begin, "X/BEGIN");
        assert_eq!(x.success, "X/SUCCESS");
        assert_eq!(x.fail, "X/FAIL");
        assert_eq!(x.phase(Phase::Fail), "X/FAIL");
    }

    #[test]
    fn creates_types_with_prefix() {
        let types =
            create_types(Some("dogs"), [("fetch", TypeSpec::Async), ("reset", TypeSpec::Simple)])
                .unwrap();
        assert_eq!(types.simple("reset"), Some("dogs/reset"));
        assert_eq!(types.async_type("fetch").unwrap().begin, "dogs/fetch/BEGIN");

        let unprefixed = create_types(Some(""), [("reset", TypeSpec::Simple)]).unwrap();
        assert_eq!(unprefixed.simple("reset"), Some("reset"));
    }

    #[test]
    fn passes_through_literals() {
        let types = create_types(
            Some("dogs"),
            [
                ("raw", TypeSpec::from("SOMETHING")),
                ("quad", TypeSpec::from(AsyncType::new("OTHER"))),
            ],
        )
        .unwrap();
        assert_eq!(types.simple("raw"), Some("SOMETHING"));
        assert_eq!(types.async_type("quad").unwrap().base, "OTHER");
    }

    #[test]
    fn rejects_collisions() {
        let err = create_types(
            Some("dogs"),
            [("fetch", TypeSpec::Simple), ("alias", TypeSpec::from("dogs/fetch"))],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateType { ref value, .. } if value == "dogs/fetch"));

        let err = create_types(None, [("X", TypeSpec::Simple), ("X", TypeSpec::Async)]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateType { .. }));
    }

    #[test]
    fn rejects_empty_names() {
        let err = create_types(None, [("", TypeSpec::Simple)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTypeName { .. }));
    }

    #[test]
    fn classifies_phases() {
        assert!(is_begin("X/BEGIN"));
        assert!(!is_success("X/BEGIN"));
        assert!(is_success("X/SUCCESS"));
        assert!(is_fail("X/FAIL"));
        assert!(!is_fail("X"));

        assert_eq!(Phase::of("a/b/BEGIN"), Some(Phase::Begin));
        assert_eq!(Phase::of("X/SUCCESS"), Some(Phase::Success));
        assert_eq!(Phase::of("X/FAIL"), Some(Phase::Fail));
        assert_eq!(Phase::of("X"), None);
        assert_eq!(Phase::of("XBEGIN"), None);
        assert!(Phase::Fail.is_completion());
        assert!(!Phase::Begin.is_completion());
    }

    #[test]
    fn checks_base() {
        assert!(is_of_base("X", "X"));
        assert!(is_of_base("X/BEGIN", "X"));
        assert!(is_of_base("X/FAIL", "X"));
        assert!(is_of_base("X/Y/SUCCESS", "X/Y"));
        assert!(!is_of_base("X", "XY"));
        assert!(!is_of_base("XY/BEGIN", "X"));
        assert!(!is_of_base("Y/BEGIN", "X"));
    }

    #[test]
    fn operation_type_accessors() {
        let simple = OperationType::Simple("S".into());
        let quad = OperationType::Async(AsyncType::new("A"));
        assert_eq!(simple.base(), "S");
        assert_eq!(quad.base(), "A");
        assert!(simple.as_async().is_none());
        assert!(quad.as_simple().is_none());
    }
}
