//! Canonical representation parameters
//!
//! Parameters are stored sorted by key, so two parameter sets built in a
//! different order compare, hash and order the same way and land in the same
//! cache slot. Integral floats are stored as integers, so `2` and `2.0` name
//! the same slot.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single parameter value
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    fn rank(&self) -> u8 {
        match self {
            ParamValue::Bool(_) => 0,
            ParamValue::Int(_) => 1,
            ParamValue::Float(_) => 2,
            ParamValue::Text(_) => 3,
        }
    }

    /// Integral floats within the exactly representable range become `Int`
    fn normalized(self) -> Self {
        const EXACT: f64 = 9_007_199_254_740_992.0;
        match self {
            ParamValue::Float(value) if value.fract() == 0.0 && value.abs() <= EXACT => {
                ParamValue::Int(value as i64)
            }
            other => other,
        }
    }

    /// Numeric view, integers included
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(value) => Some(*value as f64),
            ParamValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

// Floats compare by bit pattern so the type can be a map key. Numbers of
// either kind order by value.
impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ParamValue {}

impl PartialOrd for ParamValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParamValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ParamValue::Bool(a), ParamValue::Bool(b)) => a.cmp(b),
            (ParamValue::Int(a), ParamValue::Int(b)) => a.cmp(b),
            (ParamValue::Float(a), ParamValue::Float(b)) => a.total_cmp(b),
            (ParamValue::Text(a), ParamValue::Text(b)) => a.cmp(b),
            (ParamValue::Int(_), ParamValue::Float(_)) | (ParamValue::Float(_), ParamValue::Int(_)) => {
                let (a, b) = (self.as_f64().unwrap_or_default(), other.as_f64().unwrap_or_default());
                a.total_cmp(&b).then(self.rank().cmp(&other.rank()))
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            ParamValue::Bool(value) => value.hash(state),
            ParamValue::Int(value) => value.hash(state),
            ParamValue::Float(value) => value.to_bits().hash(state),
            ParamValue::Text(value) => value.hash(state),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Text(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Keyword parameters passed to a representation factory
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, ParamValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into().normalized());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Numeric parameter with a fallback
    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(ParamValue::as_f64).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(ParamValue::as_bool).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into().normalized()))
                .collect(),
        )
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Cache slot of one representation: factory name plus frozen parameters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RepresentationKey {
    pub name: String,
    pub parameters: Parameters,
}

impl RepresentationKey {
    pub fn new(name: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

impl fmt::Display for RepresentationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.parameters)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &impl Hash) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = Parameters::new().with("tolerance", 0.5).with("closed", true);
        let b: Parameters = [("closed", ParamValue::from(true)), ("tolerance", 0.5.into())]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.to_string(), "closed=true, tolerance=0.5");
    }

    #[test]
    fn distinct_values_are_distinct_keys() {
        let low = RepresentationKey::new("contour.flattened", Parameters::new().with("tolerance", 0.1));
        let high = RepresentationKey::new("contour.flattened", Parameters::new().with("tolerance", 1.0));
        assert_ne!(low, high);
        assert!(low < high);
        assert_eq!(low.to_string(), "contour.flattened(tolerance=0.1)");
    }

    #[test]
    fn integral_floats_share_the_integer_slot() {
        let whole = RepresentationKey::new("contour.flattened", Parameters::new().with("tolerance", 2));
        let float = RepresentationKey::new("contour.flattened", Parameters::new().with("tolerance", 2.0));
        assert_eq!(whole, float);
        assert_eq!(hash_of(&whole), hash_of(&float));
        assert_eq!(float.to_string(), "contour.flattened(tolerance=2)");

        let fractional = Parameters::new().with("tolerance", 2.5);
        assert_eq!(fractional.get("tolerance"), Some(&ParamValue::Float(2.5)));
        let huge = Parameters::new().with("scale", 1e300);
        assert_eq!(huge.get("scale"), Some(&ParamValue::Float(1e300)));
        assert_eq!(huge.f64_or("scale", 0.0), 1e300);
    }

    #[test]
    fn typed_lookups() {
        let parameters = Parameters::new()
            .with("tolerance", 2)
            .with("mode", "fast")
            .with("closed", false);
        assert_eq!(parameters.f64_or("tolerance", 0.25), 2.0);
        assert_eq!(parameters.f64_or("missing", 0.25), 0.25);
        assert!(!parameters.bool_or("closed", true));
        assert_eq!(parameters.get("mode").and_then(ParamValue::as_str), Some("fast"));
        assert_eq!(parameters.len(), 3);
    }

    #[test]
    fn serializes_as_plain_map() {
        let key = RepresentationKey::new("glyph.bounds", Parameters::new().with("scale", 2.5));
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "glyph.bounds", "parameters": { "scale": 2.5 } })
        );
    }
}
