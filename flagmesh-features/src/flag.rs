//! Flag Definitions
//!
//! Defines feature flags, targeting rules, and local evaluation logic used by
//! the in-memory flag client.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feature flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlag {
    /// Flag key
    pub key: String,

    /// Flag description
    #[serde(default)]
    pub description: Option<String>,

    /// Whether targeting is on. An off flag serves its first variation.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Targeting rules, evaluated in order
    #[serde(default)]
    pub targeting: Vec<TargetingRule>,

    /// Variation served when no rule or rollout applies
    pub default_variation: Variation,

    /// All available variations
    #[serde(default)]
    pub variations: Vec<Variation>,

    /// Rollout configuration
    #[serde(default)]
    pub rollout: Option<Rollout>,
}

fn default_enabled() -> bool {
    true
}

impl FeatureFlag {
    /// Create a boolean flag serving `default_value` when no rule matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use flagmesh_features::{EvaluationContext, FeatureFlag};
    ///
    /// let flag = FeatureFlag::boolean("new-ui", true);
    /// let ctx = EvaluationContext::new("user-1");
    /// assert_eq!(flag.evaluate(&ctx).as_bool(), Some(true));
    /// ```
    pub fn boolean(key: impl Into<String>, default_value: bool) -> Self {
        Self {
            key: key.into(),
            description: None,
            enabled: true,
            targeting: Vec::new(),
            default_variation: Variation::boolean(default_value),
            variations: vec![Variation::boolean(false), Variation::boolean(true)],
            rollout: None,
        }
    }

    /// Create a single-valued string flag
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = Variation::string(value);
        Self {
            key: key.into(),
            description: None,
            enabled: true,
            targeting: Vec::new(),
            default_variation: value.clone(),
            variations: vec![value],
            rollout: None,
        }
    }

    /// Create a multivariate flag. The first variation is the default.
    pub fn multivariate(key: impl Into<String>, variations: Vec<Variation>) -> Self {
        let default_variation = variations
            .first()
            .cloned()
            .unwrap_or(Variation::Boolean(false));

        Self {
            key: key.into(),
            description: None,
            enabled: true,
            targeting: Vec::new(),
            default_variation,
            variations,
            rollout: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_default(mut self, variation: Variation) -> Self {
        self.default_variation = variation;
        self
    }

    pub fn with_rule(mut self, rule: TargetingRule) -> Self {
        self.targeting.push(rule);
        self
    }

    pub fn with_rollout(mut self, rollout: Rollout) -> Self {
        self.rollout = Some(rollout);
        self
    }

    /// Evaluate the flag for a context.
    ///
    /// Order: off check, targeting rules, rollout, default variation.
    pub fn evaluate(&self, context: &EvaluationContext) -> Variation {
        if !self.enabled {
            return self
                .variations
                .first()
                .cloned()
                .unwrap_or_else(|| self.default_variation.clone());
        }

        if let Some(rule) = self.targeting.iter().find(|rule| rule.matches(context)) {
            return rule.variation.clone();
        }

        if let Some(ref rollout) = self.rollout
            && let Some(variation) = rollout.evaluate(context, &self.key)
        {
            return variation;
        }

        self.default_variation.clone()
    }
}

/// Flag value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variation {
    Boolean(bool),
    String(String),
    Number(f64),
    Json(serde_json::Value),
}

impl Variation {
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::Json(value)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Any variation as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Json(v) => v.clone(),
        }
    }

    /// Name of the value type, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Json(_) => "json",
        }
    }
}

impl From<bool> for Variation {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Variation {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Variation {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Variation {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<serde_json::Value> for Variation {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Typed extraction from a [`Variation`].
pub trait FromVariation: Sized {
    /// Type name reported on mismatch
    const KIND: &'static str;

    fn from_variation(variation: Variation) -> Option<Self>;
}

impl FromVariation for bool {
    const KIND: &'static str = "boolean";

    fn from_variation(variation: Variation) -> Option<Self> {
        variation.as_bool()
    }
}

impl FromVariation for String {
    const KIND: &'static str = "string";

    fn from_variation(variation: Variation) -> Option<Self> {
        match variation {
            Variation::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromVariation for f64 {
    const KIND: &'static str = "number";

    fn from_variation(variation: Variation) -> Option<Self> {
        variation.as_number()
    }
}

impl FromVariation for serde_json::Value {
    const KIND: &'static str = "json";

    // Every variation has a JSON form.
    fn from_variation(variation: Variation) -> Option<Self> {
        Some(match variation {
            Variation::Json(v) => v,
            other => other.to_json(),
        })
    }
}

/// Targeting rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingRule {
    /// Rule conditions (all must match)
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Variation to serve if the rule matches
    pub variation: Variation,
}

impl TargetingRule {
    pub fn new(variation: Variation) -> Self {
        Self {
            conditions: Vec::new(),
            variation,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn matches(&self, context: &EvaluationContext) -> bool {
        self.conditions.iter().all(|c| c.matches(context))
    }
}

/// Targeting condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Context attribute to check (`key` addresses the context key)
    pub attribute: String,

    pub operator: Operator,

    /// Values to compare against
    pub values: Vec<String>,
}

impl Condition {
    pub fn new(attribute: impl Into<String>, operator: Operator, values: Vec<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            values,
        }
    }

    pub fn matches(&self, context: &EvaluationContext) -> bool {
        let attr_value = context.get(&self.attribute);

        match self.operator {
            Operator::In => attr_value
                .map(|v| self.values.iter().any(|val| val == v))
                .unwrap_or(false),
            Operator::NotIn => attr_value
                .map(|v| !self.values.iter().any(|val| val == v))
                .unwrap_or(true),
            Operator::Contains => attr_value
                .map(|v| self.values.iter().any(|val| v.contains(val.as_str())))
                .unwrap_or(false),
            Operator::StartsWith => attr_value
                .map(|v| self.values.iter().any(|val| v.starts_with(val.as_str())))
                .unwrap_or(false),
            Operator::EndsWith => attr_value
                .map(|v| self.values.iter().any(|val| v.ends_with(val.as_str())))
                .unwrap_or(false),
            // Invalid patterns never match.
            Operator::Matches => attr_value
                .map(|v| {
                    self.values
                        .iter()
                        .filter_map(|pattern| Regex::new(pattern).ok())
                        .any(|re| re.is_match(v))
                })
                .unwrap_or(false),
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
}

/// Percentage rollout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rollout {
    /// Percentage (0-100)
    pub percentage: u8,

    /// Variation served to included contexts
    pub variation: Variation,

    /// Attribute used for bucketing (default: the context key)
    #[serde(default)]
    pub bucket_by: Option<String>,
}

impl Rollout {
    pub fn new(percentage: u8, variation: Variation) -> Self {
        Self {
            percentage: percentage.min(100),
            variation,
            bucket_by: None,
        }
    }

    pub fn with_bucket_by(mut self, attribute: impl Into<String>) -> Self {
        self.bucket_by = Some(attribute.into());
        self
    }

    pub fn evaluate(&self, context: &EvaluationContext, flag_key: &str) -> Option<Variation> {
        let bucket_attr = self.bucket_by.as_deref().unwrap_or(EvaluationContext::KEY);
        let bucket_value = context.get(bucket_attr)?;

        if Self::bucket(flag_key, bucket_value) < self.percentage {
            Some(self.variation.clone())
        } else {
            None
        }
    }

    /// Stable bucket in `0..100` for a flag and attribute value.
    fn bucket(flag_key: &str, value: &str) -> u8 {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(flag_key.as_bytes());
        hasher.update(b".");
        hasher.update(value.as_bytes());
        let digest = hasher.finalize();

        let prefix = u16::from_be_bytes([digest[0], digest[1]]);
        ((prefix as u32 * 100) / 65_536) as u8
    }
}

/// Evaluation context: the entity a flag is evaluated for.
///
/// Passed through to every flag client unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    key: String,
    attributes: HashMap<String, String>,
}

impl EvaluationContext {
    /// Attribute name that addresses the context key.
    pub const KEY: &'static str = "key";

    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        if name == Self::KEY {
            return Some(&self.key);
        }
        self.attributes.get(name).map(|s| s.as_str())
    }
}
