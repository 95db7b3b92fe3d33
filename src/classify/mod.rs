//! Category classification.
//!
//! Maps free text typed by the user (and, failing that, the provider's
//! category tags) to a canonical category plus a search keyword. The rule
//! table is data: adding a category means editing `rules.yaml` (or a
//! user-supplied table), not code.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PlaceRankError, Result};

const BUILTIN_RULES: &str = include_str!("rules.yaml");

/// How a classification was reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchSource {
    /// A free-text rule matched (index into the rule table)
    Text { rule_index: usize },
    /// A provider category tag was recognized
    ApiType { tag: String },
    /// Nothing matched
    Default,
}

/// Canonical category and the keyword used to scope the nearby search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub keyword: String,
    pub source: MatchSource,
}

impl Classification {
    /// Query for the text-search fallback: the keyword, or the category
    /// when there is no keyword.
    pub fn search_term(&self) -> &str {
        if self.keyword.is_empty() {
            &self.category
        } else {
            &self.keyword
        }
    }
}

/// One free-text rule: pattern plus its output
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pattern: Regex,
    pub category: String,
    pub keyword: String,
}

impl CategoryRule {
    pub fn new(pattern: &str, category: impl Into<String>, keyword: impl Into<String>) -> Result<Self> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(PlaceRankError::Rules(format!("rule '{pattern}' has an empty category")));
        }
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| PlaceRankError::Rules(format!("invalid pattern '{pattern}': {e}")))?;
        Ok(Self {
            pattern,
            category,
            keyword: keyword.into(),
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Provider tag → canonical category, with a specificity rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    pub tag: String,
    pub category: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub specificity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DefaultCategory {
    category: String,
    #[serde(default)]
    keyword: String,
}

#[derive(Debug, Deserialize)]
struct RuleDoc {
    pattern: String,
    category: String,
    #[serde(default)]
    keyword: String,
}

#[derive(Debug, Deserialize)]
struct RuleTableDoc {
    default: DefaultCategory,
    #[serde(default)]
    rules: Vec<RuleDoc>,
    #[serde(default)]
    types: Vec<TypeMapping>,
}

/// Compiled, read-only rule table
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<CategoryRule>,
    types: HashMap<String, TypeMapping>,
    default: DefaultCategory,
}

impl RuleTable {
    /// The table shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_RULES)
    }

    /// Load a table from a YAML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PlaceRankError::Rules(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let doc: RuleTableDoc = serde_yaml::from_str(raw)?;

        let rules = doc
            .rules
            .iter()
            .map(|r| CategoryRule::new(&r.pattern, r.category.as_str(), r.keyword.as_str()))
            .collect::<Result<Vec<_>>>()?;

        let mut types = HashMap::with_capacity(doc.types.len());
        for mapping in doc.types {
            let tag = mapping.tag.trim().to_lowercase();
            if types.contains_key(&tag) {
                return Err(PlaceRankError::Rules(format!("duplicate type tag '{tag}'")));
            }
            types.insert(tag, mapping);
        }

        tracing::debug!("Loaded rule table: {} text rules, {} type mappings", rules.len(), types.len());

        Ok(Self {
            rules,
            types,
            default: doc.default,
        })
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Resolve free text and provider tags to a category. Always succeeds.
    pub fn classify<S: AsRef<str>>(&self, free_text: &str, api_types: &[S]) -> Classification {
        let text = free_text.to_lowercase();

        if let Some((rule_index, rule)) = self.rules.iter().enumerate().find(|(_, r)| r.matches(&text)) {
            return Classification {
                category: rule.category.clone(),
                keyword: rule.keyword.clone(),
                source: MatchSource::Text { rule_index },
            };
        }

        // max_by_key keeps the last maximum; iterate reversed so input order breaks ties
        let best = api_types
            .iter()
            .rev()
            .filter_map(|t| {
                let tag = t.as_ref().trim().to_lowercase();
                self.types.get(&tag).map(|m| (tag, m))
            })
            .max_by_key(|(_, m)| m.specificity);

        if let Some((tag, mapping)) = best {
            return Classification {
                category: mapping.category.clone(),
                keyword: mapping.keyword.clone(),
                source: MatchSource::ApiType { tag },
            };
        }

        Classification {
            category: self.default.category.clone(),
            keyword: self.default.keyword.clone(),
            source: MatchSource::Default,
        }
    }
}
