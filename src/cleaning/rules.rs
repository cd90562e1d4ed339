//! Column Rule Tables
//! Per-site validation rules for every sensor channel.
//!
//! Rules are registered in order. Registering a column twice overwrites the
//! earlier rule in place, so the last registration is the one applied.

use crate::data::Site;
use serde::Serialize;

/// Channels that may legitimately hold negative values.
pub const ALLOW_NEGATIVE: [&str; 3] = ["Tamb", "TModA", "TModB"];

/// Binary panel-cleaning flag, repaired by mode substitution.
pub const CLEANING: &str = "Cleaning";

/// Inclusive physical range. `high` may be `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Range {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Range with a lower bound only.
    pub fn at_least(low: f64) -> Self {
        Self {
            low,
            high: f64::INFINITY,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.low && v <= self.high
    }
}

/// How one column is validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRule {
    pub column: String,
    pub allow_negative: bool,
    /// `None` selects the adaptive IQR policy.
    pub expected_range: Option<Range>,
}

impl ColumnRule {
    /// Rule using the adaptive (IQR) outlier policy.
    pub fn adaptive(column: &str) -> Self {
        Self {
            column: column.to_string(),
            allow_negative: ALLOW_NEGATIVE.contains(&column),
            expected_range: None,
        }
    }

    /// Rule using a fixed physical range.
    pub fn fixed(column: &str, range: Range) -> Self {
        Self {
            column: column.to_string(),
            allow_negative: ALLOW_NEGATIVE.contains(&column),
            expected_range: Some(range),
        }
    }
}

/// Ordered rule registrations for one site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<ColumnRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Returns the rule it replaced, if any.
    pub fn register(&mut self, rule: ColumnRule) -> Option<ColumnRule> {
        match self.rules.iter_mut().find(|r| r.column == rule.column) {
            Some(existing) => {
                log::debug!(
                    "Rule for {} re-registered: {:?} -> {:?}",
                    rule.column,
                    existing.expected_range,
                    rule.expected_range
                );
                Some(std::mem::replace(existing, rule))
            }
            None => {
                self.rules.push(rule);
                None
            }
        }
    }

    pub fn adaptive(mut self, column: &str) -> Self {
        self.register(ColumnRule::adaptive(column));
        self
    }

    pub fn range(mut self, column: &str, low: f64, high: f64) -> Self {
        self.register(ColumnRule::fixed(column, Range::new(low, high)));
        self
    }

    pub fn at_least(mut self, column: &str, low: f64) -> Self {
        self.register(ColumnRule::fixed(column, Range::at_least(low)));
        self
    }

    pub fn get(&self, column: &str) -> Option<&ColumnRule> {
        self.rules.iter().find(|r| r.column == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule table used for a site.
    ///
    /// GHI is registered twice on every site. On benin the fixed (0, 4000)
    /// range replaces the adaptive rule; on sierraleone and togo (0, 1000)
    /// replaces (0, 4000). The narrower range looks unintended but is what
    /// the published results were produced with.
    pub fn for_site(site: Site) -> Self {
        match site {
            Site::Benin => Self::new()
                .adaptive("GHI")
                .adaptive("DNI")
                .adaptive("DHI")
                .adaptive("ModA")
                .adaptive("ModB")
                .adaptive("Tamb")
                .range("RH", 0.0, 100.0)
                .adaptive("WS")
                .adaptive("WSgust")
                .adaptive("WSstdev")
                .range("WD", 0.0, 360.0)
                .adaptive("WDstdev")
                .range("BP", 900.0, 1050.0)
                .range(CLEANING, 0.0, 1.0)
                .at_least("Precipitation", 0.0)
                .adaptive("TModA")
                .adaptive("TModB")
                .range("GHI", 0.0, 4000.0),
            Site::SierraLeone | Site::Togo => Self::new()
                .range("GHI", 0.0, 4000.0)
                .range("DNI", 0.0, 2000.0)
                .range("DHI", 0.0, 2000.0)
                .adaptive("ModA")
                .adaptive("ModB")
                .range("Tamb", -50.0, 50.0)
                .range("RH", 0.0, 100.0)
                .range("WS", 0.0, 100.0)
                .range("WSgust", 0.0, 100.0)
                .range("WSstdev", 0.0, 100.0)
                .range("WD", 0.0, 360.0)
                .range("WDstdev", 0.0, 360.0)
                .range("BP", 900.0, 1050.0)
                .range(CLEANING, 0.0, 1.0)
                .at_least("Precipitation", 0.0)
                .range("TModA", -50.0, 50.0)
                .range("TModB", -50.0, 50.0)
                .range("GHI", 0.0, 1000.0),
        }
    }
}
