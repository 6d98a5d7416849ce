use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use wayfare_core::activity::UserActivity;

/// Price statistics in minor units. Every field is `None` when the history
/// carries no prices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub currency: Option<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub average: Option<f64>,
}

/// What a user's recent history says about them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    /// Number of activity records folded in.
    pub sample_size: usize,
    pub destinations: BTreeMap<String, u32>,
    pub categories: BTreeMap<String, u32>,
    pub tags: BTreeMap<String, u32>,
    pub price_range: PriceRange,
    /// Index 0 is January.
    pub months: [u32; 12],
}

impl PreferenceProfile {
    pub fn is_empty(&self) -> bool {
        self.sample_size == 0
    }

    pub fn top_destinations(&self, n: usize) -> Vec<&str> {
        top(&self.destinations, n)
    }

    pub fn top_categories(&self, n: usize) -> Vec<&str> {
        top(&self.categories, n)
    }

    pub fn top_tags(&self, n: usize) -> Vec<&str> {
        top(&self.tags, n)
    }

    /// Busiest month as 1-12, if any start dates were recorded.
    pub fn peak_month(&self) -> Option<u32> {
        let (idx, count) = self
            .months
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
        (*count > 0).then_some(idx as u32 + 1)
    }
}

/// Fold a user's activity records into a profile. Pure; the caller decides
/// how many records to pass.
pub fn aggregate(records: &[UserActivity]) -> PreferenceProfile {
    let mut profile = PreferenceProfile {
        sample_size: records.len(),
        ..PreferenceProfile::default()
    };

    for record in records {
        if let Some(key) = record.destination.as_deref().and_then(normalize) {
            *profile.destinations.entry(key).or_default() += 1;
        }
        if let Some(key) = record.category.as_deref().and_then(normalize) {
            *profile.categories.entry(key).or_default() += 1;
        }
        for tag in record.preferences.iter().filter_map(|t| normalize(t)) {
            *profile.tags.entry(tag).or_default() += 1;
        }
        if let Some(date) = record.start_date {
            profile.months[date.month0() as usize] += 1;
        }
    }

    profile.price_range = price_range(records);
    profile
}

/// Statistics over the prices in the most common currency; amounts in other
/// currencies are not comparable and are left out.
fn price_range(records: &[UserActivity]) -> PriceRange {
    let mut by_currency: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for price in records.iter().filter_map(|r| r.price.as_ref()) {
        by_currency
            .entry(price.currency.as_str())
            .or_default()
            .push(price.amount_minor);
    }

    let Some((currency, amounts)) = by_currency
        .into_iter()
        .max_by(|a, b| a.1.len().cmp(&b.1.len()).then(b.0.cmp(a.0)))
    else {
        return PriceRange::default();
    };

    let sum: i128 = amounts.iter().map(|&a| i128::from(a)).sum();
    PriceRange {
        currency: Some(currency.to_string()),
        min: amounts.iter().copied().min(),
        max: amounts.iter().copied().max(),
        average: Some(sum as f64 / amounts.len() as f64),
    }
}

fn normalize(raw: &str) -> Option<String> {
    let key = raw.trim().to_lowercase();
    (!key.is_empty()).then_some(key)
}

fn top(table: &BTreeMap<String, u32>, n: usize) -> Vec<&str> {
    let mut entries: Vec<(&String, &u32)> = table.iter().collect();
    // Highest count first; ties stay alphabetical.
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries.into_iter().take(n).map(|(k, _)| k.as_str()).collect()
}
