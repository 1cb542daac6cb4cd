//! Per-asset size differences between the base build and the current build

use crate::assets::AssetSizeReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size change of a single asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDiff {
    /// Size in the current build
    pub current: u64,
    /// Size in the base build (0 when the asset is new)
    pub original: u64,
    /// `current - original`, saturated to the `i64` range
    pub difference: i64,
    /// `difference / original * 100`, undefined for new assets
    pub percent_change: Option<f64>,
}

impl AssetDiff {
    /// Compare two sizes
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_weigh_in::cicd::diff::AssetDiff;
    ///
    /// let diff = AssetDiff::between(20, 200);
    /// assert_eq!(diff.difference, 180);
    /// assert_eq!(diff.percent_change, Some(900.0));
    ///
    /// assert_eq!(AssetDiff::between(0, 10).percent_change, None);
    /// ```
    pub fn between(original: u64, current: u64) -> Self {
        let exact = i128::from(current) - i128::from(original);
        let difference = i64::try_from(exact).unwrap_or(if exact < 0 { i64::MIN } else { i64::MAX });
        let percent_change = if original == 0 {
            None
        } else {
            Some(exact as f64 / original as f64 * 100.0)
        };

        Self {
            current,
            original,
            difference,
            percent_change,
        }
    }
}

/// Asset id → diff, one entry per asset of the current report
pub type AssetDiffs = BTreeMap<String, AssetDiff>;

/// Diff every asset of `current` against `original`
///
/// Assets only present in `original` are ignored; assets only present in
/// `current` compare against a size of 0.
pub fn diff_reports(original: &AssetSizeReport, current: &AssetSizeReport) -> AssetDiffs {
    current
        .iter()
        .map(|(asset_id, stat)| {
            let original_size = original.get(asset_id).map_or(0, |stat| stat.size);
            (asset_id.clone(), AssetDiff::between(original_size, stat.size))
        })
        .collect()
}
