//! Failure threshold enforcement for CI/CD
//!
//! Each threshold names assets by id or by extension (`.js`) and a maximum
//! size. Strategy `any` fails the threshold when any matched asset is larger
//! than the limit. Threshold failures are reported, not raised: the run
//! still writes its artifacts and posts a `failure` status.

use crate::assets::AssetSizeReport;
use crate::config::threshold::{FailureThreshold, Strategy};
use crate::error::WeighInError;
use serde::{Deserialize, Serialize};

/// A violated threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdFailure {
    /// Human-readable description of the violation
    pub message: String,
    /// The threshold as configured
    pub threshold: FailureThreshold,
    /// Assets larger than the limit, in report order
    pub offending_assets: Vec<String>,
}

/// Whether `target` selects `asset_id`
///
/// Targets starting with `.` are extensions and match by suffix; every
/// other target must equal the asset id.
pub fn target_matches(target: &str, asset_id: &str) -> bool {
    if target.starts_with('.') {
        asset_id.ends_with(target)
    } else {
        asset_id == target
    }
}

/// Threshold checker over the current asset report
pub struct BudgetChecker<'a> {
    report: &'a AssetSizeReport,
}

impl<'a> BudgetChecker<'a> {
    /// Create a checker for `report`
    pub fn new(report: &'a AssetSizeReport) -> Self {
        Self { report }
    }

    /// Ensure every target of every threshold matches at least one asset
    pub fn check_targets(&self, thresholds: &[FailureThreshold]) -> Result<(), WeighInError> {
        for threshold in thresholds {
            for target in threshold.targets.as_slice() {
                if !self
                    .report
                    .keys()
                    .any(|asset_id| target_matches(target, asset_id))
                {
                    return Err(WeighInError::InvalidFailureThresholdTarget {
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Evaluate one threshold; `None` when it holds
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_weigh_in::assets::{AssetSizeReport, AssetStat};
    /// use circleci_weigh_in::cicd::budget::BudgetChecker;
    /// use circleci_weigh_in::config::threshold::FailureThreshold;
    ///
    /// let report = AssetSizeReport::from([(
    ///     "app.js".to_string(),
    ///     AssetStat { filename: "app.js".into(), path: "dist/app.js".into(), size: 200 },
    /// )]);
    ///
    /// let failure = BudgetChecker::new(&report)
    ///     .check(&FailureThreshold::new("app.js", 50))
    ///     .unwrap();
    /// assert_eq!(failure.message, r#""app.js" (200B) must be less than or equal to 50B!"#);
    /// ```
    pub fn check(&self, threshold: &FailureThreshold) -> Option<ThresholdFailure> {
        let offending: Vec<(&String, u64)> = match threshold.strategy {
            Strategy::Any => self
                .report
                .iter()
                .filter(|(asset_id, _)| {
                    threshold
                        .targets
                        .as_slice()
                        .iter()
                        .any(|target| target_matches(target, asset_id))
                })
                .filter(|(_, stat)| stat.size > threshold.max_size)
                .map(|(asset_id, stat)| (asset_id, stat.size))
                .collect(),
        };

        if offending.is_empty() {
            return None;
        }

        let assets = offending
            .iter()
            .map(|(asset_id, size)| format!("\"{}\" ({}B)", asset_id, size))
            .collect::<Vec<_>>()
            .join(", ");

        Some(ThresholdFailure {
            message: format!(
                "{} must be less than or equal to {}B!",
                assets, threshold.max_size
            ),
            threshold: threshold.clone(),
            offending_assets: offending
                .into_iter()
                .map(|(asset_id, _)| asset_id.clone())
                .collect(),
        })
    }

    /// Check target validity, then evaluate every threshold in order
    pub fn evaluate(
        &self,
        thresholds: &[FailureThreshold],
    ) -> Result<Vec<ThresholdFailure>, WeighInError> {
        self.check_targets(thresholds)?;
        Ok(thresholds
            .iter()
            .filter_map(|threshold| self.check(threshold))
            .collect())
    }
}
