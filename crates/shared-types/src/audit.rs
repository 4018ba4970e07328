//! Append-only, hash-chained ledger of finished analyses
//!
//! Each entry records which rule set produced which verdict, carries the
//! SHA-256 of its own fields and links to its predecessor's hash. Editing
//! an entry's fields breaks its own hash; rewriting that hash as well
//! breaks the successor's link, so only the head entry depends on
//! [`AnalysisLedger::last_hash`] being kept somewhere outside the ledger.
//! Entries are never updated or removed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::rules::RuleSet;
use crate::types::{AnalysisResult, OverallStatus};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to serialize analysis record: {0}")]
    Serialization(String),

    #[error("chain broken at entry {index}: expected previous hash {expected:?}, got {found:?}")]
    BrokenChain {
        index: usize,
        expected: Option<String>,
        found: Option<String>,
    },

    #[error("entry {index} does not match its recorded hash")]
    TamperedEntry { index: usize },
}

/// A single stored analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: String,
    pub recorded_at: String,
    pub analysis_id: Uuid,
    pub original_filename: String,
    pub rule_set_id: Uuid,
    pub overall_status: OverallStatus,
    /// SHA-256 of the serialized result and rule set
    pub result_digest: String,
    pub previous_hash: Option<String>,
    /// `compute_hash()` as of append
    pub entry_hash: String,
}

impl LedgerEntry {
    /// Hash over every field except `entry_hash` itself
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.entry_id.as_bytes());
        hasher.update(self.recorded_at.as_bytes());
        hasher.update(self.analysis_id.as_bytes());
        hasher.update(self.original_filename.as_bytes());
        hasher.update(self.rule_set_id.as_bytes());
        hasher.update(self.overall_status.as_str().as_bytes());
        hasher.update(self.result_digest.as_bytes());
        if let Some(ref prev) = self.previous_hash {
            hasher.update(prev.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AnalysisLedger {
    pub entries: Vec<LedgerEntry>,
}

impl AnalysisLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_hash(&self) -> Option<String> {
        self.entries.last().map(|e| e.entry_hash.clone())
    }

    /// Record a finished analysis together with the rule set it was checked against
    pub fn append(
        &mut self,
        result: &AnalysisResult,
        rule_set: &RuleSet,
    ) -> Result<&LedgerEntry, LedgerError> {
        let mut entry = LedgerEntry {
            entry_id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now().to_rfc3339(),
            analysis_id: result.analysis_id,
            original_filename: result.original_filename.clone(),
            rule_set_id: rule_set.id,
            overall_status: result.overall_status,
            result_digest: digest_record(result, rule_set)?,
            previous_hash: self.last_hash(),
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.compute_hash();
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Walk the chain and confirm every link and every entry's own hash
    pub fn verify(&self) -> Result<(), LedgerError> {
        let mut expected: Option<String> = None;

        for (index, entry) in self.entries.iter().enumerate() {
            if entry.previous_hash != expected {
                return Err(LedgerError::BrokenChain {
                    index,
                    expected,
                    found: entry.previous_hash.clone(),
                });
            }
            if entry.entry_hash != entry.compute_hash() {
                return Err(LedgerError::TamperedEntry { index });
            }
            expected = Some(entry.entry_hash.clone());
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

/// SHA-256 over the serialized result followed by the serialized rule set
pub fn digest_record(result: &AnalysisResult, rule_set: &RuleSet) -> Result<String, LedgerError> {
    let result_bytes =
        serde_json::to_vec(result).map_err(|e| LedgerError::Serialization(e.to_string()))?;
    let rules_bytes =
        serde_json::to_vec(rule_set).map_err(|e| LedgerError::Serialization(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&result_bytes);
    hasher.update(&rules_bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleCondition;
    use crate::types::AnalysisSummary;

    pub(super) fn sample_result(filename: &str, status: OverallStatus) -> AnalysisResult {
        AnalysisResult {
            analysis_id: Uuid::new_v4(),
            original_filename: filename.to_string(),
            overall_status: status,
            summary: AnalysisSummary {
                total_rules_defined: 1,
                matches: usize::from(status == OverallStatus::Pass),
                mismatches_or_errors: usize::from(status != OverallStatus::Pass),
                faults_without_location: Vec::new(),
            },
            highlights: Vec::new(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub(super) fn sample_rules() -> RuleSet {
        RuleSet::new("label", vec![RuleCondition::exact_text("NET WT 500g")]).unwrap()
    }

    #[test]
    fn test_chain_integrity() {
        let mut ledger = AnalysisLedger::new();
        let rules = sample_rules();

        ledger
            .append(&sample_result("a.png", OverallStatus::Pass), &rules)
            .unwrap();
        ledger
            .append(&sample_result("b.png", OverallStatus::FailMinor), &rules)
            .unwrap();

        assert!(ledger.verify().is_ok());
        assert_eq!(ledger.len(), 2);
        assert!(ledger.entries[0].previous_hash.is_none());
    }

    #[test]
    fn test_tamper_detection() {
        let mut ledger = AnalysisLedger::new();
        let rules = sample_rules();

        ledger
            .append(&sample_result("a.png", OverallStatus::FailMinor), &rules)
            .unwrap();
        ledger
            .append(&sample_result("b.png", OverallStatus::Pass), &rules)
            .unwrap();

        ledger.entries[0].overall_status = OverallStatus::Pass;

        assert!(matches!(
            ledger.verify(),
            Err(LedgerError::TamperedEntry { index: 0 })
        ));

        // Re-hashing the edited entry moves the break to its successor's link
        ledger.entries[0].entry_hash = ledger.entries[0].compute_hash();
        assert!(matches!(
            ledger.verify(),
            Err(LedgerError::BrokenChain { index: 1, .. })
        ));
    }

    #[test]
    fn test_tampering_sole_entry_detected() {
        let mut ledger = AnalysisLedger::new();
        ledger
            .append(&sample_result("a.png", OverallStatus::FailMinor), &sample_rules())
            .unwrap();
        assert!(ledger.verify().is_ok());

        ledger.entries[0].overall_status = OverallStatus::Pass;

        assert!(matches!(
            ledger.verify(),
            Err(LedgerError::TamperedEntry { index: 0 })
        ));
    }

    #[test]
    fn test_tampering_last_entry_detected() {
        let mut ledger = AnalysisLedger::new();
        let rules = sample_rules();
        for name in ["a.png", "b.png", "c.png"] {
            ledger
                .append(&sample_result(name, OverallStatus::FailMinor), &rules)
                .unwrap();
        }
        let head = ledger.last_hash();

        ledger.entries[2].original_filename = "other.png".to_string();
        assert!(matches!(
            ledger.verify(),
            Err(LedgerError::TamperedEntry { index: 2 })
        ));

        // A rewritten head hash no longer matches the one published earlier
        ledger.entries[2].entry_hash = ledger.entries[2].compute_hash();
        assert!(ledger.verify().is_ok());
        assert_ne!(ledger.last_hash(), head);
    }

    #[test]
    fn test_digest_changes_with_rules() {
        let result = sample_result("a.png", OverallStatus::Pass);
        let first = digest_record(&result, &sample_rules()).unwrap();
        let other = RuleSet::new("other", vec![RuleCondition::exact_text("500 g")]).unwrap();
        let second = digest_record(&result, &other).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.len(), 64);
    }
}
