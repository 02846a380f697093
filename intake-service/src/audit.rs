//! Assessment audit trail
//!
//! Append-only JSON lines file. Every record carries the hash of the record
//! before it, so any edit or deletion breaks the chain and is caught by
//! [`AuditTrail::verify_integrity`]. Also backs the results view: filtering,
//! ordering, paging, verdict tallies and CSV export.

use crate::collaborators::{AssessmentEntry, AssessmentSink};
use crate::error::{IntakeError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use trust_engine::{Verdict, VerdictSummary};
use uuid::Uuid;

/// Persisted assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record identifier
    pub id: Uuid,
    /// Append time
    pub created_at: DateTime<Utc>,
    /// message, transactions, screenshot, invoice or qr
    pub feature: String,
    /// Summary of the scored input
    pub input_value: String,
    /// Final trust, 0 to 100
    pub score: u8,
    /// Verdict for `score`
    pub verdict: Verdict,
    /// Reasons in firing order
    pub reasons: Vec<String>,
    /// Recommended action
    pub action: String,
    /// Reference hash of the scored evidence
    pub reference: String,

    /// Hash of the preceding record, empty for the first
    pub previous_hash: String,

    /// Hash over every field above
    pub hash: String,
}

impl AuditRecord {
    fn new(entry: &AssessmentEntry, previous_hash: String) -> Self {
        let assessment = &entry.assessment;
        let mut record = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            feature: entry.feature.clone(),
            input_value: entry.input_value.clone(),
            score: assessment.trust.score(),
            verdict: assessment.verdict,
            reasons: assessment.reasons.clone(),
            action: assessment.action.clone(),
            reference: assessment.reference_hash.clone(),
            previous_hash,
            hash: String::new(),
        };
        record.hash = record.compute_hash();
        record
    }

    fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();

        hasher.update(self.id.as_bytes());
        hasher.update(self.created_at.to_rfc3339().as_bytes());
        hasher.update(self.feature.as_bytes());
        hasher.update(self.input_value.as_bytes());
        hasher.update([self.score]);
        hasher.update(self.verdict.as_str().as_bytes());
        for reason in &self.reasons {
            hasher.update(reason.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(self.action.as_bytes());
        hasher.update(self.reference.as_bytes());
        hasher.update(self.previous_hash.as_bytes());

        hex::encode(hasher.finalize())
    }

    /// Recompute and compare the record hash
    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Results ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrder {
    /// Newest first
    #[default]
    New,
    /// Oldest first
    Old,
    /// Highest score first, newest first within a score
    Hi,
    /// Lowest score first, newest first within a score
    Lo,
}

impl std::str::FromStr for ResultOrder {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "new" => Ok(ResultOrder::New),
            "old" => Ok(ResultOrder::Old),
            "hi" => Ok(ResultOrder::Hi),
            "lo" => Ok(ResultOrder::Lo),
            other => Err(IntakeError::Config(format!("unknown result order {:?}", other))),
        }
    }
}

/// Results view query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsQuery {
    /// Feature to keep; `None` or `"all"` keeps every feature
    pub feature: Option<String>,
    /// First day included
    pub from: Option<NaiveDate>,
    /// Last day included
    pub to: Option<NaiveDate>,
    /// Sort order
    pub order: ResultOrder,
    /// 1-based page number
    pub page: usize,
    /// Records per page
    pub limit: usize,
}

impl Default for ResultsQuery {
    fn default() -> Self {
        Self {
            feature: None,
            from: None,
            to: None,
            order: ResultOrder::New,
            page: 1,
            limit: 50,
        }
    }
}

impl ResultsQuery {
    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(feature) = self.feature.as_deref() {
            if feature != "all" && record.feature != feature {
                return false;
            }
        }

        let day = record.created_at.date_naive();
        if self.from.map_or(false, |from| day < from) {
            return false;
        }
        if self.to.map_or(false, |to| day > to) {
            return false;
        }

        true
    }

    /// Filter, order and page records
    pub fn apply(&self, records: Vec<AuditRecord>) -> Vec<AuditRecord> {
        let mut selected: Vec<AuditRecord> =
            records.into_iter().filter(|r| self.matches(r)).collect();

        match self.order {
            ResultOrder::New => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ResultOrder::Old => selected.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            ResultOrder::Hi => selected.sort_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
            ResultOrder::Lo => selected.sort_by(|a, b| {
                a.score
                    .cmp(&b.score)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }

        let skip = self.page.saturating_sub(1).saturating_mul(self.limit);
        selected.into_iter().skip(skip).take(self.limit).collect()
    }
}

/// Count records per verdict
pub fn tally(records: &[AuditRecord]) -> VerdictSummary {
    let mut summary = VerdictSummary::default();
    for record in records {
        summary.record(record.verdict);
    }
    summary
}

/// Write `created_at,feature,verdict,score,input_value` rows
pub fn export_csv<W: Write>(records: &[AuditRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["created_at", "feature", "verdict", "score", "input_value"])?;

    for record in records {
        csv.write_record([
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.feature.clone(),
            record.verdict.as_str().to_string(),
            record.score.to_string(),
            record.input_value.clone(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Hash-chained JSON lines audit trail
pub struct AuditTrail {
    path: PathBuf,
    state: Mutex<TrailState>,
}

struct TrailState {
    file: File,
    last_hash: String,
}

impl AuditTrail {
    /// Open (or create) a trail, resuming the chain from its last record
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let last_hash = Self::last_hash(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            state: Mutex::new(TrailState { file, last_hash }),
        })
    }

    /// Trail file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn last_hash(path: &Path) -> Result<String> {
        if !path.exists() {
            return Ok(String::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut last = None;
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                last = Some(line);
            }
        }

        match last {
            Some(line) => {
                let record: AuditRecord = serde_json::from_str(&line)?;
                Ok(record.hash)
            }
            None => Ok(String::new()),
        }
    }

    /// Append one assessment
    pub async fn append(&self, entry: &AssessmentEntry) -> Result<AuditRecord> {
        let mut state = self.state.lock().await;

        let record = AuditRecord::new(entry, state.last_hash.clone());
        let mut json = serde_json::to_string(&record)?;
        json.push('\n');

        state.file.write_all(json.as_bytes())?;
        state.file.flush()?;
        state.last_hash = record.hash.clone();

        debug!(id = %record.id, feature = %record.feature, "audit record appended");
        Ok(record)
    }

    /// All records in append order
    pub async fn records(&self) -> Result<Vec<AuditRecord>> {
        let _guard = self.state.lock().await;

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    /// Records selected by a results query
    pub async fn query(&self, query: &ResultsQuery) -> Result<Vec<AuditRecord>> {
        Ok(query.apply(self.records().await?))
    }

    /// Walk the chain; returns the number of verified records
    pub async fn verify_integrity(&self) -> Result<usize> {
        let records = self.records().await?;
        let mut previous_hash = String::new();

        for (i, record) in records.iter().enumerate() {
            if !record.verify_hash() {
                return Err(IntakeError::Integrity(format!(
                    "record hash mismatch at record {} (id {})",
                    i + 1,
                    record.id
                )));
            }
            if record.previous_hash != previous_hash {
                return Err(IntakeError::Integrity(format!(
                    "broken chain at record {} (id {})",
                    i + 1,
                    record.id
                )));
            }
            previous_hash = record.hash.clone();
        }

        Ok(records.len())
    }
}

#[async_trait]
impl AssessmentSink for AuditTrail {
    async fn record(&self, entry: &AssessmentEntry) -> Result<()> {
        self.append(entry).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use trust_engine::{Domain, RiskAssessment, TrustScore};

    fn entry(feature: &str, score: u8) -> AssessmentEntry {
        AssessmentEntry {
            feature: feature.to_string(),
            input_value: format!("{} input", feature),
            assessment: RiskAssessment::new(
                Domain::Message,
                TrustScore::new(score),
                vec!["Unknown sender".to_string()],
                "ab".repeat(32),
            ),
        }
    }

    fn record_at(feature: &str, score: u8, created_at: DateTime<Utc>) -> AuditRecord {
        let mut record = AuditRecord::new(&entry(feature, score), String::new());
        record.created_at = created_at;
        record
    }

    #[tokio::test]
    async fn test_append_and_verify_chain() {
        let dir = tempfile::tempdir().unwrap();
        let trail = AuditTrail::open(dir.path().join("audit.jsonl")).unwrap();

        let first = trail.append(&entry("message", 20)).await.unwrap();
        let second = trail.append(&entry("qr", 90)).await.unwrap();

        assert_eq!(first.previous_hash, "");
        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(trail.verify_integrity().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_chain_resumes_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let first = {
            let trail = AuditTrail::open(&path).unwrap();
            trail.append(&entry("message", 20)).await.unwrap()
        };

        let trail = AuditTrail::open(&path).unwrap();
        let second = trail.append(&entry("message", 30)).await.unwrap();

        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(trail.verify_integrity().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_tampering_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let trail = AuditTrail::open(&path).unwrap();
        trail.append(&entry("message", 20)).await.unwrap();
        trail.append(&entry("message", 25)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let tampered = format!("\n{}", content.replacen("\"score\":25", "\"score\":95", 1));
        std::fs::write(&path, tampered).unwrap();

        match trail.verify_integrity().await {
            Err(IntakeError::Integrity(msg)) => {
                assert!(msg.starts_with("record hash mismatch at record 2"), "{}", msg)
            }
            other => panic!("expected integrity error, got {:?}", other),
        }
    }

    #[test]
    fn test_query_filters_orders_and_pages() {
        let now = Utc::now();
        let records = vec![
            record_at("message", 40, now - Duration::days(3)),
            record_at("qr", 90, now - Duration::days(2)),
            record_at("message", 70, now - Duration::days(1)),
            record_at("message", 70, now),
        ];

        let messages = ResultsQuery {
            feature: Some("message".to_string()),
            order: ResultOrder::Hi,
            ..Default::default()
        }
        .apply(records.clone());
        let scores: Vec<u8> = messages.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![70, 70, 40]);
        assert_eq!(messages[0].created_at, now);

        let oldest = ResultsQuery {
            feature: Some("all".to_string()),
            order: ResultOrder::Old,
            limit: 2,
            page: 2,
            ..Default::default()
        }
        .apply(records.clone());
        assert_eq!(oldest.len(), 2);
        assert_eq!(oldest[0].score, 70);

        let recent = ResultsQuery {
            from: Some((now - Duration::days(1)).date_naive()),
            ..Default::default()
        }
        .apply(records);
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_tally_and_csv_export() {
        let now = Utc::now();
        let records = vec![
            record_at("message", 90, now),
            record_at("qr", 60, now),
            record_at("invoice", 10, now),
        ];

        let summary = tally(&records);
        assert_eq!((summary.safe, summary.suspicious, summary.fraud), (1, 1, 1));

        let mut out = Vec::new();
        export_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("created_at,feature,verdict,score,input_value"));
        assert!(lines.next().unwrap().ends_with(",message,SAFE,90,message input"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_result_order_parse() {
        assert_eq!("lo".parse::<ResultOrder>().unwrap(), ResultOrder::Lo);
        assert!("sideways".parse::<ResultOrder>().is_err());
    }
}
