//! Migration outcome records, the run report, and report sinks.
//!
//! ## Record lifecycle
//!
//! 1. [`PendingRecord::new`] when a source workspace is picked up.
//! 2. [`PendingRecord::target`] / [`PendingRecord::snapshot`] as facts
//!    become known. Each consumes and returns the pending record, so a
//!    field is set at most once.
//! 3. [`PendingRecord::seal`] fixes status and detail and yields an
//!    immutable [`MigrationRecord`], which is appended to the report.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use stateshift_core::{OrgName, WorkspaceDescriptor, WorkspaceId, WorkspaceName};

use crate::error::{io_err, ReportError};
use crate::snapshot::StateSnapshot;

/// Shown in place of a target id when pairing found no target.
pub const UNRESOLVED: &str = "unresolved";

/// Column order of the tabular report.
pub const CSV_COLUMNS: [&str; 8] = [
    "sourceOrg",
    "targetOrg",
    "workspaceName",
    "sourceWorkspaceId",
    "targetWorkspaceId",
    "detail",
    "status",
    "migrated",
];

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationStatus {
    Migrated,
    Skipped,
    Failed,
}

impl MigrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MigrationStatus::Migrated => "MIGRATED",
            MigrationStatus::Skipped => "SKIPPED",
            MigrationStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Outcome of migrating one source workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    pub source_org: OrgName,
    pub target_org: OrgName,
    pub workspace_name: WorkspaceName,
    pub source_workspace_id: WorkspaceId,
    /// `None` when no target workspace of the same name exists. Serialized
    /// as [`UNRESOLVED`] in that case.
    #[serde(serialize_with = "serialize_target_id")]
    pub target_workspace_id: Option<WorkspaceId>,
    pub status: MigrationStatus,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl MigrationRecord {
    pub fn migrated(&self) -> bool {
        self.status == MigrationStatus::Migrated
    }

    /// Target id, or `"unresolved"`.
    pub fn target_id_label(&self) -> &str {
        self.target_workspace_id
            .as_ref()
            .map_or(UNRESOLVED, |id| id.0.as_str())
    }
}

fn serialize_target_id<S: Serializer>(id: &Option<WorkspaceId>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(id.as_ref().map_or(UNRESOLVED, |id| id.0.as_str()))
}

/// A record whose outcome is not yet known.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    source_org: OrgName,
    target_org: OrgName,
    workspace_name: WorkspaceName,
    source_workspace_id: WorkspaceId,
    target_workspace_id: Option<WorkspaceId>,
    serial: Option<u64>,
    lineage: Option<String>,
    digest: Option<String>,
}

impl PendingRecord {
    pub fn new(source_org: &OrgName, target_org: &OrgName, source: &WorkspaceDescriptor) -> Self {
        Self {
            source_org: source_org.clone(),
            target_org: target_org.clone(),
            workspace_name: source.name.clone(),
            source_workspace_id: source.id.clone(),
            target_workspace_id: None,
            serial: None,
            lineage: None,
            digest: None,
        }
    }

    /// Record the paired target workspace.
    pub fn target(self, id: &WorkspaceId) -> Self {
        Self {
            target_workspace_id: Some(id.clone()),
            ..self
        }
    }

    /// Record the bookkeeping of the fetched snapshot.
    pub fn snapshot(self, snapshot: &StateSnapshot) -> Self {
        Self {
            serial: Some(snapshot.serial()),
            lineage: Some(snapshot.lineage().to_string()),
            digest: Some(snapshot.digest().to_string()),
            ..self
        }
    }

    /// Fix the outcome.
    pub fn seal(self, status: MigrationStatus, detail: impl Into<String>) -> MigrationRecord {
        MigrationRecord {
            source_org: self.source_org,
            target_org: self.target_org,
            workspace_name: self.workspace_name,
            source_workspace_id: self.source_workspace_id,
            target_workspace_id: self.target_workspace_id,
            status,
            detail: detail.into(),
            serial: self.serial,
            lineage: self.lineage,
            digest: self.digest,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Ordered, append-only collection of records for one run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    summary: ReportSummary,
    records: Vec<MigrationRecord>,
}

/// Per-status record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ReportSummary {
    pub fn total(&self) -> usize {
        self.migrated + self.skipped + self.failed
    }
}

impl Default for MigrationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            summary: ReportSummary::default(),
            records: Vec::new(),
        }
    }

    pub fn append(&mut self, record: MigrationRecord) {
        match record.status {
            MigrationStatus::Migrated => self.summary.migrated += 1,
            MigrationStatus::Skipped => self.summary.skipped += 1,
            MigrationStatus::Failed => self.summary.failed += 1,
        }
        self.records.push(record);
    }

    /// Records in processing order.
    pub fn all(&self) -> &[MigrationRecord] {
        &self.records
    }

    pub fn summary(&self) -> ReportSummary {
        self.summary
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination for a finished report.
pub trait ReportSink {
    fn write_report(&mut self, report: &MigrationReport) -> Result<(), ReportError>;
}

/// Writes the report as CSV: one header row, then one row per record.
pub struct CsvReportSink<W: Write> {
    writer: W,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    source_org: &'a str,
    target_org: &'a str,
    workspace_name: &'a str,
    source_workspace_id: &'a str,
    target_workspace_id: &'a str,
    detail: &'a str,
    status: &'static str,
    migrated: bool,
}

impl<'a> From<&'a MigrationRecord> for CsvRow<'a> {
    fn from(r: &'a MigrationRecord) -> Self {
        CsvRow {
            source_org: &r.source_org.0,
            target_org: &r.target_org.0,
            workspace_name: &r.workspace_name.0,
            source_workspace_id: &r.source_workspace_id.0,
            target_workspace_id: r.target_id_label(),
            detail: &r.detail,
            status: r.status.as_str(),
            migrated: r.migrated(),
        }
    }
}

impl<W: Write> CsvReportSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for CsvReportSink<W> {
    fn write_report(&mut self, report: &MigrationReport) -> Result<(), ReportError> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut self.writer);
        csv.write_record(CSV_COLUMNS)?;
        for record in report.all() {
            csv.serialize(CsvRow::from(record))?;
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// Write the CSV report to `path` atomically (`<path>.tmp` then rename).
pub fn save_csv(path: &Path, report: &MigrationReport) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    let mut sink = CsvReportSink::new(Vec::new());
    sink.write_report(report)?;
    std::fs::write(&tmp, sink.into_inner()).map_err(|e| io_err(&tmp, e))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    tracing::info!("wrote report: {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(name: &str, id: &str) -> WorkspaceDescriptor {
        WorkspaceDescriptor {
            name: name.into(),
            id: id.into(),
            locked: false,
        }
    }

    fn pending(name: &str) -> PendingRecord {
        PendingRecord::new(
            &OrgName::from("old"),
            &OrgName::from("new"),
            &source(name, &format!("ws-src-{name}")),
        )
    }

    fn sample_report() -> MigrationReport {
        let snap = StateSnapshot::from_raw(br#"{"serial":3,"lineage":"L1"}"#.to_vec()).unwrap();
        let mut report = MigrationReport::new();
        report.append(
            pending("alpha")
                .target(&WorkspaceId::from("ws-tgt-alpha"))
                .snapshot(&snap)
                .seal(MigrationStatus::Migrated, "migrated serial 3"),
        );
        report.append(pending("beta").seal(MigrationStatus::Failed, "target workspace not found"));
        report.append(
            pending("gamma")
                .target(&WorkspaceId::from("ws-tgt-gamma"))
                .seal(MigrationStatus::Skipped, "no current state version"),
        );
        report
    }

    fn csv_string(report: &MigrationReport) -> String {
        let mut sink = CsvReportSink::new(Vec::new());
        sink.write_report(report).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn seal_carries_every_known_fact() {
        let snap = StateSnapshot::from_raw(br#"{"serial":7,"lineage":"L9"}"#.to_vec()).unwrap();
        let record = pending("alpha")
            .target(&WorkspaceId::from("ws-t"))
            .snapshot(&snap)
            .seal(MigrationStatus::Migrated, "ok");
        assert_eq!(record.target_id_label(), "ws-t");
        assert_eq!(record.serial, Some(7));
        assert_eq!(record.lineage.as_deref(), Some("L9"));
        assert_eq!(record.digest.as_deref(), Some(snap.digest()));
        assert!(record.migrated());
    }

    #[test]
    fn unpaired_record_reports_unresolved_target() {
        let record = pending("beta").seal(MigrationStatus::Failed, "target workspace not found");
        assert_eq!(record.target_id_label(), UNRESOLVED);
        assert!(!record.migrated());
    }

    #[test]
    fn report_keeps_append_order_and_counts() {
        let report = sample_report();
        let names: Vec<&str> = report.all().iter().map(|r| r.workspace_name.0.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
        assert_eq!(
            report.summary(),
            ReportSummary {
                migrated: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(report.summary().total(), 3);
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let csv = csv_string(&sample_report());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "sourceOrg,targetOrg,workspaceName,sourceWorkspaceId,targetWorkspaceId,detail,status,migrated"
        );
        assert_eq!(
            lines[1],
            "old,new,alpha,ws-src-alpha,ws-tgt-alpha,migrated serial 3,MIGRATED,true"
        );
        assert_eq!(
            lines[2],
            "old,new,beta,ws-src-beta,unresolved,target workspace not found,FAILED,false"
        );
        assert_eq!(
            lines[3],
            "old,new,gamma,ws-src-gamma,ws-tgt-gamma,no current state version,SKIPPED,false"
        );
    }

    #[test]
    fn csv_for_empty_report_is_header_only() {
        let csv = csv_string(&MigrationReport::new());
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("sourceOrg,"));
    }

    #[test]
    fn csv_quotes_details_with_commas() {
        let mut report = MigrationReport::new();
        report.append(pending("alpha").seal(MigrationStatus::Failed, "HTTP 500: a, b"));
        let csv = csv_string(&report);
        assert!(csv.contains("\"HTTP 500: a, b\""), "got: {csv}");
    }

    #[test]
    fn save_csv_writes_file_and_cleans_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.csv");
        save_csv(&path, &sample_report()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 4);
        assert!(!PathBuf::from(format!("{}.tmp", path.display())).exists());
    }

    #[test]
    fn json_uses_screaming_status_names() {
        let value = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(value["records"][0]["status"], "MIGRATED");
        assert_eq!(value["summary"]["failed"], 1);
    }

    #[test]
    fn json_labels_unresolved_target_like_csv() {
        let report = sample_report();
        let value = serde_json::to_value(&report).unwrap();
        let csv = csv_string(&report);
        for (i, record) in report.all().iter().enumerate() {
            let label = record.target_id_label();
            assert_eq!(value["records"][i]["target_workspace_id"], label);
            assert!(csv.lines().nth(i + 1).unwrap().contains(label), "got: {csv}");
        }
        assert_eq!(value["records"][1]["target_workspace_id"], UNRESOLVED);
    }
}
