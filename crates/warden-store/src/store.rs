use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use uuid::Uuid;

use warden_core::{Result, TrustLevel, WardenError};
use warden_outcome::{KnowledgeEntry, OutcomeContext, OutcomeEvent};
use warden_proposal::{ChangeProposal, ProposalAction};
use warden_runner::ActionRun;
use warden_safety::SafetyAuditEntry;
use warden_trust::TrustRecord;

/// SQLite persistence for every governed record.
///
/// The append-only tables (`proposal_actions`, `outcome_events`,
/// `safety_audit`) have insert and read paths only. The unique index on open
/// proposal fingerprints backs the at-most-one-open-proposal invariant at the
/// storage layer.
pub struct WardenStore {
    db: Arc<Mutex<Connection>>,
}

impl WardenStore {
    /// Open or create the governance database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        info!(?path, "opening warden store");

        let conn = Connection::open(path).map_err(store_err)?;

        // Enable WAL mode for concurrent reads
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(store_err)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS trust_records (
                website_id TEXT NOT NULL,
                action_category TEXT NOT NULL,
                trust_level INTEGER NOT NULL,
                confidence REAL NOT NULL,
                success_count INTEGER NOT NULL DEFAULT 0,
                failure_count INTEGER NOT NULL DEFAULT 0,
                last_success_at TEXT,
                last_failure_at TEXT,
                last_reviewed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (website_id, action_category)
            );

            CREATE TABLE IF NOT EXISTS proposals (
                proposal_id TEXT PRIMARY KEY,
                fingerprint TEXT NOT NULL,
                website_id TEXT NOT NULL,
                service_key TEXT NOT NULL,
                kind TEXT NOT NULL,
                target TEXT NOT NULL,
                status TEXT NOT NULL,
                risk_level TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                rationale TEXT NOT NULL,
                evidence TEXT NOT NULL DEFAULT '{}',
                change_plan TEXT NOT NULL DEFAULT '[]',
                verification_plan TEXT NOT NULL DEFAULT '[]',
                rollback_plan TEXT NOT NULL DEFAULT '[]',
                blocking INTEGER NOT NULL DEFAULT 0,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_proposals_open_fingerprint
                ON proposals(fingerprint) WHERE status = 'open';

            CREATE TABLE IF NOT EXISTS proposal_actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                proposal_id TEXT NOT NULL REFERENCES proposals(proposal_id),
                seq INTEGER NOT NULL,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                reason TEXT NOT NULL DEFAULT '',
                at TEXT NOT NULL,
                UNIQUE (proposal_id, seq)
            );

            CREATE TABLE IF NOT EXISTS action_runs (
                run_id TEXT PRIMARY KEY,
                anomaly_id TEXT NOT NULL,
                website_id TEXT NOT NULL,
                action_code TEXT NOT NULL,
                status TEXT NOT NULL,
                plan TEXT NOT NULL DEFAULT '[]',
                output TEXT NOT NULL DEFAULT '{}',
                started_at TEXT NOT NULL,
                completed_at TEXT,
                error_text TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_action_runs_anomaly ON action_runs(anomaly_id);

            CREATE TABLE IF NOT EXISTS outcome_events (
                event_id TEXT PRIMARY KEY,
                site_id TEXT NOT NULL,
                metric_key TEXT NOT NULL,
                old_value REAL NOT NULL,
                new_value REAL NOT NULL,
                delta REAL NOT NULL,
                percent_change REAL NOT NULL,
                severity TEXT NOT NULL,
                event_type TEXT NOT NULL,
                window_label TEXT NOT NULL,
                intervention_id TEXT,
                note TEXT NOT NULL DEFAULT '',
                detected_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_outcome_events_site ON outcome_events(site_id);

            CREATE TABLE IF NOT EXISTS knowledge_entries (
                entry_id TEXT PRIMARY KEY,
                source_event_id TEXT NOT NULL UNIQUE,
                confidence REAL NOT NULL,
                status TEXT NOT NULL,
                recommended_action TEXT,
                avoid_action TEXT,
                guardrail TEXT,
                evidence TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS safety_audit (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                seq INTEGER NOT NULL,
                at TEXT NOT NULL,
                actor TEXT NOT NULL,
                command TEXT NOT NULL,
                detail TEXT NOT NULL DEFAULT ''
            );
            ",
        )
        .map_err(store_err)?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    // ── Trust records ──────────────────────────────────────────

    /// Persist a trust record (upsert by website + category). Records are
    /// superseded in place, never deleted.
    pub fn persist_trust_record(&self, record: &TrustRecord) -> Result<()> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO trust_records (website_id, action_category, trust_level, confidence,
                success_count, failure_count, last_success_at, last_failure_at,
                last_reviewed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(website_id, action_category) DO UPDATE SET
                trust_level = excluded.trust_level,
                confidence = excluded.confidence,
                success_count = excluded.success_count,
                failure_count = excluded.failure_count,
                last_success_at = excluded.last_success_at,
                last_failure_at = excluded.last_failure_at,
                last_reviewed_at = excluded.last_reviewed_at,
                updated_at = excluded.updated_at",
            rusqlite::params![
                record.website_id,
                record.action_category,
                record.trust_level as u8,
                record.confidence,
                record.success_count,
                record.failure_count,
                record.last_success_at.map(|t| t.to_rfc3339()),
                record.last_failure_at.map(|t| t.to_rfc3339()),
                record.last_reviewed_at.map(|t| t.to_rfc3339()),
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    pub fn trust_record(&self, website_id: &str, category: &str) -> Result<Option<TrustRecord>> {
        let db = self.db.lock();
        let row: Option<TrustRow> = db
            .query_row(
                "SELECT website_id, action_category, trust_level, confidence, success_count,
                        failure_count, last_success_at, last_failure_at, last_reviewed_at,
                        created_at, updated_at
                 FROM trust_records WHERE website_id = ?1 AND action_category = ?2",
                rusqlite::params![website_id, category],
                map_trust_row,
            )
            .optional()
            .map_err(store_err)?;
        row.map(TrustRow::into_record).transpose()
    }

    /// Every persisted trust record, for ledger warm-up at startup.
    pub fn load_trust_records(&self) -> Result<Vec<TrustRecord>> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare(
                "SELECT website_id, action_category, trust_level, confidence, success_count,
                        failure_count, last_success_at, last_failure_at, last_reviewed_at,
                        created_at, updated_at
                 FROM trust_records",
            )
            .map_err(store_err)?;
        let rows: Vec<TrustRow> = stmt
            .query_map([], map_trust_row)
            .map_err(store_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(store_err)?;
        rows.into_iter().map(TrustRow::into_record).collect()
    }

    // ── Proposals ──────────────────────────────────────────────

    /// Persist a proposal (upsert by id). Inserting a second *open* proposal
    /// with an already-open fingerprint violates the unique index and is
    /// rejected by SQLite — the storage-level backstop for the dedup
    /// invariant.
    pub fn persist_proposal(&self, proposal: &ChangeProposal) -> Result<()> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO proposals (proposal_id, fingerprint, website_id, service_key, kind,
                target, status, risk_level, title, description, rationale, evidence,
                change_plan, verification_plan, rollback_plan, blocking, tags,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
             ON CONFLICT(proposal_id) DO UPDATE SET
                status = excluded.status,
                risk_level = excluded.risk_level,
                title = excluded.title,
                description = excluded.description,
                rationale = excluded.rationale,
                evidence = excluded.evidence,
                change_plan = excluded.change_plan,
                verification_plan = excluded.verification_plan,
                rollback_plan = excluded.rollback_plan,
                blocking = excluded.blocking,
                tags = excluded.tags,
                updated_at = excluded.updated_at",
            rusqlite::params![
                proposal.proposal_id.to_string(),
                proposal.fingerprint,
                proposal.website_id,
                proposal.service_key,
                proposal.kind,
                proposal.target,
                proposal.status.as_str(),
                enum_text(&proposal.risk_level)?,
                proposal.title,
                proposal.description,
                proposal.rationale,
                proposal.evidence.to_string(),
                serde_json::to_string(&proposal.change_plan)?,
                serde_json::to_string(&proposal.verification_plan)?,
                serde_json::to_string(&proposal.rollback_plan)?,
                proposal.blocking as i32,
                serde_json::to_string(&proposal.tags)?,
                proposal.created_at.to_rfc3339(),
                proposal.updated_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    pub fn proposal(&self, proposal_id: Uuid) -> Result<Option<ChangeProposal>> {
        self.query_proposal(
            "SELECT * FROM proposals WHERE proposal_id = ?1",
            rusqlite::params![proposal_id.to_string()],
        )
    }

    pub fn open_proposal_by_fingerprint(&self, fingerprint: &str) -> Result<Option<ChangeProposal>> {
        self.query_proposal(
            "SELECT * FROM proposals WHERE fingerprint = ?1 AND status = 'open'",
            rusqlite::params![fingerprint],
        )
    }

    fn query_proposal(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<ChangeProposal>> {
        let db = self.db.lock();
        let row: Option<ProposalRow> = db
            .query_row(sql, params, map_proposal_row)
            .optional()
            .map_err(store_err)?;
        row.map(ProposalRow::into_proposal).transpose()
    }

    /// Append one row to a proposal's action log. There is no update or
    /// delete path for this table.
    pub fn append_proposal_action(&self, action: &ProposalAction) -> Result<()> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO proposal_actions (proposal_id, seq, actor, action, reason, at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                action.proposal_id.to_string(),
                action.seq as i64,
                action.actor,
                action.action,
                action.reason,
                action.at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    /// A proposal's action log, oldest first.
    pub fn proposal_actions(&self, proposal_id: Uuid) -> Result<Vec<ProposalAction>> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare(
                "SELECT proposal_id, seq, actor, action, reason, at
                 FROM proposal_actions WHERE proposal_id = ?1 ORDER BY seq",
            )
            .map_err(store_err)?;
        let rows: Vec<(String, u64, String, String, String, String)> = stmt
            .query_map(rusqlite::params![proposal_id.to_string()], |row| {
                Ok((
                    row.get(0)?,
                    row.get::<_, i64>(1)? as u64,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .map_err(store_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(store_err)?;

        rows.into_iter()
            .map(|(pid, seq, actor, action, reason, at)| {
                Ok(ProposalAction {
                    proposal_id: parse_id(&pid)?,
                    seq,
                    actor,
                    action,
                    reason,
                    at: parse_ts(&at)?,
                })
            })
            .collect()
    }

    // ── Action runs ────────────────────────────────────────────

    /// Persist an action run (upsert by id). A run is written once when it
    /// starts and once more at its terminal transition.
    pub fn persist_action_run(&self, run: &ActionRun) -> Result<()> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO action_runs (run_id, anomaly_id, website_id, action_code, status,
                plan, output, started_at, completed_at, error_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(run_id) DO UPDATE SET
                status = excluded.status,
                output = excluded.output,
                completed_at = excluded.completed_at,
                error_text = excluded.error_text",
            rusqlite::params![
                run.run_id.to_string(),
                run.anomaly_id,
                run.website_id,
                run.action_code,
                enum_text(&run.status)?,
                serde_json::to_string(&run.plan)?,
                serde_json::to_string(&run.output)?,
                run.started_at.to_rfc3339(),
                run.completed_at.map(|t| t.to_rfc3339()),
                run.error_text,
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    pub fn action_run(&self, run_id: Uuid) -> Result<Option<ActionRun>> {
        let db = self.db.lock();
        let row: Option<RunRow> = db
            .query_row(
                "SELECT run_id, anomaly_id, website_id, action_code, status, plan, output,
                        started_at, completed_at, error_text
                 FROM action_runs WHERE run_id = ?1",
                rusqlite::params![run_id.to_string()],
                map_run_row,
            )
            .optional()
            .map_err(store_err)?;
        row.map(RunRow::into_run).transpose()
    }

    /// Every run triggered by one anomaly, newest first.
    pub fn action_runs_for_anomaly(&self, anomaly_id: &str) -> Result<Vec<ActionRun>> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare(
                "SELECT run_id, anomaly_id, website_id, action_code, status, plan, output,
                        started_at, completed_at, error_text
                 FROM action_runs WHERE anomaly_id = ?1 ORDER BY started_at DESC",
            )
            .map_err(store_err)?;
        let rows: Vec<RunRow> = stmt
            .query_map(rusqlite::params![anomaly_id], map_run_row)
            .map_err(store_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(store_err)?;
        rows.into_iter().map(RunRow::into_run).collect()
    }

    // ── Outcome events ─────────────────────────────────────────

    /// Append one outcome event. The table is insert-only.
    pub fn append_outcome_event(&self, event: &OutcomeEvent) -> Result<()> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO outcome_events (event_id, site_id, metric_key, old_value, new_value,
                delta, percent_change, severity, event_type, window_label, intervention_id,
                note, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                event.event_id.to_string(),
                event.site_id,
                event.metric_key,
                event.old_value,
                event.new_value,
                event.delta,
                event.percent_change,
                enum_text(&event.severity)?,
                enum_text(&event.event_type)?,
                event.window,
                event.context.intervention_id.map(|id| id.to_string()),
                event.context.note,
                event.detected_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    /// Recent outcome events for a site, newest first.
    pub fn outcome_events(&self, site_id: &str, limit: usize) -> Result<Vec<OutcomeEvent>> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare(
                "SELECT event_id, site_id, metric_key, old_value, new_value, delta,
                        percent_change, severity, event_type, window_label, intervention_id,
                        note, detected_at
                 FROM outcome_events WHERE site_id = ?1
                 ORDER BY detected_at DESC LIMIT ?2",
            )
            .map_err(store_err)?;
        let rows: Vec<EventRow> = stmt
            .query_map(rusqlite::params![site_id, limit as i64], map_event_row)
            .map_err(store_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(store_err)?;
        rows.into_iter().map(EventRow::into_event).collect()
    }

    // ── Knowledge entries ──────────────────────────────────────

    /// Persist a knowledge entry, upserting by its originating event so
    /// corroborating promotions land on the existing row.
    pub fn persist_knowledge_entry(&self, entry: &KnowledgeEntry) -> Result<()> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO knowledge_entries (entry_id, source_event_id, confidence, status,
                recommended_action, avoid_action, guardrail, evidence, tags,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(source_event_id) DO UPDATE SET
                confidence = excluded.confidence,
                status = excluded.status,
                recommended_action = excluded.recommended_action,
                avoid_action = excluded.avoid_action,
                guardrail = excluded.guardrail,
                evidence = excluded.evidence,
                tags = excluded.tags,
                updated_at = excluded.updated_at",
            rusqlite::params![
                entry.entry_id.to_string(),
                entry.source_event_id.to_string(),
                entry.confidence,
                enum_text(&entry.status)?,
                entry.recommended_action,
                entry.avoid_action,
                entry.guardrail,
                serde_json::to_string(&entry.evidence)?,
                serde_json::to_string(&entry.tags)?,
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    pub fn load_knowledge_entries(&self) -> Result<Vec<KnowledgeEntry>> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare(
                "SELECT entry_id, source_event_id, confidence, status, recommended_action,
                        avoid_action, guardrail, evidence, tags, created_at, updated_at
                 FROM knowledge_entries ORDER BY updated_at DESC",
            )
            .map_err(store_err)?;
        let rows: Vec<KnowledgeRow> = stmt
            .query_map([], map_knowledge_row)
            .map_err(store_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(store_err)?;
        rows.into_iter().map(KnowledgeRow::into_entry).collect()
    }

    // ── Safety audit ───────────────────────────────────────────

    /// Append one safety audit entry. The table is insert-only.
    pub fn append_safety_audit(&self, entry: &SafetyAuditEntry) -> Result<()> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO safety_audit (seq, at, actor, command, detail)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                entry.seq as i64,
                entry.at.to_rfc3339(),
                entry.actor,
                entry.command,
                entry.detail,
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    /// Recent safety audit entries, newest first.
    pub fn safety_audit(&self, limit: usize) -> Result<Vec<SafetyAuditEntry>> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare(
                "SELECT seq, at, actor, command, detail
                 FROM safety_audit ORDER BY id DESC LIMIT ?1",
            )
            .map_err(store_err)?;
        let rows: Vec<(u64, String, String, String, String)> = stmt
            .query_map(rusqlite::params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })
            .map_err(store_err)?
            .collect::<rusqlite::Result<_>>()
            .map_err(store_err)?;

        rows.into_iter()
            .map(|(seq, at, actor, command, detail)| {
                Ok(SafetyAuditEntry {
                    seq,
                    at: parse_ts(&at)?,
                    actor,
                    command,
                    detail,
                })
            })
            .collect()
    }
}

// ── Row mapping ────────────────────────────────────────────────

struct TrustRow {
    website_id: String,
    action_category: String,
    trust_level: u8,
    confidence: f64,
    success_count: u32,
    failure_count: u32,
    last_success_at: Option<String>,
    last_failure_at: Option<String>,
    last_reviewed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn map_trust_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrustRow> {
    Ok(TrustRow {
        website_id: row.get(0)?,
        action_category: row.get(1)?,
        trust_level: row.get(2)?,
        confidence: row.get(3)?,
        success_count: row.get(4)?,
        failure_count: row.get(5)?,
        last_success_at: row.get(6)?,
        last_failure_at: row.get(7)?,
        last_reviewed_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl TrustRow {
    fn into_record(self) -> Result<TrustRecord> {
        Ok(TrustRecord {
            website_id: self.website_id,
            action_category: self.action_category,
            trust_level: TrustLevel::from_u8(self.trust_level),
            confidence: self.confidence,
            success_count: self.success_count,
            failure_count: self.failure_count,
            last_success_at: parse_opt_ts(self.last_success_at)?,
            last_failure_at: parse_opt_ts(self.last_failure_at)?,
            last_reviewed_at: parse_opt_ts(self.last_reviewed_at)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

struct ProposalRow {
    proposal_id: String,
    fingerprint: String,
    website_id: String,
    service_key: String,
    kind: String,
    target: String,
    status: String,
    risk_level: String,
    title: String,
    description: String,
    rationale: String,
    evidence: String,
    change_plan: String,
    verification_plan: String,
    rollback_plan: String,
    blocking: bool,
    tags: String,
    created_at: String,
    updated_at: String,
}

fn map_proposal_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProposalRow> {
    Ok(ProposalRow {
        proposal_id: row.get("proposal_id")?,
        fingerprint: row.get("fingerprint")?,
        website_id: row.get("website_id")?,
        service_key: row.get("service_key")?,
        kind: row.get("kind")?,
        target: row.get("target")?,
        status: row.get("status")?,
        risk_level: row.get("risk_level")?,
        title: row.get("title")?,
        description: row.get("description")?,
        rationale: row.get("rationale")?,
        evidence: row.get("evidence")?,
        change_plan: row.get("change_plan")?,
        verification_plan: row.get("verification_plan")?,
        rollback_plan: row.get("rollback_plan")?,
        blocking: row.get::<_, i32>("blocking")? != 0,
        tags: row.get("tags")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl ProposalRow {
    fn into_proposal(self) -> Result<ChangeProposal> {
        Ok(ChangeProposal {
            proposal_id: parse_id(&self.proposal_id)?,
            fingerprint: self.fingerprint,
            website_id: self.website_id,
            service_key: self.service_key,
            kind: self.kind,
            target: self.target,
            status: text_enum(&self.status)?,
            risk_level: text_enum(&self.risk_level)?,
            title: self.title,
            description: self.description,
            rationale: self.rationale,
            evidence: parse_json(&self.evidence)?,
            change_plan: parse_json(&self.change_plan)?,
            verification_plan: parse_json(&self.verification_plan)?,
            rollback_plan: parse_json(&self.rollback_plan)?,
            blocking: self.blocking,
            tags: parse_json(&self.tags)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

struct RunRow {
    run_id: String,
    anomaly_id: String,
    website_id: String,
    action_code: String,
    status: String,
    plan: String,
    output: String,
    started_at: String,
    completed_at: Option<String>,
    error_text: Option<String>,
}

fn map_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
    Ok(RunRow {
        run_id: row.get(0)?,
        anomaly_id: row.get(1)?,
        website_id: row.get(2)?,
        action_code: row.get(3)?,
        status: row.get(4)?,
        plan: row.get(5)?,
        output: row.get(6)?,
        started_at: row.get(7)?,
        completed_at: row.get(8)?,
        error_text: row.get(9)?,
    })
}

impl RunRow {
    fn into_run(self) -> Result<ActionRun> {
        Ok(ActionRun {
            run_id: parse_id(&self.run_id)?,
            anomaly_id: self.anomaly_id,
            website_id: self.website_id,
            action_code: self.action_code,
            status: text_enum(&self.status)?,
            plan: parse_json(&self.plan)?,
            output: parse_json(&self.output)?,
            started_at: parse_ts(&self.started_at)?,
            completed_at: parse_opt_ts(self.completed_at)?,
            error_text: self.error_text,
        })
    }
}

struct EventRow {
    event_id: String,
    site_id: String,
    metric_key: String,
    old_value: f64,
    new_value: f64,
    delta: f64,
    percent_change: f64,
    severity: String,
    event_type: String,
    window_label: String,
    intervention_id: Option<String>,
    note: String,
    detected_at: String,
}

fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        event_id: row.get(0)?,
        site_id: row.get(1)?,
        metric_key: row.get(2)?,
        old_value: row.get(3)?,
        new_value: row.get(4)?,
        delta: row.get(5)?,
        percent_change: row.get(6)?,
        severity: row.get(7)?,
        event_type: row.get(8)?,
        window_label: row.get(9)?,
        intervention_id: row.get(10)?,
        note: row.get(11)?,
        detected_at: row.get(12)?,
    })
}

impl EventRow {
    fn into_event(self) -> Result<OutcomeEvent> {
        Ok(OutcomeEvent {
            event_id: parse_id(&self.event_id)?,
            site_id: self.site_id,
            metric_key: self.metric_key,
            old_value: self.old_value,
            new_value: self.new_value,
            delta: self.delta,
            percent_change: self.percent_change,
            severity: text_enum(&self.severity)?,
            event_type: text_enum(&self.event_type)?,
            window: self.window_label,
            context: OutcomeContext {
                intervention_id: self.intervention_id.map(|id| parse_id(&id)).transpose()?,
                note: self.note,
            },
            detected_at: parse_ts(&self.detected_at)?,
        })
    }
}

struct KnowledgeRow {
    entry_id: String,
    source_event_id: String,
    confidence: f64,
    status: String,
    recommended_action: Option<String>,
    avoid_action: Option<String>,
    guardrail: Option<String>,
    evidence: String,
    tags: String,
    created_at: String,
    updated_at: String,
}

fn map_knowledge_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<KnowledgeRow> {
    Ok(KnowledgeRow {
        entry_id: row.get(0)?,
        source_event_id: row.get(1)?,
        confidence: row.get(2)?,
        status: row.get(3)?,
        recommended_action: row.get(4)?,
        avoid_action: row.get(5)?,
        guardrail: row.get(6)?,
        evidence: row.get(7)?,
        tags: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl KnowledgeRow {
    fn into_entry(self) -> Result<KnowledgeEntry> {
        Ok(KnowledgeEntry {
            entry_id: parse_id(&self.entry_id)?,
            source_event_id: parse_id(&self.source_event_id)?,
            confidence: self.confidence,
            status: text_enum(&self.status)?,
            recommended_action: self.recommended_action,
            avoid_action: self.avoid_action,
            guardrail: self.guardrail,
            evidence: parse_json(&self.evidence)?,
            tags: parse_json(&self.tags)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

// ── Column conversions ─────────────────────────────────────────

fn store_err(e: impl std::fmt::Display) -> WardenError {
    WardenError::Store(e.to_string())
}

/// Serialize a serde string-enum (snake_case / lowercase renames) into its
/// TEXT column form, so stored values always match the serde names the rest
/// of the system uses.
fn enum_text<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(WardenError::Store(format!(
            "expected a string-encoded enum, got {other}"
        ))),
    }
}

fn text_enum<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(text.to_string()))
        .map_err(|e| WardenError::Store(format!("unknown enum value '{text}': {e}")))
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| WardenError::Store(format!("bad json column: {e}")))
}

fn parse_id(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| WardenError::Store(format!("bad uuid '{text}': {e}")))
}

fn parse_ts(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| WardenError::Store(format!("bad timestamp '{text}': {e}")))
}

fn parse_opt_ts(text: Option<String>) -> Result<Option<DateTime<Utc>>> {
    text.map(|t| parse_ts(&t)).transpose()
}
