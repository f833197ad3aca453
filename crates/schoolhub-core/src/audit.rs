//! Append-only audit trail of create/update/delete operations.
//!
//! Writing is best-effort: [`AuditLog::record`] never fails the caller. It runs
//! as its own statement, outside any transaction the caller holds, so a lost
//! audit write can never roll back the business write it describes.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    ItemsAndPagesNumber, NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set,
};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::outcome::Outcome;
use schoolhub_db::entities::audit_entry::{self, Operation};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u64 = 200;

const CIVIL_ID_LEN: usize = 20;
const NAME_LEN: usize = 100;
const JOB_TITLE_LEN: usize = 50;
const IP_LEN: usize = 45;

/// Who performed an operation, copied from their session at write time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub civil_id: Option<String>,
    pub name: Option<String>,
    pub subject: Option<String>,
    pub job_title: Option<String>,
}

impl Actor {
    /// Actor for operations with no signed-in user.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Network details of the request that caused an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One audit entry waiting to be written.
///
/// Snapshots are encoded to JSON text as soon as they are attached. A snapshot
/// that cannot be encoded is dropped on its own; the rest of the entry is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    operation: Operation,
    table: String,
    record_id: Option<String>,
    old_state: Option<String>,
    new_state: Option<String>,
    description: Option<String>,
}

impl AuditRecord {
    pub fn new(operation: Operation, table: impl Into<String>) -> Self {
        Self {
            operation,
            table: table.into(),
            record_id: None,
            old_state: None,
            new_state: None,
            description: None,
        }
    }

    pub fn record_id(mut self, id: impl ToString) -> Self {
        self.record_id = Some(id.to_string());
        self
    }

    pub fn old_state<T: Serialize + ?Sized>(mut self, state: &T) -> Self {
        self.old_state = encode_snapshot(state, &self.table, "old");
        self
    }

    pub fn new_state<T: Serialize + ?Sized>(mut self, state: &T) -> Self {
        self.new_state = encode_snapshot(state, &self.table, "new");
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

fn encode_snapshot<T: Serialize + ?Sized>(state: &T, table: &str, which: &str) -> Option<String> {
    match canonical_json(state) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::warn!(table, snapshot = which, "dropping unserializable audit snapshot: {e}");
            None
        }
    }
}

/// Stable JSON text for a snapshot: object keys sorted, non-ASCII kept as is.
/// `null` and empty objects/arrays carry no information and encode to `None`.
pub fn canonical_json<T: Serialize + ?Sized>(state: &T) -> Result<Option<String>, serde_json::Error> {
    let value = serde_json::to_value(state)?;
    let empty = match &value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(None);
    }
    serde_json::to_string(&value).map(Some)
}

/// What became of a `record` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Stored { id: i32 },
    Skipped { reason: String },
}

impl RecordOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, RecordOutcome::Stored { .. })
    }
}

/// Raw filter values as they arrive in a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQueryParams {
    pub operation: Option<String>,
    pub table: Option<String>,
    pub user: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl AuditQueryParams {
    /// Requested page, falling back to 1 for missing or malformed input.
    pub fn page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }

    pub fn per_page(&self, default: u64) -> u64 {
        self.per_page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(default)
    }
}

/// AND-combined audit filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub operation: Option<Operation>,
    pub table: Option<String>,
    /// Substring of the actor's name or civil id.
    pub actor: Option<String>,
    /// Calendar day (UTC) the entry was created on.
    pub day: Option<NaiveDate>,
}

impl AuditFilter {
    /// Build a filter from untrusted input. Blank values, unknown operations
    /// and dates that are not `YYYY-MM-DD` are ignored.
    pub fn from_params(params: &AuditQueryParams) -> Self {
        Self {
            operation: params.operation.as_deref().and_then(Operation::parse),
            table: non_blank(params.table.as_deref()),
            actor: non_blank(params.user.as_deref()),
            day: params
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
        }
    }

    fn apply(&self, select: Select<audit_entry::Entity>) -> Select<audit_entry::Entity> {
        let mut cond = Condition::all();

        if let Some(op) = self.operation {
            cond = cond.add(audit_entry::Column::Operation.eq(op));
        }
        if let Some(table) = &self.table {
            cond = cond.add(audit_entry::Column::TableName.eq(table.as_str()));
        }
        if let Some(actor) = &self.actor {
            cond = cond.add(
                Condition::any()
                    .add(audit_entry::Column::ActorName.contains(actor.as_str()))
                    .add(audit_entry::Column::ActorCivilId.contains(actor.as_str())),
            );
        }
        if let Some(day) = self.day {
            let (start, end) = day_bounds(day);
            cond = cond
                .add(audit_entry::Column::CreatedAt.gte(start))
                .add(audit_entry::Column::CreatedAt.lte(end));
        }

        select.filter(cond)
    }
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `[day 00:00:00, day 23:59:59]` in UTC, inclusive on both ends.
pub fn day_bounds(day: NaiveDate) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let start = day.and_time(NaiveTime::MIN).and_utc().fixed_offset();
    let end = day
        .and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| day.and_time(NaiveTime::MIN))
        .and_utc()
        .fixed_offset();
    (start, end)
}

/// One page of entries, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditPage {
    pub entries: Vec<audit_entry::Model>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl AuditPage {
    pub fn empty(page: u64, per_page: u64) -> Self {
        Self {
            entries: Vec::new(),
            page,
            per_page,
            total: 0,
            total_pages: 0,
        }
    }
}

/// Values currently present in the log, for filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub operations: Vec<Operation>,
    pub tables: Vec<String>,
    pub actors: Vec<String>,
}

/// Full view of one entry with its payloads decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntryDetail {
    pub id: i32,
    pub operation: Operation,
    pub table_name: String,
    pub record_id: Option<String>,
    pub actor: Actor,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
}

impl From<audit_entry::Model> for AuditEntryDetail {
    fn from(m: audit_entry::Model) -> Self {
        Self {
            id: m.id,
            operation: m.operation,
            table_name: m.table_name,
            record_id: m.record_id,
            actor: Actor {
                civil_id: m.actor_civil_id,
                name: m.actor_name,
                subject: m.actor_subject,
                job_title: m.actor_job_title,
            },
            description: m.description,
            ip_address: m.ip_address,
            user_agent: m.user_agent,
            created_at: m.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            old_data: decode_payload(m.old_data.as_deref()),
            new_data: decode_payload(m.new_data.as_deref()),
        }
    }
}

fn decode_payload(raw: Option<&str>) -> Option<serde_json::Value> {
    raw.and_then(|text| serde_json::from_str(text).ok())
}

#[derive(Clone)]
pub struct AuditLog {
    db: DatabaseConnection,
}

impl AuditLog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append one entry. Never fails: a storage error is logged and reported
    /// as [`RecordOutcome::Skipped`].
    pub async fn record(
        &self,
        actor: &Actor,
        meta: &RequestMeta,
        record: AuditRecord,
    ) -> RecordOutcome {
        let operation = record.operation;
        let table = record.table.clone();

        let entry = audit_entry::ActiveModel {
            id: NotSet,
            operation: Set(operation),
            table_name: Set(record.table),
            record_id: Set(record.record_id),
            actor_civil_id: Set(actor.civil_id.as_deref().map(|v| clip(v, CIVIL_ID_LEN))),
            actor_name: Set(actor.name.as_deref().map(|v| clip(v, NAME_LEN))),
            actor_subject: Set(actor.subject.as_deref().map(|v| clip(v, NAME_LEN))),
            actor_job_title: Set(actor.job_title.as_deref().map(|v| clip(v, JOB_TITLE_LEN))),
            old_data: Set(record.old_state),
            new_data: Set(record.new_state),
            description: Set(record.description),
            ip_address: Set(meta.ip_address.as_deref().map(|v| clip(v, IP_LEN))),
            user_agent: Set(meta.user_agent.clone()),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        };

        match entry.insert(&self.db).await {
            Ok(saved) => {
                tracing::debug!(id = saved.id, %operation, table = %table, "audit entry recorded");
                RecordOutcome::Stored { id: saved.id }
            }
            Err(e) => {
                tracing::warn!(%operation, table = %table, "audit entry dropped: {e}");
                RecordOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Filtered page of entries, newest first. `page` is 1-based.
    ///
    /// An unreachable store yields an empty page with a warning.
    pub async fn query(&self, filter: &AuditFilter, page: u64, per_page: u64) -> Outcome<AuditPage> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);

        match self.fetch_page(filter, page, per_page).await {
            Ok(result) => Outcome::fresh(result),
            Err(e) => {
                tracing::warn!("audit log query failed: {e}");
                Outcome::degraded(
                    AuditPage::empty(page, per_page),
                    "the audit log could not be loaded",
                )
            }
        }
    }

    async fn fetch_page(
        &self,
        filter: &AuditFilter,
        page: u64,
        per_page: u64,
    ) -> Result<AuditPage, DbErr> {
        let paginator = filter
            .apply(audit_entry::Entity::find())
            .order_by_desc(audit_entry::Column::CreatedAt)
            .order_by_desc(audit_entry::Column::Id)
            .paginate(&self.db, per_page);

        let ItemsAndPagesNumber {
            number_of_items,
            number_of_pages,
        } = paginator.num_items_and_pages().await?;
        // Pages past the end, including ones whose offset would overflow,
        // are empty without asking the store.
        let entries = match (page - 1).checked_mul(per_page) {
            Some(offset) if offset < number_of_items => paginator.fetch_page(page - 1).await?,
            _ => Vec::new(),
        };

        Ok(AuditPage {
            entries,
            page,
            per_page,
            total: number_of_items,
            total_pages: number_of_pages,
        })
    }

    /// One entry with decoded payloads, or `None` if the id is unknown.
    pub async fn get(&self, id: i32) -> Result<Option<AuditEntryDetail>, CoreError> {
        let entry = audit_entry::Entity::find_by_id(id).one(&self.db).await?;
        Ok(entry.map(AuditEntryDetail::from))
    }

    /// Distinct operations, tables and actor names present in the log.
    pub async fn filter_options(&self) -> Outcome<FilterOptions> {
        match self.load_filter_options().await {
            Ok(options) => Outcome::fresh(options),
            Err(e) => {
                tracing::warn!("audit filter options unavailable: {e}");
                Outcome::degraded(FilterOptions::default(), "filter options could not be loaded")
            }
        }
    }

    async fn load_filter_options(&self) -> Result<FilterOptions, DbErr> {
        let operations: Vec<String> = audit_entry::Entity::find()
            .select_only()
            .column(audit_entry::Column::Operation)
            .distinct()
            .order_by_asc(audit_entry::Column::Operation)
            .into_tuple()
            .all(&self.db)
            .await?;

        let tables: Vec<String> = audit_entry::Entity::find()
            .select_only()
            .column(audit_entry::Column::TableName)
            .distinct()
            .order_by_asc(audit_entry::Column::TableName)
            .into_tuple()
            .all(&self.db)
            .await?;

        let actors: Vec<Option<String>> = audit_entry::Entity::find()
            .select_only()
            .column(audit_entry::Column::ActorName)
            .distinct()
            .order_by_asc(audit_entry::Column::ActorName)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(FilterOptions {
            operations: operations.iter().filter_map(|o| Operation::parse(o)).collect(),
            tables,
            actors: actors
                .into_iter()
                .flatten()
                .filter(|name| !name.trim().is_empty())
                .collect(),
        })
    }

    /// Delete every entry and return how many were removed.
    ///
    /// The clear itself is not recorded; callers that want a trace of it
    /// record one afterwards.
    pub async fn clear_all(&self) -> Result<u64, CoreError> {
        let result = audit_entry::Entity::delete_many().exec(&self.db).await?;
        tracing::info!(deleted = result.rows_affected, "audit log cleared");
        Ok(result.rows_affected)
    }
}

/// Truncate to at most `max` characters on a char boundary.
fn clip(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
