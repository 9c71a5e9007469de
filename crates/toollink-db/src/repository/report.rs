//! SurrealDB implementation of [`ReportRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use toollink_core::error::ToolLinkResult;
use toollink_core::models::report::{CreateReport, Report, ReportStatus, ReportType};
use toollink_core::repository::{PaginatedResult, Pagination, ReportRepository};
use uuid::Uuid;

use crate::error::DbError;

fn type_to_string(report_type: ReportType) -> &'static str {
    match report_type {
        ReportType::Sales => "Sales",
        ReportType::Inventory => "Inventory",
        ReportType::Activity => "Activity",
    }
}

fn parse_type(s: &str) -> Result<ReportType, DbError> {
    match s {
        "Sales" => Ok(ReportType::Sales),
        "Inventory" => Ok(ReportType::Inventory),
        "Activity" => Ok(ReportType::Activity),
        other => Err(DbError::Decode(format!("unknown report type: {other}"))),
    }
}

fn parse_status(s: &str) -> Result<ReportStatus, DbError> {
    match s {
        "Generating" => Ok(ReportStatus::Generating),
        "Completed" => Ok(ReportStatus::Completed),
        "Failed" => Ok(ReportStatus::Failed),
        other => Err(DbError::Decode(format!("unknown report status: {other}"))),
    }
}

#[derive(Debug, SurrealValue)]
struct ReportRow {
    requested_by: String,
    report_type: String,
    parameters: String,
    status: String,
    result: Option<String>,
    error: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ReportRowWithId {
    record_id: String,
    requested_by: String,
    report_type: String,
    parameters: String,
    status: String,
    result: Option<String>,
    error: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

fn assemble(
    id: Uuid,
    requested_by: String,
    report_type: String,
    parameters: String,
    status: String,
    result: Option<String>,
    error: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> Result<Report, DbError> {
    Ok(Report {
        id,
        requested_by: Uuid::parse_str(&requested_by)
            .map_err(|e| DbError::Decode(format!("invalid requester UUID: {e}")))?,
        report_type: parse_type(&report_type)?,
        parameters: serde_json::from_str(&parameters)
            .map_err(|e| DbError::Decode(format!("malformed report parameters: {e}")))?,
        status: parse_status(&status)?,
        result: result
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| DbError::Decode(format!("malformed report result: {e}")))?,
        error,
        completed_at,
        created_at,
    })
}

impl ReportRow {
    fn into_report(self, id: Uuid) -> Result<Report, DbError> {
        assemble(
            id,
            self.requested_by,
            self.report_type,
            self.parameters,
            self.status,
            self.result,
            self.error,
            self.completed_at,
            self.created_at,
        )
    }
}

impl ReportRowWithId {
    fn try_into_report(self) -> Result<Report, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        assemble(
            id,
            self.requested_by,
            self.report_type,
            self.parameters,
            self.status,
            self.result,
            self.error,
            self.completed_at,
            self.created_at,
        )
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Report repository.
#[derive(Clone)]
pub struct SurrealReportRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReportRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ReportRepository for SurrealReportRepository<C> {
    async fn create(&self, input: CreateReport) -> ToolLinkResult<Report> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let parameters = serde_json::to_string(&input.parameters)
            .map_err(|e| DbError::Decode(format!("unencodable report parameters: {e}")))?;

        let mut result = self
            .db
            .query(
                "CREATE type::record('report', $id) SET \
                 requested_by = $requested_by, \
                 report_type = $report_type, \
                 parameters = $parameters, status = 'Generating'",
            )
            .bind(("id", id_str.clone()))
            .bind(("requested_by", input.requested_by.to_string()))
            .bind(("report_type", type_to_string(input.report_type)))
            .bind(("parameters", parameters))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReportRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "report".into(),
            id: id_str,
        })?;

        Ok(row.into_report(id)?)
    }

    async fn complete(&self, id: Uuid, result: serde_json::Value) -> ToolLinkResult<Report> {
        let id_str = id.to_string();
        let payload = serde_json::to_string(&result)
            .map_err(|e| DbError::Decode(format!("unencodable report result: {e}")))?;

        let mut response = self
            .db
            .query(
                "UPDATE type::record('report', $id) SET \
                 status = 'Completed', result = $result, \
                 completed_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("result", payload))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReportRow> = response.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "report".into(),
            id: id_str,
        })?;

        Ok(row.into_report(id)?)
    }

    async fn fail(&self, id: Uuid, error: String) -> ToolLinkResult<Report> {
        let id_str = id.to_string();

        let mut response = self
            .db
            .query(
                "UPDATE type::record('report', $id) SET \
                 status = 'Failed', error = $error, \
                 completed_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("error", error))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReportRow> = response.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "report".into(),
            id: id_str,
        })?;

        Ok(row.into_report(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ToolLinkResult<Report> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('report', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReportRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "report".into(),
            id: id_str,
        })?;

        Ok(row.into_report(id)?)
    }

    async fn list(&self, pagination: Pagination) -> ToolLinkResult<PaginatedResult<Report>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM report GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM report \
                 ORDER BY created_at DESC LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReportRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_report())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }
}
