use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use viaro_booking::{RefundRequest, RefundStatus, SupportTicket, TicketStatus};

/// CRUD for the two flat after-sales records: refund requests and support
/// tickets.
#[derive(Clone)]
pub struct SupportRepository {
    pool: PgPool,
}

impl SupportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RefundRow {
    id: Uuid,
    booking_id: Uuid,
    amount: i32,
    reason: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RefundRow> for RefundRequest {
    fn from(r: RefundRow) -> Self {
        RefundRequest {
            id: r.id,
            booking_id: r.booking_id,
            amount: r.amount,
            reason: r.reason,
            status: RefundStatus::parse(&r.status).unwrap_or(RefundStatus::Requested),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    user_id: Uuid,
    booking_id: Option<Uuid>,
    subject: String,
    body: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TicketRow> for SupportTicket {
    fn from(r: TicketRow) -> Self {
        SupportTicket {
            id: r.id,
            user_id: r.user_id,
            booking_id: r.booking_id,
            subject: r.subject,
            body: r.body,
            status: TicketStatus::parse(&r.status).unwrap_or(TicketStatus::Open),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl SupportRepository {
    pub async fn create_refund(&self, refund: &RefundRequest) -> Result<Uuid, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO refund_requests (id, booking_id, amount, reason, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(refund.id)
        .bind(refund.booking_id)
        .bind(refund.amount)
        .bind(&refund.reason)
        .bind(refund.status.as_str())
        .bind(refund.created_at)
        .bind(refund.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(refund.id)
    }

    pub async fn get_refund(&self, id: Uuid) -> Result<Option<RefundRequest>, sqlx::Error> {
        let row: Option<RefundRow> = sqlx::query_as("SELECT * FROM refund_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RefundRequest::from))
    }

    pub async fn list_refunds(
        &self,
        status: Option<RefundStatus>,
    ) -> Result<Vec<RefundRequest>, sqlx::Error> {
        let rows: Vec<RefundRow> = match status {
            Some(s) => {
                sqlx::query_as(
                    "SELECT * FROM refund_requests WHERE status = $1 ORDER BY created_at",
                )
                .bind(s.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM refund_requests ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(RefundRequest::from).collect())
    }

    pub async fn update_refund(&self, refund: &RefundRequest) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE refund_requests SET status = $1, updated_at = $2 WHERE id = $3")
                .bind(refund.status.as_str())
                .bind(refund.updated_at)
                .bind(refund.id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn create_ticket(&self, ticket: &SupportTicket) -> Result<Uuid, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO support_tickets (id, user_id, booking_id, subject, body, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.user_id)
        .bind(ticket.booking_id)
        .bind(&ticket.subject)
        .bind(&ticket.body)
        .bind(ticket.status.as_str())
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(ticket.id)
    }

    pub async fn get_ticket(&self, id: Uuid) -> Result<Option<SupportTicket>, sqlx::Error> {
        let row: Option<TicketRow> = sqlx::query_as("SELECT * FROM support_tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(SupportTicket::from))
    }

    pub async fn list_tickets(
        &self,
        status: Option<TicketStatus>,
    ) -> Result<Vec<SupportTicket>, sqlx::Error> {
        let rows: Vec<TicketRow> = match status {
            Some(s) => {
                sqlx::query_as("SELECT * FROM support_tickets WHERE status = $1 ORDER BY created_at")
                    .bind(s.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM support_tickets ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(SupportTicket::from).collect())
    }

    pub async fn update_ticket(&self, ticket: &SupportTicket) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE support_tickets SET status = $1, updated_at = $2 WHERE id = $3")
                .bind(ticket.status.as_str())
                .bind(ticket.updated_at)
                .bind(ticket.id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}
