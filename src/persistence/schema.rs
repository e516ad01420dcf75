use sqlx::PgPool;

/// Initialize PostgreSQL schema for accounts and the transfer ledger
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing PostgreSQL schema...");

    for ddl in [
        CREATE_ACCOUNTS_TABLE,
        CREATE_TRANSFERS_TABLE,
        CREATE_TRANSFERS_SENDER_INDEX,
        CREATE_TRANSFERS_RECEIVER_INDEX,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }

    tracing::info!("PostgreSQL schema ready");
    Ok(())
}

pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id BIGINT PRIMARY KEY,
    balance NUMERIC(20, 4) NOT NULL DEFAULT 0 CHECK (balance >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Append-only ledger. Rows are inserted once and never updated.
pub const CREATE_TRANSFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfers (
    id TEXT PRIMARY KEY,
    sender_id BIGINT NOT NULL REFERENCES accounts (id),
    receiver_id BIGINT NOT NULL REFERENCES accounts (id),
    amount NUMERIC(20, 4) NOT NULL CHECK (amount > 0),
    commission_rate NUMERIC(9, 6) NOT NULL,
    commission_fee NUMERIC(20, 4) NOT NULL,
    total_debit NUMERIC(20, 4) NOT NULL,
    sender_balance_before NUMERIC(20, 4) NOT NULL,
    sender_balance_after NUMERIC(20, 4) NOT NULL,
    receiver_balance_before NUMERIC(20, 4) NOT NULL,
    receiver_balance_after NUMERIC(20, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)
"#;

pub const CREATE_TRANSFERS_SENDER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS transfers_sender_created_idx
    ON transfers (sender_id, created_at DESC)
"#;

pub const CREATE_TRANSFERS_RECEIVER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS transfers_receiver_created_idx
    ON transfers (receiver_id, created_at DESC)
"#;
