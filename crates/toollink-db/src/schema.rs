//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The order table is named
//! `customer_order` to stay clear of the `ORDER` keyword.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD phone ON TABLE user TYPE option<string>;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['admin', 'warehouse', 'cashier', 'customer', \
    'driver', 'editor'];
DEFINE FIELD approval_status ON TABLE user TYPE string \
    ASSERT $value IN ['Pending', 'Active', 'Rejected'];
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD email_verified ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD failed_login_attempts ON TABLE user TYPE int DEFAULT 0;
DEFINE FIELD locked_until ON TABLE user TYPE option<datetime>;
DEFINE FIELD approved_by ON TABLE user TYPE option<string>;
DEFINE FIELD approved_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD last_login_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD deleted_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;

-- =======================================================================
-- Refresh sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token_hash ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;

-- =======================================================================
-- Orders
-- =======================================================================
DEFINE TABLE customer_order SCHEMAFULL;
DEFINE FIELD order_number ON TABLE customer_order TYPE string;
DEFINE FIELD customer_id ON TABLE customer_order TYPE string;
DEFINE FIELD items ON TABLE customer_order TYPE array<object>;
DEFINE FIELD items.*.item_id ON TABLE customer_order TYPE string;
DEFINE FIELD items.*.name ON TABLE customer_order TYPE string;
DEFINE FIELD items.*.quantity ON TABLE customer_order TYPE int;
DEFINE FIELD items.*.unit_price ON TABLE customer_order TYPE float;
DEFINE FIELD items.*.subtotal ON TABLE customer_order TYPE float;
DEFINE FIELD pricing ON TABLE customer_order TYPE object;
DEFINE FIELD pricing.subtotal ON TABLE customer_order TYPE float;
DEFINE FIELD pricing.tax ON TABLE customer_order TYPE float;
DEFINE FIELD pricing.delivery_charge ON TABLE customer_order TYPE float;
DEFINE FIELD pricing.discount ON TABLE customer_order TYPE float;
DEFINE FIELD pricing.total ON TABLE customer_order TYPE float;
DEFINE FIELD status ON TABLE customer_order TYPE string \
    ASSERT $value IN ['Pending', 'Processing', 'Completed', 'Cancelled'];
DEFINE FIELD delivery ON TABLE customer_order TYPE object;
DEFINE FIELD delivery.address ON TABLE customer_order \
    TYPE option<string>;
DEFINE FIELD delivery.instructions ON TABLE customer_order \
    TYPE option<string>;
DEFINE FIELD delivery.preferred_date ON TABLE customer_order \
    TYPE option<datetime>;
DEFINE FIELD deleted_at ON TABLE customer_order TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE customer_order TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE customer_order TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_order_number ON TABLE customer_order \
    COLUMNS order_number UNIQUE;
DEFINE INDEX idx_order_customer ON TABLE customer_order \
    COLUMNS customer_id;

-- =======================================================================
-- Inventory items
-- =======================================================================
DEFINE TABLE inventory_item SCHEMAFULL;
DEFINE FIELD name ON TABLE inventory_item TYPE string;
DEFINE FIELD category ON TABLE inventory_item TYPE string;
DEFINE FIELD sku ON TABLE inventory_item TYPE string;
DEFINE FIELD description ON TABLE inventory_item TYPE option<string>;
DEFINE FIELD quantity ON TABLE inventory_item TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD unit ON TABLE inventory_item TYPE string;
DEFINE FIELD reorder_threshold ON TABLE inventory_item TYPE int;
DEFINE FIELD cost_price ON TABLE inventory_item TYPE float;
DEFINE FIELD selling_price ON TABLE inventory_item TYPE float;
DEFINE FIELD currency ON TABLE inventory_item TYPE string;
DEFINE FIELD location ON TABLE inventory_item TYPE object;
DEFINE FIELD location.warehouse ON TABLE inventory_item \
    TYPE option<string>;
DEFINE FIELD location.zone ON TABLE inventory_item TYPE option<string>;
DEFINE FIELD supplier ON TABLE inventory_item TYPE object;
DEFINE FIELD supplier.name ON TABLE inventory_item TYPE option<string>;
DEFINE FIELD supplier.phone ON TABLE inventory_item TYPE option<string>;
DEFINE FIELD supplier.email ON TABLE inventory_item TYPE option<string>;
DEFINE FIELD is_active ON TABLE inventory_item TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE inventory_item TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE inventory_item TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_inventory_sku ON TABLE inventory_item \
    COLUMNS sku UNIQUE;

-- =======================================================================
-- Activity log (append-only)
-- =======================================================================
DEFINE TABLE activity SCHEMAFULL;
DEFINE FIELD actor_id ON TABLE activity TYPE option<string>;
DEFINE FIELD action ON TABLE activity TYPE string;
DEFINE FIELD entity_type ON TABLE activity TYPE string;
DEFINE FIELD entity_id ON TABLE activity TYPE option<string>;
-- JSON-encoded entity snapshots; opaque to the query layer.
DEFINE FIELD before ON TABLE activity TYPE option<string>;
DEFINE FIELD after ON TABLE activity TYPE option<string>;
DEFINE FIELD ip_address ON TABLE activity TYPE option<string>;
DEFINE FIELD outcome ON TABLE activity TYPE string \
    ASSERT $value IN ['Success', 'Failure', 'Partial'];
DEFINE FIELD timestamp ON TABLE activity TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_activity_actor ON TABLE activity COLUMNS actor_id;

-- =======================================================================
-- Notifications
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD user_id ON TABLE notification TYPE string;
DEFINE FIELD title ON TABLE notification TYPE string;
DEFINE FIELD message ON TABLE notification TYPE string;
DEFINE FIELD status ON TABLE notification TYPE string \
    ASSERT $value IN ['Unread', 'Read'];
DEFINE FIELD read_at ON TABLE notification TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_notification_user ON TABLE notification COLUMNS user_id;

-- =======================================================================
-- Feedback
-- =======================================================================
DEFINE TABLE feedback SCHEMAFULL;
DEFINE FIELD user_id ON TABLE feedback TYPE string;
DEFINE FIELD subject ON TABLE feedback TYPE string;
DEFINE FIELD message ON TABLE feedback TYPE string;
DEFINE FIELD rating ON TABLE feedback TYPE option<int>;
DEFINE FIELD status ON TABLE feedback TYPE string \
    ASSERT $value IN ['Pending', 'Resolved'];
DEFINE FIELD resolved_by ON TABLE feedback TYPE option<string>;
DEFINE FIELD created_at ON TABLE feedback TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE feedback TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Reports
-- =======================================================================
DEFINE TABLE report SCHEMAFULL;
DEFINE FIELD requested_by ON TABLE report TYPE string;
DEFINE FIELD report_type ON TABLE report TYPE string \
    ASSERT $value IN ['Sales', 'Inventory', 'Activity'];
-- JSON-encoded request parameters and result payload.
DEFINE FIELD parameters ON TABLE report TYPE string;
DEFINE FIELD status ON TABLE report TYPE string \
    ASSERT $value IN ['Generating', 'Completed', 'Failed'];
DEFINE FIELD result ON TABLE report TYPE option<string>;
DEFINE FIELD error ON TABLE report TYPE option<string>;
DEFINE FIELD completed_at ON TABLE report TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE report TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Predictions
-- =======================================================================
DEFINE TABLE prediction SCHEMAFULL;
DEFINE FIELD item_id ON TABLE prediction TYPE string;
DEFINE FIELD window_days ON TABLE prediction TYPE int;
DEFINE FIELD predicted_quantity ON TABLE prediction TYPE int;
DEFINE FIELD confidence ON TABLE prediction TYPE float;
DEFINE FIELD created_by ON TABLE prediction TYPE string;
DEFINE FIELD created_at ON TABLE prediction TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_prediction_item ON TABLE prediction COLUMNS item_id;

-- =======================================================================
-- Settings (singleton document)
-- =======================================================================
DEFINE TABLE settings SCHEMAFULL;
DEFINE FIELD tax_rate ON TABLE settings TYPE float;
DEFINE FIELD delivery_charge ON TABLE settings TYPE float;
DEFINE FIELD currency ON TABLE settings TYPE string;
DEFINE FIELD low_stock_alerts ON TABLE settings TYPE bool;
";

/// Apply any migrations that have not been recorded yet.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("migration table DDL failed: {e}")))?;

    let mut applied = db
        .query("SELECT version, name FROM _migration ORDER BY version ASC")
        .await?;
    let applied: Vec<MigrationRecord> = applied.take(0)?;
    let latest = applied.iter().map(|m| m.version).max().unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > latest) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );

        db.query(migration.sql)
            .await?
            .check()
            .map_err(|e| DbError::Migration(format!("{} failed: {e}", migration.name)))?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Migration(format!("recording {} failed: {e}", migration.name)))?;
    }

    Ok(())
}
