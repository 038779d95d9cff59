use async_trait::async_trait;
use mobc::{Manager, Pool};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::config::MatchStrategy;
use crate::models::{normalize_name, Lead, Result};

pub type DbPool = Pool<SqliteManager>;

pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl Manager for SqliteManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        debug!("🔌 Opening database: {}", self.db_path);
        let conn = Connection::open(&self.db_path)?;

        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=memory;",
        )?;

        init_schema(&conn)?;
        Ok(conn)
    }

    async fn check(&self, conn: Self::Connection) -> std::result::Result<Self::Connection, Self::Error> {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(conn)
    }
}

fn init_schema(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            normalized_name TEXT NOT NULL,
            sector TEXT NOT NULL,
            address TEXT NOT NULL,
            city TEXT NOT NULL,
            normalized_city TEXT NOT NULL,
            postal_code TEXT,
            website TEXT,
            phone TEXT,
            emails_json TEXT NOT NULL,
            contact_name TEXT,
            contact_role TEXT,
            socials_json TEXT NOT NULL,
            registration_id TEXT,
            quality_score INTEGER NOT NULL,
            email_status TEXT NOT NULL,
            collected_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_leads_normalized_name ON leads(normalized_name);
        CREATE INDEX IF NOT EXISTS idx_leads_city ON leads(normalized_city);
        "#,
    )
}

pub async fn create_db_pool(db_path: &str) -> Result<DbPool> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let manager = SqliteManager::new(db_path.to_string());
    let pool = Pool::builder().max_open(8).build(manager);

    // Force one connection now so schema problems surface at startup
    // instead of mid-run.
    let _conn = pool.get().await?;
    info!("💾 Lead store ready at {}", db_path);
    Ok(pool)
}

/// Persistent deduplication authority shared by all harvest workers.
/// `exists` then `record` is deliberately not transactional: two
/// workers racing on the same business may both insert, which is an
/// accepted data-quality gap rather than a correctness bug.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn exists(&self, name: &str, locality: &str) -> Result<bool>;
    /// Append-only; recorded rows are never mutated or deleted.
    async fn record(&self, lead: &Lead) -> Result<()>;
}

pub struct SqliteLeadStore {
    pool: DbPool,
    strategy: MatchStrategy,
}

impl SqliteLeadStore {
    pub fn new(pool: DbPool, strategy: MatchStrategy) -> Self {
        Self { pool, strategy }
    }

    pub async fn count(&self) -> Result<i64> {
        let conn = self.pool.get().await?;
        let count = conn.query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        Ok(count)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Lead>> {
        let conn = self.pool.get().await?;
        let mut stmt = conn.prepare(
            "SELECT id, name, sector, address, city, postal_code, website, phone,
                    emails_json, contact_name, contact_role, socials_json,
                    registration_id, quality_score, email_status, collected_at
             FROM leads ORDER BY collected_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_lead)?;
        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }
}

fn row_to_lead(row: &rusqlite::Row<'_>) -> std::result::Result<Lead, rusqlite::Error> {
    let id: String = row.get(0)?;
    let emails_json: String = row.get(8)?;
    let socials_json: String = row.get(11)?;
    let email_status: String = row.get(14)?;
    let collected_at: String = row.get(15)?;

    Ok(Lead {
        id: id.parse().unwrap_or_else(|_| uuid::Uuid::new_v4()),
        name: row.get(1)?,
        sector: row.get(2)?,
        address: row.get(3)?,
        city: row.get(4)?,
        postal_code: row.get(5)?,
        website: row.get(6)?,
        phone: row.get(7)?,
        emails: serde_json::from_str(&emails_json).unwrap_or_default(),
        contact_name: row.get(9)?,
        contact_role: row.get(10)?,
        socials: serde_json::from_str(&socials_json).unwrap_or_default(),
        registration_id: row.get(12)?,
        quality_score: row.get::<_, i64>(13)?.clamp(0, 100) as u8,
        email_status: serde_json::from_str(&format!("\"{}\"", email_status))
            .unwrap_or(crate::models::EmailStatus::Unknown),
        collected_at: collected_at
            .parse()
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}

#[async_trait]
impl LeadStore for SqliteLeadStore {
    async fn exists(&self, name: &str, locality: &str) -> Result<bool> {
        let normalized_name = normalize_name(name);
        let normalized_city = normalize_name(locality);
        let conn = self.pool.get().await?;

        let count: i64 = match self.strategy {
            // Two-way substring match on both fields: "Acme" blocks
            // "Acme Consulting" and the other way around. Permissive
            // on purpose, to soak up punctuation/suffix variants.
            MatchStrategy::Contains => conn.query_row(
                "SELECT COUNT(*) FROM leads
                 WHERE (instr(normalized_name, ?1) > 0 OR instr(?1, normalized_name) > 0)
                   AND (instr(normalized_city, ?2) > 0 OR instr(?2, normalized_city) > 0)",
                params![normalized_name, normalized_city],
                |row| row.get(0),
            )?,
            MatchStrategy::Exact => conn.query_row(
                "SELECT COUNT(*) FROM leads
                 WHERE normalized_name = ?1 AND normalized_city = ?2",
                params![normalized_name, normalized_city],
                |row| row.get(0),
            )?,
        };
        Ok(count > 0)
    }

    async fn record(&self, lead: &Lead) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute(
            "INSERT INTO leads (
                id, name, normalized_name, sector, address, city, normalized_city,
                postal_code, website, phone, emails_json, contact_name, contact_role,
                socials_json, registration_id, quality_score, email_status, collected_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                lead.id.to_string(),
                lead.name,
                normalize_name(&lead.name),
                lead.sector,
                lead.address,
                lead.city,
                normalize_name(&lead.city),
                lead.postal_code,
                lead.website,
                lead.phone,
                serde_json::to_string(&lead.emails)?,
                lead.contact_name,
                lead.contact_role,
                serde_json::to_string(&lead.socials)?,
                lead.registration_id,
                lead.quality_score as i64,
                lead.email_status.to_string(),
                lead.collected_at.to_rfc3339(),
            ],
        )?;
        debug!("💾 Recorded lead '{}' ({})", lead.name, lead.id);
        Ok(())
    }
}
