//! PostgreSQL store
//!
//! Implements every storage port from `fueleu-core`. Read-check-write
//! sequences run in one transaction with the rows they depend on locked.

use crate::config::DatabaseConfig;
use crate::errors::{Result, StorageResultExt};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fueleu_core::intensity::{adjusted_cb, debit_banked, surplus_to_bank};
use fueleu_core::{
    BankEntry, BankStore, ComplianceBalance, ComplianceStore, Error, Pool, PoolMember, PoolStore,
    Route, RouteStore,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const ROUTE_COLUMNS: &str = "id, route_id, vessel_type, fuel_type, year, ghg_intensity, \
     fuel_consumption, distance, total_emissions, is_baseline";

#[derive(Debug, FromRow)]
struct RouteRow {
    id: Uuid,
    route_id: String,
    vessel_type: String,
    fuel_type: String,
    year: i32,
    ghg_intensity: Decimal,
    fuel_consumption: Decimal,
    distance: Decimal,
    total_emissions: Decimal,
    is_baseline: bool,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: row.id,
            route_id: row.route_id,
            vessel_type: row.vessel_type,
            fuel_type: row.fuel_type,
            year: row.year,
            ghg_intensity: row.ghg_intensity,
            fuel_consumption: row.fuel_consumption,
            distance: row.distance,
            total_emissions: row.total_emissions,
            is_baseline: row.is_baseline,
        }
    }
}

#[derive(Debug, FromRow)]
struct ComplianceRow {
    id: Uuid,
    ship_id: String,
    year: i32,
    cb_gco2_eq: Decimal,
}

impl From<ComplianceRow> for ComplianceBalance {
    fn from(row: ComplianceRow) -> Self {
        ComplianceBalance {
            id: row.id,
            ship_id: row.ship_id,
            year: row.year,
            cb_gco2_eq: row.cb_gco2_eq,
        }
    }
}

#[derive(Debug, FromRow)]
struct BankRow {
    id: Uuid,
    ship_id: String,
    year: i32,
    amount_gco2_eq: Decimal,
}

impl From<BankRow> for BankEntry {
    fn from(row: BankRow) -> Self {
        BankEntry {
            id: row.id,
            ship_id: row.ship_id,
            year: row.year,
            amount_gco2_eq: row.amount_gco2_eq,
        }
    }
}

#[derive(Debug, FromRow)]
struct PoolMemberRow {
    ship_id: String,
    cb_before: Decimal,
    cb_after: Decimal,
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        info!("Database connection pool created successfully");
        Ok(PgStore { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RouteStore for PgStore {
    async fn list_routes(&self) -> fueleu_core::Result<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes ORDER BY route_id",
            ROUTE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .storage()?;

        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn find_route(&self, route_id: &str) -> fueleu_core::Result<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes WHERE route_id = $1",
            ROUTE_COLUMNS
        ))
        .bind(route_id)
        .fetch_optional(&self.pool)
        .await
        .storage()?;

        Ok(row.map(Route::from))
    }

    async fn find_baseline(&self) -> fueleu_core::Result<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes WHERE is_baseline LIMIT 1",
            ROUTE_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .storage()?;

        Ok(row.map(Route::from))
    }

    async fn set_baseline(&self, route_id: &str) -> fueleu_core::Result<Route> {
        let mut tx = self.pool.begin().await.storage()?;

        // Lock the target and the current baseline before touching either
        let locked: Vec<(String,)> = sqlx::query_as(
            "SELECT route_id FROM routes WHERE route_id = $1 OR is_baseline FOR UPDATE",
        )
        .bind(route_id)
        .fetch_all(&mut *tx)
        .await
        .storage()?;

        if !locked.iter().any(|(id,)| id == route_id) {
            return Err(Error::RouteNotFound(route_id.to_string()));
        }

        sqlx::query("UPDATE routes SET is_baseline = FALSE WHERE is_baseline AND route_id <> $1")
            .bind(route_id)
            .execute(&mut *tx)
            .await
            .storage()?;

        let row = sqlx::query_as::<_, RouteRow>(&format!(
            "UPDATE routes SET is_baseline = TRUE WHERE route_id = $1 RETURNING {}",
            ROUTE_COLUMNS
        ))
        .bind(route_id)
        .fetch_one(&mut *tx)
        .await
        .storage()?;

        tx.commit().await.storage()?;
        Ok(row.into())
    }
}

#[async_trait]
impl ComplianceStore for PgStore {
    async fn find_compliance(
        &self,
        ship_id: &str,
        year: i32,
    ) -> fueleu_core::Result<Option<ComplianceBalance>> {
        let row = sqlx::query_as::<_, ComplianceRow>(
            r#"
            SELECT id, ship_id, year, cb_gco2_eq
            FROM ship_compliance
            WHERE ship_id = $1 AND year = $2
            "#,
        )
        .bind(ship_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .storage()?;

        Ok(row.map(ComplianceBalance::from))
    }

    async fn save_compliance(
        &self,
        balance: &ComplianceBalance,
    ) -> fueleu_core::Result<ComplianceBalance> {
        let row = sqlx::query_as::<_, ComplianceRow>(
            r#"
            INSERT INTO ship_compliance (id, ship_id, year, cb_gco2_eq)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (ship_id, year)
            DO UPDATE SET cb_gco2_eq = EXCLUDED.cb_gco2_eq
            RETURNING id, ship_id, year, cb_gco2_eq
            "#,
        )
        .bind(balance.id)
        .bind(&balance.ship_id)
        .bind(balance.year)
        .bind(balance.cb_gco2_eq)
        .fetch_one(&self.pool)
        .await
        .storage()?;

        Ok(row.into())
    }
}

#[async_trait]
impl BankStore for PgStore {
    async fn find_bank_entry(&self, ship_id: &str, year: i32) -> fueleu_core::Result<Option<BankEntry>> {
        let row = sqlx::query_as::<_, BankRow>(
            r#"
            SELECT id, ship_id, year, amount_gco2_eq
            FROM bank_entries
            WHERE ship_id = $1 AND year = $2
            "#,
        )
        .bind(ship_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .storage()?;

        Ok(row.map(BankEntry::from))
    }

    async fn bank_surplus(&self, ship_id: &str, year: i32) -> fueleu_core::Result<BankEntry> {
        let mut tx = self.pool.begin().await.storage()?;

        let compliance = sqlx::query_as::<_, ComplianceRow>(
            r#"
            SELECT id, ship_id, year, cb_gco2_eq
            FROM ship_compliance
            WHERE ship_id = $1 AND year = $2
            FOR SHARE
            "#,
        )
        .bind(ship_id)
        .bind(year)
        .fetch_optional(&mut *tx)
        .await
        .storage()?
        .map(ComplianceBalance::from);

        let surplus = surplus_to_bank(compliance.as_ref(), ship_id, year)?;

        let row = sqlx::query_as::<_, BankRow>(
            r#"
            INSERT INTO bank_entries (id, ship_id, year, amount_gco2_eq)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (ship_id, year)
            DO UPDATE SET amount_gco2_eq = EXCLUDED.amount_gco2_eq
            RETURNING id, ship_id, year, amount_gco2_eq
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ship_id)
        .bind(year)
        .bind(surplus)
        .fetch_one(&mut *tx)
        .await
        .storage()?;

        tx.commit().await.storage()?;
        Ok(row.into())
    }

    async fn apply_banked(
        &self,
        ship_id: &str,
        year: i32,
        amount: Decimal,
    ) -> fueleu_core::Result<BankEntry> {
        let mut tx = self.pool.begin().await.storage()?;

        let current = sqlx::query_as::<_, BankRow>(
            r#"
            SELECT id, ship_id, year, amount_gco2_eq
            FROM bank_entries
            WHERE ship_id = $1 AND year = $2
            FOR UPDATE
            "#,
        )
        .bind(ship_id)
        .bind(year)
        .fetch_optional(&mut *tx)
        .await
        .storage()?;

        let remaining = debit_banked(current.as_ref().map(|row| row.amount_gco2_eq), amount)?;
        let current = current.ok_or(Error::InsufficientBanked {
            available: Decimal::ZERO,
            requested: amount,
        })?;

        let row = sqlx::query_as::<_, BankRow>(
            r#"
            UPDATE bank_entries
            SET amount_gco2_eq = $2
            WHERE id = $1
            RETURNING id, ship_id, year, amount_gco2_eq
            "#,
        )
        .bind(current.id)
        .bind(remaining)
        .fetch_one(&mut *tx)
        .await
        .storage()?;

        tx.commit().await.storage()?;
        Ok(row.into())
    }
}

#[async_trait]
impl PoolStore for PgStore {
    async fn create_pool(&self, year: i32, ship_ids: &[String]) -> fueleu_core::Result<Pool> {
        let mut tx = self.pool.begin().await.storage()?;

        // One snapshot for every member read
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .storage()?;

        let mut members = Vec::with_capacity(ship_ids.len());
        for ship_id in ship_ids {
            let balances: Option<(Decimal, Option<Decimal>)> = sqlx::query_as(
                r#"
                SELECT c.cb_gco2_eq, b.amount_gco2_eq
                FROM ship_compliance c
                LEFT JOIN bank_entries b ON b.ship_id = c.ship_id AND b.year = c.year
                WHERE c.ship_id = $1 AND c.year = $2
                "#,
            )
            .bind(ship_id)
            .bind(year)
            .fetch_optional(&mut *tx)
            .await
            .storage()?;

            let cb = match balances {
                Some((cb, banked)) => adjusted_cb(Some(cb), banked),
                None => adjusted_cb(None, None),
            };
            members.push(PoolMember::snapshot(ship_id.clone(), cb));
        }

        let pool = Pool::new(year, members);

        sqlx::query("INSERT INTO pools (id, year, created_at) VALUES ($1, $2, $3)")
            .bind(pool.id)
            .bind(pool.year)
            .bind(pool.created_at)
            .execute(&mut *tx)
            .await
            .storage()?;

        for (position, member) in pool.members.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO pool_members (
                    id, pool_id, position, ship_id, year, cb_before, cb_after
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(pool.id)
            .bind(position as i32)
            .bind(&member.ship_id)
            .bind(pool.year)
            .bind(member.cb_before)
            .bind(member.cb_after)
            .execute(&mut *tx)
            .await
            .storage()?;
        }

        tx.commit().await.storage()?;
        Ok(pool)
    }

    async fn find_pool(&self, id: Uuid) -> fueleu_core::Result<Option<Pool>> {
        let header: Option<(Uuid, i32, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, year, created_at FROM pools WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .storage()?;

        let Some((id, year, created_at)) = header else {
            return Ok(None);
        };

        let members = sqlx::query_as::<_, PoolMemberRow>(
            r#"
            SELECT ship_id, cb_before, cb_after
            FROM pool_members
            WHERE pool_id = $1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .storage()?;

        Ok(Some(Pool {
            id,
            year,
            created_at,
            members: members
                .into_iter()
                .map(|row| PoolMember {
                    ship_id: row.ship_id,
                    cb_before: row.cb_before,
                    cb_after: row.cb_after,
                })
                .collect(),
        }))
    }
}
