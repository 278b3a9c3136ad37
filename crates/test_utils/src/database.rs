//! PostgreSQL containers for the adapter integration tests
//!
//! Each [`LedgerTestDatabase`] owns a throwaway `postgres:16-alpine`
//! container with the ledger migrations applied. Dropping it stops the
//! container, so tests never share books.

use domain_ledger::StandardChart;
use infra_db::{create_pool, run_migrations, DatabasePool, PoolSettings};
use infra_db::{PostgresChartStore, PostgresJournalStore, PostgresPartyAdapter};
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const POSTGRES_TAG: &str = "16-alpine";
const DATABASE: &str = "ledger_test";

/// Tables the journal writes, in dependency order
const JOURNAL_TABLES: [&str; 2] = ["vouchers", "voucher_entries"];

/// The three Postgres adapters over one pool
pub struct LedgerStores {
    pub chart: PostgresChartStore,
    pub journal: PostgresJournalStore,
    pub parties: PostgresPartyAdapter,
}

pub struct LedgerTestDatabase {
    _container: ContainerAsync<Postgres>,
    pool: DatabasePool,
}

impl LedgerTestDatabase {
    /// Starts a container and applies the schema
    pub async fn start() -> TestResult<Self> {
        let container = Postgres::default()
            .with_db_name(DATABASE)
            .with_tag(POSTGRES_TAG)
            .start()
            .await?;

        let url = format!(
            "postgres://postgres:postgres@{}:{}/{}",
            container.get_host().await?,
            container.get_host_port_ipv4(5432).await?,
            DATABASE
        );
        let settings = PoolSettings::for_url(url)
            .max_connections(5)
            .application_name("ledger-tests");
        let pool = create_pool(settings).await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Adapters over this database, with the standard chart seeded
    pub async fn ledger_stores(&self) -> TestResult<LedgerStores> {
        let chart = PostgresChartStore::new(self.pool.clone());
        chart.seed(&StandardChart::create()?).await?;

        Ok(LedgerStores {
            chart,
            journal: PostgresJournalStore::new(self.pool.clone()),
            parties: PostgresPartyAdapter::new(self.pool.clone()),
        })
    }

    /// Row count per journal table, for checking that rejected posts left nothing behind
    pub async fn journal_rows(&self) -> TestResult<Vec<(&'static str, i64)>> {
        let mut counts = Vec::with_capacity(JOURNAL_TABLES.len());
        for table in JOURNAL_TABLES {
            let (rows,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await?;
            counts.push((table, rows));
        }
        Ok(counts)
    }
}
