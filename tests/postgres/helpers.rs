//! Shared fixtures for the embedded `PostgreSQL` tests.

use std::sync::Arc;

use atelier::task::{
    adapters::postgres::PostgresHierarchyRepository,
    domain::{
        Epic, EpicKey, Feature, FeatureKey, NewEpic, NewFeature, NewTask, NewTaskHistory, Task,
        TaskKey, TaskStatus,
    },
    ports::{
        HierarchyRepository, HierarchyRepositoryError, HierarchyRepositoryResult,
        HierarchyTransaction,
    },
    services::TaskLifecycleService,
};
use atelier::workflow::domain::WorkflowDefinition;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::{BigInt, Text};
use eyre::WrapErr;
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::fixture;
use tokio::runtime::Runtime;

/// Schema applied once to the template database.
const HIERARCHY_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-03-01-000000_create_work_hierarchy/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "atelier_test_template";

/// Service type used by the `PostgreSQL` tests.
pub type PgService = TaskLifecycleService<PostgresHierarchyRepository, DefaultClock>;

/// Per-test database dropped when the test finishes, even on panic.
struct TestDatabase {
    cluster: &'static TestCluster,
    name: String,
    url: String,
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(self.name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {err}", self.name);
        }
    }
}

/// Repository, service and runtime bound to one fresh database.
///
/// Field order matters: the pool closes its connection before the database
/// is dropped.
pub struct PgContext {
    /// Service under test.
    pub service: PgService,
    /// Repository backing the service.
    pub repository: Arc<PostgresHierarchyRepository>,
    /// Runtime driving the async port.
    pub runtime: Runtime,
    database: TestDatabase,
}

impl PgContext {
    /// Runs `work` in one repository transaction and waits for it.
    ///
    /// # Errors
    ///
    /// Returns whatever the transaction returns.
    pub fn run<T, F>(&self, work: F) -> HierarchyRepositoryResult<T>
    where
        F: FnOnce(&mut dyn HierarchyTransaction) -> HierarchyRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.runtime.block_on(self.repository.transaction(work))
    }

    /// Opens a raw connection for assertions the port does not expose.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn connect(&self) -> eyre::Result<PgConnection> {
        PgConnection::establish(&self.database.url).wrap_err("connect to test database")
    }
}

/// Provides a context over a database cloned from the migrated template.
///
/// # Errors
///
/// Returns an error if the template, database, pool or runtime cannot be set
/// up.
#[fixture]
pub fn pg_context(shared_test_cluster: &'static TestCluster) -> eyre::Result<PgContext> {
    let cluster = shared_test_cluster;
    ensure_template(cluster)?;

    let name = format!("atelier_test_{}", uuid::Uuid::new_v4().simple());
    cluster
        .create_database_from_template(name.as_str(), TEMPLATE_DB)
        .map_err(|err| eyre::eyre!("create database {name}: {err}"))?;
    let database = TestDatabase {
        cluster,
        url: cluster.connection().database_url(&name),
        name,
    };

    // One connection, so a follow-up transaction waits for any in flight.
    let pool = Pool::builder()
        .max_size(1)
        .build(ConnectionManager::<PgConnection>::new(database.url.clone()))
        .wrap_err("build connection pool")?;
    let repository = Arc::new(PostgresHierarchyRepository::new(pool));
    let service = TaskLifecycleService::new(
        Arc::clone(&repository),
        Arc::new(WorkflowDefinition::builtin()),
        Arc::new(DefaultClock),
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .wrap_err("build test runtime")?;

    Ok(PgContext {
        service,
        repository,
        runtime,
        database,
    })
}

fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|err| eyre::eyre!("{err}"))?;
            conn.batch_execute(HIERARCHY_SCHEMA_SQL)
                .map_err(|err| eyre::eyre!("apply hierarchy schema: {err}"))?;
            Ok(())
        })
        .map_err(|err| eyre::eyre!("prepare template database: {err}"))
}

#[derive(QueryableByName)]
struct RowCount {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Counts the rows of `table`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_rows(conn: &mut PgConnection, table: &str) -> eyre::Result<i64> {
    let row = diesel::sql_query(format!("SELECT COUNT(*) AS count FROM {table}"))
        .get_result::<RowCount>(conn)
        .wrap_err_with(|| format!("count rows in {table}"))?;
    Ok(row.count)
}

/// Overwrites the stored prerequisite column of a task.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn overwrite_depends_on(conn: &mut PgConnection, task: &str, raw: &str) -> eyre::Result<()> {
    diesel::sql_query("UPDATE tasks SET depends_on = $1 WHERE key = $2")
        .bind::<Text, _>(raw)
        .bind::<Text, _>(task)
        .execute(conn)
        .wrap_err("overwrite depends_on")?;
    Ok(())
}

/// Fixed timestamp with whole seconds, so it survives the round trip.
#[must_use]
pub fn at() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

/// Parses a task key.
///
/// # Errors
///
/// Returns an error if the key is blank or contains whitespace.
pub fn task_key(value: &str) -> eyre::Result<TaskKey> {
    TaskKey::new(value).wrap_err_with(|| format!("parse task key {value}"))
}

/// Parses a feature key.
///
/// # Errors
///
/// Returns an error if the key is blank or contains whitespace.
pub fn feature_key(value: &str) -> eyre::Result<FeatureKey> {
    FeatureKey::new(value).wrap_err_with(|| format!("parse feature key {value}"))
}

/// Parses an epic key.
///
/// # Errors
///
/// Returns an error if the key is blank or contains whitespace.
pub fn epic_key(value: &str) -> eyre::Result<EpicKey> {
    EpicKey::new(value).wrap_err_with(|| format!("parse epic key {value}"))
}

/// Returns the built-in initial status.
#[must_use]
pub fn todo() -> TaskStatus {
    TaskStatus::from_persisted("todo".to_owned())
}

/// Rows inserted by [`seed`].
pub struct Seeded {
    /// Epic `E01`.
    pub epic: Epic,
    /// Feature `E01-F01`.
    pub feature: Feature,
    /// Task `T1`, with its creation history row.
    pub task: Task,
}

/// Inserts epic `E01`, feature `E01-F01` and task `T1` directly through the
/// port.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub fn seed(ctx: &PgContext) -> eyre::Result<Seeded> {
    let epic = NewEpic::new(epic_key("E01")?, "Platform", at())?;
    let feature_key = feature_key("E01-F01")?;
    let task_key = task_key("T1")?;
    let seeded = ctx.run(move |tx| {
        let stored_epic = tx.insert_epic(epic)?;
        let feature = NewFeature::new(stored_epic.id(), feature_key, "Login", at())
            .map_err(HierarchyRepositoryError::persistence)?;
        let stored_feature = tx.insert_feature(feature)?;
        let task = NewTask::new(stored_feature.id(), task_key, "Schema", todo(), at())
            .map_err(HierarchyRepositoryError::persistence)?;
        let stored_task = tx.insert_task(task)?;
        tx.append_history(NewTaskHistory::creation(stored_task.id(), todo(), None, at()))?;
        Ok(Seeded {
            epic: stored_epic,
            feature: stored_feature,
            task: stored_task,
        })
    })?;
    Ok(seeded)
}
