//! `PostgreSQL` repository implementation for the work hierarchy.

use super::{
    models::{
        EpicChanges, EpicRow, FeatureChanges, FeatureRow, NewEpicRow, NewFeatureRow,
        NewTaskHistoryRow, NewTaskRow, TaskChanges, TaskHistoryRow, TaskRow,
    },
    schema::{epics, features, task_history, tasks},
};
use crate::task::{
    domain::{
        ContainerStatus, DependencyList, Epic, EpicId, EpicKey, ExecutionOrder, Feature,
        FeatureId, FeatureKey, HistoryId, NewEpic, NewFeature, NewTask, NewTaskHistory,
        PersistedEpicData, PersistedFeatureData, PersistedTaskData, Revision, Task, TaskHistory,
        TaskId, TaskKey, TaskStatus,
    },
    ports::{
        HierarchyRepository, HierarchyRepositoryError, HierarchyRepositoryResult,
        HierarchyTransaction,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// `PostgreSQL` connection pool type used by hierarchy adapters.
pub type HierarchyPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed hierarchy repository.
#[derive(Debug, Clone)]
pub struct PostgresHierarchyRepository {
    pool: HierarchyPgPool,
}

impl PostgresHierarchyRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: HierarchyPgPool) -> Self {
        Self { pool }
    }
}

/// Separates the closure's own error from database failures so that the
/// caller's error type comes back unchanged after rollback.
enum TxError<E> {
    Work(E),
    Abandoned,
    Diesel(DieselError),
}

/// Raises the shared flag when the awaiting future is dropped before the
/// blocking transaction reports back.
struct AbandonOnDrop {
    abandoned: Arc<AtomicBool>,
    armed: bool,
}

impl AbandonOnDrop {
    const fn new(abandoned: Arc<AtomicBool>) -> Self {
        Self {
            abandoned,
            armed: true,
        }
    }

    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.abandoned.store(true, Ordering::SeqCst);
        }
    }
}

impl<E> From<DieselError> for TxError<E> {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

#[async_trait]
impl HierarchyRepository for PostgresHierarchyRepository {
    async fn transaction<F, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn HierarchyTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<HierarchyRepositoryError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let abandoned = Arc::new(AtomicBool::new(false));
        let mut guard = AbandonOnDrop::new(Arc::clone(&abandoned));
        let outcome = tokio::task::spawn_blocking(move || {
            let mut pooled = pool
                .get()
                .map_err(|err| E::from(HierarchyRepositoryError::persistence(err)))?;
            let connection: &mut PgConnection = &mut pooled;
            connection
                .transaction::<T, TxError<E>, _>(|conn| {
                    let mut tx = PgHierarchyTransaction { connection: conn };
                    let value = work(&mut tx).map_err(TxError::Work)?;
                    if abandoned.load(Ordering::SeqCst) {
                        return Err(TxError::Abandoned);
                    }
                    Ok(value)
                })
                .map_err(|err| match err {
                    TxError::Work(inner) => inner,
                    TxError::Abandoned => {
                        warn!("caller dropped the transaction future; rolled back");
                        E::from(HierarchyRepositoryError::Abandoned)
                    }
                    TxError::Diesel(inner) => E::from(HierarchyRepositoryError::persistence(inner)),
                })
        })
        .await;
        guard.disarm();
        outcome.map_err(|err| E::from(HierarchyRepositoryError::persistence(err)))?
    }
}

struct PgHierarchyTransaction<'c> {
    connection: &'c mut PgConnection,
}

impl HierarchyTransaction for PgHierarchyTransaction<'_> {
    fn epic(&mut self, id: EpicId) -> HierarchyRepositoryResult<Option<Epic>> {
        epics::table
            .filter(epics::id.eq(id.value()))
            .select(EpicRow::as_select())
            .first::<EpicRow>(self.connection)
            .optional()
            .map_err(HierarchyRepositoryError::persistence)?
            .map(row_to_epic)
            .transpose()
    }

    fn epic_by_key(&mut self, key: &EpicKey) -> HierarchyRepositoryResult<Option<Epic>> {
        epics::table
            .filter(epics::key.eq(key.as_str()))
            .select(EpicRow::as_select())
            .first::<EpicRow>(self.connection)
            .optional()
            .map_err(HierarchyRepositoryError::persistence)?
            .map(row_to_epic)
            .transpose()
    }

    fn all_epics(&mut self) -> HierarchyRepositoryResult<Vec<Epic>> {
        epics::table
            .order(epics::id.asc())
            .select(EpicRow::as_select())
            .load::<EpicRow>(self.connection)
            .map_err(HierarchyRepositoryError::persistence)?
            .into_iter()
            .map(row_to_epic)
            .collect()
    }

    fn feature(&mut self, id: FeatureId) -> HierarchyRepositoryResult<Option<Feature>> {
        features::table
            .filter(features::id.eq(id.value()))
            .select(FeatureRow::as_select())
            .first::<FeatureRow>(self.connection)
            .optional()
            .map_err(HierarchyRepositoryError::persistence)?
            .map(row_to_feature)
            .transpose()
    }

    fn feature_by_key(&mut self, key: &FeatureKey) -> HierarchyRepositoryResult<Option<Feature>> {
        features::table
            .filter(features::key.eq(key.as_str()))
            .select(FeatureRow::as_select())
            .first::<FeatureRow>(self.connection)
            .optional()
            .map_err(HierarchyRepositoryError::persistence)?
            .map(row_to_feature)
            .transpose()
    }

    fn features_in_epic(&mut self, epic_id: EpicId) -> HierarchyRepositoryResult<Vec<Feature>> {
        features::table
            .filter(features::epic_id.eq(epic_id.value()))
            .order(features::id.asc())
            .select(FeatureRow::as_select())
            .load::<FeatureRow>(self.connection)
            .map_err(HierarchyRepositoryError::persistence)?
            .into_iter()
            .map(row_to_feature)
            .collect()
    }

    fn task(&mut self, id: TaskId) -> HierarchyRepositoryResult<Option<Task>> {
        tasks::table
            .filter(tasks::id.eq(id.value()))
            .select(TaskRow::as_select())
            .first::<TaskRow>(self.connection)
            .optional()
            .map_err(HierarchyRepositoryError::persistence)?
            .map(row_to_task)
            .transpose()
    }

    fn task_by_key(&mut self, key: &TaskKey) -> HierarchyRepositoryResult<Option<Task>> {
        tasks::table
            .filter(tasks::key.eq(key.as_str()))
            .select(TaskRow::as_select())
            .first::<TaskRow>(self.connection)
            .optional()
            .map_err(HierarchyRepositoryError::persistence)?
            .map(row_to_task)
            .transpose()
    }

    fn tasks_in_feature(&mut self, feature_id: FeatureId) -> HierarchyRepositoryResult<Vec<Task>> {
        tasks::table
            .filter(tasks::feature_id.eq(feature_id.value()))
            .order(tasks::id.asc())
            .select(TaskRow::as_select())
            .load::<TaskRow>(self.connection)
            .map_err(HierarchyRepositoryError::persistence)?
            .into_iter()
            .map(row_to_task)
            .collect()
    }

    fn all_tasks(&mut self) -> HierarchyRepositoryResult<Vec<Task>> {
        tasks::table
            .order(tasks::id.asc())
            .select(TaskRow::as_select())
            .load::<TaskRow>(self.connection)
            .map_err(HierarchyRepositoryError::persistence)?
            .into_iter()
            .map(row_to_task)
            .collect()
    }

    fn history_for_task(&mut self, task_id: TaskId) -> HierarchyRepositoryResult<Vec<TaskHistory>> {
        task_history::table
            .filter(task_history::task_id.eq(task_id.value()))
            .order(task_history::id.asc())
            .select(TaskHistoryRow::as_select())
            .load::<TaskHistoryRow>(self.connection)
            .map_err(HierarchyRepositoryError::persistence)
            .map(|rows| rows.into_iter().map(row_to_history).collect())
    }

    fn insert_epic(&mut self, epic: NewEpic) -> HierarchyRepositoryResult<Epic> {
        let key = epic.key.to_string();
        let row = NewEpicRow {
            key: key.clone(),
            title: epic.title.clone(),
            status: ContainerStatus::Draft.as_str().to_owned(),
            progress_pct: 0.0,
            created_at: epic.created_at,
            updated_at: epic.created_at,
            revision: Revision::INITIAL.value(),
        };
        let id = diesel::insert_into(epics::table)
            .values(&row)
            .returning(epics::id)
            .get_result::<i64>(self.connection)
            .map_err(|err| map_insert_error(err, "epic", &key))?;
        Ok(epic.into_epic(EpicId::new(id)))
    }

    fn insert_feature(&mut self, feature: NewFeature) -> HierarchyRepositoryResult<Feature> {
        let key = feature.key.to_string();
        let row = NewFeatureRow {
            epic_id: feature.epic_id.value(),
            key: key.clone(),
            title: feature.title.clone(),
            status: ContainerStatus::Draft.as_str().to_owned(),
            progress_pct: 0.0,
            execution_order: order_to_column(feature.execution_order)?,
            status_override: false,
            created_at: feature.created_at,
            updated_at: feature.created_at,
            revision: Revision::INITIAL.value(),
        };
        let id = diesel::insert_into(features::table)
            .values(&row)
            .returning(features::id)
            .get_result::<i64>(self.connection)
            .map_err(|err| map_insert_error(err, "feature", &key))?;
        Ok(feature.into_feature(FeatureId::new(id)))
    }

    fn insert_task(&mut self, task: NewTask) -> HierarchyRepositoryResult<Task> {
        let key = task.key.to_string();
        let row = NewTaskRow {
            feature_id: task.feature_id.value(),
            key: key.clone(),
            title: task.title.clone(),
            status: task.status.as_str().to_owned(),
            depends_on: task.depends_on.to_json(),
            execution_order: order_to_column(task.execution_order)?,
            created_at: task.created_at,
            updated_at: task.created_at,
            revision: Revision::INITIAL.value(),
        };
        let id = diesel::insert_into(tasks::table)
            .values(&row)
            .returning(tasks::id)
            .get_result::<i64>(self.connection)
            .map_err(|err| map_insert_error(err, "task", &key))?;
        Ok(task.into_task(TaskId::new(id)))
    }

    fn update_epic(&mut self, epic: &Epic) -> HierarchyRepositoryResult<Epic> {
        let next = epic.revision().next();
        let changes = EpicChanges {
            title: epic.title().to_owned(),
            status: epic.status().as_str().to_owned(),
            progress_pct: epic.progress_pct(),
            updated_at: epic.updated_at(),
            revision: next.value(),
        };
        let updated = diesel::update(
            epics::table
                .filter(epics::id.eq(epic.id().value()))
                .filter(epics::revision.eq(epic.revision().value())),
        )
        .set(&changes)
        .execute(self.connection)
        .map_err(HierarchyRepositoryError::persistence)?;
        if updated == 0 {
            let exists = self.epic(epic.id())?.is_some();
            return Err(stale_update("epic", epic.key(), exists));
        }
        Ok(epic.clone().with_revision(next))
    }

    fn update_feature(&mut self, feature: &Feature) -> HierarchyRepositoryResult<Feature> {
        let next = feature.revision().next();
        let changes = FeatureChanges {
            title: feature.title().to_owned(),
            status: feature.status().as_str().to_owned(),
            progress_pct: feature.progress_pct(),
            execution_order: order_to_column(feature.execution_order())?,
            status_override: feature.status_override(),
            updated_at: feature.updated_at(),
            revision: next.value(),
        };
        let updated = diesel::update(
            features::table
                .filter(features::id.eq(feature.id().value()))
                .filter(features::revision.eq(feature.revision().value())),
        )
        .set(&changes)
        .execute(self.connection)
        .map_err(HierarchyRepositoryError::persistence)?;
        if updated == 0 {
            let exists = self.feature(feature.id())?.is_some();
            return Err(stale_update("feature", feature.key(), exists));
        }
        Ok(feature.clone().with_revision(next))
    }

    fn update_task(&mut self, task: &Task) -> HierarchyRepositoryResult<Task> {
        let next = task.revision().next();
        let changes = TaskChanges {
            title: task.title().to_owned(),
            status: task.status().as_str().to_owned(),
            depends_on: task.depends_on().to_json(),
            execution_order: order_to_column(task.execution_order())?,
            blocked_reason: task.blocked_reason().map(str::to_owned),
            updated_at: task.updated_at(),
            started_at: task.started_at(),
            completed_at: task.completed_at(),
            blocked_at: task.blocked_at(),
            revision: next.value(),
        };
        let updated = diesel::update(
            tasks::table
                .filter(tasks::id.eq(task.id().value()))
                .filter(tasks::revision.eq(task.revision().value())),
        )
        .set(&changes)
        .execute(self.connection)
        .map_err(HierarchyRepositoryError::persistence)?;
        if updated == 0 {
            let exists = self.task(task.id())?.is_some();
            return Err(stale_update("task", task.key(), exists));
        }
        Ok(task.clone().with_revision(next))
    }

    fn append_history(&mut self, entry: NewTaskHistory) -> HierarchyRepositoryResult<TaskHistory> {
        let row = NewTaskHistoryRow {
            task_id: entry.task_id.value(),
            old_status: entry.old_status.as_ref().map(|status| status.as_str().to_owned()),
            new_status: entry.new_status.as_str().to_owned(),
            agent: entry.agent.clone(),
            notes: entry.notes.clone(),
            rejection_reason: entry.rejection_reason.clone(),
            forced: entry.forced,
            created_at: entry.created_at,
        };
        let task_key = entry.task_id.to_string();
        let id = diesel::insert_into(task_history::table)
            .values(&row)
            .returning(task_history::id)
            .get_result::<i64>(self.connection)
            .map_err(|err| map_insert_error(err, "task", &task_key))?;
        Ok(entry.into_history(HistoryId::new(id)))
    }

    fn delete_task(&mut self, id: TaskId) -> HierarchyRepositoryResult<()> {
        let deleted = diesel::delete(tasks::table.filter(tasks::id.eq(id.value())))
            .execute(self.connection)
            .map_err(HierarchyRepositoryError::persistence)?;
        ensure_deleted(deleted, "task", &id)
    }

    fn delete_feature(&mut self, id: FeatureId) -> HierarchyRepositoryResult<()> {
        let deleted = diesel::delete(features::table.filter(features::id.eq(id.value())))
            .execute(self.connection)
            .map_err(HierarchyRepositoryError::persistence)?;
        ensure_deleted(deleted, "feature", &id)
    }

    fn delete_epic(&mut self, id: EpicId) -> HierarchyRepositoryResult<()> {
        let deleted = diesel::delete(epics::table.filter(epics::id.eq(id.value())))
            .execute(self.connection)
            .map_err(HierarchyRepositoryError::persistence)?;
        ensure_deleted(deleted, "epic", &id)
    }
}

fn map_insert_error(err: DieselError, entity: &'static str, key: &str) -> HierarchyRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            HierarchyRepositoryError::DuplicateKey {
                entity,
                key: key.to_owned(),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info) => {
            let parent = info.table_name().unwrap_or("parent");
            HierarchyRepositoryError::NotFound {
                entity: parent_entity(parent),
                key: key.to_owned(),
            }
        }
        _ => HierarchyRepositoryError::persistence(err),
    }
}

fn parent_entity(table: &str) -> &'static str {
    match table {
        "features" => "epic",
        "tasks" => "feature",
        "task_history" => "task",
        _ => "parent",
    }
}

fn stale_update(
    entity: &'static str,
    key: &dyn std::fmt::Display,
    exists: bool,
) -> HierarchyRepositoryError {
    if exists {
        HierarchyRepositoryError::ConcurrentModification {
            entity,
            key: key.to_string(),
        }
    } else {
        HierarchyRepositoryError::not_found(entity, key)
    }
}

fn ensure_deleted(
    deleted: usize,
    entity: &'static str,
    key: &dyn std::fmt::Display,
) -> HierarchyRepositoryResult<()> {
    if deleted == 0 {
        Err(HierarchyRepositoryError::not_found(entity, key))
    } else {
        Ok(())
    }
}

fn order_to_column(order: Option<ExecutionOrder>) -> HierarchyRepositoryResult<Option<i32>> {
    order
        .map(|value| i32::try_from(value.value()).map_err(HierarchyRepositoryError::persistence))
        .transpose()
}

fn order_from_column(order: Option<i32>) -> HierarchyRepositoryResult<Option<ExecutionOrder>> {
    order
        .map(|value| {
            ExecutionOrder::new(i64::from(value)).map_err(HierarchyRepositoryError::persistence)
        })
        .transpose()
}

fn parse_container_status(raw: &str) -> HierarchyRepositoryResult<ContainerStatus> {
    ContainerStatus::try_from(raw).map_err(HierarchyRepositoryError::persistence)
}

fn row_to_epic(row: EpicRow) -> HierarchyRepositoryResult<Epic> {
    let data = PersistedEpicData {
        id: EpicId::new(row.id),
        key: EpicKey::new(row.key).map_err(HierarchyRepositoryError::persistence)?,
        title: row.title,
        status: parse_container_status(&row.status)?,
        progress_pct: row.progress_pct,
        created_at: row.created_at,
        updated_at: row.updated_at,
        revision: Revision::new(row.revision),
    };
    Ok(Epic::from_persisted(data))
}

fn row_to_feature(row: FeatureRow) -> HierarchyRepositoryResult<Feature> {
    let data = PersistedFeatureData {
        id: FeatureId::new(row.id),
        epic_id: EpicId::new(row.epic_id),
        key: FeatureKey::new(row.key).map_err(HierarchyRepositoryError::persistence)?,
        title: row.title,
        status: parse_container_status(&row.status)?,
        progress_pct: row.progress_pct,
        execution_order: order_from_column(row.execution_order)?,
        status_override: row.status_override,
        created_at: row.created_at,
        updated_at: row.updated_at,
        revision: Revision::new(row.revision),
    };
    Ok(Feature::from_persisted(data))
}

fn row_to_task(row: TaskRow) -> HierarchyRepositoryResult<Task> {
    let TaskRow {
        id,
        feature_id,
        key: persisted_key,
        title,
        status,
        depends_on: persisted_dependencies,
        execution_order,
        blocked_reason,
        created_at,
        updated_at,
        started_at,
        completed_at,
        blocked_at,
        revision,
    } = row;

    let depends_on = DependencyList::parse_json(&persisted_key, &persisted_dependencies)
        .map_err(HierarchyRepositoryError::persistence)?;
    let data = PersistedTaskData {
        id: TaskId::new(id),
        feature_id: FeatureId::new(feature_id),
        key: TaskKey::new(persisted_key).map_err(HierarchyRepositoryError::persistence)?,
        title,
        status: TaskStatus::from_persisted(status),
        depends_on,
        execution_order: order_from_column(execution_order)?,
        blocked_reason,
        created_at,
        updated_at,
        started_at,
        completed_at,
        blocked_at,
        revision: Revision::new(revision),
    };
    Ok(Task::from_persisted(data))
}

fn row_to_history(row: TaskHistoryRow) -> TaskHistory {
    TaskHistory {
        id: HistoryId::new(row.id),
        task_id: TaskId::new(row.task_id),
        old_status: row.old_status.map(TaskStatus::from_persisted),
        new_status: TaskStatus::from_persisted(row.new_status),
        agent: row.agent,
        notes: row.notes,
        rejection_reason: row.rejection_reason,
        forced: row.forced,
        created_at: row.created_at,
    }
}
