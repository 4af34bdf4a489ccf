//! All-or-nothing behaviour of `PostgreSQL` transactions.

use std::sync::{Arc, mpsc};
use std::time::Duration;

use super::helpers::{PgContext, at, count_rows, epic_key, feature_key, pg_context, seed};
use atelier::task::{
    domain::{NewEpic, NewFeature},
    ports::{HierarchyRepository, HierarchyRepositoryError, HierarchyTransaction},
    services::TaskLifecycleError,
};
use eyre::ensure;
use rstest::rstest;

const SIGNAL_TIMEOUT: Duration = Duration::from_secs(30);

#[rstest]
fn failing_work_rolls_back_earlier_writes(
    pg_context: eyre::Result<PgContext>,
) -> eyre::Result<()> {
    let ctx = pg_context?;
    seed(&ctx)?;
    let fresh = NewEpic::new(epic_key("E02")?, "Billing", at())?;
    let clash = NewEpic::new(epic_key("E01")?, "Platform again", at())?;
    let feature_key = feature_key("E02-F01")?;

    let result = ctx.run(move |tx| {
        let epic = tx.insert_epic(fresh)?;
        let feature = NewFeature::new(epic.id(), feature_key, "Invoices", at())
            .map_err(HierarchyRepositoryError::persistence)?;
        tx.insert_feature(feature)?;
        tx.insert_epic(clash)
    });

    ensure!(matches!(
        result,
        Err(HierarchyRepositoryError::DuplicateKey { entity: "epic", .. })
    ));
    let mut conn = ctx.connect()?;
    ensure!(count_rows(&mut conn, "epics")? == 1);
    ensure!(count_rows(&mut conn, "features")? == 1);
    Ok(())
}

#[rstest]
fn caller_error_type_comes_back_unchanged(
    pg_context: eyre::Result<PgContext>,
) -> eyre::Result<()> {
    let ctx = pg_context?;
    let epic = NewEpic::new(epic_key("E02")?, "Billing", at())?;
    let repository = Arc::clone(&ctx.repository);

    let result = ctx.runtime.block_on(repository.transaction(
        move |tx: &mut dyn HierarchyTransaction| -> Result<(), TaskLifecycleError> {
            tx.insert_epic(epic)?;
            Err(TaskLifecycleError::EntityNotFound {
                entity: "feature",
                key: "E02-F09".to_owned(),
            })
        },
    ));

    ensure!(matches!(
        result,
        Err(TaskLifecycleError::EntityNotFound { entity: "feature", ref key }) if key == "E02-F09"
    ));
    ensure!(count_rows(&mut ctx.connect()?, "epics")? == 0);
    Ok(())
}

#[rstest]
fn dropped_caller_rolls_back_finished_work(
    pg_context: eyre::Result<PgContext>,
) -> eyre::Result<()> {
    let ctx = pg_context?;
    let epic = NewEpic::new(epic_key("E02")?, "Billing", at())?;
    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let repository = Arc::clone(&ctx.repository);

    let pending = ctx.runtime.spawn(async move {
        repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| {
                tx.insert_epic(epic)?;
                entered_tx
                    .send(())
                    .map_err(HierarchyRepositoryError::persistence)?;
                release_rx
                    .recv_timeout(SIGNAL_TIMEOUT)
                    .map_err(HierarchyRepositoryError::persistence)?;
                Ok::<_, HierarchyRepositoryError>(())
            })
            .await
    });

    entered_rx.recv_timeout(SIGNAL_TIMEOUT)?;
    pending.abort();
    let joined = ctx.runtime.block_on(pending);
    ensure!(joined.is_err_and(|err| err.is_cancelled()));
    release_tx.send(())?;

    // The pool holds one connection, so this read waits for the rollback.
    let lookup = epic_key("E02")?;
    let found = ctx.run(move |tx| tx.epic_by_key(&lookup))?;
    ensure!(found.is_none(), "abandoned work must not be committed");
    ensure!(count_rows(&mut ctx.connect()?, "epics")? == 0);
    Ok(())
}
