//! Sync pass driver

use std::collections::{HashMap, HashSet};
use std::pin::pin;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use super::{PassConfig, SyncReport};
use crate::catalog::{CatalogClient, CatalogError, ExternalCard, ExternalSetDetail};
use crate::db::{CatalogStore, PassStart, ReconcileOutcome, ReconcilePlan, StaleCard};
use crate::error::{Error, Result};
use crate::mapper::{map_card, map_set_detail, map_set_summary};
use crate::models::{CardSet, SyncRun, SyncRunStatus};
use crate::progress::{ProgressGauge, ProgressReporter, SyncEvent};
use crate::util::{unix_millis_now, utc_day};

const DISCOVER_DONE: u8 = 5;
const POPULATE_DONE: u8 = 90;
const RECONCILE_DONE: u8 = 99;

/// Drives catalog sync passes against one provider and one store.
///
/// The store is an explicit handle so every test can inject an isolated
/// database.
pub struct SyncEngine<C, S> {
    client: C,
    store: S,
    config: PassConfig,
}

/// Members of one set after validation
struct WrittenSet {
    cards: usize,
    skipped: usize,
}

/// Bookkeeping of a running pass
struct PassState<'r, R: ?Sized> {
    reporter: &'r R,
    gauge: ProgressGauge,
    report: SyncReport,
}

impl<'r, R: ProgressReporter + ?Sized> PassState<'r, R> {
    fn new(reporter: &'r R) -> Self {
        Self {
            reporter,
            gauge: ProgressGauge::default(),
            report: SyncReport::default(),
        }
    }

    fn warn(&mut self, message: String, set_id: Option<&str>) {
        self.report.warnings += 1;
        tracing::warn!(set_id, "{message}");
        self.reporter.report(SyncEvent::Warning {
            message,
            set_id: set_id.map(str::to_string),
        });
    }

    fn step(&mut self, message: String, from: u8, to: u8, done: usize, total: usize) {
        let progress = self.gauge.advance(from, to, done, total);
        self.reporter.report(SyncEvent::Progress {
            message,
            progress,
            processed_sets: None,
            total_sets: None,
            total_cards: None,
        });
    }

    fn populate_step(&mut self, message: String, processed: usize, total_sets: usize) {
        let progress = self
            .gauge
            .advance(DISCOVER_DONE, POPULATE_DONE, processed, total_sets);
        self.reporter.report(SyncEvent::Progress {
            message,
            progress,
            processed_sets: Some(processed),
            total_sets: Some(total_sets),
            total_cards: Some(self.report.cards_processed),
        });
    }
}

impl<C: CatalogClient, S: CatalogStore> SyncEngine<C, S> {
    pub const fn new(client: C, store: S, config: PassConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    /// Run one full pass, streaming events to `reporter`.
    ///
    /// Returns the final report after a terminal `complete` event, or the
    /// fatal error after a terminal `error` event. Cancelling `cancel` stops
    /// new set fetches; the pass then ends with [`Error::Cancelled`] and no
    /// obsolescence processing.
    pub async fn run<R>(&self, reporter: &R, cancel: &CancellationToken) -> Result<SyncReport>
    where
        R: ProgressReporter + ?Sized,
    {
        reporter.report(SyncEvent::Starting {
            message: "Starting catalog sync".to_string(),
        });

        let pass = match self.store.begin_pass(unix_millis_now()) {
            Ok(pass) => pass,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start catalog sync");
                reporter.report(SyncEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };
        tracing::info!(run_id = pass.run_id, epoch = pass.epoch, "Catalog sync started");

        let mut state = PassState::new(reporter);
        let result = self.run_phases(pass.epoch, &mut state, cancel).await;

        let status = match &result {
            Ok(()) => SyncRunStatus::Completed,
            Err(Error::Cancelled) => SyncRunStatus::Cancelled,
            Err(_) => SyncRunStatus::Failed,
        };
        self.record_run(pass, status, &state.report);

        match result {
            Ok(()) => {
                let report = state.report;
                tracing::info!(
                    sets = report.sets_processed,
                    cards = report.cards_processed,
                    sets_removed = report.sets_removed,
                    holdings_migrated = report.holdings_migrated,
                    skipped = report.skipped_units(),
                    "Catalog sync complete"
                );
                reporter.report(SyncEvent::Complete {
                    message: report.summary(),
                    stats: report,
                });
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Catalog sync failed");
                reporter.report(SyncEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_phases<R>(
        &self,
        epoch: i64,
        state: &mut PassState<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        R: ProgressReporter + ?Sized,
    {
        let sets = self.discover(epoch, state, cancel).await?;
        let populated = self.populate(&sets, epoch, state, cancel).await?;
        self.reconcile(epoch, &populated, state);
        Ok(())
    }

    async fn discover<R>(
        &self,
        epoch: i64,
        state: &mut PassState<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<Vec<CardSet>>
    where
        R: ProgressReporter + ?Sized,
    {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let summaries = self.client.list_sets(self.config.include_series).await?;
        let synced_at = epoch;
        let mut seen = HashSet::new();
        let sets: Vec<CardSet> = summaries
            .iter()
            .filter(|summary| !summary.id.trim().is_empty() && seen.insert(summary.id.clone()))
            .map(|summary| map_set_summary(summary, synced_at))
            .collect();

        // An empty listing would mark the whole local catalog obsolete.
        if sets.is_empty() {
            return Err(CatalogError::Decode("catalog listed no sets".to_string()).into());
        }

        self.store.upsert_sets(&sets)?;
        tracing::info!(sets = sets.len(), "Discovered catalog sets");
        state.step(
            format!("Found {} sets", sets.len()),
            0,
            DISCOVER_DONE,
            1,
            1,
        );
        Ok(sets)
    }

    /// Fetch and write every set's members. Returns the ids of sets that were
    /// written completely and may have stale cards pruned.
    async fn populate<R>(
        &self,
        sets: &[CardSet],
        epoch: i64,
        state: &mut PassState<'_, R>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>>
    where
        R: ProgressReporter + ?Sized,
    {
        let total_sets = sets.len();
        let client = &self.client;
        let mut fetches = pin!(stream::iter(0..total_sets)
            .map(move |index| async move {
                if cancel.is_cancelled() {
                    return (index, None);
                }
                (index, Some(client.get_set(&sets[index].id).await))
            })
            .buffered(self.config.concurrency.max(1)));

        let mut complete = Vec::with_capacity(total_sets);
        let mut processed = 0;
        while let Some((index, fetched)) = fetches.next().await {
            let Some(fetched) = fetched else {
                break;
            };
            let set = &sets[index];
            processed += 1;

            let written = fetched
                .map_err(Error::from)
                .and_then(|detail| self.write_members(set, &detail, epoch));
            match written {
                Ok(written) => {
                    state.report.sets_processed += 1;
                    state.report.cards_processed += written.cards;
                    if written.skipped == 0 {
                        complete.push(set.id.clone());
                    } else {
                        state.report.cards_skipped += written.skipped;
                        state.warn(
                            format!(
                                "Skipped {} malformed cards in set {}",
                                written.skipped, set.id
                            ),
                            Some(&set.id),
                        );
                    }
                }
                Err(e) => {
                    state.report.sets_failed += 1;
                    state.warn(format!("Failed to sync set {}: {e}", set.id), Some(&set.id));
                }
            }

            state.populate_step(format!("Synced {}", set.name), processed, total_sets);

            if cancel.is_cancelled() {
                break;
            }
        }

        if cancel.is_cancelled() {
            tracing::info!(processed, total_sets, "Catalog sync cancelled");
            return Err(Error::Cancelled);
        }
        Ok(complete)
    }

    /// Validate, map and store one set's members as a single unit
    fn write_members(
        &self,
        summary: &CardSet,
        detail: &ExternalSetDetail,
        epoch: i64,
    ) -> Result<WrittenSet> {
        let synced_at = epoch;
        let mut set = map_set_detail(detail, summary.series.as_deref(), synced_at);
        set.id.clone_from(&summary.id);
        set.card_count = i64::try_from(detail.cards.len()).unwrap_or(i64::MAX);

        let mut cards = Vec::with_capacity(detail.cards.len());
        let mut skipped = 0;
        for raw in &detail.cards {
            match ExternalCard::from_value(raw) {
                Ok(card) => cards.push(map_card(&card, &set.id, synced_at)),
                Err(e) => {
                    skipped += 1;
                    tracing::debug!(set_id = %set.id, error = %e, "Skipping malformed card");
                }
            }
        }

        self.store
            .write_set_members(&set, &cards, &utc_day(synced_at))?;
        Ok(WrittenSet {
            cards: cards.len(),
            skipped,
        })
    }

    /// Remove obsolete sets, then prune stale cards of fully written sets.
    /// A failing batch is rolled back, reported and skipped.
    fn reconcile<R>(&self, epoch: i64, complete: &[String], state: &mut PassState<'_, R>)
    where
        R: ProgressReporter + ?Sized,
    {
        let obsolete = match self.store.obsolete_set_ids(epoch) {
            Ok(ids) => ids,
            Err(e) => {
                state.report.batches_failed += 1;
                state.warn(format!("Failed to look up obsolete sets: {e}"), None);
                return;
            }
        };

        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<(&[String], bool)> = obsolete
            .chunks(batch_size)
            .map(|chunk| (chunk, true))
            .chain(complete.chunks(batch_size).map(|chunk| (chunk, false)))
            .collect();
        let total = batches.len();
        tracing::info!(obsolete_sets = obsolete.len(), batches = total, "Reconciling catalog");

        for (index, (set_ids, remove_sets)) in batches.into_iter().enumerate() {
            let batch = index + 1;
            match self.reconcile_batch(set_ids, remove_sets, epoch) {
                Ok(outcome) => {
                    state.report.holdings_migrated += outcome.holdings_migrated;
                    state.report.holdings_removed += outcome.holdings_removed;
                    state.report.cards_removed += outcome.cards_removed;
                    state.report.sets_removed += outcome.sets_removed;
                    if outcome != ReconcileOutcome::default() {
                        tracing::info!(
                            batch,
                            sets_removed = outcome.sets_removed,
                            cards_removed = outcome.cards_removed,
                            holdings_migrated = outcome.holdings_migrated,
                            holdings_removed = outcome.holdings_removed,
                            "Reconciled batch"
                        );
                    }
                }
                Err(e) => {
                    state.report.batches_failed += 1;
                    state.warn(format!("Reconcile batch {batch} of {total} failed: {e}"), None);
                }
            }
            state.step(
                format!("Reconciled batch {batch} of {total}"),
                POPULATE_DONE,
                RECONCILE_DONE,
                batch,
                total,
            );
        }
    }

    /// Plan and apply one batch. With `remove_sets` the sets themselves go
    /// too; otherwise only their stale cards are pruned.
    fn reconcile_batch(
        &self,
        set_ids: &[String],
        remove_sets: bool,
        epoch: i64,
    ) -> Result<ReconcileOutcome> {
        let stale = self.store.stale_cards(set_ids, epoch)?;
        if stale.is_empty() && !remove_sets {
            return Ok(ReconcileOutcome::default());
        }

        let card_ids: Vec<String> = stale.iter().map(|card| card.id.clone()).collect();
        let by_id: HashMap<&str, &StaleCard> =
            stale.iter().map(|card| (card.id.as_str(), card)).collect();

        let mut successors: HashMap<&str, Option<String>> = HashMap::new();
        let mut migrations = Vec::new();
        for holding in self.store.holdings_for_cards(&card_ids)? {
            let Some(&card) = by_id.get(holding.card_id.as_str()) else {
                continue;
            };
            let successor = if let Some(known) = successors.get(card.id.as_str()) {
                known.clone()
            } else {
                let found = self.store.find_successor(card, epoch)?;
                successors.insert(card.id.as_str(), found.clone());
                found
            };

            if let Some(successor) = successor {
                tracing::debug!(
                    holding_id = %holding.id,
                    from = %card.id,
                    to = %successor,
                    "Migrating holding"
                );
                migrations.push((holding.id, successor));
            }
        }

        let plan = ReconcilePlan {
            migrations,
            card_ids,
            set_ids: if remove_sets {
                set_ids.to_vec()
            } else {
                Vec::new()
            },
        };
        if plan.is_empty() {
            return Ok(ReconcileOutcome::default());
        }
        self.store.apply_reconcile(&plan)
    }

    fn record_run(&self, pass: PassStart, status: SyncRunStatus, report: &SyncReport) {
        let run = SyncRun {
            id: pass.run_id,
            started_at: pass.epoch,
            finished_at: Some(unix_millis_now()),
            status,
            sets_processed: count(report.sets_processed),
            cards_processed: count(report.cards_processed),
            sets_removed: count(report.sets_removed),
            holdings_migrated: count(report.holdings_migrated),
            warnings: count(report.warnings),
        };
        if let Err(e) = self.store.finish_pass(&run) {
            tracing::warn!(error = %e, run_id = pass.run_id, "Failed to record sync run");
        }
    }
}

fn count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
