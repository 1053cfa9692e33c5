//! One end-to-end simulation run.

use std::collections::BTreeMap;

use questline_core::repository::Clock;
use questline_engine::application::query_handlers::{QuestView, list_quests};
use questline_save_store::JsonFileSaveRepository;
use serde::Serialize;

use crate::config::SimConfig;
use crate::error::AppError;
use crate::scenario;

/// How far ahead the report looks for scheduled incidents.
pub const INCIDENT_HORIZON_TICKS: i64 = 60_000;

/// End-of-run report.
#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    /// Whether the run resumed from a save.
    pub resumed: bool,
    /// First simulated tick.
    pub start_tick: i64,
    /// Tick the next run would start at.
    pub end_tick: i64,
    /// Signals delivered during the run.
    pub signals_delivered: usize,
    /// Subquests created during the run.
    pub subquests_created: usize,
    /// Part faults caught during the run.
    pub faults: usize,
    /// Titles of the letters sent during the run.
    pub letters: Vec<String>,
    /// Quest endings by outcome label.
    pub outcomes: BTreeMap<String, u32>,
    /// Incidents scheduled within the look-ahead horizon.
    pub upcoming_incidents: usize,
    /// Every quest at the end of the run.
    pub quests: Vec<QuestView>,
}

/// Runs the sandbox scenario for `config.ticks` ticks.
///
/// With a save path the run resumes from the save when one exists and writes
/// the final state back to it; otherwise it seeds a fresh scenario.
///
/// # Errors
///
/// Returns `AppError::Domain` if seeding, loading or saving fails.
pub async fn run(config: &SimConfig, clock: &dyn Clock) -> Result<SimSummary, AppError> {
    let mut manager = scenario::manager(config.seed).with_signal_budget(config.signal_budget);
    let repo = config.save_path.as_ref().map(JsonFileSaveRepository::new);

    let resumed = match &repo {
        Some(repo) => manager.load(repo).await?,
        None => false,
    };
    if !resumed {
        scenario::seed_quests(&mut manager, config.seed)?;
    }

    let start_tick = manager.tick();
    tracing::info!(start_tick, ticks = config.ticks, resumed, "simulation started");
    let totals = manager.run(config.ticks);
    tracing::info!(
        end_tick = manager.tick(),
        signals = totals.signals_delivered,
        subquests = totals.subquests_created,
        faults = totals.faults,
        "simulation finished"
    );

    if let Some(repo) = &repo {
        manager.save(clock, repo).await?;
    }

    Ok(SimSummary {
        resumed,
        start_tick,
        end_tick: manager.tick(),
        signals_delivered: totals.signals_delivered,
        subquests_created: totals.subquests_created,
        faults: totals.faults,
        letters: manager
            .letters()
            .letters()
            .iter()
            .map(|letter| letter.title.clone())
            .collect(),
        outcomes: manager.letters().outcomes().clone(),
        upcoming_incidents: manager.upcoming_incidents(INCIDENT_HORIZON_TICKS).len(),
        quests: list_quests(manager.quests(), true),
    })
}
