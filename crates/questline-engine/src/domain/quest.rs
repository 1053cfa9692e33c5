//! The quest aggregate root.

use std::collections::BTreeSet;

use questline_core::aggregate::PersistentAggregate;
use questline_core::entity::{EntityHandle, ReferenceResolver};
use questline_core::error::DomainError;
use questline_core::identity::{PartId, QuestId};
use questline_core::notify::{Letter, LetterSeverity};
use questline_core::signal::{Signal, SignalArgs};

use super::activable::Activable;
use super::env::QuestEnv;
use super::fault::{Hook, PartFault, PartSite, guarded};
use super::part::{PartContext, QuestPart, QuestRequest};
use super::parts::threats_generator::IncidentSchedule;
use super::record::{CustomPartFactory, NoCustomParts, PartSlot, QuestRecord};
use super::state::{EndOutcome, QuestState};

/// Ticks after cleanup at which a historical quest drops all of its parts.
pub const GARBAGE_HORIZON_TICKS: i64 = 1_800_000;

/// Outcome of one fan-out over a quest's parts.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Hooks invoked.
    pub invoked: usize,
    /// Hooks that faulted. Each was already logged.
    pub faults: Vec<PartFault>,
}

impl DispatchReport {
    fn record(&mut self, result: Result<(), PartFault>) {
        self.invoked += 1;
        if let Err(fault) = result {
            self.faults.push(fault);
        }
    }

    fn merge(&mut self, other: DispatchReport) {
        self.invoked += other.invoked;
        self.faults.extend(other.faults);
    }

    /// Whether every invoked hook succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// A stateful workflow instance composed of parts.
///
/// The lifecycle [`QuestState`] is never stored; it is derived on demand from
/// the expiry countdown, the ended flag, the outcome and the acceptance tick.
#[derive(Debug)]
pub struct Quest {
    id: QuestId,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Difficulty / points value.
    pub points: f32,
    /// Free-form tags.
    pub tags: BTreeSet<String>,
    script: Option<String>,
    appearance_tick: i64,
    acceptance_tick: i64,
    ticks_until_acceptance_expiry: i64,
    initially_accepted: bool,
    dismissed: bool,
    hidden: bool,
    hide_on_cleanup: bool,
    hidden_in_ui: bool,
    ended: bool,
    end_outcome: EndOutcome,
    cleaned_up: bool,
    cleanup_tick: i64,
    parent: Option<QuestId>,
    accepter: Option<EntityHandle>,
    accepter_label: Option<String>,
    added_signal_sent: bool,
    initiate_signal_sent: bool,
    next_part_id: u32,
    parts: Vec<Box<dyn QuestPart>>,
    pending_subquests: Vec<String>,
}

impl Quest {
    /// Creates a quest offered at `appearance_tick`, with no expiry.
    #[must_use]
    pub fn new(id: QuestId, name: impl Into<String>, appearance_tick: i64) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            points: 0.0,
            tags: BTreeSet::new(),
            script: None,
            appearance_tick,
            acceptance_tick: -1,
            ticks_until_acceptance_expiry: -1,
            initially_accepted: false,
            dismissed: false,
            hidden: false,
            hide_on_cleanup: false,
            hidden_in_ui: false,
            ended: false,
            end_outcome: EndOutcome::Unknown,
            cleaned_up: false,
            cleanup_tick: -1,
            parent: None,
            accepter: None,
            accepter_label: None,
            added_signal_sent: false,
            initiate_signal_sent: false,
            next_part_id: 0,
            parts: Vec::new(),
            pending_subquests: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the points value.
    #[must_use]
    pub fn with_points(mut self, points: f32) -> Self {
        self.points = points;
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Records the script this quest was generated from.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Links the quest to a parent.
    #[must_use]
    pub fn with_parent(mut self, parent: QuestId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Makes the offer expire after `ticks` unaccepted ticks.
    #[must_use]
    pub fn with_acceptance_expiry(mut self, ticks: i64) -> Self {
        self.ticks_until_acceptance_expiry = ticks;
        self
    }

    /// Suppresses outcome letters.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Hides the quest from the UI once cleanup has run.
    #[must_use]
    pub fn hiding_on_cleanup(mut self) -> Self {
        self.hide_on_cleanup = true;
        self
    }

    /// Quest id.
    #[must_use]
    pub fn id(&self) -> QuestId {
        self.id
    }

    /// Script name, if generated from one.
    #[must_use]
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Parent quest, if any.
    #[must_use]
    pub fn parent(&self) -> Option<QuestId> {
        self.parent
    }

    /// Tick the quest was created.
    #[must_use]
    pub fn appearance_tick(&self) -> i64 {
        self.appearance_tick
    }

    /// Tick the quest was accepted, or `-1`.
    #[must_use]
    pub fn acceptance_tick(&self) -> i64 {
        self.acceptance_tick
    }

    /// Remaining offer ticks; `-1` means no expiry.
    #[must_use]
    pub fn ticks_until_acceptance_expiry(&self) -> i64 {
        self.ticks_until_acceptance_expiry
    }

    /// Whether the quest started pre-accepted.
    #[must_use]
    pub fn initially_accepted(&self) -> bool {
        self.initially_accepted
    }

    /// Whether the offer was dismissed.
    #[must_use]
    pub fn dismissed(&self) -> bool {
        self.dismissed
    }

    /// Whether outcome letters are suppressed.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether the UI should hide this quest.
    #[must_use]
    pub fn hidden_in_ui(&self) -> bool {
        self.hidden_in_ui
    }

    /// Whether `end` has run.
    #[must_use]
    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Recorded outcome.
    #[must_use]
    pub fn end_outcome(&self) -> EndOutcome {
        self.end_outcome
    }

    /// Whether the one-shot cleanup pass has run.
    #[must_use]
    pub fn cleaned_up(&self) -> bool {
        self.cleaned_up
    }

    /// Tick of the cleanup pass, or `-1`.
    #[must_use]
    pub fn cleanup_tick(&self) -> i64 {
        self.cleanup_tick
    }

    /// The accepting entity while it is still reachable.
    #[must_use]
    pub fn accepter(&self) -> Option<EntityHandle> {
        self.accepter
    }

    /// Label captured when the accepter became unreachable.
    #[must_use]
    pub fn accepter_label(&self) -> Option<&str> {
        self.accepter_label.as_deref()
    }

    /// Tag fired once from [`Quest::post_added`].
    #[must_use]
    pub fn added_signal(&self) -> String {
        self.id.scoped_tag("Added")
    }

    /// Tag fired once on acceptance.
    #[must_use]
    pub fn initiate_signal(&self) -> String {
        self.id.scoped_tag("Initiate")
    }

    /// Derived lifecycle state.
    #[must_use]
    pub fn state(&self) -> QuestState {
        QuestState::derive(
            self.ticks_until_acceptance_expiry,
            self.ended,
            self.end_outcome,
            self.acceptance_tick,
        )
    }

    /// Whether the state is terminal.
    #[must_use]
    pub fn is_historical(&self) -> bool {
        self.state().is_historical()
    }

    // --- parts ---

    /// Attaches a part at the end of the dispatch order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PartAlreadyAttached` (and drops the part) if it
    /// already carries an owner.
    pub fn add_part(&mut self, mut part: Box<dyn QuestPart>) -> Result<PartId, DomainError> {
        if let Some(owner) = part.base().owner() {
            let err = DomainError::PartAlreadyAttached {
                quest_id: self.id,
                owner,
            };
            tracing::error!(quest_id = %self.id, part_kind = part.kind(), error = %err, "attach skipped");
            return Err(err);
        }
        let part_id = PartId(self.next_part_id);
        self.next_part_id += 1;
        part.base_mut().attach(self.id, part_id);
        tracing::debug!(quest_id = %self.id, %part_id, part_kind = part.kind(), "part attached");
        self.parts.push(part);
        Ok(part_id)
    }

    /// Detaches and returns a part, clearing its back-reference.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PartNotFound` if this quest owns no such part.
    pub fn remove_part(&mut self, part_id: PartId) -> Result<Box<dyn QuestPart>, DomainError> {
        let Some(index) = self
            .parts
            .iter()
            .position(|part| part.base().id() == Some(part_id))
        else {
            let err = DomainError::PartNotFound {
                quest_id: self.id,
                part_id,
            };
            tracing::error!(quest_id = %self.id, %part_id, error = %err, "detach skipped");
            return Err(err);
        };
        let mut part = self.parts.remove(index);
        part.base_mut().detach();
        tracing::debug!(quest_id = %self.id, %part_id, "part detached");
        Ok(part)
    }

    /// Parts in dispatch order.
    pub fn parts(&self) -> impl Iterator<Item = &dyn QuestPart> {
        self.parts.iter().map(|part| &**part)
    }

    /// Looks up a part by id.
    #[must_use]
    pub fn part(&self, part_id: PartId) -> Option<&dyn QuestPart> {
        self.parts()
            .find(|part| part.base().id() == Some(part_id))
    }

    /// Number of owned parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    // --- lifecycle ---

    /// Announces the quest. Fires `Quest{id}.Added` the first time only.
    pub fn post_added(&mut self, env: &mut QuestEnv<'_>) {
        if self.added_signal_sent {
            return;
        }
        self.added_signal_sent = true;
        tracing::info!(quest_id = %self.id, name = %self.name, "quest added");
        env.dispatcher.publish(Signal::new(self.added_signal(), SignalArgs::new()));
    }

    /// Starts the quest already accepted, bypassing the offer.
    ///
    /// Returns `false` (and does nothing) unless the quest is an open offer.
    pub fn set_initially_accepted(&mut self, env: &mut QuestEnv<'_>) -> bool {
        if self.state() != QuestState::NotYetAccepted {
            return false;
        }
        self.initially_accepted = true;
        self.acceptance_tick = env.tick;
        self.ticks_until_acceptance_expiry = -1;
        self.dismissed = false;
        self.fire_initiate(env);
        true
    }

    /// Accepts the offer on behalf of `by`.
    ///
    /// Only legal while the quest is `NotYetAccepted`; any later call is a
    /// no-op that returns `false`. Part pre-accept hooks run first; if one
    /// of them ends the quest the acceptance is abandoned.
    pub fn accept(&mut self, by: Option<EntityHandle>, env: &mut QuestEnv<'_>) -> bool {
        let state = self.state();
        if state != QuestState::NotYetAccepted {
            tracing::debug!(quest_id = %self.id, state = state.as_str(), "accept ignored");
            return false;
        }
        let report = self.run_pass(Hook::PreAccept, env);
        if !report.is_clean() {
            tracing::warn!(
                quest_id = %self.id,
                faults = report.faults.len(),
                "pre-accept hooks faulted"
            );
        }
        if self.is_historical() {
            tracing::info!(quest_id = %self.id, "quest ended during pre-accept; not accepted");
            return false;
        }
        self.acceptance_tick = env.tick;
        self.dismissed = false;
        self.accepter = by;
        self.accepter_label = None;
        tracing::info!(quest_id = %self.id, tick = env.tick, accepter = ?by, "quest accepted");
        self.fire_initiate(env);
        true
    }

    fn fire_initiate(&mut self, env: &mut QuestEnv<'_>) {
        if self.initiate_signal_sent {
            return;
        }
        self.initiate_signal_sent = true;
        env.dispatcher
            .publish(Signal::new(self.initiate_signal(), SignalArgs::new()));
    }

    /// Dismisses an open offer.
    pub fn dismiss(&mut self) {
        if !self.is_historical() {
            self.dismissed = true;
        }
    }

    /// Ends the quest and immediately cleans up its parts.
    ///
    /// A letter is requested when `send_letter` is set and the quest is not
    /// hidden, unless the offer lapsed without ever being accepted. Offers
    /// that fail or become invalid before acceptance still get their letter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` (already logged) if the quest is
    /// already historical; nothing changes in that case.
    pub fn end(
        &mut self,
        outcome: EndOutcome,
        send_letter: bool,
        play_sound: bool,
        env: &mut QuestEnv<'_>,
    ) -> Result<(), DomainError> {
        let state = self.state();
        if state.is_historical() {
            let err = DomainError::InvalidState {
                quest_id: self.id,
                operation: "end",
                state: state.as_str(),
            };
            tracing::error!(quest_id = %self.id, error = %err, "end skipped");
            return Err(err);
        }
        let lapsed_offer = self.acceptance_tick < 0 && self.ticks_until_acceptance_expiry == 0;
        let look_targets = self.look_targets();
        self.ended = true;
        self.end_outcome = outcome;
        tracing::info!(quest_id = %self.id, outcome = outcome.as_str(), "quest ended");
        env.notifier.quest_ended(self.id, outcome.as_str());
        self.cleanup_quest_parts(env);
        if send_letter && !lapsed_offer && !self.hidden {
            env.notifier
                .send_letter(self.outcome_letter(outcome, look_targets, play_sound));
        }
        Ok(())
    }

    fn outcome_letter(
        &self,
        outcome: EndOutcome,
        look_targets: Vec<EntityHandle>,
        play_sound: bool,
    ) -> Letter {
        let (title, body, severity) = match outcome {
            EndOutcome::Success => (
                format!("Quest completed: {}", self.name),
                format!("The quest \"{}\" has been completed.", self.name),
                LetterSeverity::Positive,
            ),
            EndOutcome::Fail => (
                format!("Quest failed: {}", self.name),
                format!("The quest \"{}\" has failed.", self.name),
                LetterSeverity::Negative,
            ),
            EndOutcome::Unknown | EndOutcome::InvalidPreAcceptance => (
                format!("Quest ended: {}", self.name),
                format!("The quest \"{}\" has ended.", self.name),
                LetterSeverity::Neutral,
            ),
        };
        Letter {
            quest_id: self.id,
            title,
            body,
            severity,
            look_targets,
            play_sound,
        }
    }

    /// Per-tick entry point. Never propagates part faults.
    ///
    /// Historical quests only finish cleanup and, once the garbage horizon
    /// has passed, drop their parts. Open offers count down their expiry.
    /// Otherwise every Enabled activable part ticks in insertion order until
    /// the quest becomes historical.
    pub fn quest_tick(&mut self, env: &mut QuestEnv<'_>) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.is_historical() {
            if !self.cleaned_up {
                report.merge(self.cleanup_quest_parts(env));
            } else if !self.parts.is_empty()
                && env.tick - self.cleanup_tick >= GARBAGE_HORIZON_TICKS
            {
                self.drop_parts();
            }
            return report;
        }

        if self.ticks_until_acceptance_expiry > 0 && self.state() == QuestState::NotYetAccepted {
            self.ticks_until_acceptance_expiry -= 1;
            if self.ticks_until_acceptance_expiry == 0 {
                tracing::info!(quest_id = %self.id, "quest offer expired");
                report.merge(self.cleanup_quest_parts(env));
                return report;
            }
        }

        let quest_id = self.id;
        for index in 0..self.parts.len() {
            let state = self.state();
            if state.is_historical() {
                break;
            }
            let Some(part) = self.parts.get_mut(index) else {
                break;
            };
            if !part.activable().is_some_and(Activable::is_enabled) {
                continue;
            }
            let site = site_of(quest_id, &**part);
            let mut ctx = PartContext::new(quest_id, site.part_id, state, env);
            report.record(guarded(site, Hook::Tick, || part.tick(&mut ctx)));
            let requests = ctx.into_requests();
            self.apply_requests(requests, env);
        }
        report
    }

    /// Inbound signal entry point. Never propagates part faults.
    ///
    /// Irrelevant signals are ignored. Each part's listen mode is checked
    /// against the quest state at the moment that part's turn comes.
    pub fn notify_signal_received(
        &mut self,
        signal: &Signal,
        env: &mut QuestEnv<'_>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        if !signal.is_relevant_to(self.id) {
            return report;
        }
        let quest_id = self.id;
        for index in 0..self.parts.len() {
            let state = self.state();
            let Some(part) = self.parts.get_mut(index) else {
                break;
            };
            if !part.base().listen_mode.permits(state) {
                continue;
            }
            let disabled = part
                .activable_mut()
                .is_some_and(|activable| activable.handle_control_signal(signal, env.tick));
            if disabled {
                tracing::debug!(quest_id = %quest_id, tag = signal.tag(), "part disabled by signal");
            }
            let site = site_of(quest_id, &**part);
            let mut ctx = PartContext::new(quest_id, site.part_id, state, env);
            report.record(guarded(site, Hook::Signal, || part.on_signal(signal, &mut ctx)));
            let requests = ctx.into_requests();
            self.apply_requests(requests, env);
        }
        report
    }

    /// One-shot cleanup: pre-cleanup then cleanup across all parts.
    /// Later calls do nothing.
    pub fn cleanup_quest_parts(&mut self, env: &mut QuestEnv<'_>) -> DispatchReport {
        if self.cleaned_up {
            return DispatchReport::default();
        }
        self.cleaned_up = true;
        self.cleanup_tick = env.tick;
        let mut report = self.run_pass(Hook::PreCleanup, env);
        report.merge(self.run_pass(Hook::Cleanup, env));
        let state = self.state();
        env.notifier.quest_cleaned_up(self.id, state.as_str());
        if self.hide_on_cleanup {
            self.hidden_in_ui = true;
        }
        tracing::info!(
            quest_id = %self.id,
            tick = env.tick,
            state = state.as_str(),
            faults = report.faults.len(),
            "quest parts cleaned up"
        );
        report
    }

    fn drop_parts(&mut self) {
        for part in &mut self.parts {
            part.base_mut().detach();
        }
        let dropped = self.parts.len();
        self.parts.clear();
        tracing::info!(quest_id = %self.id, dropped, "garbage horizon reached; parts dropped");
    }

    fn run_pass(&mut self, hook: Hook, env: &mut QuestEnv<'_>) -> DispatchReport {
        let mut report = DispatchReport::default();
        let quest_id = self.id;
        for index in 0..self.parts.len() {
            let state = self.state();
            let Some(part) = self.parts.get_mut(index) else {
                break;
            };
            let site = site_of(quest_id, &**part);
            let mut ctx = PartContext::new(quest_id, site.part_id, state, env);
            report.record(guarded(site, hook, || match hook {
                Hook::PreAccept => part.pre_accept(&mut ctx),
                Hook::PreCleanup => part.pre_cleanup(&mut ctx),
                Hook::Cleanup => part.cleanup(&mut ctx),
                Hook::Tick => part.tick(&mut ctx),
                Hook::Signal => Ok(()),
            }));
            let requests = ctx.into_requests();
            self.apply_requests(requests, env);
        }
        report
    }

    fn apply_requests(&mut self, requests: Vec<QuestRequest>, env: &mut QuestEnv<'_>) {
        for request in requests {
            match request {
                QuestRequest::End {
                    outcome,
                    send_letter,
                } => {
                    // Already logged by `end` when the quest is historical.
                    let _ = self.end(outcome, send_letter, true, env);
                }
                QuestRequest::GenerateSubquest { script } => {
                    tracing::debug!(quest_id = %self.id, %script, "subquest requested");
                    self.pending_subquests.push(script);
                }
            }
        }
    }

    /// Drains subquest scripts requested by parts since the last call.
    pub fn take_subquest_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_subquests)
    }

    // --- entity references ---

    /// An entity was removed from the world. Clears the accepter (keeping
    /// `label` as its fallback) and lets every part drop its references.
    pub fn notify_entity_discarded(&mut self, entity: EntityHandle, label: Option<&str>) {
        if self.accepter == Some(entity) {
            self.accepter = None;
            self.accepter_label = Some(label.unwrap_or("someone").to_owned());
        }
        for part in &mut self.parts {
            part.on_entity_discarded(entity);
        }
    }

    /// Whether any part reserves the entity. Always `false` once historical.
    #[must_use]
    pub fn quest_reserves(&self, entity: EntityHandle) -> bool {
        if self.is_historical() {
            return false;
        }
        self.parts.iter().any(|part| part.reserves(entity))
    }

    // --- aggregate views ---

    /// Look targets across parts, deduplicated, in part order.
    #[must_use]
    pub fn look_targets(&self) -> Vec<EntityHandle> {
        dedup(self.parts.iter().flat_map(|part| part.look_targets()))
    }

    /// Select targets across parts, deduplicated, in part order.
    #[must_use]
    pub fn select_targets(&self) -> Vec<EntityHandle> {
        dedup(self.parts.iter().flat_map(|part| part.select_targets()))
    }

    /// Factions involved across parts, deduplicated, in part order.
    #[must_use]
    pub fn involved_factions(&self) -> Vec<EntityHandle> {
        dedup(self.parts.iter().flat_map(|part| part.involved_factions()))
    }

    /// Inspect-pane lines for `target`, one per contributing part.
    #[must_use]
    pub fn inspect_strings(&self, target: EntityHandle) -> Vec<String> {
        self.parts
            .iter()
            .filter_map(|part| part.inspect_string(target))
            .collect()
    }

    /// Whether any part affects population.
    #[must_use]
    pub fn affects_population(&self) -> bool {
        self.parts.iter().any(|part| part.affects_population())
    }

    /// Seeds debug data on every part.
    pub fn assign_debug_data(&mut self) {
        for part in &mut self.parts {
            part.assign_debug_data();
        }
    }

    /// Lazy incident schedules from every threat-generating part. Empty once
    /// the quest is historical.
    #[must_use]
    pub fn incident_schedules(&self, from_tick: i64) -> Vec<IncidentSchedule> {
        if self.is_historical() {
            return Vec::new();
        }
        self.parts
            .iter()
            .filter_map(|part| part.incident_schedule(self.id, from_tick))
            .collect()
    }

    /// Phase one of loading with a factory for custom part kinds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` for an unsupported record version
    /// or a custom part kind the factory does not know.
    pub fn from_record_with(
        record: QuestRecord,
        factory: &dyn CustomPartFactory,
    ) -> Result<Self, DomainError> {
        if record.version > Self::RECORD_VERSION {
            return Err(DomainError::Serialization(format!(
                "quest record version {} is newer than supported {}",
                record.version,
                Self::RECORD_VERSION
            )));
        }
        let mut quest = Quest {
            id: record.id,
            name: record.name,
            description: record.description,
            points: record.points,
            tags: record.tags,
            script: record.script,
            appearance_tick: record.appearance_tick,
            acceptance_tick: record.acceptance_tick,
            ticks_until_acceptance_expiry: record.ticks_until_acceptance_expiry,
            initially_accepted: record.initially_accepted,
            dismissed: record.dismissed,
            hidden: record.hidden,
            hide_on_cleanup: record.hide_on_cleanup,
            hidden_in_ui: record.hidden_in_ui,
            ended: record.ended,
            end_outcome: record.end_outcome,
            cleaned_up: record.cleaned_up,
            cleanup_tick: record.cleanup_tick,
            parent: record.parent,
            accepter: record.accepter,
            accepter_label: record.accepter_label,
            added_signal_sent: record.added_signal_sent,
            initiate_signal_sent: record.initiate_signal_sent,
            next_part_id: record.next_part_id,
            parts: Vec::with_capacity(record.parts.len()),
            pending_subquests: record.pending_subquests,
        };
        for slot in record.parts {
            if quest.part(slot.id).is_some() {
                return Err(DomainError::Serialization(format!(
                    "{} stores {} twice",
                    quest.id, slot.id
                )));
            }
            let mut part = slot.part.into_part(factory)?;
            part.base_mut().attach(quest.id, slot.id);
            quest.next_part_id = quest.next_part_id.max(slot.id.0.saturating_add(1));
            quest.parts.push(part);
        }
        Ok(quest)
    }
}

impl PersistentAggregate for Quest {
    type Record = QuestRecord;

    const RECORD_VERSION: u32 = 2;

    fn to_record(&self) -> QuestRecord {
        QuestRecord {
            version: Self::RECORD_VERSION,
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            points: self.points,
            tags: self.tags.clone(),
            script: self.script.clone(),
            appearance_tick: self.appearance_tick,
            acceptance_tick: self.acceptance_tick,
            ticks_until_acceptance_expiry: self.ticks_until_acceptance_expiry,
            initially_accepted: self.initially_accepted,
            dismissed: self.dismissed,
            hidden: self.hidden,
            hide_on_cleanup: self.hide_on_cleanup,
            hidden_in_ui: self.hidden_in_ui,
            ended: self.ended,
            end_outcome: self.end_outcome,
            cleaned_up: self.cleaned_up,
            cleanup_tick: self.cleanup_tick,
            parent: self.parent,
            accepter: self.accepter,
            accepter_label: self.accepter_label.clone(),
            added_signal_sent: self.added_signal_sent,
            initiate_signal_sent: self.initiate_signal_sent,
            pending_subquests: self.pending_subquests.clone(),
            next_part_id: self.next_part_id,
            parts: self
                .parts
                .iter()
                .map(|part| PartSlot {
                    id: attached_id(&**part),
                    part: part.to_record(),
                })
                .collect(),
        }
    }

    fn from_record(record: QuestRecord) -> Result<Self, DomainError> {
        Self::from_record_with(record, &NoCustomParts)
    }

    fn resolve_references(&mut self, resolver: &mut ReferenceResolver<'_>) {
        if self
            .accepter
            .is_some_and(|accepter| resolver.resolve(accepter).is_none())
        {
            self.accepter = None;
            self.accepter_label.get_or_insert_with(|| "someone".to_owned());
        }
        for part in &mut self.parts {
            part.resolve_references(resolver);
        }
    }
}

fn site_of(quest_id: QuestId, part: &dyn QuestPart) -> PartSite {
    PartSite {
        quest_id,
        part_id: attached_id(part),
        kind: part.kind(),
    }
}

/// Owned parts always carry an id.
fn attached_id(part: &dyn QuestPart) -> PartId {
    part.base().id().unwrap_or(PartId(u32::MAX))
}

fn dedup(handles: impl Iterator<Item = EntityHandle>) -> Vec<EntityHandle> {
    let mut seen = BTreeSet::new();
    handles.filter(|handle| seen.insert(*handle)).collect()
}
