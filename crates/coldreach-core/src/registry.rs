//! Run Registry: in-flight and finished runs keyed by id.
//!
//! The map lock is only taken for synchronous bookkeeping. Runs are checked
//! out (marked busy) while a stage or decision is being applied, which is
//! what keeps two concurrent decisions from both reaching the send stage.
//!
//! A checkout is released when its [`Checkout`] guard drops, even if the
//! future driving the run is cancelled. A run interrupted mid-flight is
//! failed rather than left half-way through a stage.
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use uuid::Uuid;

use crate::data_model::{ApprovalDecision, RunInput, WorkflowRun};
use crate::error::{WorkflowError, WorkflowResult};
use crate::runner::{RunObserver, WorkflowController};
use crate::state::RunState;

/// Finished runs kept before the oldest are evicted.
pub const DEFAULT_RETAINED_RUNS: usize = 1000;

struct Slot {
    run: WorkflowRun,
    busy: bool,
    finished: bool,
}

impl Slot {
    fn new(run: WorkflowRun, busy: bool) -> Self {
        Self {
            run,
            busy,
            finished: false,
        }
    }
}

#[derive(Default)]
struct Table {
    slots: HashMap<Uuid, Slot>,
    finished: VecDeque<Uuid>,
}

pub struct RunRegistry {
    runs: Mutex<Table>,
    retain_finished: usize,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_RUNS)
    }
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `retain_finished` terminal runs; older ones are evicted
    /// as new runs finish. Runs still in flight or at the gate are never
    /// evicted.
    pub fn with_retention(retain_finished: usize) -> Self {
        Self {
            runs: Mutex::new(Table::default()),
            retain_finished,
        }
    }

    pub fn len(&self) -> usize {
        self.runs.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().slots.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<WorkflowRun> {
        self.runs.lock().slots.get(&id).map(|slot| slot.run.clone())
    }

    pub fn is_busy(&self, id: Uuid) -> bool {
        self.runs
            .lock()
            .slots
            .get(&id)
            .map(|slot| slot.busy)
            .unwrap_or(false)
    }

    /// Store a run that nobody is working on.
    pub fn insert(&self, run: WorkflowRun) {
        let id = run.id();
        let mut table = self.runs.lock();
        table.slots.insert(id, Slot::new(run, false));
        self.settle(&mut table, id);
    }

    /// Forget a run. Work still in flight for it is discarded on completion.
    pub fn abandon(&self, id: Uuid) -> WorkflowResult<WorkflowRun> {
        self.runs
            .lock()
            .slots
            .remove(&id)
            .map(|slot| slot.run)
            .ok_or(WorkflowError::RunNotFound(id))
    }

    /// Validate `input` and register the new run as busy.
    pub fn admit(
        &self,
        controller: &WorkflowController,
        input: RunInput,
    ) -> WorkflowResult<WorkflowRun> {
        let run = controller.prepare(input)?;
        self.runs
            .lock()
            .slots
            .insert(run.id(), Slot::new(run.clone(), true));
        Ok(run)
    }

    /// Drive an admitted run to the approval gate and check it back in.
    ///
    /// The run is owned by the returned future from the moment this is
    /// called, so dropping it unpolled still releases the run.
    pub fn execute<'a>(
        &'a self,
        controller: &'a WorkflowController,
        mut run: WorkflowRun,
    ) -> impl Future<Output = WorkflowRun> + Send + 'a {
        let checkout = Checkout {
            registry: self,
            id: run.id(),
            returned: false,
        };
        async move {
            controller.drive(&mut run, self).await;
            checkout.check_in(&run);
            run
        }
    }

    /// `admit` followed by `execute`.
    pub async fn submit(
        &self,
        controller: &WorkflowController,
        input: RunInput,
    ) -> WorkflowResult<WorkflowRun> {
        let run = self.admit(controller, input)?;
        Ok(self.execute(controller, run).await)
    }

    /// Apply an operator decision to a stored run.
    ///
    /// The run is checked out when this is called, not when the future is
    /// first polled.
    pub fn decide<'a>(
        &'a self,
        controller: &'a WorkflowController,
        id: Uuid,
        decision: ApprovalDecision,
    ) -> impl Future<Output = WorkflowResult<WorkflowRun>> + Send + 'a {
        let checked_out = self.check_out(id);
        async move {
            let (checkout, mut run) = checked_out?;
            let result = controller.decide(&mut run, decision, self).await;
            checkout.check_in(&run);
            result.map(|()| run)
        }
    }

    fn check_out(&self, id: Uuid) -> WorkflowResult<(Checkout<'_>, WorkflowRun)> {
        let mut table = self.runs.lock();
        let slot = table.slots.get_mut(&id).ok_or(WorkflowError::RunNotFound(id))?;
        if slot.busy {
            return Err(WorkflowError::RunBusy(id));
        }
        slot.busy = true;
        let run = slot.run.clone();
        Ok((
            Checkout {
                registry: self,
                id,
                returned: false,
            },
            run,
        ))
    }

    fn store(&self, run: &WorkflowRun) {
        let mut table = self.runs.lock();
        match table.slots.get_mut(&run.id()) {
            Some(slot) => {
                slot.run = run.clone();
                slot.busy = false;
            }
            None => {
                tracing::debug!(run_id = %run.id(), "run was abandoned; dropping result");
                return;
            }
        }
        self.settle(&mut table, run.id());
    }

    /// Release a checkout whose work never came back. The slot already holds
    /// the last snapshot the controller reported.
    fn release_interrupted(&self, id: Uuid) {
        let mut table = self.runs.lock();
        let Some(slot) = table.slots.get_mut(&id) else {
            return;
        };
        slot.busy = false;
        let state = slot.run.state();
        if !state.is_terminal() && state != RunState::AwaitingApproval {
            tracing::warn!(run_id = %id, state = %state, "run interrupted; marking it failed");
            slot.run.fail(format!("RUN/interrupted while {}", state));
        }
        self.settle(&mut table, id);
    }

    fn settle(&self, table: &mut Table, id: Uuid) {
        let Some(slot) = table.slots.get_mut(&id) else {
            return;
        };
        if slot.finished || !slot.run.state().is_terminal() {
            return;
        }
        slot.finished = true;
        table.finished.push_back(id);

        while table.finished.len() > self.retain_finished {
            if let Some(old) = table.finished.pop_front() {
                if table.slots.remove(&old).is_some() {
                    tracing::debug!(run_id = %old, "evicted finished run");
                }
            }
        }
    }
}

/// A run checked out of the registry.
struct Checkout<'a> {
    registry: &'a RunRegistry,
    id: Uuid,
    returned: bool,
}

impl Checkout<'_> {
    fn check_in(mut self, run: &WorkflowRun) {
        self.returned = true;
        self.registry.store(run);
    }
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        if !self.returned {
            self.registry.release_interrupted(self.id);
        }
    }
}

impl RunObserver for RunRegistry {
    fn on_update(&self, run: &WorkflowRun) {
        if let Some(slot) = self.runs.lock().slots.get_mut(&run.id()) {
            slot.run = run.clone();
        }
    }
}
