use super::entity::EntityId;
use super::overlay::{CgPayload, DialogueId, PresentationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Lifetime a deferred task is tied to. Cancelling by owner drops every task
/// the owner scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskOwner {
    Engine,
    Session,
    Scene(String),
    Entity(EntityId),
}

/// One-shot work that fires on a later tick. Each variant carries what it
/// needs to re-check its trigger condition when it fires.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredTask {
    DismissCg(PresentationId),
    DismissDialogue(DialogueId),
    PresentWhenCollected {
        required: Vec<String>,
        payload: CgPayload,
    },
    ShowDialogue(String),
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    handle: TaskHandle,
    due_at_ms: f64,
    owner: TaskOwner,
    task: DeferredTask,
}

#[derive(Debug, Default)]
pub struct TaskScheduler {
    pending: Vec<ScheduledTask>,
    next_handle: u64,
}

impl TaskScheduler {
    pub fn schedule(
        &mut self,
        now_ms: f64,
        delay_ms: f64,
        owner: TaskOwner,
        task: DeferredTask,
    ) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.pending.push(ScheduledTask {
            handle,
            due_at_ms: now_ms + delay_ms.max(0.0),
            owner,
            task,
        });
        handle
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|scheduled| scheduled.handle != handle);
        self.pending.len() != before
    }

    pub fn cancel_owned_by(&mut self, owner: &TaskOwner) -> usize {
        let before = self.pending.len();
        self.pending.retain(|scheduled| &scheduled.owner != owner);
        before - self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Removes and returns every task due at `now_ms`, earliest first; equal
    /// due times keep scheduling order.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<(TaskHandle, DeferredTask)> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due_at_ms <= now_ms {
                due.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by(|a, b| {
            a.due_at_ms
                .total_cmp(&b.due_at_ms)
                .then(a.handle.cmp(&b.handle))
        });
        due.into_iter()
            .map(|scheduled| (scheduled.handle, scheduled.task))
            .collect()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|scheduled| scheduled.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|scheduled| scheduled.due_at_ms)
            .min_by(f64::total_cmp)
    }
}
