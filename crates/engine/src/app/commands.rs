use std::collections::VecDeque;

use super::event_bus::Event;
use super::overlay::CgPayload;
use super::timers::{DeferredTask, TaskOwner};

/// Engine-level requests queued by entities and bus handlers during a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Publish { channel: String, event: Event },
    ShowDialogue(String),
    PresentCg(CgPayload),
    DismissCg,
    Schedule {
        delay_ms: f64,
        owner: TaskOwner,
        task: DeferredTask,
    },
    CancelTasks(TaskOwner),
    SetScene(String),
    UseItem(String),
    UseItemAt(usize),
    Stop,
}

/// FIFO command sink. The engine drains it after scene and global updates,
/// and after every direct publish.
#[derive(Debug, Default)]
pub struct Commands {
    queue: VecDeque<Command>,
}

impl Commands {
    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    pub fn publish(&mut self, channel: &str, event: Event) {
        self.push(Command::Publish {
            channel: channel.to_string(),
            event,
        });
    }

    pub fn schedule(&mut self, delay_ms: f64, owner: TaskOwner, task: DeferredTask) {
        self.push(Command::Schedule {
            delay_ms,
            owner,
            task,
        });
    }

    /// Drops the owner's pending tasks, including ones queued earlier this
    /// drain.
    pub fn cancel_tasks(&mut self, owner: TaskOwner) {
        self.push(Command::CancelTasks(owner));
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.queue.iter()
    }
}
