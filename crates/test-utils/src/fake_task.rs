use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use assetkiln::errors::KilnError;
use assetkiln::task::{Task, TaskFuture};

/// What a [`FakeTask`] did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Started(String),
    Finished(String),
    Failed(String),
}

/// Shared, ordered record of task events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TaskEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: TaskEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn position(&self, event: &TaskEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn started_at(&self, name: &str) -> Option<usize> {
        self.position(&TaskEvent::Started(name.to_string()))
    }

    /// Index of the event that ended `name`'s first run (finished or failed).
    pub fn ended_at(&self, name: &str) -> Option<usize> {
        self.events().iter().position(|e| {
            matches!(e, TaskEvent::Finished(n) | TaskEvent::Failed(n) if n == name)
        })
    }

    pub fn starts_of(&self, name: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, TaskEvent::Started(n) if n == name))
            .count()
    }

    /// Poll until `name` has been started `count` times.
    pub async fn wait_for_starts(&self, name: &str, count: usize) {
        while self.starts_of(name) < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// A task that only records its start and end in an [`EventLog`].
#[derive(Debug, Clone)]
pub struct FakeTask {
    name: String,
    log: EventLog,
    delay: Duration,
    fail: bool,
    runs: Arc<AtomicUsize>,
}

impl FakeTask {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            delay: Duration::ZERO,
            fail: false,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn arc(self) -> Arc<dyn Task> {
        Arc::new(self)
    }
}

impl Task for FakeTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> TaskFuture {
        let this = self.clone();
        Box::pin(async move {
            this.runs.fetch_add(1, Ordering::SeqCst);
            this.log.push(TaskEvent::Started(this.name.clone()));
            if !this.delay.is_zero() {
                tokio::time::sleep(this.delay).await;
            }
            if this.fail {
                this.log.push(TaskEvent::Failed(this.name.clone()));
                return Err(KilnError::Other(anyhow!("{} failed on purpose", this.name)));
            }
            this.log.push(TaskEvent::Finished(this.name.clone()));
            Ok(())
        })
    }
}
