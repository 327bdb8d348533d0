use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use stylesync::dag::ScheduledTask;
use stylesync::engine::{RuntimeEvent, TaskOutcome};
use stylesync::errors::Result;
use stylesync::exec::TaskExecutor;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were dispatched, in order
/// - reports `ServiceStarted` for tasks registered as services
/// - reports `TaskCompleted(Success)` for everything else.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    services: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            services: HashSet::new(),
        }
    }

    /// Dispatches of `name` report readiness instead of completion, like a
    /// real long-lived service.
    pub fn with_service(mut self, name: &str) -> Self {
        self.services.insert(name.to_string());
        self
    }
}

impl TaskExecutor for FakeExecutor {
    fn dispatch(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let services = self.services.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.name.clone());
                }

                let event = if services.contains(&t.name) {
                    RuntimeEvent::ServiceStarted {
                        task: t.name.clone(),
                    }
                } else {
                    RuntimeEvent::TaskCompleted {
                        task: t.name.clone(),
                        outcome: TaskOutcome::Success,
                    }
                };

                tx.send(event).await.map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
