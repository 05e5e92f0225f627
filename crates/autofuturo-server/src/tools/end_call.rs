use super::Tool;
use async_trait::async_trait;
use autofuturo_types::{ToolContext, ToolDefinition};
use autofuturo_voice::CallControl;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub const NAME: &str = "end_call";

pub const CALL_ENDED: &str = "llamada terminada exitosamente";

/// Hang-ups still waiting out their grace period.
///
/// Clones share the same set, so the server can drain what the tool
/// scheduled before it exits.
#[derive(Clone, Default)]
pub struct PendingHangups {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl std::fmt::Debug for PendingHangups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingHangups")
            .field("len", &self.len())
            .finish()
    }
}

impl PendingHangups {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        // Reap finished hang-ups so the set only holds live ones.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Number of hang-ups not reaped yet.
    pub fn len(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits until every scheduled hang-up has run.
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if !tasks.is_empty() {
            info!(pending = tasks.len(), "waiting for pending hang-ups");
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "hang-up task did not complete");
            }
        }
    }
}

/// Ends the call once the farewell has had time to play.
///
/// The room is deleted on a background task so the model can still speak the
/// farewell while the grace period runs. The task is tracked in
/// [`PendingHangups`].
pub struct EndCallTool {
    calls: Arc<dyn CallControl>,
    grace: Duration,
    pending: PendingHangups,
}

impl EndCallTool {
    pub fn new(calls: Arc<dyn CallControl>, grace: Duration, pending: PendingHangups) -> Self {
        Self {
            calls,
            grace,
            pending,
        }
    }
}

#[async_trait]
impl Tool for EndCallTool {
    fn name(&self) -> &str {
        NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: NAME.to_string(),
            description: "Called when the user wants to end the call or when the conversation \
is complete"
                .to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(&self, ctx: &ToolContext, _args: &Value) -> String {
        let Some(room) = ctx.room_name.clone() else {
            info!("end_call outside of a job, nothing to hang up");
            return CALL_ENDED.to_string();
        };

        info!(room = %room, grace_ms = self.grace.as_millis() as u64, "scheduling hang-up");
        let calls = Arc::clone(&self.calls);
        let grace = self.grace;
        self.pending.spawn(async move {
            tokio::time::sleep(grace).await;
            if let Err(e) = calls.hang_up(&room).await {
                error!(room = %room, error = %e, "failed to delete room");
            }
        });

        CALL_ENDED.to_string()
    }
}
