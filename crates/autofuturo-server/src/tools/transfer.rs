use super::Tool;
use async_trait::async_trait;
use autofuturo_types::{ToolContext, ToolDefinition};
use autofuturo_voice::CallControl;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const NAME: &str = "transfer_call";

/// Returned once the SIP transfer has been accepted.
pub const TRANSFER_STARTED: &str = "transferencia iniciada";

/// Returned when there is no line or no caller to transfer.
pub const TRANSFER_UNAVAILABLE: &str = "No es posible transferir la llamada en este momento. \
Ofrece al cliente que un asesor le devuelva la llamada.";

/// Returned when the transfer request fails.
pub const TRANSFER_FAILED: &str = "Lo siento, no pude transferir la llamada. Ofrece al cliente \
que un asesor le devuelva la llamada en unos minutos.";

/// Hands the caller over to a human line.
pub struct TransferCallTool {
    calls: Arc<dyn CallControl>,
    transfer_to: Option<String>,
}

impl TransferCallTool {
    pub fn new(calls: Arc<dyn CallControl>, transfer_to: Option<String>) -> Self {
        Self { calls, transfer_to }
    }
}

#[async_trait]
impl Tool for TransferCallTool {
    fn name(&self) -> &str {
        NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: NAME.to_string(),
            description: "Transfiere la llamada a un asesor humano cuando el usuario lo solicite."
                .to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(&self, ctx: &ToolContext, _args: &Value) -> String {
        let (Some(transfer_to), Some(room), Some(participant)) = (
            self.transfer_to.as_deref(),
            ctx.room_name.as_deref(),
            ctx.participant_identity.as_deref(),
        ) else {
            warn!(room = ?ctx.room_name, "transfer requested without target, room or participant");
            return TRANSFER_UNAVAILABLE.to_string();
        };

        match self.calls.transfer(room, participant, transfer_to).await {
            Ok(()) => {
                info!(room, participant, "call transferred");
                TRANSFER_STARTED.to_string()
            }
            Err(e) => {
                error!(room, participant, error = %e, "call transfer failed");
                TRANSFER_FAILED.to_string()
            }
        }
    }
}
