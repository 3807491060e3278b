//! WebSocket frame codec for the job updates endpoint.
//!
//! Client → server: `{"type":"subscribe","job_id":"..."}` and the matching
//! `unsubscribe`.
//! Server → client: `{"type":"job_update","data":{...}}`; the update fields
//! may also be inlined next to `type`.

use serde::Serialize;
use serde_json::Value;

use tellmemo_core::JobId;

use crate::update::{DecodeError, JobUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe { job_id: JobId },
    Unsubscribe { job_id: JobId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    JobUpdate(JobUpdate),
    /// Any frame type this client does not consume.
    Other(String),
}

pub fn decode_server_frame(text: &str) -> Result<ServerFrame, DecodeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let Value::Object(mut obj) = value else {
        return Err(DecodeError::Malformed("frame must be a JSON object".into()));
    };

    let kind = match obj.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(DecodeError::MissingField("type")),
    };

    match kind.as_str() {
        "job_update" => {
            let payload = match obj.remove("data") {
                Some(data) => data,
                None => Value::Object(obj),
            };
            JobUpdate::from_value(payload).map(ServerFrame::JobUpdate)
        }
        _ => Ok(ServerFrame::Other(kind)),
    }
}
