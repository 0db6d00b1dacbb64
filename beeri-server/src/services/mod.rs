//! Outbound integrations: web push delivery, the LLM assistant and file
//! storage for uploads.

pub mod assistant;
pub mod push;
pub mod uploads;

pub use assistant::{AssistantClient, AssistantError, AssistantReply};
pub use push::{fan_out, FanOutReport, NoopPushSender, PushError, PushSender, PushTarget, VapidPushSender};
pub use uploads::{StoredFile, UploadError, UploadStore};
