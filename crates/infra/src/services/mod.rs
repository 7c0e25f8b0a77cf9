pub mod google_calendar;
pub mod push;

pub use push::{HttpPushSender, IPushSender, PushOutcome, PushPayload, StubPushSender};
