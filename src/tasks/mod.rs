//! Task identity, lifecycle record, and wire-facing submission types.

mod record;
mod submit;

pub use record::{FailureInfo, TaskId, TaskSnapshot, TaskStatus};
pub use submit::{Mode, SubmitReply, SubmitRequest};

pub(crate) use record::TaskRecord;
