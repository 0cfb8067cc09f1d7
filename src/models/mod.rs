pub use assignment::{Assignment, AssignmentDraft, AssignmentPayload};
pub use submission::{SubmitOutcome, Submission};
pub use user::User;

pub mod assignment;
mod submission;
mod user;
