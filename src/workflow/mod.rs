pub mod controller;
pub mod session;

pub use controller::{StepOutcome, WorkflowController};
pub use session::{Progress, WorkflowSession, WorkflowStage};
