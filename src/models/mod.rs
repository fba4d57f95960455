pub mod proposal;
pub mod record;
pub mod stage;

pub use proposal::{
    BudgetRequest, DraftRequest, Explanation, ExplainRequest, GuidanceRequest, Proposal,
};
pub use record::{NewRecord, WorkflowRecord};
pub use stage::{StageKind, Tier};
