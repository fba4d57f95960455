pub mod agent_client;
pub mod history_client;

pub use agent_client::{HttpAgentClient, StageAgents};
pub use history_client::HttpHistoryStore;
