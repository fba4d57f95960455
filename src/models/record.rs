use serde::{Deserialize, Serialize};

use super::proposal::{Explanation, Proposal};

/// 持久化的历史记录
///
/// `id` 和 `timestamp` 由存储端分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    /// 部分历史服务用毫秒时间戳作为数字 id，统一转成字符串
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub proposal: Option<Proposal>,
    #[serde(default)]
    pub explanations: Vec<Explanation>,
    #[serde(default)]
    pub guidance: String,
    #[serde(default)]
    pub budget_plan: String,
    #[serde(default)]
    pub timestamp: String,
}

impl WorkflowRecord {
    /// 四个部分是否全部存在
    pub fn is_complete(&self) -> bool {
        self.proposal.is_some()
            && !self.explanations.is_empty()
            && !self.guidance.is_empty()
            && !self.budget_plan.is_empty()
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// 待创建的记录（不含 id / timestamp）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    pub requirements: String,
    pub proposal: Option<Proposal>,
    pub explanations: Vec<Explanation>,
    pub guidance: String,
    pub budget_plan: String,
}

impl NewRecord {
    pub fn into_record(self, id: impl Into<String>, timestamp: impl Into<String>) -> WorkflowRecord {
        WorkflowRecord {
            id: id.into(),
            title: self.title,
            requirements: self.requirements,
            proposal: self.proposal,
            explanations: self.explanations,
            guidance: self.guidance,
            budget_plan: self.budget_plan,
            timestamp: timestamp.into(),
        }
    }
}
