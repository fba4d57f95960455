use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 四个有序的生成阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Draft,
    Explain,
    Guidance,
    Budget,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [
        StageKind::Draft,
        StageKind::Explain,
        StageKind::Guidance,
        StageKind::Budget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Draft => "draft",
            StageKind::Explain => "explain",
            StageKind::Guidance => "guidance",
            StageKind::Budget => "budget",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 订阅等级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => f.write_str("free"),
            Tier::Pro => f.write_str("pro"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            other => Err(format!("未知的套餐等级: {}", other)),
        }
    }
}
