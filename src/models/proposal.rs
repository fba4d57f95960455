use serde::{Deserialize, Serialize};

/// 草稿阶段产出的提案
///
/// 同一次流程内创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub introduction: String,
    /// 要点列表，顺序即解释顺序
    #[serde(
        rename = "point_of_view",
        alias = "key_points",
        alias = "keyPoints",
        default,
        deserialize_with = "deserialize_points"
    )]
    pub key_points: Vec<String>,
}

impl Proposal {
    pub fn new(
        title: impl Into<String>,
        introduction: impl Into<String>,
        key_points: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self {
            title: title.into(),
            introduction: introduction.into(),
            key_points: clean_points(key_points),
        }
    }
}

/// 单个要点的解释
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub point: String,
    #[serde(default)]
    pub explanation: String,
}

impl Explanation {
    pub fn new(point: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            point: point.into(),
            explanation: explanation.into(),
        }
    }
}

// ========== 阶段请求 ==========

#[derive(Debug, Clone, Serialize)]
pub struct DraftRequest {
    pub requirements: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplainRequest {
    pub title: String,
    pub introduction: String,
    pub point: String,
}

impl ExplainRequest {
    pub fn for_point(proposal: &Proposal, point: &str) -> Self {
        Self {
            title: proposal.title.clone(),
            introduction: proposal.introduction.clone(),
            point: point.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GuidanceRequest {
    pub title: String,
    pub table_of_contents: Vec<String>,
}

impl GuidanceRequest {
    pub fn from_proposal(proposal: &Proposal) -> Self {
        Self {
            title: proposal.title.clone(),
            table_of_contents: proposal.key_points.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetRequest {
    pub title: String,
    pub table_of_contents: Vec<String>,
    /// 只保留解释正文，去掉要点标签
    pub explanations: Vec<String>,
    pub timeline: String,
}

impl BudgetRequest {
    pub fn new(proposal: &Proposal, explanations: &[Explanation], guidance: &str) -> Self {
        Self {
            title: proposal.title.clone(),
            table_of_contents: proposal.key_points.clone(),
            explanations: explanations.iter().map(|e| e.explanation.clone()).collect(),
            timeline: guidance.to_string(),
        }
    }
}

// ========== 要点清洗 ==========

/// 去掉项目符号和首尾空白，丢弃空要点
fn clean_points(points: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    points
        .into_iter()
        .map(|p| strip_bullet(p.as_ref()).to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// `•` 总是项目符号；`-` 和 `*` 后面必须跟空白才算
fn strip_bullet(point: &str) -> &str {
    let trimmed = point.trim();
    if let Some(rest) = trimmed.strip_prefix('•') {
        return rest.trim_start();
    }
    for marker in ['-', '*'] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }
    trimmed
}

// 要点既可能是数组，也可能是按行分隔的字符串
fn deserialize_points<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{SeqAccess, Visitor};
    use std::fmt;

    struct PointsVisitor;

    impl<'de> Visitor<'de> for PointsVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a list of points or a newline separated string")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(clean_points(value.lines()))
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut raw = Vec::new();
            while let Some(point) = seq.next_element::<String>()? {
                raw.push(point);
            }
            Ok(clean_points(raw))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(PointsVisitor)
}
