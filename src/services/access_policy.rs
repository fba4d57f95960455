//! 访问策略 - 业务能力层
//!
//! 静态表：订阅等级 → 可进入的阶段。每次进入受限阶段前都要重新查询。

use crate::models::{StageKind, Tier};

/// 受限阶段及允许进入的等级
const GATED_STAGES: &[(StageKind, &[Tier])] = &[
    (StageKind::Guidance, &[Tier::Pro]),
    (StageKind::Budget, &[Tier::Pro]),
];

/// 判断某等级是否可以进入某阶段
pub fn allowed(tier: Tier, stage: StageKind) -> bool {
    GATED_STAGES
        .iter()
        .find(|(gated, _)| *gated == stage)
        .map_or(true, |(_, tiers)| tiers.contains(&tier))
}

/// 某等级可进入的全部阶段（按阶段顺序）
pub fn allowed_stages(tier: Tier) -> Vec<StageKind> {
    StageKind::ALL
        .into_iter()
        .filter(|stage| allowed(tier, *stage))
        .collect()
}
