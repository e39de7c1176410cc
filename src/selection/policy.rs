use serde::Serialize;

use crate::storage::models::{SLOT_COUNT, Slot};

/// 每隔多少个视频投放一次广告
pub const SERVE_INTERVAL: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementReason {
    /// 播放位置命中投放间隔
    Interval,
    /// 调用方显式指定了广告位
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Placement {
    Skip,
    Serve { slot: Slot, reason: PlacementReason },
}

impl Placement {
    pub fn slot(&self) -> Option<Slot> {
        match self {
            Placement::Skip => None,
            Placement::Serve { slot, .. } => Some(*slot),
        }
    }
}

/// 第 video_index（从 0 开始）个视频是否投放：每 SERVE_INTERVAL 个一次
pub fn is_eligible(video_index: u64) -> bool {
    video_index.saturating_add(1) % SERVE_INTERVAL == 0
}

/// 按投放轮次在五个广告位之间循环
pub fn cycle_slot(video_index: u64) -> Slot {
    let cycle = video_index.saturating_add(1) / SERVE_INTERVAL;
    Slot::clamped((cycle % SLOT_COUNT as u64) as i64 + 1)
}

/// 显式广告位优先，不受投放间隔限制
pub fn place(video_index: u64, explicit_slot: Option<Slot>) -> Placement {
    match explicit_slot {
        Some(slot) => Placement::Serve {
            slot,
            reason: PlacementReason::Explicit,
        },
        None if is_eligible(video_index) => Placement::Serve {
            slot: cycle_slot(video_index),
            reason: PlacementReason::Interval,
        },
        None => Placement::Skip,
    }
}
