// ==========================================
// 餐饮出品编排系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 所有人工变更必须记录
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::ActionLogRepository;
