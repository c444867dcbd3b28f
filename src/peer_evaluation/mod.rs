//! 互评分配引擎
//!
//! 冲突矩阵 -> 分配器 -> 协调器持久化，评价完成后汇总成绩。

pub mod allocator;
pub mod conflict;
pub mod coordinator;
pub mod grading;
pub mod locks;
pub mod projection;
pub mod reassign;
pub mod statistics;

pub use coordinator::PeerEvaluationCoordinator;
