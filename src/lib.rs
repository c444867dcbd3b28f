//! HWSystem 互评分配引擎
//!
//! 在作业提交截止后为每份提交分配同伴评价人，跟踪评价进度并汇总最终成绩。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `peer_evaluation`: 冲突判定、分配算法与流程协调
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: HTTP 业务层
//! - `storage`: 数据存储层（SeaORM / 内存）
//! - `utils`: 工具函数

pub mod config;
pub mod entity;
pub mod errors;
pub mod models;
pub mod peer_evaluation;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
