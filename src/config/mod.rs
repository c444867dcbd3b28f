//! 应用配置
//!
//! 配置来源（优先级从低到高）：`config.toml`、`config.{APP_ENV}.toml`、
//! `HWSYSTEM_*` 环境变量以及少量显式覆盖的环境变量。

mod r#impl;
mod structs;

pub use structs::*;
