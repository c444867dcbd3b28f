use serde::Deserialize;
use ts_rs::TS;

/// 保存（草稿）提交请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SaveSubmissionRequest {
    pub creator_id: i64,
    pub content: String,
}

/// 正式提交请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmitSubmissionRequest {
    pub creator_id: i64,
}
