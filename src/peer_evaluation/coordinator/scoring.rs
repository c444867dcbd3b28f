use chrono::Utc;
use tracing::info;

use super::PeerEvaluationCoordinator;
use crate::errors::{HWSystemError, Result};
use crate::models::peer_evaluations::{
    entities::{CriterionScore, EvaluationStatus, PeerEvaluation},
    requests::SubmitEvaluationRequest,
};

impl PeerEvaluationCoordinator {
    /// 评价人开始评价：assigned -> in_progress
    pub async fn start_evaluation(
        &self,
        evaluation_id: i64,
        evaluator_id: i64,
    ) -> Result<PeerEvaluation> {
        let mut evaluation = self.load_evaluation(evaluation_id).await?;
        ensure_evaluator(&evaluation, evaluator_id)?;
        ensure_transition(&evaluation, EvaluationStatus::InProgress)?;

        evaluation.status = EvaluationStatus::InProgress;
        evaluation.started_at = Some(Utc::now());
        let updated = self.storage.update_peer_evaluation(&evaluation).await?;

        self.sync_projection_after_commit(updated.submission_id)
            .await?;
        Ok(updated)
    }

    /// 提交评分：assigned | in_progress -> submitted
    pub async fn submit_evaluation(
        &self,
        evaluation_id: i64,
        req: SubmitEvaluationRequest,
    ) -> Result<PeerEvaluation> {
        let mut evaluation = self.load_evaluation(evaluation_id).await?;
        ensure_evaluator(&evaluation, req.evaluator_id)?;
        ensure_transition(&evaluation, EvaluationStatus::Submitted)?;

        let total = validate_scores(&req.criteria_scores, evaluation.max_total_score)?;

        let now = Utc::now();
        evaluation.status = EvaluationStatus::Submitted;
        evaluation.criteria_scores = req.criteria_scores;
        evaluation.total_score = Some(total);
        evaluation.overall_feedback = req
            .overall_feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        evaluation.started_at.get_or_insert(now);
        evaluation.submitted_at = Some(now);
        let updated = self.storage.update_peer_evaluation(&evaluation).await?;

        info!(
            "Evaluation {} submitted by {} with total {}/{}",
            updated.id, updated.evaluator_id, total, updated.max_total_score
        );

        self.sync_projection_after_commit(updated.submission_id)
            .await?;
        Ok(updated)
    }

    /// 复核评价：submitted -> reviewed，清除待复核标记
    pub async fn review_evaluation(
        &self,
        evaluation_id: i64,
        note: Option<String>,
    ) -> Result<PeerEvaluation> {
        let mut evaluation = self.load_evaluation(evaluation_id).await?;
        ensure_transition(&evaluation, EvaluationStatus::Reviewed)?;

        evaluation.status = EvaluationStatus::Reviewed;
        evaluation.reviewed_at = Some(Utc::now());
        evaluation.needs_review = false;
        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            evaluation.review_note = Some(note);
        }

        self.storage.update_peer_evaluation(&evaluation).await
    }
}

fn ensure_evaluator(evaluation: &PeerEvaluation, evaluator_id: i64) -> Result<()> {
    if evaluation.evaluator_id != evaluator_id {
        return Err(HWSystemError::authorization(format!(
            "用户 {evaluator_id} 不是互评记录 {} 的评价人",
            evaluation.id
        )));
    }
    Ok(())
}

fn ensure_transition(evaluation: &PeerEvaluation, next: EvaluationStatus) -> Result<()> {
    if !evaluation.status.can_transition_to(next) {
        return Err(HWSystemError::invalid_state(format!(
            "互评记录 {} 当前状态为 {}，不能变更为 {next}",
            evaluation.id, evaluation.status
        )));
    }
    Ok(())
}

/// 校验各评分项并返回总分
pub(crate) fn validate_scores(scores: &[CriterionScore], max_total_score: f64) -> Result<f64> {
    if scores.is_empty() {
        return Err(HWSystemError::validation("至少需要一个评分项"));
    }

    for score in scores {
        if score.criterion.trim().is_empty() {
            return Err(HWSystemError::validation("评分项名称不能为空"));
        }
        if !score.max_score.is_finite() || score.max_score <= 0.0 {
            return Err(HWSystemError::validation(format!(
                "评分项 {} 的满分必须大于 0",
                score.criterion
            )));
        }
        if !score.score.is_finite() || score.score < 0.0 || score.score > score.max_score {
            return Err(HWSystemError::validation(format!(
                "评分项 {} 的得分 {} 超出范围 0-{}",
                score.criterion, score.score, score.max_score
            )));
        }
    }

    let total: f64 = scores.iter().map(|s| s.score).sum();
    if total > max_total_score {
        return Err(HWSystemError::validation(format!(
            "总分 {total} 超过满分 {max_total_score}"
        )));
    }
    Ok(total)
}
