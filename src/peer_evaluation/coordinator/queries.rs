use std::collections::HashMap;

use super::PeerEvaluationCoordinator;
use crate::errors::Result;
use crate::models::peer_evaluations::{
    entities::{EvaluationStatus, PeerEvaluation},
    responses::{
        EvaluationProgressResponse, EvaluatorAssignmentItem, EvaluatorAssignmentListResponse,
    },
};
use crate::peer_evaluation::statistics::round2;

impl PeerEvaluationCoordinator {
    /// 用户作为评价人的互评任务
    pub async fn get_user_evaluation_assignments(
        &self,
        user_id: i64,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<PeerEvaluation>> {
        self.storage
            .list_peer_evaluations_by_evaluator(user_id, status)
            .await
    }

    /// 评价人视角的任务列表，匿名互评的作业不返回被评价者
    pub async fn list_evaluator_assignments(
        &self,
        user_id: i64,
        status: Option<EvaluationStatus>,
    ) -> Result<EvaluatorAssignmentListResponse> {
        let evaluations = self.get_user_evaluation_assignments(user_id, status).await?;

        let mut anonymous: HashMap<i64, bool> = HashMap::new();
        let mut items = Vec::with_capacity(evaluations.len());
        for evaluation in evaluations {
            let hidden = match anonymous.get(&evaluation.homework_id) {
                Some(&hidden) => hidden,
                None => {
                    // 作业已不存在时按匿名处理
                    let hidden = self
                        .storage
                        .get_homework_by_id(evaluation.homework_id)
                        .await?
                        .is_none_or(|h| h.anonymous_evaluation);
                    anonymous.insert(evaluation.homework_id, hidden);
                    hidden
                }
            };
            items.push(EvaluatorAssignmentItem::from_evaluation(evaluation, hidden));
        }

        Ok(EvaluatorAssignmentListResponse { user_id, items })
    }

    /// 作业的互评进度
    pub async fn get_assignment_evaluation_status(
        &self,
        homework_id: i64,
    ) -> Result<EvaluationProgressResponse> {
        self.load_homework(homework_id).await?;
        let evaluations = self
            .storage
            .list_peer_evaluations_by_homework(homework_id)
            .await?;

        let mut status_breakdown: HashMap<String, i64> = EvaluationStatus::ALL
            .iter()
            .map(|status| (status.to_string(), 0))
            .collect();
        for evaluation in &evaluations {
            *status_breakdown
                .entry(evaluation.status.to_string())
                .or_default() += 1;
        }

        let total = evaluations.len() as i64;
        let completed = evaluations
            .iter()
            .filter(|e| e.status.is_completed())
            .count() as i64;
        let progress_percentage = if total > 0 {
            round2(completed as f64 / total as f64 * 100.0)
        } else {
            0.0
        };

        Ok(EvaluationProgressResponse {
            homework_id,
            total_evaluations: total,
            completed_evaluations: completed,
            progress_percentage,
            status_breakdown,
            needs_review_count: evaluations.iter().filter(|e| e.needs_review).count() as i64,
        })
    }
}
