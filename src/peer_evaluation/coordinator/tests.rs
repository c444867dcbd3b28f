use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;

use super::PeerEvaluationCoordinator;
use crate::config::PeerEvaluationSettings;
use crate::errors::Result;
use crate::models::homeworks::{
    entities::{EvaluationPhase, Homework},
    requests::CreateHomeworkRequest,
};
use crate::models::peer_evaluations::{
    entities::{CriterionScore, EvaluationStatus, NewPeerEvaluation, PeerEvaluation},
    requests::{SubmitEvaluationRequest, TriggerPeerEvaluationRequest},
};
use crate::models::submissions::{
    entities::{AssignmentStatus, Submission, SubmissionStatus},
    requests::SaveSubmissionRequest,
};
use crate::storage::Storage;
use crate::storage::memory_storage::MemoryStorage;

struct Fixture {
    storage: Arc<MemoryStorage>,
    coordinator: PeerEvaluationCoordinator,
    homework: Homework,
    submissions: Vec<Submission>,
}

fn settings() -> PeerEvaluationSettings {
    PeerEvaluationSettings {
        default_due_days: 7,
        batch_retry_attempts: 3,
        retry_backoff_ms: 1,
        consensus_threshold: 15.0,
    }
}

/// 学生 ID 为 1..=students，每人一份已提交的作业
async fn fixture_with(
    students: i64,
    customize: impl FnOnce(&mut CreateHomeworkRequest),
) -> Fixture {
    let storage = Arc::new(MemoryStorage::new());
    let coordinator = PeerEvaluationCoordinator::new(storage.clone(), settings());

    let mut req = CreateHomeworkRequest {
        class_id: 1,
        created_by: 1000,
        title: "Essay".to_string(),
        description: None,
        max_score: Some(100.0),
        deadline: None,
        evaluations_per_submission: None,
        max_evaluations_per_student: None,
        allow_self_evaluation: None,
        anonymous_evaluation: None,
        evaluation_deadline: None,
    };
    customize(&mut req);
    let homework = storage.create_homework(req).await.unwrap();

    let mut submissions = Vec::new();
    for student in 1..=students {
        let draft = coordinator
            .save_submission(
                homework.id,
                SaveSubmissionRequest {
                    creator_id: student,
                    content: format!("essay by {student}"),
                },
            )
            .await
            .unwrap();
        submissions.push(coordinator.submit_submission(draft.id, student).await.unwrap());
    }

    Fixture {
        storage,
        coordinator,
        homework,
        submissions,
    }
}

async fn fixture(students: i64) -> Fixture {
    fixture_with(students, |_| {}).await
}

fn seeded(seed: u64) -> TriggerPeerEvaluationRequest {
    TriggerPeerEvaluationRequest {
        seed: Some(seed),
        ..Default::default()
    }
}

fn scores(total: f64, feedback: &str, evaluator_id: i64) -> SubmitEvaluationRequest {
    SubmitEvaluationRequest {
        evaluator_id,
        criteria_scores: vec![CriterionScore {
            criterion: "overall".to_string(),
            score: total,
            max_score: 100.0,
            comment: None,
        }],
        overall_feedback: Some(feedback.to_string()),
    }
}

fn new_evaluation(
    homework: &Homework,
    submission: &Submission,
    evaluator_id: i64,
) -> NewPeerEvaluation {
    NewPeerEvaluation {
        homework_id: homework.id,
        submission_id: submission.id,
        submitter_id: submission.creator_id,
        evaluator_id,
        max_total_score: homework.max_score,
        due_date: homework.created_at + Duration::days(7),
        round: 1,
        priority: 1,
    }
}

async fn evaluations_of(fx: &Fixture, submission_id: i64) -> Vec<PeerEvaluation> {
    fx.storage
        .list_peer_evaluations_by_submission(submission_id)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_five_students_get_ten_balanced_evaluations() {
    let fx = fixture(5).await;
    let response = fx
        .coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(42))
        .await
        .unwrap();

    assert_eq!(response.total_evaluations, 10);
    assert_eq!(response.round, 1);
    assert!(response.warnings.is_empty());
    assert!(
        response
            .assignments
            .iter()
            .all(|a| a.evaluator_id != a.submitter_id)
    );

    let mut workload: HashMap<i64, usize> = HashMap::new();
    for assignment in &response.assignments {
        *workload.entry(assignment.evaluator_id).or_default() += 1;
    }
    assert!(workload.values().all(|&load| load <= 3));
    assert_eq!(response.statistics.total_evaluations, 10);
    assert!(response.statistics.max_workload <= 3);
    assert_eq!(response.statistics.covered_submissions, 5);

    for submission in &fx.submissions {
        let current = fx.coordinator.get_submission(submission.id).await.unwrap();
        assert_eq!(current.status, SubmissionStatus::UnderEvaluation);
        assert_eq!(current.evaluation_assignments.len(), 2);
        assert!(
            current
                .evaluation_assignments
                .windows(2)
                .all(|w| w[0].evaluation_id < w[1].evaluation_id)
        );
    }

    let homework = fx
        .storage
        .get_homework_by_id(fx.homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(homework.evaluation_phase, EvaluationPhase::EvaluationPhase);
}

#[tokio::test]
async fn test_single_submission_is_rejected() {
    let fx = fixture(1).await;
    let err = fx
        .coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E015");

    let homework = fx
        .storage
        .get_homework_by_id(fx.homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(homework.evaluation_phase, EvaluationPhase::SubmissionPhase);
}

#[tokio::test]
async fn test_unknown_homework_is_not_found() {
    let fx = fixture(2).await;
    let err = fx
        .coordinator
        .trigger_peer_evaluation(9999, seeded(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E008");
}

#[tokio::test]
async fn test_out_of_range_override_is_rejected() {
    let fx = fixture(3).await;
    let req = TriggerPeerEvaluationRequest {
        seed: Some(1),
        evaluations_per_submission: Some(6),
        max_evaluations_per_student: None,
    };
    let err = fx
        .coordinator
        .trigger_peer_evaluation(fx.homework.id, req)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");
}

#[tokio::test]
async fn test_second_trigger_is_invalid_state() {
    let fx = fixture(3).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(1))
        .await
        .unwrap();

    let err = fx
        .coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(2))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E018");
    assert_eq!(
        fx.storage
            .list_peer_evaluations_by_homework(fx.homework.id)
            .await
            .unwrap()
            .len(),
        6
    );
}

#[tokio::test]
async fn test_concurrent_triggers_allocate_once() {
    let fx = fixture(4).await;
    let (first, second) = tokio::join!(
        fx.coordinator
            .trigger_peer_evaluation(fx.homework.id, seeded(1)),
        fx.coordinator
            .trigger_peer_evaluation(fx.homework.id, seeded(2)),
    );

    let (winner, loser) = match (first, second) {
        (Ok(response), Err(e)) | (Err(e), Ok(response)) => (response, e),
        _ => panic!("exactly one trigger should succeed"),
    };
    assert_eq!(loser.code(), "E018");
    assert_eq!(winner.round, 1);
    assert_eq!(
        fx.storage
            .list_peer_evaluations_by_homework(fx.homework.id)
            .await
            .unwrap()
            .len(),
        winner.total_evaluations
    );
}

#[tokio::test]
async fn test_drafts_are_left_out() {
    let fx = fixture(3).await;
    let draft = fx
        .coordinator
        .save_submission(
            fx.homework.id,
            SaveSubmissionRequest {
                creator_id: 4,
                content: "unfinished".to_string(),
            },
        )
        .await
        .unwrap();

    let response = fx
        .coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(3))
        .await
        .unwrap();
    assert!(
        response
            .assignments
            .iter()
            .all(|a| a.submission_id != draft.id && a.evaluator_id != 4)
    );

    let draft = fx.coordinator.get_submission(draft.id).await.unwrap();
    assert_eq!(draft.status, SubmissionStatus::Draft);
}

#[tokio::test]
async fn test_due_date_defaults_to_seven_days_after_creation() {
    let fx = fixture(2).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(5))
        .await
        .unwrap();

    let evaluations = fx
        .storage
        .list_peer_evaluations_by_homework(fx.homework.id)
        .await
        .unwrap();
    assert_eq!(evaluations.len(), 2);
    for evaluation in evaluations {
        assert_eq!(evaluation.due_date, fx.homework.created_at + Duration::days(7));
        assert_eq!(evaluation.status, EvaluationStatus::Assigned);
        assert_eq!(evaluation.max_total_score, 100.0);
    }
}

#[tokio::test]
async fn test_transient_batch_failures_are_retried() {
    let fx = fixture(3).await;
    fx.storage.fail_next_batches(2);

    let response = fx
        .coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(8))
        .await
        .unwrap();
    assert_eq!(response.total_evaluations, 6);
}

#[tokio::test]
async fn test_exhausted_retries_release_the_homework() {
    let fx = fixture(3).await;
    fx.storage.fail_next_batches(3);

    let err = fx
        .coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(8))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E005");

    let homework = fx
        .storage
        .get_homework_by_id(fx.homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(homework.evaluation_phase, EvaluationPhase::SubmissionPhase);
    assert!(
        fx.storage
            .list_peer_evaluations_by_homework(fx.homework.id)
            .await
            .unwrap()
            .is_empty()
    );
    for submission in &fx.submissions {
        let current = fx.coordinator.get_submission(submission.id).await.unwrap();
        assert_eq!(current.status, SubmissionStatus::Submitted);
    }

    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(8))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_scoring_flow_and_final_grade() {
    let fx = fixture(3).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(11))
        .await
        .unwrap();

    let target = &fx.submissions[0];
    let evaluations = evaluations_of(&fx, target.id).await;
    assert_eq!(evaluations.len(), 2);
    let (first, second) = (&evaluations[0], &evaluations[1]);

    let started = fx
        .coordinator
        .start_evaluation(first.id, first.evaluator_id)
        .await
        .unwrap();
    assert_eq!(started.status, EvaluationStatus::InProgress);
    let current = fx.coordinator.get_submission(target.id).await.unwrap();
    assert_eq!(
        current.evaluation_assignments[0].status,
        AssignmentStatus::InProgress
    );

    fx.coordinator
        .submit_evaluation(first.id, scores(80.0, "Good structure", first.evaluator_id))
        .await
        .unwrap();

    let err = fx
        .coordinator
        .compile_final_evaluation(target.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E018");

    fx.coordinator
        .submit_evaluation(
            second.id,
            scores(90.0, "Needs better citations", second.evaluator_id),
        )
        .await
        .unwrap();
    let current = fx.coordinator.get_submission(target.id).await.unwrap();
    assert_eq!(current.status, SubmissionStatus::Evaluated);
    assert!(current.all_assignments_completed());

    let result = fx
        .coordinator
        .compile_final_evaluation(target.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.average_score, 85.0);
    assert_eq!(result.total_score, 170.0);
    assert_eq!(result.letter_grade, "B");
    assert_eq!(result.evaluation_count, 2);
    assert!(result.consensus);
    assert_eq!(result.strengths, vec!["Good structure"]);
    assert_eq!(result.improvements, vec!["Needs better citations"]);

    let current = fx.coordinator.get_submission(target.id).await.unwrap();
    assert_eq!(current.status, SubmissionStatus::Finalized);
    assert_eq!(current.final_evaluation.as_ref(), Some(&result));
    assert!(
        evaluations_of(&fx, target.id)
            .await
            .iter()
            .all(|e| e.status == EvaluationStatus::Finalized)
    );

    let again = fx
        .coordinator
        .compile_final_evaluation(target.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.average_score, 85.0);

    let returned = fx.coordinator.return_submission(target.id).await.unwrap();
    assert_eq!(returned.status, SubmissionStatus::Returned);
}

#[tokio::test]
async fn test_compile_without_scores_returns_none() {
    let fx = fixture(3).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(4))
        .await
        .unwrap();

    let result = fx
        .coordinator
        .compile_final_evaluation(fx.submissions[1].id)
        .await
        .unwrap();
    assert!(result.is_none());

    let err = fx
        .coordinator
        .return_submission(fx.submissions[1].id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E018");
}

#[tokio::test]
async fn test_only_the_evaluator_may_score() {
    let fx = fixture(3).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(6))
        .await
        .unwrap();
    let evaluation = evaluations_of(&fx, fx.submissions[0].id).await.remove(0);

    let err = fx
        .coordinator
        .submit_evaluation(evaluation.id, scores(50.0, "ok", 999))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E013");

    fx.coordinator
        .submit_evaluation(evaluation.id, scores(50.0, "ok", evaluation.evaluator_id))
        .await
        .unwrap();
    let err = fx
        .coordinator
        .submit_evaluation(evaluation.id, scores(60.0, "ok", evaluation.evaluator_id))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E018");

    let reviewed = fx
        .coordinator
        .review_evaluation(evaluation.id, Some("checked".to_string()))
        .await
        .unwrap();
    assert_eq!(reviewed.status, EvaluationStatus::Reviewed);
    assert_eq!(reviewed.review_note.as_deref(), Some("checked"));
}

#[tokio::test]
async fn test_progress_report() {
    let fx = fixture(3).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(9))
        .await
        .unwrap();
    let evaluation = evaluations_of(&fx, fx.submissions[2].id).await.remove(0);
    fx.coordinator
        .submit_evaluation(evaluation.id, scores(70.0, "fine", evaluation.evaluator_id))
        .await
        .unwrap();

    let progress = fx
        .coordinator
        .get_assignment_evaluation_status(fx.homework.id)
        .await
        .unwrap();
    assert_eq!(progress.total_evaluations, 6);
    assert_eq!(progress.completed_evaluations, 1);
    assert_eq!(progress.progress_percentage, 16.67);
    assert_eq!(progress.status_breakdown.len(), 5);
    assert_eq!(progress.status_breakdown["assigned"], 5);
    assert_eq!(progress.status_breakdown["submitted"], 1);
    assert_eq!(progress.status_breakdown["finalized"], 0);
    assert_eq!(progress.needs_review_count, 0);
}

#[tokio::test]
async fn test_progress_for_homework_without_evaluations() {
    let fx = fixture(2).await;
    let progress = fx
        .coordinator
        .get_assignment_evaluation_status(fx.homework.id)
        .await
        .unwrap();
    assert_eq!(progress.total_evaluations, 0);
    assert_eq!(progress.progress_percentage, 0.0);
    assert!(progress.status_breakdown.values().all(|&count| count == 0));
}

#[tokio::test]
async fn test_evaluator_view_respects_anonymity() {
    let fx = fixture(3).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(2))
        .await
        .unwrap();
    let view = fx.coordinator.list_evaluator_assignments(1, None).await.unwrap();
    assert_eq!(view.items.len(), 2);
    assert!(view.items.iter().all(|item| item.submitter_id.is_none()));

    let fx = fixture_with(3, |req| req.anonymous_evaluation = Some(false)).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(2))
        .await
        .unwrap();
    let view = fx
        .coordinator
        .list_evaluator_assignments(1, Some(EvaluationStatus::Assigned))
        .await
        .unwrap();
    assert_eq!(view.items.len(), 2);
    assert!(view.items.iter().all(|item| item.submitter_id.is_some()));

    let submitted = fx
        .coordinator
        .get_user_evaluation_assignments(1, Some(EvaluationStatus::Submitted))
        .await
        .unwrap();
    assert!(submitted.is_empty());
}

#[tokio::test]
async fn test_reassignment_rules() {
    let fx = fixture_with(4, |req| req.max_evaluations_per_student = Some(1)).await;
    let created = fx
        .storage
        .create_peer_evaluations(vec![
            new_evaluation(&fx.homework, &fx.submissions[0], 2),
            new_evaluation(&fx.homework, &fx.submissions[1], 3),
        ])
        .await
        .unwrap();
    let (first, second) = (&created[0], &created[1]);

    let err = fx.coordinator.reassign(first.id, 1, "absent").await.unwrap_err();
    assert_eq!(err.code(), "E016");

    let err = fx.coordinator.reassign(first.id, 4, "  ").await.unwrap_err();
    assert_eq!(err.code(), "E007");

    let err = fx.coordinator.reassign(first.id, 2, "absent").await.unwrap_err();
    assert_eq!(err.code(), "E007");

    let err = fx.coordinator.reassign(first.id, 3, "absent").await.unwrap_err();
    assert_eq!(err.code(), "E017");

    let err = fx.coordinator.reassign(9999, 4, "absent").await.unwrap_err();
    assert_eq!(err.code(), "E008");

    let err = fx
        .coordinator
        .reassign(first.id, 987_654, "absent")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E007");

    fx.coordinator
        .save_submission(
            fx.homework.id,
            SaveSubmissionRequest {
                creator_id: 55,
                content: "unfinished".to_string(),
            },
        )
        .await
        .unwrap();
    let err = fx.coordinator.reassign(first.id, 55, "absent").await.unwrap_err();
    assert_eq!(err.code(), "E007");

    let stale = fx
        .storage
        .get_peer_evaluation_by_id(first.id)
        .await
        .unwrap()
        .unwrap();
    let moved = fx.coordinator.reassign(first.id, 4, "absent").await.unwrap();
    assert_eq!(moved.evaluator_id, 4);
    assert_eq!(moved.status, EvaluationStatus::Assigned);
    assert!(moved.started_at.is_none());
    assert!(moved.needs_review);
    let note = moved.review_note.as_deref().unwrap();
    assert!(note.contains('2') && note.contains('4') && note.contains("absent"));

    let submission = fx.coordinator.get_submission(fx.submissions[0].id).await.unwrap();
    assert_eq!(submission.status, SubmissionStatus::UnderEvaluation);
    assert_eq!(submission.evaluation_assignments.len(), 1);
    assert_eq!(submission.evaluation_assignments[0].evaluator_id, 4);

    let err = fx.storage.update_peer_evaluation(&stale).await.unwrap_err();
    assert_eq!(err.code(), "E020");

    let err = fx
        .coordinator
        .submit_evaluation(first.id, scores(50.0, "late", 2))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E013");

    fx.storage
        .create_peer_evaluations(vec![new_evaluation(&fx.homework, &fx.submissions[0], 3)])
        .await
        .unwrap();
    let err = fx.coordinator.reassign(first.id, 3, "swap").await.unwrap_err();
    assert_eq!(err.code(), "E007");

    let progress = fx
        .coordinator
        .get_assignment_evaluation_status(fx.homework.id)
        .await
        .unwrap();
    assert_eq!(progress.needs_review_count, 1);

    fx.coordinator
        .submit_evaluation(second.id, scores(75.0, "solid", 3))
        .await
        .unwrap();
    let err = fx.coordinator.reassign(second.id, 4, "late").await.unwrap_err();
    assert_eq!(err.code(), "E018");
}

#[tokio::test]
async fn test_reassign_to_submitter_rejected_even_with_self_evaluation() {
    let fx = fixture_with(3, |req| req.allow_self_evaluation = Some(true)).await;
    let created = fx
        .storage
        .create_peer_evaluations(vec![new_evaluation(&fx.homework, &fx.submissions[0], 2)])
        .await
        .unwrap();

    let err = fx
        .coordinator
        .reassign(created[0].id, 1, "absent")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E016");

    let unchanged = fx
        .storage
        .get_peer_evaluation_by_id(created[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.evaluator_id, 2);
}

#[tokio::test]
async fn test_reconcile_repairs_and_is_idempotent() {
    let fx = fixture(3).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(12))
        .await
        .unwrap();

    let target = fx.coordinator.get_submission(fx.submissions[0].id).await.unwrap();
    let expected = target.evaluation_assignments.clone();
    let mut corrupted = target.clone();
    corrupted.evaluation_assignments.clear();
    corrupted.status = SubmissionStatus::Submitted;
    fx.storage.update_submission(&corrupted).await.unwrap();

    assert!(fx.coordinator.reconcile_submission(target.id).await.unwrap());
    assert!(!fx.coordinator.reconcile_submission(target.id).await.unwrap());

    let repaired = fx.coordinator.get_submission(target.id).await.unwrap();
    assert_eq!(repaired.evaluation_assignments, expected);
    assert_eq!(repaired.status, SubmissionStatus::UnderEvaluation);

    let report = fx.coordinator.reconcile_homework(fx.homework.id).await.unwrap();
    assert_eq!(report.checked, 3);
    assert!(report.repaired.is_empty());
    assert!(!report.phase_repaired);
}

#[tokio::test]
async fn test_reconcile_homework_recovers_stalled_allocation() {
    let fx = fixture(3).await;
    fx.storage
        .create_peer_evaluations(vec![new_evaluation(&fx.homework, &fx.submissions[0], 2)])
        .await
        .unwrap();
    fx.storage
        .update_homework_phase(
            fx.homework.id,
            EvaluationPhase::SubmissionPhase,
            EvaluationPhase::Allocating,
        )
        .await
        .unwrap();

    let report = fx.coordinator.reconcile_homework(fx.homework.id).await.unwrap();
    assert!(report.phase_repaired);
    assert_eq!(report.repaired, vec![fx.submissions[0].id]);

    let homework = fx
        .storage
        .get_homework_by_id(fx.homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(homework.evaluation_phase, EvaluationPhase::EvaluationPhase);
}

#[tokio::test]
async fn test_submission_lifecycle_guards() {
    let fx = fixture(2).await;

    let err = fx
        .coordinator
        .submit_submission(fx.submissions[0].id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E018");

    let err = fx
        .coordinator
        .save_submission(
            fx.homework.id,
            SaveSubmissionRequest {
                creator_id: 1,
                content: "rewrite".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E018");

    let late = fx
        .coordinator
        .save_submission(
            fx.homework.id,
            SaveSubmissionRequest {
                creator_id: 3,
                content: "late essay".to_string(),
            },
        )
        .await
        .unwrap();
    let err = fx.coordinator.submit_submission(late.id, 4).await.unwrap_err();
    assert_eq!(err.code(), "E013");

    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(1))
        .await
        .unwrap();
    let err = fx.coordinator.submit_submission(late.id, 3).await.unwrap_err();
    assert_eq!(err.code(), "E018");
}

#[tokio::test]
async fn test_configured_evaluation_deadline_is_used_as_due_date() {
    use chrono::{TimeZone, Utc};

    let deadline = Utc.with_ymd_and_hms(2030, 6, 30, 23, 59, 0).unwrap();
    let fx = fixture_with(2, |req| req.evaluation_deadline = Some(deadline)).await;
    fx.coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(6))
        .await
        .unwrap();

    let evaluations = fx
        .storage
        .list_peer_evaluations_by_homework(fx.homework.id)
        .await
        .unwrap();
    assert_eq!(evaluations.len(), 2);
    assert!(evaluations.iter().all(|e| e.due_date == deadline));
}

#[tokio::test]
async fn test_reassign_reports_data_integrity_when_projection_fails() {
    let fx = fixture(3).await;
    let created = fx
        .storage
        .create_peer_evaluations(vec![new_evaluation(&fx.homework, &fx.submissions[0], 2)])
        .await
        .unwrap();
    fx.storage.fail_next_submission_updates(100);

    let err = fx
        .coordinator
        .reassign(created[0].id, 3, "absent")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E019");

    // 互评记录已提交，只有提交镜像落后
    let committed = fx
        .storage
        .get_peer_evaluation_by_id(created[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(committed.evaluator_id, 3);
    assert!(committed.needs_review);
    let stale = fx.coordinator.get_submission(fx.submissions[0].id).await.unwrap();
    assert!(stale.evaluation_assignments.is_empty());

    fx.storage.fail_next_submission_updates(0);
    assert!(
        fx.coordinator
            .reconcile_submission(fx.submissions[0].id)
            .await
            .unwrap()
    );
    let repaired = fx.coordinator.get_submission(fx.submissions[0].id).await.unwrap();
    assert_eq!(repaired.evaluation_assignments.len(), 1);
    assert_eq!(repaired.evaluation_assignments[0].evaluator_id, 3);
}

#[tokio::test]
async fn test_trigger_reports_data_integrity_when_projection_fails() {
    let fx = fixture(3).await;
    fx.storage.fail_next_submission_updates(100);

    let err = fx
        .coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(14))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E019");

    let homework = fx
        .storage
        .get_homework_by_id(fx.homework.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(homework.evaluation_phase, EvaluationPhase::EvaluationPhase);
    assert_eq!(
        fx.storage
            .list_peer_evaluations_by_homework(fx.homework.id)
            .await
            .unwrap()
            .len(),
        6
    );
    for submission in &fx.submissions {
        let current = fx.coordinator.get_submission(submission.id).await.unwrap();
        assert_eq!(current.status, SubmissionStatus::Submitted);
    }

    fx.storage.fail_next_submission_updates(0);
    let report = fx.coordinator.reconcile_homework(fx.homework.id).await.unwrap();
    assert_eq!(report.repaired.len(), 3);
    for submission in &fx.submissions {
        let current = fx.coordinator.get_submission(submission.id).await.unwrap();
        assert_eq!(current.status, SubmissionStatus::UnderEvaluation);
        assert_eq!(current.evaluation_assignments.len(), 2);
    }
}

/// 在作业被认领为分配中的瞬间，把一份草稿改为已提交
struct SubmitOnClaim {
    inner: Arc<MemoryStorage>,
    pending: std::sync::Mutex<Option<Submission>>,
}

#[async_trait::async_trait]
impl Storage for SubmitOnClaim {
    async fn create_homework(&self, req: CreateHomeworkRequest) -> Result<Homework> {
        self.inner.create_homework(req).await
    }

    async fn get_homework_by_id(&self, homework_id: i64) -> Result<Option<Homework>> {
        self.inner.get_homework_by_id(homework_id).await
    }

    async fn update_homework_phase(
        &self,
        homework_id: i64,
        expected: EvaluationPhase,
        next: EvaluationPhase,
    ) -> Result<bool> {
        if expected == EvaluationPhase::SubmissionPhase && next == EvaluationPhase::Allocating {
            let pending = self.pending.lock().unwrap().take();
            if let Some(mut submission) = pending {
                submission.status = SubmissionStatus::Submitted;
                submission.submitted_at = Some(chrono::Utc::now());
                self.inner.update_submission(&submission).await?;
            }
        }
        self.inner
            .update_homework_phase(homework_id, expected, next)
            .await
    }

    async fn save_submission(
        &self,
        homework_id: i64,
        creator_id: i64,
        content: String,
    ) -> Result<Submission> {
        self.inner
            .save_submission(homework_id, creator_id, content)
            .await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.inner.get_submission_by_id(submission_id).await
    }

    async fn list_submissions_by_homework(
        &self,
        homework_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<Submission>> {
        self.inner
            .list_submissions_by_homework(homework_id, status)
            .await
    }

    async fn update_submission(&self, submission: &Submission) -> Result<Submission> {
        self.inner.update_submission(submission).await
    }

    async fn create_peer_evaluations(
        &self,
        evaluations: Vec<NewPeerEvaluation>,
    ) -> Result<Vec<PeerEvaluation>> {
        self.inner.create_peer_evaluations(evaluations).await
    }

    async fn get_peer_evaluation_by_id(
        &self,
        evaluation_id: i64,
    ) -> Result<Option<PeerEvaluation>> {
        self.inner.get_peer_evaluation_by_id(evaluation_id).await
    }

    async fn list_peer_evaluations_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<PeerEvaluation>> {
        self.inner
            .list_peer_evaluations_by_submission(submission_id)
            .await
    }

    async fn list_peer_evaluations_by_homework(
        &self,
        homework_id: i64,
    ) -> Result<Vec<PeerEvaluation>> {
        self.inner.list_peer_evaluations_by_homework(homework_id).await
    }

    async fn list_peer_evaluations_by_evaluator(
        &self,
        evaluator_id: i64,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<PeerEvaluation>> {
        self.inner
            .list_peer_evaluations_by_evaluator(evaluator_id, status)
            .await
    }

    async fn update_peer_evaluation(&self, evaluation: &PeerEvaluation) -> Result<PeerEvaluation> {
        self.inner.update_peer_evaluation(evaluation).await
    }
}

#[tokio::test]
async fn test_submission_finished_during_claim_is_allocated() {
    let fx = fixture(2).await;
    let late = fx
        .coordinator
        .save_submission(
            fx.homework.id,
            SaveSubmissionRequest {
                creator_id: 3,
                content: "just in time".to_string(),
            },
        )
        .await
        .unwrap();

    let storage = Arc::new(SubmitOnClaim {
        inner: fx.storage.clone(),
        pending: std::sync::Mutex::new(Some(late.clone())),
    });
    let coordinator = PeerEvaluationCoordinator::new(storage, settings());

    let response = coordinator
        .trigger_peer_evaluation(fx.homework.id, seeded(21))
        .await
        .unwrap();
    assert_eq!(response.total_evaluations, 6);
    assert!(response.assignments.iter().any(|a| a.submission_id == late.id));
    assert!(response.assignments.iter().any(|a| a.evaluator_id == 3));

    let late = fx.coordinator.get_submission(late.id).await.unwrap();
    assert_eq!(late.status, SubmissionStatus::UnderEvaluation);
    assert_eq!(late.evaluation_assignments.len(), 2);
}
