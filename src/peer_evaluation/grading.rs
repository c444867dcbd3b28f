//! 最终成绩汇总

use chrono::{DateTime, Utc};

use super::statistics::round2;
use crate::models::peer_evaluations::entities::PeerEvaluation;
use crate::models::submissions::entities::{CriterionAverage, FinalEvaluation};

const GRADE_BANDS: [(f64, &str); 11] = [
    (97.0, "A+"),
    (93.0, "A"),
    (90.0, "A-"),
    (87.0, "B+"),
    (83.0, "B"),
    (80.0, "B-"),
    (77.0, "C+"),
    (73.0, "C"),
    (70.0, "C-"),
    (67.0, "D+"),
    (60.0, "D"),
];

const STRENGTH_KEYWORDS: [&str; 3] = ["good", "excellent", "well"];
const IMPROVEMENT_KEYWORDS: [&str; 3] = ["improve", "better", "need"];

/// 百分制分数对应的等级
pub fn letter_grade(percentage: f64) -> &'static str {
    GRADE_BANDS
        .iter()
        .find(|(threshold, _)| percentage >= *threshold)
        .map(|(_, grade)| *grade)
        .unwrap_or("F")
}

/// 按关键词把评语分为优点和待改进（不区分大小写，一条评语可同时属于两类）
pub fn classify_feedback<'a, I>(feedback: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    for text in feedback {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if STRENGTH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            strengths.push(trimmed.to_string());
        }
        if IMPROVEMENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            improvements.push(trimmed.to_string());
        }
    }

    (strengths, improvements)
}

/// 汇总已完成的评价，没有可用评分时返回 `None`
pub fn compile(
    evaluations: &[PeerEvaluation],
    consensus_threshold: f64,
    now: DateTime<Utc>,
) -> Option<FinalEvaluation> {
    let scored: Vec<(&PeerEvaluation, f64)> = evaluations
        .iter()
        .filter(|e| e.status.is_completed())
        .filter_map(|e| e.total_score.map(|total| (e, total)))
        .collect();

    let (first, _) = scored.first()?;
    let max_score = first.max_total_score;
    let count = scored.len();
    let total_score: f64 = scored.iter().map(|(_, total)| total).sum();
    let average_score = total_score / count as f64;
    let percentage = percent(average_score, max_score);

    let percentages: Vec<f64> = scored
        .iter()
        .map(|(e, total)| percent(*total, e.max_total_score))
        .collect();
    let highest = percentages.iter().copied().fold(f64::MIN, f64::max);
    let lowest = percentages.iter().copied().fold(f64::MAX, f64::min);
    let score_spread = round2(highest - lowest);

    let (strengths, improvements) = classify_feedback(
        scored
            .iter()
            .filter_map(|(e, _)| e.overall_feedback.as_deref()),
    );

    Some(FinalEvaluation {
        total_score,
        max_score,
        average_score: round2(average_score),
        percentage: round2(percentage),
        letter_grade: letter_grade(percentage).to_string(),
        evaluation_count: count as i32,
        consensus: score_spread <= consensus_threshold,
        score_spread,
        criteria_averages: criteria_averages(scored.iter().map(|(e, _)| *e)),
        strengths,
        improvements,
        finalized_at: now,
    })
}

fn percent(score: f64, max: f64) -> f64 {
    if max > 0.0 { score / max * 100.0 } else { 0.0 }
}

// 按评分项首次出现的顺序输出
fn criteria_averages<'a>(
    evaluations: impl Iterator<Item = &'a PeerEvaluation>,
) -> Vec<CriterionAverage> {
    let mut sums: Vec<(String, f64, f64, i32)> = Vec::new();

    for evaluation in evaluations {
        for score in &evaluation.criteria_scores {
            match sums.iter_mut().find(|(name, ..)| *name == score.criterion) {
                Some((_, sum, _, count)) => {
                    *sum += score.score;
                    *count += 1;
                }
                None => sums.push((score.criterion.clone(), score.score, score.max_score, 1)),
            }
        }
    }

    sums.into_iter()
        .map(|(criterion, sum, max_score, count)| CriterionAverage {
            criterion,
            average_score: round2(sum / count as f64),
            max_score,
            count,
        })
        .collect()
}
