//! 分配统计

use super::allocator::Allocation;
use crate::models::peer_evaluations::responses::AllocationStatistics;

/// 统计一次分配结果
///
/// 工作量和覆盖数的最小值、平均值按全部参与者计算，没有被分配的参与者计为 0。
pub fn compute(allocation: &Allocation, participant_count: usize) -> AllocationStatistics {
    if participant_count == 0 {
        return AllocationStatistics::default();
    }

    let mut workload = vec![0usize; participant_count];
    let mut coverage = vec![0usize; participant_count];
    for pair in &allocation.pairs {
        if let Some(load) = workload.get_mut(pair.evaluator_index) {
            *load += 1;
        }
        if let Some(count) = coverage.get_mut(pair.submission_index) {
            *count += 1;
        }
    }

    let total = allocation.pairs.len();
    AllocationStatistics {
        total_evaluations: total,
        evaluator_count: workload.iter().filter(|&&load| load > 0).count(),
        covered_submissions: coverage.iter().filter(|&&count| count > 0).count(),
        min_workload: workload.iter().copied().min().unwrap_or(0),
        max_workload: workload.iter().copied().max().unwrap_or(0),
        average_workload: round2(total as f64 / participant_count as f64),
        min_coverage: coverage.iter().copied().min().unwrap_or(0),
        max_coverage: coverage.iter().copied().max().unwrap_or(0),
        average_coverage: round2(total as f64 / participant_count as f64),
        under_assigned_submissions: allocation.warnings.len(),
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
