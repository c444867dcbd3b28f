//! 互评分配器
//!
//! 贪心 + 工作量均衡：按输入顺序处理每份提交，从可评价的学生中优先选择
//! 当前工作量最小的，同一工作量内用随机洗牌打破平局。这不是最优二分图匹配，
//! 约束较紧时可能出现某些提交评价人不足（记为警告，不报错）。

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::conflict::{ConflictMatrix, Participant};
use crate::errors::{HWSystemError, Result};

/// 单次分配的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub evaluations_per_submission: u32,
    pub max_evaluations_per_user: u32,
    pub seed: u64,
}

/// 一条分配：参与者下标 `evaluator_index` 评价参与者下标 `submission_index` 的提交
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationPair {
    pub submission_index: usize,
    pub evaluator_index: usize,
    // 在该提交评价人中的名次，从 1 开始
    pub priority: u32,
}

/// 评价人不足
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnderAssignment {
    pub submission_index: usize,
    pub requested: u32,
    pub assigned: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub pairs: Vec<AllocationPair>,
    pub warnings: Vec<UnderAssignment>,
}

/// Fisher-Yates 洗牌，相同种子得到相同顺序
pub fn shuffle<T>(seed: u64, mut items: Vec<T>) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    items
}

/// 计算分配结果，返回前会经过 [`validate_allocation`] 校验
pub fn allocate(
    participants: &[Participant],
    conflict: &ConflictMatrix,
    config: &AllocatorConfig,
) -> Result<Allocation> {
    let n = participants.len();
    if n < 2 {
        return Err(HWSystemError::insufficient_participants(format!(
            "互评至少需要 2 名参与者，当前 {n} 名"
        )));
    }
    if conflict.len() != n {
        return Err(HWSystemError::validation(format!(
            "冲突矩阵大小 {} 与参与者数量 {n} 不一致",
            conflict.len()
        )));
    }

    let per_submission = config.evaluations_per_submission as usize;
    let max_workload = config.max_evaluations_per_user as usize;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut workload = vec![0usize; n];
    let mut allocation = Allocation::default();

    for submission in 0..n {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for evaluator in 0..n {
            if !conflict.is_conflict(evaluator, submission) && workload[evaluator] < max_workload
            {
                groups
                    .entry(workload[evaluator])
                    .or_default()
                    .push(evaluator);
            }
        }

        let ordered: Vec<usize> = groups
            .into_values()
            .flat_map(|group| shuffle(rng.random(), group))
            .collect();

        let chosen = &ordered[..ordered.len().min(per_submission)];
        for (rank, &evaluator) in chosen.iter().enumerate() {
            workload[evaluator] += 1;
            allocation.pairs.push(AllocationPair {
                submission_index: submission,
                evaluator_index: evaluator,
                priority: rank as u32 + 1,
            });
        }

        if chosen.len() < per_submission {
            warn!(
                "Submission {} received {} of {} requested evaluators",
                participants[submission].submission_id,
                chosen.len(),
                per_submission
            );
            allocation.warnings.push(UnderAssignment {
                submission_index: submission,
                requested: config.evaluations_per_submission,
                assigned: chosen.len() as u32,
            });
        }
    }

    validate_allocation(&allocation, conflict, config)?;
    debug!(
        "Allocated {} evaluation pairs for {} participants",
        allocation.pairs.len(),
        n
    );
    Ok(allocation)
}

/// 校验分配结果的不变式
///
/// 违反冲突矩阵返回 `SelfEvaluationViolation`；覆盖数、工作量超限或重复分配
/// 返回 `WorkloadViolation`。
pub fn validate_allocation(
    allocation: &Allocation,
    conflict: &ConflictMatrix,
    config: &AllocatorConfig,
) -> Result<()> {
    let mut seen = HashSet::new();
    let mut workload: HashMap<usize, u32> = HashMap::new();
    let mut coverage: HashMap<usize, u32> = HashMap::new();

    for pair in &allocation.pairs {
        if conflict.is_conflict(pair.evaluator_index, pair.submission_index) {
            return Err(HWSystemError::self_evaluation_violation(format!(
                "参与者 {} 不能评价参与者 {} 的提交",
                pair.evaluator_index, pair.submission_index
            )));
        }
        if !seen.insert((pair.evaluator_index, pair.submission_index)) {
            return Err(HWSystemError::workload_violation(format!(
                "参与者 {} 被重复分配评价参与者 {} 的提交",
                pair.evaluator_index, pair.submission_index
            )));
        }
        *workload.entry(pair.evaluator_index).or_default() += 1;
        *coverage.entry(pair.submission_index).or_default() += 1;
    }

    if let Some((evaluator, count)) = workload
        .iter()
        .find(|(_, count)| **count > config.max_evaluations_per_user)
    {
        return Err(HWSystemError::workload_violation(format!(
            "参与者 {evaluator} 被分配了 {count} 份评价，上限为 {}",
            config.max_evaluations_per_user
        )));
    }

    if let Some((submission, count)) = coverage
        .iter()
        .find(|(_, count)| **count > config.evaluations_per_submission)
    {
        return Err(HWSystemError::workload_violation(format!(
            "参与者 {submission} 的提交被分配了 {count} 位评价人，要求为 {}",
            config.evaluations_per_submission
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participants(n: i64) -> Vec<Participant> {
        (1..=n)
            .map(|i| Participant {
                student_id: i,
                submission_id: 100 + i,
            })
            .collect()
    }

    fn config(per_submission: u32, max_per_user: u32, seed: u64) -> AllocatorConfig {
        AllocatorConfig {
            evaluations_per_submission: per_submission,
            max_evaluations_per_user: max_per_user,
            seed,
        }
    }

    fn workloads(allocation: &Allocation, n: usize) -> Vec<u32> {
        let mut loads = vec![0; n];
        for pair in &allocation.pairs {
            loads[pair.evaluator_index] += 1;
        }
        loads
    }

    #[test]
    fn test_shuffle_is_deterministic_for_seed() {
        let items: Vec<u32> = (0..20).collect();
        let a = shuffle(7, items.clone());
        let b = shuffle(7, items.clone());
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, items);
    }

    #[test]
    fn test_five_students_two_per_submission() {
        let people = participants(5);
        let matrix = ConflictMatrix::build(&people, false);

        for seed in 0..32 {
            let allocation = allocate(&people, &matrix, &config(2, 3, seed)).unwrap();
            assert_eq!(allocation.pairs.len(), 10);
            assert!(allocation.warnings.is_empty());
            assert!(
                allocation
                    .pairs
                    .iter()
                    .all(|p| p.evaluator_index != p.submission_index)
            );
            assert!(workloads(&allocation, 5).iter().all(|&load| load <= 3));
        }
    }

    #[test]
    fn test_same_seed_same_allocation() {
        let people = participants(6);
        let matrix = ConflictMatrix::build(&people, false);
        let a = allocate(&people, &matrix, &config(3, 4, 99)).unwrap();
        let b = allocate(&people, &matrix, &config(3, 4, 99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_priorities_rank_within_submission() {
        let people = participants(4);
        let matrix = ConflictMatrix::build(&people, false);
        let allocation = allocate(&people, &matrix, &config(3, 3, 1)).unwrap();

        for submission in 0..4 {
            let mut ranks: Vec<u32> = allocation
                .pairs
                .iter()
                .filter(|p| p.submission_index == submission)
                .map(|p| p.priority)
                .collect();
            ranks.sort();
            assert_eq!(ranks, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_invariants_hold_across_seeds() {
        let people = participants(7);
        let matrix = ConflictMatrix::build(&people, false);

        for seed in 0..64 {
            let allocation = allocate(&people, &matrix, &config(3, 3, seed)).unwrap();
            assert!(workloads(&allocation, 7).iter().all(|&load| load <= 3));
            for submission in 0..7 {
                let coverage = allocation
                    .pairs
                    .iter()
                    .filter(|p| p.submission_index == submission)
                    .count();
                assert!((1..=3).contains(&coverage));
            }
        }
    }

    #[test]
    fn test_under_assignment_is_a_warning() {
        let people = participants(2);
        let matrix = ConflictMatrix::build(&people, false);
        let allocation = allocate(&people, &matrix, &config(2, 3, 0)).unwrap();

        assert_eq!(allocation.pairs.len(), 2);
        assert_eq!(allocation.warnings.len(), 2);
        assert_eq!(allocation.warnings[0].requested, 2);
        assert_eq!(allocation.warnings[0].assigned, 1);
    }

    #[test]
    fn test_workload_cap_limits_coverage() {
        let people = participants(3);
        let matrix = ConflictMatrix::build(&people, false);
        let allocation = allocate(&people, &matrix, &config(2, 1, 5)).unwrap();

        assert!(workloads(&allocation, 3).iter().all(|&load| load <= 1));
        assert_eq!(allocation.pairs.len(), 3);
        assert_eq!(allocation.warnings.len(), 2);
    }

    #[test]
    fn test_self_evaluation_allowed() {
        let people = participants(2);
        let matrix = ConflictMatrix::build(&people, true);
        let allocation = allocate(&people, &matrix, &config(2, 2, 0)).unwrap();
        assert_eq!(allocation.pairs.len(), 4);
        assert!(allocation.warnings.is_empty());
    }

    #[test]
    fn test_single_participant_rejected() {
        let people = participants(1);
        let matrix = ConflictMatrix::build(&people, false);
        let err = allocate(&people, &matrix, &config(2, 3, 0)).unwrap_err();
        assert_eq!(err.code(), "E014");
    }

    #[test]
    fn test_validate_rejects_self_pair() {
        let people = participants(3);
        let matrix = ConflictMatrix::build(&people, false);
        let allocation = Allocation {
            pairs: vec![AllocationPair {
                submission_index: 1,
                evaluator_index: 1,
                priority: 1,
            }],
            warnings: Vec::new(),
        };
        let err = validate_allocation(&allocation, &matrix, &config(2, 3, 0)).unwrap_err();
        assert_eq!(err.code(), "E016");
    }

    #[test]
    fn test_validate_rejects_overloaded_evaluator() {
        let people = participants(4);
        let matrix = ConflictMatrix::build(&people, false);
        let pairs = (1..4)
            .map(|submission| AllocationPair {
                submission_index: submission,
                evaluator_index: 0,
                priority: 1,
            })
            .collect();
        let allocation = Allocation {
            pairs,
            warnings: Vec::new(),
        };
        let err = validate_allocation(&allocation, &matrix, &config(2, 2, 0)).unwrap_err();
        assert_eq!(err.code(), "E017");
    }

    #[test]
    fn test_validate_rejects_duplicate_pair() {
        let people = participants(3);
        let matrix = ConflictMatrix::build(&people, false);
        let pair = AllocationPair {
            submission_index: 0,
            evaluator_index: 1,
            priority: 1,
        };
        let allocation = Allocation {
            pairs: vec![pair, pair],
            warnings: Vec::new(),
        };
        let err = validate_allocation(&allocation, &matrix, &config(2, 3, 0)).unwrap_err();
        assert!(err.is_allocation_invariant_violation());
    }
}
