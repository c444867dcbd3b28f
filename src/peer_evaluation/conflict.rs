//! 冲突矩阵
//!
//! `matrix[i][j] == true` 表示学生 i 不能评价提交 j。后续分配只读取矩阵，
//! 不关心冲突来自哪条规则。

/// 参与互评的学生及其提交
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub student_id: i64,
    pub submission_id: i64,
}

/// 冲突规则
pub trait ConflictRule: Send + Sync {
    /// 评价人 `evaluator` 是否不能评价 `target` 的提交
    fn conflicts(&self, evaluator: &Participant, target: &Participant) -> bool;
}

/// 禁止自评（学生不能评价自己的提交）
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfEvaluationRule;

impl ConflictRule for SelfEvaluationRule {
    fn conflicts(&self, evaluator: &Participant, target: &Participant) -> bool {
        evaluator.student_id == target.student_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictMatrix {
    cells: Vec<Vec<bool>>,
}

impl ConflictMatrix {
    /// 按默认规则构建：不允许自评时加入 [`SelfEvaluationRule`]
    pub fn build(participants: &[Participant], allow_self_evaluation: bool) -> Self {
        let mut rules: Vec<Box<dyn ConflictRule>> = Vec::new();
        if !allow_self_evaluation {
            rules.push(Box::new(SelfEvaluationRule));
        }
        Self::with_rules(participants, &rules)
    }

    pub fn with_rules(participants: &[Participant], rules: &[Box<dyn ConflictRule>]) -> Self {
        let cells = participants
            .iter()
            .map(|evaluator| {
                participants
                    .iter()
                    .map(|target| rules.iter().any(|rule| rule.conflicts(evaluator, target)))
                    .collect()
            })
            .collect();
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 越界视为冲突
    pub fn is_conflict(&self, evaluator: usize, submission: usize) -> bool {
        self.cells
            .get(evaluator)
            .and_then(|row| row.get(submission))
            .copied()
            .unwrap_or(true)
    }
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

    #[test]
    fn test_diagonal_conflicts_without_self_evaluation() {
        let matrix = ConflictMatrix::build(&participants(3), false);
        assert_eq!(matrix.len(), 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix.is_conflict(i, j), i == j);
            }
        }
    }

    #[test]
    fn test_no_conflicts_when_self_evaluation_allowed() {
        let matrix = ConflictMatrix::build(&participants(3), true);
        assert!(!matrix.is_conflict(1, 1));
        assert!(matrix.is_conflict(3, 0));
    }

    struct SameGroupRule;

    impl ConflictRule for SameGroupRule {
        fn conflicts(&self, evaluator: &Participant, target: &Participant) -> bool {
            evaluator.student_id % 2 == target.student_id % 2
        }
    }

    #[test]
    fn test_custom_rules_are_combined() {
        let rules: Vec<Box<dyn ConflictRule>> =
            vec![Box::new(SelfEvaluationRule), Box::new(SameGroupRule)];
        let matrix = ConflictMatrix::with_rules(&participants(4), &rules);
        assert!(matrix.is_conflict(0, 2));
        assert!(!matrix.is_conflict(0, 1));
    }
}
