use crate::error::{GradebookError, Result};
use crate::ids::{AssignmentId, StudentId};
use crate::model::Grade;
use crate::store::RecordStore;
use serde::Serialize;
use tracing::{debug, info};

/// Result of a grade lookup. `Ungraded` is distinct from a score of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GradeLookup {
    Ungraded,
    Graded { score: f64 },
}

impl GradeLookup {
    pub fn score(self) -> Option<f64> {
        match self {
            Self::Ungraded => None,
            Self::Graded { score } => Some(score),
        }
    }
}

/// Strict numeric parse of a raw score entry. Blank, non-numeric, NaN and
/// infinite inputs are all refused.
pub fn parse_score(raw: &str) -> Result<f64> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(GradebookError::invalid("score must not be empty"));
    }
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(GradebookError::invalid(format!("score is not a number: {t}"))),
    }
}

/// Upserts the single grade for (student, assignment).
///
/// The input is parsed before anything is read or written, so a rejected
/// submission never changes the ledger.
pub fn submit_grade<S: RecordStore + ?Sized>(
    store: &mut S,
    student_id: StudentId,
    assignment_id: AssignmentId,
    raw_score: &str,
) -> Result<Grade> {
    let score = parse_score(raw_score)?;
    if store.student(student_id)?.is_none() {
        return Err(GradebookError::not_found("student", student_id));
    }
    if store.assignment(assignment_id)?.is_none() {
        return Err(GradebookError::not_found("assignment", assignment_id));
    }

    match store.grade(student_id, assignment_id)? {
        Some(mut existing) => {
            store.set_grade_score(existing.id, score)?;
            debug!(grade_id = %existing.id, previous = existing.score, score, "grade overwritten");
            existing.score = score;
            Ok(existing)
        }
        None => {
            let grade = store.insert_grade(student_id, assignment_id, score)?;
            info!(
                grade_id = %grade.id,
                student_id = %student_id,
                assignment_id = %assignment_id,
                score,
                "grade recorded"
            );
            Ok(grade)
        }
    }
}

pub fn grade_for<S: RecordStore + ?Sized>(
    store: &S,
    student_id: StudentId,
    assignment_id: AssignmentId,
) -> Result<GradeLookup> {
    Ok(store
        .grade(student_id, assignment_id)?
        .map(|g| GradeLookup::Graded { score: g.score })
        .unwrap_or(GradeLookup::Ungraded))
}

/// Returns the pair to the ungraded state. `true` if a grade was removed.
pub fn clear_grade<S: RecordStore + ?Sized>(
    store: &mut S,
    student_id: StudentId,
    assignment_id: AssignmentId,
) -> Result<bool> {
    let Some(existing) = store.grade(student_id, assignment_id)? else {
        return Ok(false);
    };
    let removed = store.delete_grade(existing.id)?;
    if removed {
        info!(grade_id = %existing.id, "grade cleared");
    }
    Ok(removed)
}

pub fn grades_for_student<S: RecordStore + ?Sized>(
    store: &S,
    student_id: StudentId,
) -> Result<Vec<Grade>> {
    store.grades_for_student(student_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn seeded() -> (MemoryStore, StudentId, AssignmentId) {
        let mut store = MemoryStore::default();
        let s = store.insert_student("Ada", "ada@example.com").expect("insert");
        let a = store.insert_assignment("Quiz", 20.0).expect("insert");
        (store, s.id, a.id)
    }

    #[test]
    fn second_submission_overwrites_first() {
        let (mut store, s, a) = seeded();
        let first = submit_grade(&mut store, s, a, "12").expect("first");
        let second = submit_grade(&mut store, s, a, "17.5").expect("second");

        assert_eq!(first.id, second.id);
        let grades = store.grades().expect("list");
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].score, 17.5);
        assert_eq!(
            grade_for(&store, s, a).expect("lookup"),
            GradeLookup::Graded { score: 17.5 }
        );
    }

    #[test]
    fn unparseable_input_changes_nothing() {
        let (mut store, s, a) = seeded();
        for bad in ["abc", "", "   ", "NaN", "inf", "12abc"] {
            let err = submit_grade(&mut store, s, a, bad).expect_err("should reject");
            assert!(matches!(err, GradebookError::InvalidInput(_)), "{bad:?}");
        }
        assert!(store.grades().expect("list").is_empty());

        submit_grade(&mut store, s, a, "5").expect("valid");
        submit_grade(&mut store, s, a, "abc").expect_err("reject");
        assert_eq!(grade_for(&store, s, a).expect("lookup").score(), Some(5.0));
    }

    #[test]
    fn ungraded_is_not_zero() {
        let (mut store, s, a) = seeded();
        assert_eq!(grade_for(&store, s, a).expect("lookup"), GradeLookup::Ungraded);
        submit_grade(&mut store, s, a, "0").expect("zero");
        assert_eq!(
            grade_for(&store, s, a).expect("lookup"),
            GradeLookup::Graded { score: 0.0 }
        );
    }

    #[test]
    fn out_of_range_scores_are_kept_as_entered() {
        let (mut store, s, a) = seeded();
        submit_grade(&mut store, s, a, "-3").expect("negative");
        assert_eq!(grade_for(&store, s, a).expect("lookup").score(), Some(-3.0));
        submit_grade(&mut store, s, a, "25").expect("over max");
        assert_eq!(grade_for(&store, s, a).expect("lookup").score(), Some(25.0));
    }

    #[test]
    fn unknown_records_are_not_found() {
        let (mut store, s, a) = seeded();
        assert!(matches!(
            submit_grade(&mut store, StudentId::new(), a, "1"),
            Err(GradebookError::NotFound { entity: "student", .. })
        ));
        assert!(matches!(
            submit_grade(&mut store, s, AssignmentId::new(), "1"),
            Err(GradebookError::NotFound { entity: "assignment", .. })
        ));
    }

    #[test]
    fn clearing_returns_pair_to_ungraded() {
        let (mut store, s, a) = seeded();
        submit_grade(&mut store, s, a, "9").expect("grade");
        assert!(clear_grade(&mut store, s, a).expect("clear"));
        assert!(!clear_grade(&mut store, s, a).expect("clear again"));
        assert_eq!(grade_for(&store, s, a).expect("lookup"), GradeLookup::Ungraded);
    }

    #[test]
    fn lookup_serializes_with_state_tag() {
        let v = serde_json::to_value(GradeLookup::Graded { score: 4.0 }).expect("json");
        assert_eq!(v, serde_json::json!({ "state": "graded", "score": 4.0 }));
        let v = serde_json::to_value(GradeLookup::Ungraded).expect("json");
        assert_eq!(v, serde_json::json!({ "state": "ungraded" }));
    }
}
