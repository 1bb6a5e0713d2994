use crate::associations::{assignments_in_course, students_in_course};
use crate::error::{GradebookError, Result};
use crate::ids::{AssignmentId, CourseId, StudentId};
use crate::ledger;
use crate::model::{Assignment, Course};
use crate::store::RecordStore;
use serde::Serialize;
use std::collections::HashMap;

/// Per-student course average, or the marker that nothing counted yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StudentAverage {
    NoGradesYet,
    Percent { percent: f64 },
}

impl StudentAverage {
    pub fn percent(self) -> Option<f64> {
        match self {
            Self::NoGradesYet => None,
            Self::Percent { percent } => Some(percent),
        }
    }
}

/// Half-up rounding to two decimals: `floor(100x + 0.5) / 100`.
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

/// Percentage of `point_value` earned by `score`. `None` when the point value
/// cannot be divided by (zero, negative, or not finite).
pub fn percent_of(score: f64, point_value: f64) -> Option<f64> {
    if point_value.is_finite() && point_value > 0.0 {
        Some(100.0 * score / point_value)
    } else {
        None
    }
}

fn mean_percent<I>(percents: I) -> StudentAverage
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for p in percents {
        sum += p;
        count += 1;
    }
    if count == 0 {
        StudentAverage::NoGradesYet
    } else {
        StudentAverage::Percent {
            percent: round_off_2_decimals(sum / (count as f64)),
        }
    }
}

/// Ungraded assignments and guarded point values drop out; they never count as zero.
fn average_over(assignments: &[Assignment], scores: &HashMap<AssignmentId, f64>) -> StudentAverage {
    mean_percent(assignments.iter().filter_map(|a| {
        let score = scores.get(&a.id)?;
        percent_of(*score, a.point_value)
    }))
}

fn scores_by_assignment<S: RecordStore + ?Sized>(
    store: &S,
    student_id: StudentId,
) -> Result<HashMap<AssignmentId, f64>> {
    Ok(ledger::grades_for_student(store, student_id)?
        .into_iter()
        .map(|g| (g.assignment_id, g.score))
        .collect())
}

pub fn average_for_student<S: RecordStore + ?Sized>(
    store: &S,
    course_id: CourseId,
    student_id: StudentId,
) -> Result<StudentAverage> {
    let assignments = assignments_in_course(store, course_id)?;
    if assignments.is_empty() {
        return Ok(StudentAverage::NoGradesYet);
    }
    let scores = scores_by_assignment(store, student_id)?;
    Ok(average_over(&assignments, &scores))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    pub assignment_id: AssignmentId,
    pub name: String,
    pub point_value: f64,
    pub graded_count: usize,
    pub ungraded_count: usize,
    /// Mean percentage over graded course members; `None` when nobody is
    /// graded or the point value is guarded.
    pub class_avg_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub student_id: StudentId,
    pub full_name: String,
    pub email: String,
    pub average: StudentAverage,
    pub graded_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub course: Course,
    pub assignments: Vec<AssignmentStats>,
    pub students: Vec<StudentRow>,
}

pub fn course_summary<S: RecordStore + ?Sized>(
    store: &S,
    course_id: CourseId,
) -> Result<CourseSummary> {
    let Some(course) = store.course(course_id)? else {
        return Err(GradebookError::not_found("course", course_id));
    };
    let assignments = assignments_in_course(store, course_id)?;
    let students = students_in_course(store, course_id)?;

    let mut score_by_student: Vec<HashMap<AssignmentId, f64>> = Vec::with_capacity(students.len());
    for s in &students {
        score_by_student.push(scores_by_assignment(store, s.id)?);
    }

    let per_assignment = assignments
        .iter()
        .map(|a| {
            let scores: Vec<f64> = score_by_student
                .iter()
                .filter_map(|m| m.get(&a.id).copied())
                .collect();
            let class_avg_percent = mean_percent(
                scores
                    .iter()
                    .filter_map(|score| percent_of(*score, a.point_value)),
            )
            .percent();
            AssignmentStats {
                assignment_id: a.id,
                name: a.name.clone(),
                point_value: a.point_value,
                graded_count: scores.len(),
                ungraded_count: students.len() - scores.len(),
                class_avg_percent,
            }
        })
        .collect();

    let per_student = students
        .iter()
        .zip(&score_by_student)
        .map(|(s, scores)| StudentRow {
            student_id: s.id,
            full_name: s.full_name.clone(),
            email: s.email.clone(),
            average: average_over(&assignments, scores),
            graded_count: assignments.iter().filter(|a| scores.contains_key(&a.id)).count(),
        })
        .collect();

    Ok(CourseSummary {
        course,
        assignments: per_assignment,
        students: per_student,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::associations::{associate_assignment, associate_student};
    use crate::ledger::submit_grade;
    use crate::records;
    use crate::store::{MemoryStore, SqliteStore};

    struct Fixture {
        course: CourseId,
        student: StudentId,
    }

    fn enroll<S: RecordStore + ?Sized>(store: &mut S) -> Fixture {
        let c = store.insert_course("Statistics").expect("course");
        let s = store.insert_student("Florence Nightingale", "fn@example.com").expect("student");
        associate_student(store, c.id, s.id).expect("enroll");
        Fixture {
            course: c.id,
            student: s.id,
        }
    }

    fn add_assignment<S: RecordStore + ?Sized>(
        store: &mut S,
        course: CourseId,
        name: &str,
        point_value: f64,
    ) -> AssignmentId {
        let a = store.insert_assignment(name, point_value).expect("assignment");
        associate_assignment(store, course, a.id).expect("link");
        a.id
    }

    #[test]
    fn round_off_is_half_up() {
        assert_eq!(round_off_2_decimals(90.0), 90.0);
        assert_eq!(round_off_2_decimals(33.333_333), 33.33);
        assert_eq!(round_off_2_decimals(66.666_666), 66.67);
        assert_eq!(round_off_2_decimals(12.345_1), 12.35);
    }

    #[test]
    fn worked_example_averages_to_ninety() {
        let mut store = MemoryStore::default();
        let f = enroll(&mut store);
        let a = add_assignment(&mut store, f.course, "A", 50.0);
        let b = add_assignment(&mut store, f.course, "B", 20.0);
        submit_grade(&mut store, f.student, a, "40").expect("grade a");
        submit_grade(&mut store, f.student, b, "20").expect("grade b");

        let avg = average_for_student(&store, f.course, f.student).expect("avg");
        assert_eq!(avg, StudentAverage::Percent { percent: 90.0 });
    }

    #[test]
    fn no_grades_yet_even_with_assignments() {
        let mut store = MemoryStore::default();
        let f = enroll(&mut store);
        add_assignment(&mut store, f.course, "A", 10.0);
        add_assignment(&mut store, f.course, "B", 10.0);
        assert_eq!(
            average_for_student(&store, f.course, f.student).expect("avg"),
            StudentAverage::NoGradesYet
        );
    }

    #[test]
    fn ungraded_assignments_do_not_count_as_zero() {
        let mut store = MemoryStore::default();
        let f = enroll(&mut store);
        let a = add_assignment(&mut store, f.course, "A", 10.0);
        add_assignment(&mut store, f.course, "B", 10.0);
        submit_grade(&mut store, f.student, a, "7").expect("grade");
        assert_eq!(
            average_for_student(&store, f.course, f.student).expect("avg").percent(),
            Some(70.0)
        );
    }

    #[test]
    fn zero_point_assignment_is_excluded_without_error() {
        let mut store = MemoryStore::default();
        let f = enroll(&mut store);
        let a = add_assignment(&mut store, f.course, "A", 10.0);
        let z = add_assignment(&mut store, f.course, "Zero", 0.0);
        submit_grade(&mut store, f.student, a, "5").expect("grade");
        submit_grade(&mut store, f.student, z, "3").expect("grade zero-point");
        assert_eq!(
            average_for_student(&store, f.course, f.student).expect("avg").percent(),
            Some(50.0)
        );

        let mut only_zero = MemoryStore::default();
        let g = enroll(&mut only_zero);
        let z = add_assignment(&mut only_zero, g.course, "Zero", 0.0);
        submit_grade(&mut only_zero, g.student, z, "3").expect("grade");
        assert_eq!(
            average_for_student(&only_zero, g.course, g.student).expect("avg"),
            StudentAverage::NoGradesYet
        );
    }

    #[test]
    fn only_the_viewed_course_counts() {
        let mut store = MemoryStore::default();
        let f = enroll(&mut store);
        let other = store.insert_course("Other").expect("course");
        let a = add_assignment(&mut store, f.course, "In", 10.0);
        let b = add_assignment(&mut store, other.id, "Out", 10.0);
        submit_grade(&mut store, f.student, a, "10").expect("grade");
        submit_grade(&mut store, f.student, b, "0").expect("grade");
        assert_eq!(
            average_for_student(&store, f.course, f.student).expect("avg").percent(),
            Some(100.0)
        );
    }

    #[test]
    fn point_value_edit_shifts_average_retroactively() {
        let mut store = MemoryStore::default();
        let f = enroll(&mut store);
        let a = add_assignment(&mut store, f.course, "A", 10.0);
        submit_grade(&mut store, f.student, a, "8").expect("grade");
        assert_eq!(
            average_for_student(&store, f.course, f.student).expect("avg").percent(),
            Some(80.0)
        );
        records::update_assignment(&mut store, a, None, Some("16")).expect("edit");
        assert_eq!(
            average_for_student(&store, f.course, f.student).expect("avg").percent(),
            Some(50.0)
        );
    }

    #[test]
    fn over_full_marks_are_accepted() {
        let mut store = MemoryStore::default();
        let f = enroll(&mut store);
        let a = add_assignment(&mut store, f.course, "Bonus", 10.0);
        submit_grade(&mut store, f.student, a, "12").expect("grade");
        assert_eq!(
            average_for_student(&store, f.course, f.student).expect("avg").percent(),
            Some(120.0)
        );
    }

    #[test]
    fn course_summary_reports_each_member() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        let f = enroll(&mut store);
        let second = store.insert_student("John Snow", "js@example.com").expect("student");
        associate_student(&mut store, f.course, second.id).expect("enroll");
        let a = add_assignment(&mut store, f.course, "A", 50.0);
        let b = add_assignment(&mut store, f.course, "B", 20.0);
        submit_grade(&mut store, f.student, a, "40").expect("grade");
        submit_grade(&mut store, f.student, b, "20").expect("grade");
        submit_grade(&mut store, second.id, a, "25").expect("grade");

        let summary = course_summary(&store, f.course).expect("summary");
        assert_eq!(summary.course.name, "Statistics");

        assert_eq!(summary.assignments.len(), 2);
        let sa = &summary.assignments[0];
        assert_eq!(sa.assignment_id, a);
        assert_eq!(sa.graded_count, 2);
        assert_eq!(sa.ungraded_count, 0);
        assert_eq!(sa.class_avg_percent, Some(65.0));
        let sb = &summary.assignments[1];
        assert_eq!(sb.graded_count, 1);
        assert_eq!(sb.ungraded_count, 1);
        assert_eq!(sb.class_avg_percent, Some(100.0));

        assert_eq!(summary.students.len(), 2);
        assert_eq!(summary.students[0].student_id, f.student);
        assert_eq!(summary.students[0].average.percent(), Some(90.0));
        assert_eq!(summary.students[0].graded_count, 2);
        assert_eq!(summary.students[1].average.percent(), Some(50.0));
        assert_eq!(summary.students[1].graded_count, 1);
    }

    #[test]
    fn course_summary_of_unknown_course_is_not_found() {
        let store = MemoryStore::default();
        assert!(matches!(
            course_summary(&store, CourseId::new()),
            Err(GradebookError::NotFound { entity: "course", .. })
        ));
    }

    #[test]
    fn average_serializes_with_state_tag() {
        let v = serde_json::to_value(StudentAverage::NoGradesYet).expect("json");
        assert_eq!(v, serde_json::json!({ "state": "no_grades_yet" }));
        let v = serde_json::to_value(StudentAverage::Percent { percent: 90.0 }).expect("json");
        assert_eq!(v, serde_json::json!({ "state": "percent", "percent": 90.0 }));
    }
}
