use crate::ids::{AssignmentId, CourseId, GradeId, StudentId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub email: String,
    /// Linked courses, oldest link first.
    pub course_ids: Vec<CourseId>,
}

impl Student {
    pub fn in_course(&self, course_id: CourseId) -> bool {
        self.course_ids.contains(&course_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub name: String,
    pub point_value: f64,
    /// Linked courses, oldest link first.
    pub course_ids: Vec<CourseId>,
}

impl Assignment {
    pub fn in_course(&self, course_id: CourseId) -> bool {
        self.course_ids.contains(&course_id)
    }
}

/// Raw score for one (student, assignment) pair. Percentages are never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: GradeId,
    pub student_id: StudentId,
    pub assignment_id: AssignmentId,
    pub score: f64,
}
