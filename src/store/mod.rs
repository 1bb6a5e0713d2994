//! Record persistence behind a single trait, so the association, ledger and
//! calculation code never knows whether it runs against memory or SQLite.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, DB_FILE_NAME};

use crate::error::Result;
use crate::ids::{AssignmentId, CourseId, GradeId, StudentId};
use crate::model::{Assignment, Course, Grade, Student};

/// CRUD over courses, students, assignments and grades.
///
/// Listing methods return records in insertion order, and each record's
/// `course_ids` in link order. Stores assign ids; callers never pick them.
///
/// Delete semantics:
/// - deleting a course removes every student/assignment link to it but keeps grades;
/// - deleting a student or an assignment removes its links and its grades.
///
/// Methods taking an id return `false` (or `None`) for unknown ids instead of
/// failing; existence policy lives in the callers.
pub trait RecordStore {
    fn insert_course(&mut self, name: &str) -> Result<Course>;
    fn course(&self, id: CourseId) -> Result<Option<Course>>;
    fn courses(&self) -> Result<Vec<Course>>;
    fn rename_course(&mut self, id: CourseId, name: &str) -> Result<bool>;
    fn delete_course(&mut self, id: CourseId) -> Result<bool>;

    fn insert_student(&mut self, full_name: &str, email: &str) -> Result<Student>;
    fn student(&self, id: StudentId) -> Result<Option<Student>>;
    fn students(&self) -> Result<Vec<Student>>;
    fn update_student(&mut self, id: StudentId, full_name: &str, email: &str) -> Result<bool>;
    fn delete_student(&mut self, id: StudentId) -> Result<bool>;

    fn insert_assignment(&mut self, name: &str, point_value: f64) -> Result<Assignment>;
    fn assignment(&self, id: AssignmentId) -> Result<Option<Assignment>>;
    fn assignments(&self) -> Result<Vec<Assignment>>;
    fn update_assignment(&mut self, id: AssignmentId, name: &str, point_value: f64)
        -> Result<bool>;
    fn delete_assignment(&mut self, id: AssignmentId) -> Result<bool>;

    /// Returns `true` when the link was newly created.
    fn link_student_course(&mut self, student_id: StudentId, course_id: CourseId) -> Result<bool>;
    /// Returns `true` when a link was removed.
    fn unlink_student_course(&mut self, student_id: StudentId, course_id: CourseId)
        -> Result<bool>;
    fn link_assignment_course(
        &mut self,
        assignment_id: AssignmentId,
        course_id: CourseId,
    ) -> Result<bool>;
    fn unlink_assignment_course(
        &mut self,
        assignment_id: AssignmentId,
        course_id: CourseId,
    ) -> Result<bool>;

    fn grade(&self, student_id: StudentId, assignment_id: AssignmentId) -> Result<Option<Grade>>;
    fn grades_for_student(&self, student_id: StudentId) -> Result<Vec<Grade>>;
    /// Every grade in the ledger; only assertions need the full table.
    #[cfg(test)]
    fn grades(&self) -> Result<Vec<Grade>>;
    fn insert_grade(
        &mut self,
        student_id: StudentId,
        assignment_id: AssignmentId,
        score: f64,
    ) -> Result<Grade>;
    fn set_grade_score(&mut self, id: GradeId, score: f64) -> Result<bool>;
    fn delete_grade(&mut self, id: GradeId) -> Result<bool>;
}
