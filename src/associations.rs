//! Course membership for students and assignments.
//!
//! Membership is stored on the member (`course_ids`), so "who is in this
//! course" is a scan over members in store order.

use crate::error::{GradebookError, Result};
use crate::ids::{AssignmentId, CourseId, StudentId};
use crate::model::{Assignment, Student};
use crate::store::RecordStore;
use tracing::{debug, info};

fn ensure_course<S: RecordStore + ?Sized>(store: &S, course_id: CourseId) -> Result<()> {
    if store.course(course_id)?.is_none() {
        return Err(GradebookError::not_found("course", course_id));
    }
    Ok(())
}

fn ensure_student<S: RecordStore + ?Sized>(store: &S, student_id: StudentId) -> Result<()> {
    if store.student(student_id)?.is_none() {
        return Err(GradebookError::not_found("student", student_id));
    }
    Ok(())
}

fn ensure_assignment<S: RecordStore + ?Sized>(
    store: &S,
    assignment_id: AssignmentId,
) -> Result<()> {
    if store.assignment(assignment_id)?.is_none() {
        return Err(GradebookError::not_found("assignment", assignment_id));
    }
    Ok(())
}

/// Returns `true` if the link is new. Re-associating is a silent no-op.
pub fn associate_student<S: RecordStore + ?Sized>(
    store: &mut S,
    course_id: CourseId,
    student_id: StudentId,
) -> Result<bool> {
    ensure_course(store, course_id)?;
    ensure_student(store, student_id)?;
    let linked = store.link_student_course(student_id, course_id)?;
    if linked {
        info!(course_id = %course_id, student_id = %student_id, "student associated");
    } else {
        debug!(course_id = %course_id, student_id = %student_id, "student already associated");
    }
    Ok(linked)
}

pub fn associate_assignment<S: RecordStore + ?Sized>(
    store: &mut S,
    course_id: CourseId,
    assignment_id: AssignmentId,
) -> Result<bool> {
    ensure_course(store, course_id)?;
    ensure_assignment(store, assignment_id)?;
    let linked = store.link_assignment_course(assignment_id, course_id)?;
    if linked {
        info!(course_id = %course_id, assignment_id = %assignment_id, "assignment associated");
    } else {
        debug!(course_id = %course_id, assignment_id = %assignment_id, "assignment already associated");
    }
    Ok(linked)
}

/// Returns `true` if a link was removed. Grades are not touched.
pub fn dissociate_student<S: RecordStore + ?Sized>(
    store: &mut S,
    course_id: CourseId,
    student_id: StudentId,
) -> Result<bool> {
    ensure_course(store, course_id)?;
    ensure_student(store, student_id)?;
    let removed = store.unlink_student_course(student_id, course_id)?;
    if removed {
        info!(course_id = %course_id, student_id = %student_id, "student dissociated");
    }
    Ok(removed)
}

pub fn dissociate_assignment<S: RecordStore + ?Sized>(
    store: &mut S,
    course_id: CourseId,
    assignment_id: AssignmentId,
) -> Result<bool> {
    ensure_course(store, course_id)?;
    ensure_assignment(store, assignment_id)?;
    let removed = store.unlink_assignment_course(assignment_id, course_id)?;
    if removed {
        info!(course_id = %course_id, assignment_id = %assignment_id, "assignment dissociated");
    }
    Ok(removed)
}

/// Empty for an unknown course, never an error.
pub fn students_in_course<S: RecordStore + ?Sized>(
    store: &S,
    course_id: CourseId,
) -> Result<Vec<Student>> {
    Ok(store
        .students()?
        .into_iter()
        .filter(|s| s.in_course(course_id))
        .collect())
}

/// Empty for an unknown course, never an error.
pub fn assignments_in_course<S: RecordStore + ?Sized>(
    store: &S,
    course_id: CourseId,
) -> Result<Vec<Assignment>> {
    Ok(store
        .assignments()?
        .into_iter()
        .filter(|a| a.in_course(course_id))
        .collect())
}
