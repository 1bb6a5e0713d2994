use crate::error::{GradebookError, Result};
use crate::ids::{AssignmentId, CourseId, StudentId};
use crate::model::{Assignment, Course, Student};
use crate::store::RecordStore;
use tracing::info;

fn required_text(field: &str, raw: &str) -> Result<String> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(GradebookError::invalid(format!("{field} must not be empty")));
    }
    Ok(t.to_string())
}

/// Point values come from a number input; anything that is not a positive,
/// finite number is refused at entry.
pub fn parse_point_value(raw: &str) -> Result<f64> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(GradebookError::invalid("pointValue must not be empty"));
    }
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        Ok(v) => Err(GradebookError::invalid(format!(
            "pointValue must be a positive number, got {v}"
        ))),
        Err(_) => Err(GradebookError::invalid(format!(
            "pointValue is not a number: {t}"
        ))),
    }
}

pub fn create_course<S: RecordStore + ?Sized>(store: &mut S, name: &str) -> Result<Course> {
    let name = required_text("name", name)?;
    let course = store.insert_course(&name)?;
    info!(course_id = %course.id, name = %course.name, "course created");
    Ok(course)
}

pub fn rename_course<S: RecordStore + ?Sized>(
    store: &mut S,
    id: CourseId,
    name: &str,
) -> Result<Course> {
    let name = required_text("name", name)?;
    if !store.rename_course(id, &name)? {
        return Err(GradebookError::not_found("course", id));
    }
    info!(course_id = %id, "course renamed");
    Ok(Course { id, name })
}

/// Removes the course and its association links. Grades stay in the ledger.
pub fn delete_course<S: RecordStore + ?Sized>(store: &mut S, id: CourseId) -> Result<()> {
    if !store.delete_course(id)? {
        return Err(GradebookError::not_found("course", id));
    }
    info!(course_id = %id, "course deleted");
    Ok(())
}

pub fn create_student<S: RecordStore + ?Sized>(
    store: &mut S,
    full_name: &str,
    email: &str,
) -> Result<Student> {
    let full_name = required_text("fullName", full_name)?;
    let email = required_text("email", email)?;
    let student = store.insert_student(&full_name, &email)?;
    info!(student_id = %student.id, "student created");
    Ok(student)
}

/// Fields left as `None` keep their stored value.
pub fn update_student<S: RecordStore + ?Sized>(
    store: &mut S,
    id: StudentId,
    full_name: Option<&str>,
    email: Option<&str>,
) -> Result<Student> {
    let Some(mut student) = store.student(id)? else {
        return Err(GradebookError::not_found("student", id));
    };
    if let Some(v) = full_name {
        student.full_name = required_text("fullName", v)?;
    }
    if let Some(v) = email {
        student.email = required_text("email", v)?;
    }
    store.update_student(id, &student.full_name, &student.email)?;
    info!(student_id = %id, "student updated");
    Ok(student)
}

/// Removes the student, its course links and its grades.
pub fn delete_student<S: RecordStore + ?Sized>(store: &mut S, id: StudentId) -> Result<()> {
    if !store.delete_student(id)? {
        return Err(GradebookError::not_found("student", id));
    }
    info!(student_id = %id, "student deleted");
    Ok(())
}

pub fn create_assignment<S: RecordStore + ?Sized>(
    store: &mut S,
    name: &str,
    raw_point_value: &str,
) -> Result<Assignment> {
    let name = required_text("name", name)?;
    let point_value = parse_point_value(raw_point_value)?;
    let assignment = store.insert_assignment(&name, point_value)?;
    info!(
        assignment_id = %assignment.id,
        point_value,
        "assignment created"
    );
    Ok(assignment)
}

/// Editing the point value re-scales every existing grade's percentage,
/// since percentages are derived on read.
pub fn update_assignment<S: RecordStore + ?Sized>(
    store: &mut S,
    id: AssignmentId,
    name: Option<&str>,
    raw_point_value: Option<&str>,
) -> Result<Assignment> {
    let Some(mut assignment) = store.assignment(id)? else {
        return Err(GradebookError::not_found("assignment", id));
    };
    if let Some(v) = name {
        assignment.name = required_text("name", v)?;
    }
    if let Some(v) = raw_point_value {
        assignment.point_value = parse_point_value(v)?;
    }
    store.update_assignment(id, &assignment.name, assignment.point_value)?;
    info!(assignment_id = %id, "assignment updated");
    Ok(assignment)
}

/// Removes the assignment, its course links and its grades.
pub fn delete_assignment<S: RecordStore + ?Sized>(store: &mut S, id: AssignmentId) -> Result<()> {
    if !store.delete_assignment(id)? {
        return Err(GradebookError::not_found("assignment", id));
    }
    info!(assignment_id = %id, "assignment deleted");
    Ok(())
}
