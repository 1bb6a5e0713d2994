use super::RecordStore;
use crate::error::Result;
use crate::ids::{AssignmentId, CourseId, GradeId, StudentId};
use crate::model::{Assignment, Course, Grade, Student};

/// Volatile store used until a workspace is selected. Collections are plain
/// vectors, so listing order is insertion order for free.
#[derive(Debug, Default)]
pub struct MemoryStore {
    courses: Vec<Course>,
    students: Vec<Student>,
    assignments: Vec<Assignment>,
    grades: Vec<Grade>,
}

impl MemoryStore {
    fn student_mut(&mut self, id: StudentId) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.id == id)
    }

    fn assignment_mut(&mut self, id: AssignmentId) -> Option<&mut Assignment> {
        self.assignments.iter_mut().find(|a| a.id == id)
    }
}

fn push_unique(ids: &mut Vec<CourseId>, id: CourseId) -> bool {
    if ids.contains(&id) {
        return false;
    }
    ids.push(id);
    true
}

fn remove_id(ids: &mut Vec<CourseId>, id: CourseId) -> bool {
    let before = ids.len();
    ids.retain(|c| *c != id);
    ids.len() != before
}

impl RecordStore for MemoryStore {
    fn insert_course(&mut self, name: &str) -> Result<Course> {
        let course = Course {
            id: CourseId::new(),
            name: name.to_string(),
        };
        self.courses.push(course.clone());
        Ok(course)
    }

    fn course(&self, id: CourseId) -> Result<Option<Course>> {
        Ok(self.courses.iter().find(|c| c.id == id).cloned())
    }

    fn courses(&self) -> Result<Vec<Course>> {
        Ok(self.courses.clone())
    }

    fn rename_course(&mut self, id: CourseId, name: &str) -> Result<bool> {
        let Some(course) = self.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        course.name = name.to_string();
        Ok(true)
    }

    fn delete_course(&mut self, id: CourseId) -> Result<bool> {
        let before = self.courses.len();
        self.courses.retain(|c| c.id != id);
        if self.courses.len() == before {
            return Ok(false);
        }
        for s in &mut self.students {
            remove_id(&mut s.course_ids, id);
        }
        for a in &mut self.assignments {
            remove_id(&mut a.course_ids, id);
        }
        Ok(true)
    }

    fn insert_student(&mut self, full_name: &str, email: &str) -> Result<Student> {
        let student = Student {
            id: StudentId::new(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            course_ids: Vec::new(),
        };
        self.students.push(student.clone());
        Ok(student)
    }

    fn student(&self, id: StudentId) -> Result<Option<Student>> {
        Ok(self.students.iter().find(|s| s.id == id).cloned())
    }

    fn students(&self) -> Result<Vec<Student>> {
        Ok(self.students.clone())
    }

    fn update_student(&mut self, id: StudentId, full_name: &str, email: &str) -> Result<bool> {
        let Some(student) = self.student_mut(id) else {
            return Ok(false);
        };
        student.full_name = full_name.to_string();
        student.email = email.to_string();
        Ok(true)
    }

    fn delete_student(&mut self, id: StudentId) -> Result<bool> {
        let before = self.students.len();
        self.students.retain(|s| s.id != id);
        if self.students.len() == before {
            return Ok(false);
        }
        self.grades.retain(|g| g.student_id != id);
        Ok(true)
    }

    fn insert_assignment(&mut self, name: &str, point_value: f64) -> Result<Assignment> {
        let assignment = Assignment {
            id: AssignmentId::new(),
            name: name.to_string(),
            point_value,
            course_ids: Vec::new(),
        };
        self.assignments.push(assignment.clone());
        Ok(assignment)
    }

    fn assignment(&self, id: AssignmentId) -> Result<Option<Assignment>> {
        Ok(self.assignments.iter().find(|a| a.id == id).cloned())
    }

    fn assignments(&self) -> Result<Vec<Assignment>> {
        Ok(self.assignments.clone())
    }

    fn update_assignment(
        &mut self,
        id: AssignmentId,
        name: &str,
        point_value: f64,
    ) -> Result<bool> {
        let Some(assignment) = self.assignment_mut(id) else {
            return Ok(false);
        };
        assignment.name = name.to_string();
        assignment.point_value = point_value;
        Ok(true)
    }

    fn delete_assignment(&mut self, id: AssignmentId) -> Result<bool> {
        let before = self.assignments.len();
        self.assignments.retain(|a| a.id != id);
        if self.assignments.len() == before {
            return Ok(false);
        }
        self.grades.retain(|g| g.assignment_id != id);
        Ok(true)
    }

    fn link_student_course(&mut self, student_id: StudentId, course_id: CourseId) -> Result<bool> {
        Ok(self
            .student_mut(student_id)
            .map(|s| push_unique(&mut s.course_ids, course_id))
            .unwrap_or(false))
    }

    fn unlink_student_course(
        &mut self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<bool> {
        Ok(self
            .student_mut(student_id)
            .map(|s| remove_id(&mut s.course_ids, course_id))
            .unwrap_or(false))
    }

    fn link_assignment_course(
        &mut self,
        assignment_id: AssignmentId,
        course_id: CourseId,
    ) -> Result<bool> {
        Ok(self
            .assignment_mut(assignment_id)
            .map(|a| push_unique(&mut a.course_ids, course_id))
            .unwrap_or(false))
    }

    fn unlink_assignment_course(
        &mut self,
        assignment_id: AssignmentId,
        course_id: CourseId,
    ) -> Result<bool> {
        Ok(self
            .assignment_mut(assignment_id)
            .map(|a| remove_id(&mut a.course_ids, course_id))
            .unwrap_or(false))
    }

    fn grade(&self, student_id: StudentId, assignment_id: AssignmentId) -> Result<Option<Grade>> {
        Ok(self
            .grades
            .iter()
            .find(|g| g.student_id == student_id && g.assignment_id == assignment_id)
            .cloned())
    }

    fn grades_for_student(&self, student_id: StudentId) -> Result<Vec<Grade>> {
        Ok(self
            .grades
            .iter()
            .filter(|g| g.student_id == student_id)
            .cloned()
            .collect())
    }

    #[cfg(test)]
    fn grades(&self) -> Result<Vec<Grade>> {
        Ok(self.grades.clone())
    }

    fn insert_grade(
        &mut self,
        student_id: StudentId,
        assignment_id: AssignmentId,
        score: f64,
    ) -> Result<Grade> {
        let grade = Grade {
            id: GradeId::new(),
            student_id,
            assignment_id,
            score,
        };
        self.grades.push(grade.clone());
        Ok(grade)
    }

    fn set_grade_score(&mut self, id: GradeId, score: f64) -> Result<bool> {
        let Some(grade) = self.grades.iter_mut().find(|g| g.id == id) else {
            return Ok(false);
        };
        grade.score = score;
        Ok(true)
    }

    fn delete_grade(&mut self, id: GradeId) -> Result<bool> {
        let before = self.grades.len();
        self.grades.retain(|g| g.id != id);
        Ok(self.grades.len() != before)
    }
}
