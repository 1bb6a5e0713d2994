use super::RecordStore;
use crate::error::Result;
use crate::ids::{AssignmentId, CourseId, GradeId, StudentId};
use crate::model::{Assignment, Course, Grade, Student};
use anyhow::{bail, Context};
use rusqlite::{Connection, OpenFlags, OptionalExtension, ToSql};
use std::collections::HashMap;
use std::path::Path;

pub const DB_FILE_NAME: &str = "gradebook.sqlite3";
const SCHEMA_VERSION: i64 = 1;

/// Workspace store: one SQLite file per workspace directory.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace).with_context(|| {
            format!("failed to create workspace {}", workspace.to_string_lossy())
        })?;
        let db_path = workspace.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
        Self::init(conn)
    }

    /// Checks that `path` is a SQLite database this build can open, without
    /// creating tables or bumping its schema version.
    pub fn check_file(path: &Path) -> anyhow::Result<()> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", path.to_string_lossy()))?;
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .with_context(|| format!("{} is not a SQLite database", path.to_string_lossy()))?;
        if version > SCHEMA_VERSION {
            bail!(
                "backup schema version {} is newer than supported version {}",
                version,
                SCHEMA_VERSION
            );
        }
        let integrity: String = conn
            .query_row("PRAGMA quick_check", [], |r| r.get(0))
            .context("integrity check failed")?;
        if integrity != "ok" {
            bail!("database failed integrity check: {}", integrity);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    fn exists(&self, table: &str, id: &dyn ToSql) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
        let hit: Option<i64> = self
            .conn
            .query_row(&sql, [id], |r| r.get(0))
            .optional()?;
        Ok(hit.is_some())
    }

    fn student_links(&self) -> Result<HashMap<StudentId, Vec<CourseId>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT student_id, course_id FROM student_courses ORDER BY rowid")?;
        let rows = stmt.query_map([], |r| {
            Ok((r.get::<_, StudentId>(0)?, r.get::<_, CourseId>(1)?))
        })?;
        let mut links: HashMap<StudentId, Vec<CourseId>> = HashMap::new();
        for row in rows {
            let (student_id, course_id) = row?;
            links.entry(student_id).or_default().push(course_id);
        }
        Ok(links)
    }

    fn assignment_links(&self) -> Result<HashMap<AssignmentId, Vec<CourseId>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT assignment_id, course_id FROM assignment_courses ORDER BY rowid")?;
        let rows = stmt.query_map([], |r| {
            Ok((r.get::<_, AssignmentId>(0)?, r.get::<_, CourseId>(1)?))
        })?;
        let mut links: HashMap<AssignmentId, Vec<CourseId>> = HashMap::new();
        for row in rows {
            let (assignment_id, course_id) = row?;
            links.entry(assignment_id).or_default().push(course_id);
        }
        Ok(links)
    }

    fn course_ids_for(&self, sql: &str, owner: &dyn ToSql) -> Result<Vec<CourseId>> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map([owner], |r| r.get::<_, CourseId>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn create_schema(conn: &Connection) -> anyhow::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if version > SCHEMA_VERSION {
        bail!(
            "workspace schema version {} is newer than supported version {}",
            version,
            SCHEMA_VERSION
        );
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS assignments(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            point_value REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_courses(
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            PRIMARY KEY(student_id, course_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_courses_course ON student_courses(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS assignment_courses(
            assignment_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            PRIMARY KEY(assignment_id, course_id),
            FOREIGN KEY(assignment_id) REFERENCES assignments(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_assignment_courses_course ON assignment_courses(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            assignment_id TEXT NOT NULL,
            score REAL NOT NULL,
            updated_at TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(assignment_id) REFERENCES assignments(id),
            UNIQUE(student_id, assignment_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_student ON grades(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grades_assignment ON grades(assignment_id)",
        [],
    )?;

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn grade_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Grade> {
    Ok(Grade {
        id: r.get(0)?,
        student_id: r.get(1)?,
        assignment_id: r.get(2)?,
        score: r.get(3)?,
    })
}

impl RecordStore for SqliteStore {
    fn insert_course(&mut self, name: &str) -> Result<Course> {
        let id = CourseId::new();
        self.conn
            .execute("INSERT INTO courses(id, name) VALUES(?, ?)", (&id, name))?;
        Ok(Course {
            id,
            name: name.to_string(),
        })
    }

    fn course(&self, id: CourseId) -> Result<Option<Course>> {
        let course = self
            .conn
            .query_row("SELECT id, name FROM courses WHERE id = ?", [&id], |r| {
                Ok(Course {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            })
            .optional()?;
        Ok(course)
    }

    fn courses(&self) -> Result<Vec<Course>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM courses ORDER BY rowid")?;
        let courses = stmt
            .query_map([], |r| {
                Ok(Course {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(courses)
    }

    fn rename_course(&mut self, id: CourseId, name: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("UPDATE courses SET name = ? WHERE id = ?", (name, &id))?;
        Ok(changed > 0)
    }

    fn delete_course(&mut self, id: CourseId) -> Result<bool> {
        let tx = self.conn.transaction()?;
        // Grades are keyed by student and assignment, so they outlive the course.
        tx.execute("DELETE FROM student_courses WHERE course_id = ?", [&id])?;
        tx.execute("DELETE FROM assignment_courses WHERE course_id = ?", [&id])?;
        let deleted = tx.execute("DELETE FROM courses WHERE id = ?", [&id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn insert_student(&mut self, full_name: &str, email: &str) -> Result<Student> {
        let id = StudentId::new();
        self.conn.execute(
            "INSERT INTO students(id, full_name, email) VALUES(?, ?, ?)",
            (&id, full_name, email),
        )?;
        Ok(Student {
            id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            course_ids: Vec::new(),
        })
    }

    fn student(&self, id: StudentId) -> Result<Option<Student>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT full_name, email FROM students WHERE id = ?",
                [&id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let Some((full_name, email)) = row else {
            return Ok(None);
        };
        let course_ids = self.course_ids_for(
            "SELECT course_id FROM student_courses WHERE student_id = ? ORDER BY rowid",
            &id,
        )?;
        Ok(Some(Student {
            id,
            full_name,
            email,
            course_ids,
        }))
    }

    fn students(&self) -> Result<Vec<Student>> {
        let mut links = self.student_links()?;
        let mut stmt = self
            .conn
            .prepare("SELECT id, full_name, email FROM students ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, StudentId>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .map(|(id, full_name, email)| Student {
                id,
                full_name,
                email,
                course_ids: links.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    fn update_student(&mut self, id: StudentId, full_name: &str, email: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE students SET full_name = ?, email = ? WHERE id = ?",
            (full_name, email, &id),
        )?;
        Ok(changed > 0)
    }

    fn delete_student(&mut self, id: StudentId) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM grades WHERE student_id = ?", [&id])?;
        tx.execute("DELETE FROM student_courses WHERE student_id = ?", [&id])?;
        let deleted = tx.execute("DELETE FROM students WHERE id = ?", [&id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn insert_assignment(&mut self, name: &str, point_value: f64) -> Result<Assignment> {
        let id = AssignmentId::new();
        self.conn.execute(
            "INSERT INTO assignments(id, name, point_value) VALUES(?, ?, ?)",
            (&id, name, point_value),
        )?;
        Ok(Assignment {
            id,
            name: name.to_string(),
            point_value,
            course_ids: Vec::new(),
        })
    }

    fn assignment(&self, id: AssignmentId) -> Result<Option<Assignment>> {
        let row: Option<(String, f64)> = self
            .conn
            .query_row(
                "SELECT name, point_value FROM assignments WHERE id = ?",
                [&id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let Some((name, point_value)) = row else {
            return Ok(None);
        };
        let course_ids = self.course_ids_for(
            "SELECT course_id FROM assignment_courses WHERE assignment_id = ? ORDER BY rowid",
            &id,
        )?;
        Ok(Some(Assignment {
            id,
            name,
            point_value,
            course_ids,
        }))
    }

    fn assignments(&self) -> Result<Vec<Assignment>> {
        let mut links = self.assignment_links()?;
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, point_value FROM assignments ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, AssignmentId>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, f64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .map(|(id, name, point_value)| Assignment {
                id,
                name,
                point_value,
                course_ids: links.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    fn update_assignment(
        &mut self,
        id: AssignmentId,
        name: &str,
        point_value: f64,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE assignments SET name = ?, point_value = ? WHERE id = ?",
            (name, point_value, &id),
        )?;
        Ok(changed > 0)
    }

    fn delete_assignment(&mut self, id: AssignmentId) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM grades WHERE assignment_id = ?", [&id])?;
        tx.execute(
            "DELETE FROM assignment_courses WHERE assignment_id = ?",
            [&id],
        )?;
        let deleted = tx.execute("DELETE FROM assignments WHERE id = ?", [&id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn link_student_course(&mut self, student_id: StudentId, course_id: CourseId) -> Result<bool> {
        if !self.exists("students", &student_id)? || !self.exists("courses", &course_id)? {
            return Ok(false);
        }
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO student_courses(student_id, course_id) VALUES(?, ?)",
            (&student_id, &course_id),
        )?;
        Ok(inserted > 0)
    }

    fn unlink_student_course(
        &mut self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM student_courses WHERE student_id = ? AND course_id = ?",
            (&student_id, &course_id),
        )?;
        Ok(deleted > 0)
    }

    fn link_assignment_course(
        &mut self,
        assignment_id: AssignmentId,
        course_id: CourseId,
    ) -> Result<bool> {
        if !self.exists("assignments", &assignment_id)? || !self.exists("courses", &course_id)? {
            return Ok(false);
        }
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO assignment_courses(assignment_id, course_id) VALUES(?, ?)",
            (&assignment_id, &course_id),
        )?;
        Ok(inserted > 0)
    }

    fn unlink_assignment_course(
        &mut self,
        assignment_id: AssignmentId,
        course_id: CourseId,
    ) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM assignment_courses WHERE assignment_id = ? AND course_id = ?",
            (&assignment_id, &course_id),
        )?;
        Ok(deleted > 0)
    }

    fn grade(&self, student_id: StudentId, assignment_id: AssignmentId) -> Result<Option<Grade>> {
        let grade = self
            .conn
            .query_row(
                "SELECT id, student_id, assignment_id, score
                 FROM grades
                 WHERE student_id = ? AND assignment_id = ?",
                (&student_id, &assignment_id),
                grade_from_row,
            )
            .optional()?;
        Ok(grade)
    }

    fn grades_for_student(&self, student_id: StudentId) -> Result<Vec<Grade>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, student_id, assignment_id, score
             FROM grades
             WHERE student_id = ?
             ORDER BY rowid",
        )?;
        let grades = stmt
            .query_map([&student_id], grade_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(grades)
    }

    #[cfg(test)]
    fn grades(&self) -> Result<Vec<Grade>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, student_id, assignment_id, score FROM grades ORDER BY rowid",
        )?;
        let grades = stmt
            .query_map([], grade_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(grades)
    }

    fn insert_grade(
        &mut self,
        student_id: StudentId,
        assignment_id: AssignmentId,
        score: f64,
    ) -> Result<Grade> {
        let id = GradeId::new();
        self.conn.execute(
            "INSERT INTO grades(id, student_id, assignment_id, score, updated_at)
             VALUES(?, ?, ?, ?, ?)",
            (&id, &student_id, &assignment_id, score, now_stamp()),
        )?;
        Ok(Grade {
            id,
            student_id,
            assignment_id,
            score,
        })
    }

    fn set_grade_score(&mut self, id: GradeId, score: f64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE grades SET score = ?, updated_at = ? WHERE id = ?",
            (score, now_stamp(), &id),
        )?;
        Ok(changed > 0)
    }

    fn delete_grade(&mut self, id: GradeId) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM grades WHERE id = ?", [&id])?;
        Ok(deleted > 0)
    }
}
