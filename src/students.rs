//! Student records: models, CRUD, and the marks patch operation.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::calc::{self, ScoreState};
use crate::db::now_rfc3339;
use crate::error::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scores {
    pub math: Option<f64>,
    pub science: Option<f64>,
    pub english: Option<f64>,
}

impl Scores {
    fn states(&self) -> [ScoreState; 3] {
        [
            self.math.into(),
            self.science.into(),
            self.english.into(),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub roll: String,
    pub grade: String,
    pub email: Option<String>,
    pub scores: Scores,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    // Derived on the way out, never stored.
    pub total_marks: f64,
    pub average_marks: f64,
}

#[derive(Debug, Deserialize)]
pub struct NewStudent {
    pub name: Option<String>,
    pub roll: Option<String>,
    pub grade: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub scores: Scores,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub roll: Option<String>,
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub remarks: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarksPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub math: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub science: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub english: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub remarks: Option<Option<String>>,
}

impl MarksPatch {
    pub fn is_empty(&self) -> bool {
        self.math.is_none()
            && self.science.is_none()
            && self.english.is_none()
            && self.remarks.is_none()
    }
}

/// An omitted key must mean "leave unchanged" while an explicit `null`
/// clears the stored value, so the two have to deserialize differently.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn student_from_row(row: &Row) -> rusqlite::Result<Student> {
    let scores = Scores {
        math: row.get("math")?,
        science: row.get("science")?,
        english: row.get("english")?,
    };
    let summary = calc::marks_summary(scores.states());

    Ok(Student {
        id: row.get("id")?,
        name: row.get("name")?,
        roll: row.get("roll")?,
        grade: row.get("grade")?,
        email: row.get("email")?,
        remarks: row.get("remarks")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        total_marks: summary.total,
        average_marks: summary.average,
        scores,
    })
}

const SELECT_STUDENT: &str = "SELECT id, name, roll, grade, email, math, science, english,
            remarks, created_at, updated_at
     FROM students";

pub fn list(conn: &Connection) -> Result<Vec<Student>, ApiError> {
    let mut stmt = conn.prepare(&format!("{SELECT_STUDENT} ORDER BY rowid"))?;
    let rows = stmt
        .query_map([], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Student>, ApiError> {
    let student = conn
        .query_row(
            &format!("{SELECT_STUDENT} WHERE id = ?1"),
            params![id],
            student_from_row,
        )
        .optional()?;
    Ok(student)
}

pub fn create(conn: &Connection, new: NewStudent) -> Result<Student, ApiError> {
    let name = required_field(new.name, "name")?;
    let roll = required_field(new.roll, "roll")?;
    let grade = required_field(new.grade, "grade")?;

    check_score("math", new.scores.math)?;
    check_score("science", new.scores.science)?;
    check_score("english", new.scores.english)?;

    if roll_in_use(conn, &roll, None)? {
        return Err(ApiError::Conflict("Roll number already exists".into()));
    }

    let id = Uuid::new_v4().to_string();
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO students
            (id, name, roll, grade, email, math, science, english, remarks,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            id,
            name,
            roll,
            grade,
            non_blank(new.email),
            new.scores.math,
            new.scores.science,
            new.scores.english,
            non_blank(new.remarks),
            now,
        ],
    )?;

    get(conn, &id)?.ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!("student {id} missing after insert"))
    })
}

pub fn update(conn: &Connection, id: &str, patch: StudentPatch) -> Result<Student, ApiError> {
    let mut student =
        get(conn, id)?.ok_or_else(|| ApiError::NotFound("Student not found".into()))?;
    let stored_roll = student.roll.clone();

    if let Some(name) = patch.name {
        student.name = non_empty_trimmed(name, "name")?;
    }
    if let Some(roll) = patch.roll {
        student.roll = non_empty_trimmed(roll, "roll")?;
    }
    if let Some(grade) = patch.grade {
        student.grade = non_empty_trimmed(grade, "grade")?;
    }
    if let Some(email) = patch.email {
        student.email = email.and_then(|e| non_blank(Some(e)));
    }
    if let Some(remarks) = patch.remarks {
        student.remarks = remarks.and_then(|r| non_blank(Some(r)));
    }

    if student.roll != stored_roll && roll_in_use(conn, &student.roll, Some(id))? {
        return Err(ApiError::Conflict("Roll number already exists".into()));
    }

    conn.execute(
        "UPDATE students
         SET name = ?1, roll = ?2, grade = ?3, email = ?4, remarks = ?5,
             updated_at = ?6
         WHERE id = ?7",
        params![
            student.name,
            student.roll,
            student.grade,
            student.email,
            student.remarks,
            now_rfc3339(),
            id,
        ],
    )?;

    get(conn, id)?.ok_or_else(|| ApiError::NotFound("Student not found".into()))
}

pub fn remove(conn: &Connection, id: &str) -> Result<(), ApiError> {
    let n = conn.execute("DELETE FROM students WHERE id = ?1", params![id])?;
    if n == 0 {
        return Err(ApiError::NotFound("Student not found".into()));
    }
    Ok(())
}

pub fn update_marks(conn: &Connection, id: &str, patch: MarksPatch) -> Result<Student, ApiError> {
    let mut student =
        get(conn, id)?.ok_or_else(|| ApiError::NotFound("Student not found".into()))?;

    // An empty patch is a no-op: return the record untouched, without even
    // bumping updated_at.
    if patch.is_empty() {
        return Ok(student);
    }

    if let Some(math) = patch.math {
        check_score("math", math)?;
        student.scores.math = math;
    }
    if let Some(science) = patch.science {
        check_score("science", science)?;
        student.scores.science = science;
    }
    if let Some(english) = patch.english {
        check_score("english", english)?;
        student.scores.english = english;
    }
    if let Some(remarks) = patch.remarks {
        student.remarks = remarks.and_then(|r| non_blank(Some(r)));
    }

    conn.execute(
        "UPDATE students
         SET math = ?1, science = ?2, english = ?3, remarks = ?4,
             updated_at = ?5
         WHERE id = ?6",
        params![
            student.scores.math,
            student.scores.science,
            student.scores.english,
            student.remarks,
            now_rfc3339(),
            id,
        ],
    )?;

    get(conn, id)?.ok_or_else(|| ApiError::NotFound("Student not found".into()))
}

fn roll_in_use(
    conn: &Connection,
    roll: &str,
    exclude_id: Option<&str>,
) -> Result<bool, ApiError> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM students WHERE roll = ?1",
            params![roll],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match existing {
        Some(found) => exclude_id != Some(found.as_str()),
        None => false,
    })
}

fn required_field(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ApiError::Validation(format!(
            "name, roll, and grade are required (missing {field})"
        ))),
    }
}

fn non_empty_trimmed(value: String, field: &str) -> Result<String, ApiError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(v.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim();
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    })
}

fn check_score(subject: &str, value: Option<f64>) -> Result<(), ApiError> {
    if let Some(v) = value {
        if !(0.0..=100.0).contains(&v) {
            return Err(ApiError::Validation(format!(
                "{subject} must be a number between 0 and 100"
            )));
        }
    }
    Ok(())
}
