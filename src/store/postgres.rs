//! PostgreSQL backend: table DDL, database bootstrap and the `Store` implementation.

use super::Store;
use crate::error::{AppError, ConfigError, StartupError};
use crate::model::{normalize_ids, Course, CoursePatch, ListFilter, NewCourse, NewStudent, Student, StudentPatch};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, PgExecutor, PgPool, Row};
use std::str::FromStr;

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        birth_date DATE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS course_students (
        course_id BIGINT NOT NULL REFERENCES courses (id) ON DELETE CASCADE,
        student_id BIGINT NOT NULL REFERENCES students (id) ON DELETE CASCADE,
        PRIMARY KEY (course_id, student_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS course_students_student_idx ON course_students (student_id)",
];

/// Create the students, courses and course_students tables if they do not exist.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), StartupError> {
    for ddl in DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Connect to the `postgres` maintenance database and create the target database if it does not exist.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StartupError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|_| invalid_url(database_url))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn invalid_url(url: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: "DATABASE_URL",
        value: url.to_string(),
    }
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let path_start = url.rfind('/').ok_or_else(|| invalid_url(url))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Unique and foreign key violations are caller mistakes, not server faults.
fn map_write_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_foreign_key_violation() {
            return AppError::Validation("referenced student does not exist".into());
        }
        if db.is_unique_violation() {
            return AppError::Validation("id already exists".into());
        }
    }
    AppError::Db(e)
}

const SELECT_COURSES: &str = r#"
    SELECT c.id, c.name,
        COALESCE(ARRAY_AGG(cs.student_id ORDER BY cs.student_id)
            FILTER (WHERE cs.student_id IS NOT NULL), '{}') AS students
    FROM courses c
    LEFT JOIN course_students cs ON cs.course_id = c.id
    WHERE ($1::BIGINT IS NULL OR c.id = $1) AND ($2::TEXT IS NULL OR c.name = $2)
    GROUP BY c.id, c.name
    ORDER BY c.id
"#;

const SELECT_STUDENTS: &str = r#"
    SELECT id, name, birth_date FROM students
    WHERE ($1::BIGINT IS NULL OR id = $1) AND ($2::TEXT IS NULL OR name = $2)
    ORDER BY id
"#;

fn row_to_course(row: &PgRow) -> Result<Course, sqlx::Error> {
    Ok(Course {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        students: row.try_get("students")?,
    })
}

fn row_to_student(row: &PgRow) -> Result<Student, sqlx::Error> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        birth_date: row.try_get("birth_date")?,
    })
}

async fn fetch_courses<'e, E: PgExecutor<'e>>(exec: E, filter: &ListFilter) -> Result<Vec<Course>, AppError> {
    tracing::debug!(sql = %SELECT_COURSES, ?filter, "query");
    let rows = sqlx::query(SELECT_COURSES)
        .bind(filter.id)
        .bind(filter.name.as_deref())
        .fetch_all(exec)
        .await?;
    Ok(rows.iter().map(row_to_course).collect::<Result<_, _>>()?)
}

async fn fetch_course<'e, E: PgExecutor<'e>>(exec: E, id: i64) -> Result<Option<Course>, AppError> {
    let filter = ListFilter { id: Some(id), name: None };
    Ok(fetch_courses(exec, &filter).await?.into_iter().next())
}

async fn link_students<'e, E: PgExecutor<'e>>(exec: E, course_id: i64, students: &[i64]) -> Result<(), AppError> {
    if students.is_empty() {
        return Ok(());
    }
    let sql = "INSERT INTO course_students (course_id, student_id) SELECT $1, UNNEST($2::BIGINT[])";
    tracing::debug!(sql = %sql, course_id, ?students, "query");
    sqlx::query(sql)
        .bind(course_id)
        .bind(students)
        .execute(exec)
        .await
        .map_err(map_write_error)?;
    Ok(())
}

/// Move a serial sequence past an explicitly inserted id. Never moves it backwards.
async fn sync_sequence<'e, E: PgExecutor<'e>>(exec: E, table: &str, explicit_id: i64) -> Result<(), AppError> {
    let sql = format!(
        "SELECT setval(s.seq::regclass, $1) FROM (SELECT pg_get_serial_sequence('{t}', 'id') AS seq) s \
         WHERE $1 > COALESCE(pg_sequence_last_value(s.seq::regclass), 0)",
        t = table
    );
    tracing::debug!(sql = %sql, explicit_id, "query");
    sqlx::query(&sql).bind(explicit_id).execute(exec).await?;
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn list_courses(&self, filter: &ListFilter) -> Result<Vec<Course>, AppError> {
        fetch_courses(&self.pool, filter).await
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>, AppError> {
        fetch_course(&self.pool, id).await
    }

    async fn insert_course(&self, new: NewCourse) -> Result<Course, AppError> {
        let mut tx = self.pool.begin().await?;
        let row = match new.id {
            Some(id) => sqlx::query("INSERT INTO courses (id, name) VALUES ($1, $2) RETURNING id")
                .bind(id)
                .bind(&new.name),
            None => sqlx::query("INSERT INTO courses (name) VALUES ($1) RETURNING id").bind(&new.name),
        }
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;
        let id: i64 = row.try_get("id")?;
        if let Some(explicit_id) = new.id {
            sync_sequence(&mut *tx, "courses", explicit_id).await?;
        }
        link_students(&mut *tx, id, &new.students).await?;
        let course = fetch_course(&mut *tx, id)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        tx.commit().await?;
        Ok(course)
    }

    async fn update_course(&self, id: i64, patch: CoursePatch) -> Result<Option<Course>, AppError> {
        let mut tx = self.pool.begin().await?;
        let found = sqlx::query("UPDATE courses SET name = COALESCE($2, name) WHERE id = $1 RETURNING id")
            .bind(id)
            .bind(patch.name.as_deref())
            .fetch_optional(&mut *tx)
            .await?;
        if found.is_none() {
            return Ok(None);
        }
        if let Some(students) = &patch.students {
            sqlx::query("DELETE FROM course_students WHERE course_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_students(&mut *tx, id, students).await?;
        }
        let course = fetch_course(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(course)
    }

    async fn delete_course(&self, id: i64) -> Result<bool, AppError> {
        let done = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn count_courses(&self) -> Result<u64, AppError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }

    async fn list_students(&self, filter: &ListFilter) -> Result<Vec<Student>, AppError> {
        tracing::debug!(sql = %SELECT_STUDENTS, ?filter, "query");
        let rows = sqlx::query(SELECT_STUDENTS)
            .bind(filter.id)
            .bind(filter.name.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_student).collect::<Result<_, _>>()?)
    }

    async fn get_student(&self, id: i64) -> Result<Option<Student>, AppError> {
        let filter = ListFilter { id: Some(id), name: None };
        Ok(self.list_students(&filter).await?.into_iter().next())
    }

    async fn insert_student(&self, new: NewStudent) -> Result<Student, AppError> {
        let mut tx = self.pool.begin().await?;
        let row = match new.id {
            Some(id) => sqlx::query(
                "INSERT INTO students (id, name, birth_date) VALUES ($1, $2, $3) RETURNING id, name, birth_date",
            )
            .bind(id)
            .bind(&new.name)
            .bind(new.birth_date),
            None => sqlx::query("INSERT INTO students (name, birth_date) VALUES ($1, $2) RETURNING id, name, birth_date")
                .bind(&new.name)
                .bind(new.birth_date),
        }
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;
        if let Some(explicit_id) = new.id {
            sync_sequence(&mut *tx, "students", explicit_id).await?;
        }
        tx.commit().await?;
        Ok(row_to_student(&row)?)
    }

    async fn update_student(&self, id: i64, patch: StudentPatch) -> Result<Option<Student>, AppError> {
        let sql = r#"
            UPDATE students
            SET name = COALESCE($2, name),
                birth_date = CASE WHEN $3 THEN $4 ELSE birth_date END
            WHERE id = $1
            RETURNING id, name, birth_date
        "#;
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query(sql)
            .bind(id)
            .bind(patch.name.as_deref())
            .bind(patch.birth_date.is_some())
            .bind(patch.birth_date.flatten())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_student).transpose()?)
    }

    async fn delete_student(&self, id: i64) -> Result<bool, AppError> {
        let done = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn count_students(&self) -> Result<u64, AppError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }

    async fn missing_students(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT t.id FROM UNNEST($1::BIGINT[]) AS t(id) WHERE NOT EXISTS (SELECT 1 FROM students s WHERE s.id = t.id)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(normalize_ids(rows.into_iter().map(|(id,)| id).collect()))
    }
}
