use crate::Database;
use crate::models::{ChirpRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Chirps --

    /// Insert a new chirp. `created_at` and `updated_at` start out
    /// identical; a chirp only becomes "edited" once an update moves
    /// `updated_at` off the creation time.
    pub fn insert_chirp(&self, id: &str, author_id: &str, body: &str, created_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chirps (id, author_id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                rusqlite::params![id, author_id, body, created_at],
            )?;
            Ok(())
        })
    }

    /// All chirps with their authors attached, newest first.
    pub fn list_chirps(&self) -> Result<Vec<ChirpRow>> {
        self.with_conn(query_chirps)
    }

    pub fn get_chirp(&self, id: &str) -> Result<Option<ChirpRow>> {
        self.with_conn(|conn| query_chirp_by_id(conn, id))
    }

    /// Set a new body and bump `updated_at`. Returns false if the chirp
    /// no longer exists.
    pub fn update_chirp(&self, id: &str, body: &str, updated_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE chirps SET body = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id, body, updated_at],
            )?;
            Ok(changed > 0)
        })
    }

    /// Returns false if the chirp no longer exists.
    pub fn delete_chirp(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM chirps WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

const CHIRP_COLUMNS: &str =
    "c.id, c.author_id, u.username, c.body, c.created_at, c.updated_at";

fn chirp_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChirpRow> {
    Ok(ChirpRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        body: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn query_chirps(conn: &Connection) -> Result<Vec<ChirpRow>> {
    // JOIN users to fetch the author username in a single query
    // (eliminates N+1). rowid breaks created_at ties deterministically.
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHIRP_COLUMNS}
         FROM chirps c
         LEFT JOIN users u ON c.author_id = u.id
         ORDER BY c.created_at DESC, c.rowid DESC",
    ))?;

    let rows = stmt
        .query_map([], chirp_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_chirp_by_id(conn: &Connection, id: &str) -> Result<Option<ChirpRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHIRP_COLUMNS}
         FROM chirps c
         LEFT JOIN users u ON c.author_id = u.id
         WHERE c.id = ?1",
    ))?;

    let row = stmt.query_row([id], chirp_from_row).optional()?;

    Ok(row)
}
