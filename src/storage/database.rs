//! SQLite idea library with FTS5 over section content

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::config::Settings;
use crate::storage::models::{Idea, IdeaSection, IdeaStatus};

/// Database wrapper for the idea library
pub struct Database {
    conn: Connection,
}

const CURRENT_SCHEMA_VERSION: i64 = 1;

const IDEA_COLUMNS: &str =
    "id, transcript, title, status, is_favorite, tags, created_at, updated_at";

impl Database {
    /// Open or create the database
    pub fn open(settings: &Settings) -> Result<Self> {
        let db_path = settings.database_path();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::open_path(&db_path)
    }

    /// Open database at a specific path (useful for testing)
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let current_version = self.schema_version()?;
        if current_version > CURRENT_SCHEMA_VERSION {
            anyhow::bail!(
                "Database schema version {} is newer than supported version {}",
                current_version,
                CURRENT_SCHEMA_VERSION
            );
        }

        if current_version < 1 {
            self.migrate_to_v1()?;
            self.set_schema_version(1)?;
        }

        Ok(())
    }

    /// Current schema version tracked in PRAGMA user_version.
    pub fn schema_version(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?)
    }

    fn set_schema_version(&self, version: i64) -> Result<()> {
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {};", version))?;
        Ok(())
    }

    fn migrate_to_v1(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ideas (
                id TEXT PRIMARY KEY,
                transcript TEXT NOT NULL,
                title TEXT,
                status TEXT NOT NULL DEFAULT 'processing',
                is_favorite INTEGER NOT NULL DEFAULT 0,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ideas_created_at
                ON ideas(created_at DESC);

            CREATE TABLE IF NOT EXISTS idea_sections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                idea_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                section_title TEXT NOT NULL,
                content TEXT NOT NULL,
                FOREIGN KEY (idea_id) REFERENCES ideas(id) ON DELETE CASCADE,
                UNIQUE (idea_id, position)
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS section_fts USING fts5(
                idea_id,
                section_title,
                content,
                content='idea_sections',
                content_rowid='id',
                tokenize='porter unicode61'
            );

            -- Keep the FTS index in sync with idea_sections
            CREATE TRIGGER IF NOT EXISTS sections_ai AFTER INSERT ON idea_sections BEGIN
                INSERT INTO section_fts(rowid, idea_id, section_title, content)
                VALUES (new.id, new.idea_id, new.section_title, new.content);
            END;

            CREATE TRIGGER IF NOT EXISTS sections_ad AFTER DELETE ON idea_sections BEGIN
                INSERT INTO section_fts(section_fts, rowid, idea_id, section_title, content)
                VALUES ('delete', old.id, old.idea_id, old.section_title, old.content);
            END;

            CREATE TRIGGER IF NOT EXISTS sections_au AFTER UPDATE ON idea_sections BEGIN
                INSERT INTO section_fts(section_fts, rowid, idea_id, section_title, content)
                VALUES ('delete', old.id, old.idea_id, old.section_title, old.content);
                INSERT INTO section_fts(rowid, idea_id, section_title, content)
                VALUES (new.id, new.idea_id, new.section_title, new.content);
            END;
            "#,
        )?;

        Ok(())
    }

    /// Insert a new idea together with its sections
    pub fn insert_idea(&self, idea: &Idea) -> Result<()> {
        let tags_json = serde_json::to_string(&idea.tags)?;
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO ideas (id, transcript, title, status, is_favorite, tags, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                idea.id,
                idea.transcript,
                idea.title,
                idea.status.as_str(),
                idea.is_favorite,
                tags_json,
                idea.created_at.timestamp_millis(),
                idea.updated_at.timestamp_millis(),
            ],
        )?;

        for section in &idea.sections {
            tx.execute(
                r#"
                INSERT INTO idea_sections (idea_id, position, section_title, content)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    idea.id,
                    section.position as i64,
                    section.section_title,
                    section.content,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Update an idea's title, status, favorite flag and tags
    pub fn update_idea(&self, idea: &Idea) -> Result<()> {
        let tags_json = serde_json::to_string(&idea.tags)?;

        self.conn.execute(
            r#"
            UPDATE ideas
            SET title = ?2, status = ?3, is_favorite = ?4, tags = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                idea.id,
                idea.title,
                idea.status.as_str(),
                idea.is_favorite,
                tags_json,
                Utc::now().timestamp_millis(),
            ],
        )?;

        Ok(())
    }

    /// Replace the content of one section. Returns false if no such section exists.
    pub fn update_section_content(
        &self,
        idea_id: &str,
        position: usize,
        content: &str,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;

        let changed = tx.execute(
            "UPDATE idea_sections SET content = ?3 WHERE idea_id = ?1 AND position = ?2",
            params![idea_id, position as i64, content],
        )?;

        if changed > 0 {
            tx.execute(
                "UPDATE ideas SET updated_at = ?2 WHERE id = ?1",
                params![idea_id, Utc::now().timestamp_millis()],
            )?;
        }

        tx.commit()?;
        Ok(changed > 0)
    }

    /// Get an idea by ID
    pub fn get_idea(&self, id: &str) -> Result<Option<Idea>> {
        let idea = self
            .conn
            .query_row(
                &format!("SELECT {} FROM ideas WHERE id = ?1", IDEA_COLUMNS),
                params![id],
                Self::row_to_idea,
            )
            .optional()?;

        self.with_sections(idea)
    }

    /// Find an idea by ID prefix. A blank prefix matches nothing.
    pub fn find_idea_by_prefix(&self, prefix: &str) -> Result<Option<Idea>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(None);
        }
        let pattern = format!("{}%", escape_like(prefix));

        let idea = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM ideas WHERE id LIKE ?1 ESCAPE '\\' ORDER BY created_at DESC LIMIT 1",
                    IDEA_COLUMNS
                ),
                params![pattern],
                Self::row_to_idea,
            )
            .optional()?;

        self.with_sections(idea)
    }

    /// List ideas, newest first
    pub fn list_ideas(&self, limit: usize, favorites_only: bool) -> Result<Vec<Idea>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}
             FROM ideas
             WHERE (?2 = 0 OR is_favorite = 1)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1",
            IDEA_COLUMNS
        ))?;

        let ideas = stmt
            .query_map(params![limit as i64, favorites_only], Self::row_to_idea)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        self.load_sections(ideas)
    }

    /// Search ideas by title or transcript (case-insensitive substring)
    pub fn search_ideas(
        &self,
        query: &str,
        limit: usize,
        favorites_only: bool,
    ) -> Result<Vec<Idea>> {
        let pattern = format!("%{}%", escape_like(query));

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}
             FROM ideas
             WHERE (title LIKE ?1 ESCAPE '\\' OR transcript LIKE ?1 ESCAPE '\\')
               AND (?3 = 0 OR is_favorite = 1)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
            IDEA_COLUMNS
        ))?;

        let ideas = stmt
            .query_map(
                params![pattern, limit as i64, favorites_only],
                Self::row_to_idea,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        self.load_sections(ideas)
    }

    /// Full-text search across section content
    pub fn search_sections(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<(Idea, IdeaSection)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                i.id, i.transcript, i.title, i.status, i.is_favorite, i.tags, i.created_at, i.updated_at,
                s.id, s.position, s.section_title, s.content
            FROM section_fts f
            JOIN idea_sections s ON f.rowid = s.id
            JOIN ideas i ON s.idea_id = i.id
            WHERE section_fts MATCH ?1
            ORDER BY rank
            LIMIT ?2
            "#,
        )?;

        let results = stmt
            .query_map(params![query, limit as i64], |row| {
                let idea = Self::row_to_idea(row)?;
                let section = Self::row_to_section_offset(row, 8)?;
                Ok((idea, section))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(results)
    }

    /// Get the sections of an idea in display order
    pub fn get_sections(&self, idea_id: &str) -> Result<Vec<IdeaSection>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, position, section_title, content
             FROM idea_sections
             WHERE idea_id = ?1
             ORDER BY position",
        )?;

        let sections = stmt
            .query_map(params![idea_id], |row| Self::row_to_section_offset(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sections)
    }

    /// Delete an idea and its sections. Returns false if it did not exist.
    pub fn delete_idea(&self, id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM ideas WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn with_sections(&self, idea: Option<Idea>) -> Result<Option<Idea>> {
        match idea {
            Some(mut idea) => {
                idea.sections = self.get_sections(&idea.id)?;
                Ok(Some(idea))
            }
            None => Ok(None),
        }
    }

    fn load_sections(&self, ideas: Vec<Idea>) -> Result<Vec<Idea>> {
        ideas
            .into_iter()
            .map(|mut idea| {
                idea.sections = self.get_sections(&idea.id)?;
                Ok(idea)
            })
            .collect()
    }

    fn row_to_idea(row: &rusqlite::Row) -> rusqlite::Result<Idea> {
        let status: String = row.get(3)?;
        let tags_json: String = row.get(5)?;

        Ok(Idea {
            id: row.get(0)?,
            transcript: row.get(1)?,
            title: row.get(2)?,
            status: IdeaStatus::parse(&status).unwrap_or(IdeaStatus::Failed),
            sections: Vec::new(),
            is_favorite: row.get(4)?,
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            created_at: from_millis(row.get(6)?),
            updated_at: from_millis(row.get(7)?),
        })
    }

    fn row_to_section_offset(
        row: &rusqlite::Row,
        offset: usize,
    ) -> rusqlite::Result<IdeaSection> {
        let position: i64 = row.get(offset + 1)?;

        Ok(IdeaSection {
            id: row.get(offset)?,
            position: position as usize,
            section_title: row.get(offset + 2)?,
            content: row.get(offset + 3)?,
        })
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let total_ideas: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ideas", [], |row| row.get(0))?;

        let favorites: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM ideas WHERE is_favorite = 1",
            [],
            |row| row.get(0),
        )?;

        let total_sections: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM idea_sections", [], |row| row.get(0))?;

        Ok(DatabaseStats {
            total_ideas: total_ideas as usize,
            favorites: favorites as usize,
            total_sections: total_sections as usize,
        })
    }
}

/// Escape `LIKE` wildcards so user input matches literally (paired with `ESCAPE '\'`).
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub total_ideas: usize,
    pub favorites: usize,
    pub total_sections: usize,
}
