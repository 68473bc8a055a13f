use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::document::MedicalDocument;

/// Default on-disk location of the knowledge base DB
pub fn default_db_path(fallback_dir: &Path) -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".rag-prep").join("data").join("knowledge.db"),
        None => fallback_dir.join("knowledge.db"),
    }
}

/// Opens (or creates) the SQLite knowledge base at `db_path`
pub fn init_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("opening {}", db_path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates tables and indexes; safe to run repeatedly
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys=ON;

        CREATE TABLE IF NOT EXISTS knowledge_sources (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            source TEXT NOT NULL,
            category TEXT NOT NULL,
            chunks TEXT,
            chunk_count INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS knowledge_chunks (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            chunk_text TEXT NOT NULL,
            FOREIGN KEY (source_id) REFERENCES knowledge_sources(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category ON knowledge_sources(category);
        CREATE INDEX IF NOT EXISTS idx_updated ON knowledge_sources(updated_at);
        CREATE INDEX IF NOT EXISTS idx_chunks_source ON knowledge_chunks(source_id);",
    )?;
    Ok(())
}

/// Inserts or replaces a document and its chunks.
///
/// Chunks are rewritten wholesale so repeated runs never accumulate rows;
/// `created_at` survives updates.
pub fn upsert_document(conn: &mut Connection, doc: &MedicalDocument) -> Result<()> {
    let chunks_json = serde_json::to_string(&doc.chunks)?;
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO knowledge_sources (id, title, content, source, category, chunks, chunk_count) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT(id) DO UPDATE SET \
            title = excluded.title, content = excluded.content, source = excluded.source, \
            category = excluded.category, chunks = excluded.chunks, \
            chunk_count = excluded.chunk_count, updated_at = datetime('now')",
        params![
            doc.id,
            doc.title,
            doc.content,
            doc.source,
            doc.category,
            chunks_json,
            doc.chunks.len() as i64
        ],
    )?;

    tx.execute(
        "DELETE FROM knowledge_chunks WHERE source_id = ?",
        params![doc.id],
    )?;
    for (idx, chunk) in doc.chunks.iter().enumerate() {
        tx.execute(
            "INSERT INTO knowledge_chunks (id, source_id, chunk_index, chunk_text) \
             VALUES (?, ?, ?, ?)",
            params![format!("{}_c{}", doc.id, idx), doc.id, idx as i64, chunk],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Lists stored documents, most recently updated first
pub fn list_sources(
    conn: &Connection,
    category: Option<&str>,
    limit: i64,
) -> Result<Vec<SourceRecord>> {
    let mut results = Vec::new();

    if let Some(c) = category {
        let mut stmt = conn.prepare(
            "SELECT id, title, source, category, chunk_count, created_at, updated_at \
             FROM knowledge_sources WHERE category = ? \
             ORDER BY updated_at DESC, id LIMIT ?",
        )?;
        let rows = stmt.query_map(params![c, limit], map_source_row)?;
        for r in rows {
            results.push(r?);
        }
    } else {
        let mut stmt = conn.prepare(
            "SELECT id, title, source, category, chunk_count, created_at, updated_at \
             FROM knowledge_sources ORDER BY updated_at DESC, id LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit], map_source_row)?;
        for r in rows {
            results.push(r?);
        }
    }

    Ok(results)
}

fn map_source_row(row: &rusqlite::Row) -> rusqlite::Result<SourceRecord> {
    Ok(SourceRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        source: row.get(2)?,
        category: row.get(3)?,
        chunk_count: row.get(4)?,
        created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub id: String,
    pub title: String,
    pub source: String,
    pub category: String,
    pub chunk_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Chunks of one document in reading order
pub fn get_chunks(conn: &Connection, source_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT chunk_text FROM knowledge_chunks WHERE source_id = ? ORDER BY chunk_index",
    )?;
    let rows = stmt.query_map(params![source_id], |row| row.get(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
}

/// Loads a full document back, chunks included
pub fn get_document(conn: &Connection, id: &str) -> Result<Option<MedicalDocument>> {
    let row = conn
        .query_row(
            "SELECT id, title, content, source, category, chunks FROM knowledge_sources WHERE id = ?",
            params![id],
            |row| {
                Ok((
                    MedicalDocument::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ),
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((mut doc, chunks_json)) = row else {
        return Ok(None);
    };
    if let Some(json) = chunks_json {
        doc.chunks = serde_json::from_str(&json)
            .with_context(|| format!("corrupt chunks column for {}", id))?;
    }
    Ok(Some(doc))
}

/// Removes a document; its chunks cascade. Returns whether a row existed.
pub fn delete_source(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM knowledge_sources WHERE id = ?", params![id])?;
    Ok(deleted > 0)
}

/// DB statistics
pub fn get_stats(conn: &Connection) -> Result<DbStats> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM knowledge_sources", [], |r| r.get(0))?;
    let chunks: i64 = conn.query_row("SELECT COUNT(*) FROM knowledge_chunks", [], |r| r.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT category, COUNT(*) FROM knowledge_sources GROUP BY category ORDER BY category",
    )?;
    let by_category = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(DbStats {
        total,
        chunks,
        by_category,
    })
}

#[derive(Debug)]
pub struct DbStats {
    pub total: i64,
    pub chunks: i64,
    pub by_category: Vec<(String, i64)>,
}
