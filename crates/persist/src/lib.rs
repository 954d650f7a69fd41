//! Label graph session storage: keeps one `LabelStore` per session between reruns.
//! Keep code tiny and predictable.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use labelgraph_store::LabelStore;
use metrics::{counter, histogram};
use tracing::{debug, warn};

pub trait SessionStore {
    /// The session's store; empty when the session has never been saved.
    fn load(&self, session: &str) -> Result<LabelStore>;
    fn save(&self, session: &str, store: &LabelStore) -> Result<()>;
}

/// In-process sessions, for hosts that keep state in memory.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, LabelStore>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, session: &str) -> Result<LabelStore> {
        let sessions = self.sessions.lock().map_err(|_| anyhow!("session map lock poisoned"))?;
        Ok(sessions.get(session).cloned().unwrap_or_default())
    }

    fn save(&self, session: &str, store: &LabelStore) -> Result<()> {
        let mut sessions = self.sessions.lock().map_err(|_| anyhow!("session map lock poisoned"))?;
        sessions.insert(session.to_string(), store.clone());
        Ok(())
    }
}

/// SQLite-backed sessions: one row per session with the store as JSON.
pub struct SqliteSessionStore {
    db: Mutex<rusqlite::Connection>,
}

impl SqliteSessionStore {
    pub fn open_default() -> Result<Self> {
        let path = std::env::var("LABELGRAPH_DB_PATH").unwrap_or_else(|_| default_db_path());
        Self::open(&path)
    }

    pub fn open(path: &str) -> Result<Self> {
        let started = std::time::Instant::now();
        let db = rusqlite::Connection::open(path).with_context(|| format!("opening sqlite db at {}", path))?;
        db.pragma_update(None, "journal_mode", "WAL").ok();
        db.pragma_update(None, "synchronous", "NORMAL").ok();
        db.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                session TEXT PRIMARY KEY,
                ts      INTEGER NOT NULL,
                store   TEXT NOT NULL
            )",
            [],
        )
        .context("creating sessions table")?;
        debug!(path, "session db opened");
        histogram!("persist_open_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(Self { db: Mutex::new(db) })
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, session: &str) -> Result<LabelStore> {
        let started = std::time::Instant::now();
        let db = self.db.lock().map_err(|_| anyhow!("session db lock poisoned"))?;
        let mut stmt = db.prepare("SELECT store FROM sessions WHERE session = ?1")?;
        let mut rows = stmt.query([session])?;
        let store = match rows.next()? {
            Some(row) => {
                let text: String = row.get(0)?;
                serde_json::from_str(&text).with_context(|| format!("decoding stored labels for session {}", session))?
            }
            None => LabelStore::new(),
        };
        histogram!("persist_load_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(store)
    }

    fn save(&self, session: &str, store: &LabelStore) -> Result<()> {
        let started = std::time::Instant::now();
        let text = serde_json::to_string(store).context("encoding label store")?;
        let db = self.db.lock().map_err(|_| anyhow!("session db lock poisoned"))?;
        db.execute(
            "INSERT INTO sessions(session, ts, store) VALUES (?1, ?2, ?3)
             ON CONFLICT(session) DO UPDATE SET ts = excluded.ts, store = excluded.store",
            (session, now_ts(), &text),
        )
        .with_context(|| format!("saving session {}", session))?;
        histogram!("persist_save_ms", started.elapsed().as_secs_f64() * 1000.0);
        counter!("persist_save_total", 1u64);
        Ok(())
    }
}

fn default_db_path() -> String {
    let Some(home) = std::env::var_os("HOME") else {
        return "labelgraph.db".to_string();
    };
    let dir = std::path::Path::new(&home).join(".labelgraph");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!(dir = %dir.display(), error = %e, "cannot create session directory");
    }
    dir.join("session.db").to_string_lossy().into_owned()
}

/// Unix time in whole seconds, stamped on every saved session row.
pub fn now_ts() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
