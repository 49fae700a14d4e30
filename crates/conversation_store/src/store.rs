use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::schema::{Conversation, Message, Role, CREATE_TABLES};

const DEFAULT_LIST_LIMIT: usize = 100;

/// SQLite-backed conversation memory.
pub struct ConversationStore {
    conn: Connection,
}

impl ConversationStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::initialize(conn)
    }

    /// In-memory store for tests and ephemeral sessions.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_TABLES)
            .map_err(|source| StoreError::query("creating base tables", source))?;

        let store = Self { conn };
        store.ensure_column("conversations", "context_prompt_tokens", "INTEGER", "0")?;
        store.ensure_column("conversations", "context_answer_tokens", "INTEGER", "0")?;
        store.ensure_column("conversations", "prompt_message_count", "INTEGER", "0")?;
        store.ensure_column("conversations", "answer_message_count", "INTEGER", "0")?;
        Ok(store)
    }

    fn ensure_column(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        default_value: &str,
    ) -> Result<(), StoreError> {
        if self.has_column(table, column)? {
            return Ok(());
        }

        let sql =
            format!("ALTER TABLE {table} ADD COLUMN {column} {column_type} DEFAULT {default_value}");
        self.conn
            .execute(&sql, [])
            .map_err(|source| StoreError::query("adding migration column", source))?;
        Ok(())
    }

    fn has_column(&self, table: &str, column: &str) -> Result<bool, StoreError> {
        let sql = format!("PRAGMA table_info({table})");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|source| StoreError::query("inspecting table columns", source))?;
        let mut rows = stmt
            .query([])
            .map_err(|source| StoreError::query("inspecting table columns", source))?;

        while let Some(row) = rows
            .next()
            .map_err(|source| StoreError::query("inspecting table columns", source))?
        {
            let name: String = row
                .get(1)
                .map_err(|source| StoreError::query("inspecting table columns", source))?;
            if name == column {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Idempotent create-or-fetch of a conversation row.
    pub fn create_or_get_conversation(
        &self,
        id: &str,
        title: &str,
    ) -> Result<Conversation, StoreError> {
        if id.is_empty() {
            return Err(StoreError::EmptyConversationId);
        }

        self.conn
            .execute(
                "INSERT OR IGNORE INTO conversations(id, title) VALUES(?1, ?2)",
                params![id, title],
            )
            .map_err(|source| StoreError::query("creating conversation", source))?;
        self.conversation(id)
    }

    pub fn conversation(&self, id: &str) -> Result<Conversation, StoreError> {
        self.conn
            .query_row(
                "SELECT id, title, context_prompt_tokens, context_answer_tokens, \
                 prompt_message_count, answer_message_count FROM conversations WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Conversation {
                        id: row.get(0)?,
                        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        prompt_tokens: row.get(2)?,
                        answer_tokens: row.get(3)?,
                        prompt_messages: row.get(4)?,
                        answer_messages: row.get(5)?,
                    })
                },
            )
            .map_err(|source| StoreError::query("loading conversation", source))
    }

    /// Appends one message and returns its insertion order.
    pub fn append_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO messages(conversation_id, role, content) VALUES(?1, ?2, ?3)",
                params![conversation_id, role.as_str(), content],
            )
            .map_err(|source| StoreError::query("appending message", source))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Returns the most recent `limit` messages in insertion order.
    pub fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let limit = if limit == 0 { DEFAULT_LIST_LIMIT } else { limit };
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, conversation_id, role, content FROM messages \
                 WHERE conversation_id = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(|source| StoreError::query("listing messages", source))?;
        let mut rows = stmt
            .query(params![conversation_id, limit as i64])
            .map_err(|source| StoreError::query("listing messages", source))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|source| StoreError::query("listing messages", source))?
        {
            let seq: i64 = row
                .get(0)
                .map_err(|source| StoreError::query("listing messages", source))?;
            let value: String = row
                .get(2)
                .map_err(|source| StoreError::query("listing messages", source))?;
            let role = Role::parse(&value).ok_or(StoreError::UnknownRole { seq, value })?;
            out.push(Message {
                seq,
                conversation_id: row
                    .get(1)
                    .map_err(|source| StoreError::query("listing messages", source))?,
                role,
                content: row
                    .get(3)
                    .map_err(|source| StoreError::query("listing messages", source))?,
            });
        }

        out.reverse();
        Ok(out)
    }

    /// Adds one turn's estimates to the conversation's cumulative aggregates.
    pub fn update_usage(
        &self,
        conversation_id: &str,
        prompt_tokens: i64,
        answer_tokens: i64,
        prompt_messages: i64,
        answer_messages: i64,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "UPDATE conversations SET \
                 context_prompt_tokens = context_prompt_tokens + ?1, \
                 context_answer_tokens = context_answer_tokens + ?2, \
                 prompt_message_count = prompt_message_count + ?3, \
                 answer_message_count = answer_message_count + ?4 \
                 WHERE id = ?5",
                params![
                    prompt_tokens,
                    answer_tokens,
                    prompt_messages,
                    answer_messages,
                    conversation_id
                ],
            )
            .map_err(|source| StoreError::query("updating usage aggregates", source))?;
        Ok(())
    }

    /// Deletes a conversation's messages and zeroes its aggregates.
    pub fn clear_conversation(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "DELETE FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
            )
            .map_err(|source| StoreError::query("clearing messages", source))?;
        self.conn
            .execute(
                "UPDATE conversations SET context_prompt_tokens = 0, \
                 context_answer_tokens = 0, prompt_message_count = 0, \
                 answer_message_count = 0 WHERE id = ?1",
                params![conversation_id],
            )
            .map_err(|source| StoreError::query("resetting usage aggregates", source))?;
        Ok(())
    }
}
