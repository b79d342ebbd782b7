use serde::Serialize;
use sqlx::SqlitePool;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{ApiError, ApiResult, rooms::Room};

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// One chat message in a user's per-room thread. AI replies carry the
/// persona's name in `sender_name` and belong to the owning user's thread.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,
    #[serde(skip)]
    pub room: Room,
    pub text: String,
    pub is_ai: bool,
    pub sender_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

pub async fn init_schema(db_pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            username TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            room TEXT NOT NULL,
            text TEXT NOT NULL,
            is_ai INTEGER NOT NULL DEFAULT 0,
            sender_name TEXT,
            timestamp TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id)
        )",
    )
    .execute(db_pool)
    .await?;

    Ok(())
}

pub async fn create_user(
    db_pool: &SqlitePool,
    email: &str,
    username: &str,
    password_hash: &str,
) -> ApiResult<User> {
    let id = Uuid::now_v7();
    let created_at = OffsetDateTime::now_utc().format(&Rfc3339)?;

    let result = sqlx::query(
        "INSERT INTO users (id,email,username,password_hash,created_at) VALUES (?,?,?,?,?)",
    )
    .bind(id.to_string())
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(&created_at)
    .execute(db_pool)
    .await;

    match result {
        Ok(_) => Ok(User {
            id,
            email: email.to_owned(),
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
        }),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            ApiError::Conflict("User with this email already exists".to_owned()),
        ),
        Err(err) => Err(err.into()),
    }
}

pub async fn user_by_email(db_pool: &SqlitePool, email: &str) -> ApiResult<Option<User>> {
    let row: Option<(String, String, String, String)> =
        sqlx::query_as("SELECT id,email,username,password_hash FROM users WHERE email=?")
            .bind(email)
            .fetch_optional(db_pool)
            .await?;

    match row {
        Some((id, email, username, password_hash)) => Ok(Some(User {
            id: Uuid::parse_str(&id).map_err(anyhow::Error::from)?,
            email,
            username,
            password_hash,
        })),
        None => Ok(None),
    }
}

pub async fn user_by_id(db_pool: &SqlitePool, user_id: Uuid) -> ApiResult<Option<User>> {
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT email,username,password_hash FROM users WHERE id=?")
            .bind(user_id.to_string())
            .fetch_optional(db_pool)
            .await?;

    Ok(row.map(|(email, username, password_hash)| User {
        id: user_id,
        email,
        username,
        password_hash,
    }))
}

/// Append one message. A single insert; there is no read-modify-write on
/// shared state, so concurrent sends only race for rowid order.
pub async fn append_message(
    db_pool: &SqlitePool,
    user_id: Uuid,
    room: Room,
    text: &str,
    is_ai: bool,
    sender_name: Option<&str>,
) -> ApiResult<Message> {
    let id = Uuid::now_v7();
    let timestamp = OffsetDateTime::now_utc();

    sqlx::query(
        "INSERT INTO messages (id,user_id,room,text,is_ai,sender_name,timestamp) VALUES (?,?,?,?,?,?,?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(room.persona_name())
    .bind(text)
    .bind(is_ai)
    .bind(sender_name)
    .bind(timestamp.format(&Rfc3339)?)
    .execute(db_pool)
    .await?;

    Ok(Message {
        id,
        user_id,
        room,
        text: text.to_owned(),
        is_ai,
        sender_name: sender_name.map(str::to_owned),
        timestamp,
    })
}

/// All messages in `user_id`'s thread for `room`, in insertion (rowid) order.
/// An empty thread is an empty vec, not an error.
pub async fn room_messages(
    db_pool: &SqlitePool,
    user_id: Uuid,
    room: Room,
) -> ApiResult<Vec<Message>> {
    let rows: Vec<(String, String, bool, Option<String>, String)> = sqlx::query_as(
        "SELECT id,text,is_ai,sender_name,timestamp FROM messages
         WHERE user_id=? AND room=? ORDER BY rowid ASC",
    )
    .bind(user_id.to_string())
    .bind(room.persona_name())
    .fetch_all(db_pool)
    .await?;

    rows.into_iter()
        .map(|(id, text, is_ai, sender_name, timestamp)| {
            Ok(Message {
                id: Uuid::parse_str(&id).map_err(anyhow::Error::from)?,
                user_id,
                room,
                text,
                is_ai,
                sender_name,
                timestamp: OffsetDateTime::parse(&timestamp, &Rfc3339)?,
            })
        })
        .collect()
}

/// Last `limit` messages of the thread, oldest first; the context window
/// handed to the AI provider.
pub async fn recent_messages(
    db_pool: &SqlitePool,
    user_id: Uuid,
    room: Room,
    limit: usize,
) -> ApiResult<Vec<Message>> {
    let mut messages = room_messages(db_pool, user_id, room).await?;
    if messages.len() > limit {
        messages.drain(..messages.len() - limit);
    }
    Ok(messages)
}

#[cfg(test)]
impl Message {
    pub fn sample(is_ai: bool, text: &str) -> Message {
        Message {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            room: Room::Kyle,
            text: text.to_owned(),
            is_ai,
            sender_name: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn append_then_list_preserves_insertion_order() {
        let pool = test_pool().await;
        let user = create_user(&pool, "a@b.c", "alice", "hash").await.unwrap();

        append_message(&pool, user.id, Room::Kyle, "hi", false, Some("alice"))
            .await
            .unwrap();
        append_message(&pool, user.id, Room::Kyle, "hello", true, Some("Kyle"))
            .await
            .unwrap();

        let messages = room_messages(&pool, user.id, Room::Kyle).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "hi");
        assert!(!messages[0].is_ai);
        assert_eq!(messages[1].text, "hello");
        assert!(messages[1].is_ai);
        assert_eq!(messages[1].sender_name.as_deref(), Some("Kyle"));
    }

    #[tokio::test]
    async fn empty_thread_lists_empty() {
        let pool = test_pool().await;
        let user = create_user(&pool, "a@b.c", "alice", "hash").await.unwrap();
        let messages = room_messages(&pool, user.id, Room::Jane).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn threads_are_isolated_per_user_and_room() {
        let pool = test_pool().await;
        let alice = create_user(&pool, "a@b.c", "alice", "hash").await.unwrap();
        let bob = create_user(&pool, "b@b.c", "bob", "hash").await.unwrap();

        append_message(&pool, alice.id, Room::Kyle, "from alice", false, Some("alice"))
            .await
            .unwrap();

        assert!(room_messages(&pool, bob.id, Room::Kyle).await.unwrap().is_empty());
        assert!(room_messages(&pool, alice.id, Room::Sam).await.unwrap().is_empty());
        assert_eq!(room_messages(&pool, alice.id, Room::Kyle).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let pool = test_pool().await;
        create_user(&pool, "a@b.c", "alice", "hash").await.unwrap();
        let err = create_user(&pool, "a@b.c", "alice2", "hash").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn recent_messages_keeps_the_tail() {
        let pool = test_pool().await;
        let user = create_user(&pool, "a@b.c", "alice", "hash").await.unwrap();
        for i in 0..5 {
            append_message(&pool, user.id, Room::David, &format!("m{i}"), false, None)
                .await
                .unwrap();
        }

        let window = recent_messages(&pool, user.id, Room::David, 3).await.unwrap();
        let texts: Vec<_> = window.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["m2", "m3", "m4"]);
    }
}
