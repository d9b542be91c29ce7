// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistent session store: sessions, their event logs, and the
//! change-notification fan-out that feeds the realtime stream.

use chrono::Utc;
use oj_core::{Affinity, CoordinatorError, Event, EventType, ExecutionMode, Session, SessionId, SessionStatus};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tokio::sync::broadcast;

use crate::notify::{ChangeNotification, CHANNEL_CAPACITY};

/// Whether a session may move from `from` to `to`. Terminal statuses accept
/// no further transitions.
fn allowed_transition(from: SessionStatus, to: SessionStatus) -> bool {
    use SessionStatus::*;
    if from.is_terminal() {
        return false;
    }
    matches!(
        (from, to),
        (Pending, Running)
            | (Pending, Stopping)
            | (Pending, Stopped)
            | (Pending, Failed)
            | (Running, Stopping)
            | (Running, Finished)
            | (Running, Failed)
            | (Running, Stopped)
            | (Stopping, Stopped)
            | (Stopping, Failed)
    )
}

pub struct SessionStore {
    pool: SqlitePool,
    changes: broadcast::Sender<ChangeNotification>,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
        self.changes.subscribe()
    }

    fn publish(&self, notification: ChangeNotification) {
        // No subscribers is not an error: the realtime API is optional.
        let _ = self.changes.send(notification);
    }

    pub async fn create_session(
        &self,
        session_id: SessionId,
        created_at: chrono::DateTime<Utc>,
        parent_session_id: Option<SessionId>,
        project_dir: Option<String>,
        agent_name: Option<String>,
        execution_mode: ExecutionMode,
    ) -> Result<Session, CoordinatorError> {
        let session = Session {
            session_id,
            status: SessionStatus::Pending,
            created_at,
            last_resumed_at: None,
            project_dir,
            agent_name,
            parent_session_id,
            execution_mode,
            hostname: None,
            executor_profile: None,
            executor_session_id: None,
        };

        let result = sqlx::query(
            "INSERT INTO sessions
                (session_id, status, created_at, last_resumed_at, project_dir, agent_name,
                 parent_session_id, execution_mode, hostname, executor_profile, executor_session_id)
             VALUES (?, ?, ?, NULL, ?, ?, ?, ?, NULL, NULL, NULL)",
        )
        .bind(session.session_id.as_str())
        .bind(session.status.to_string())
        .bind(session.created_at.to_rfc3339())
        .bind(&session.project_dir)
        .bind(&session.agent_name)
        .bind(session.parent_session_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(session.execution_mode.to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                self.publish(ChangeNotification::SessionCreated(session.clone()));
                Ok(session)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                CoordinatorError::Conflict(format!("session {} already exists", session.session_id)),
            ),
            Err(err) => Err(CoordinatorError::Internal(err.into())),
        }
    }

    pub async fn bind_executor(
        &self,
        session_id: &SessionId,
        executor_session_id: &str,
        hostname: &str,
        executor_profile: &str,
        project_dir: Option<String>,
    ) -> Result<Session, CoordinatorError> {
        let mut session = self.get_session(session_id).await?;
        if session.status.is_terminal() {
            return Err(CoordinatorError::BadState(format!(
                "session {session_id} is terminal ({}) and cannot bind an executor",
                session.status
            )));
        }

        let project_dir = project_dir.or_else(|| session.project_dir.clone());

        sqlx::query(
            "UPDATE sessions
                SET status = ?, hostname = ?, executor_profile = ?, executor_session_id = ?,
                    project_dir = COALESCE(?, project_dir), last_resumed_at = ?
             WHERE session_id = ?",
        )
        .bind(SessionStatus::Running.to_string())
        .bind(hostname)
        .bind(executor_profile)
        .bind(executor_session_id)
        .bind(&project_dir)
        .bind(Utc::now().to_rfc3339())
        .bind(session_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| CoordinatorError::Internal(e.into()))?;

        session.status = SessionStatus::Running;
        session.hostname = Some(hostname.to_string());
        session.executor_profile = Some(executor_profile.to_string());
        session.executor_session_id = Some(executor_session_id.to_string());
        session.project_dir = project_dir;
        session.last_resumed_at = Some(Utc::now());

        self.publish(ChangeNotification::SessionUpdated(session.clone()));
        Ok(session)
    }

    pub async fn append_event(&self, event: Event) -> Result<(), CoordinatorError> {
        let session = self.get_session(&event.session_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| CoordinatorError::Internal(e.into()))?;

        sqlx::query(
            "INSERT INTO events (session_id, sequence, event_type, payload, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(event.session_id.as_str())
        .bind(event.sequence as i64)
        .bind(event.event_type.to_string())
        .bind(event.payload.to_string())
        .bind(event.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| CoordinatorError::Internal(e.into()))?;

        let mut updated_session = session.clone();
        if event.event_type.is_session_stop() {
            sqlx::query("UPDATE sessions SET status = ? WHERE session_id = ?")
                .bind(SessionStatus::Finished.to_string())
                .bind(event.session_id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| CoordinatorError::Internal(e.into()))?;
            updated_session.status = SessionStatus::Finished;
        }

        tx.commit().await.map_err(|e| CoordinatorError::Internal(e.into()))?;

        self.publish(ChangeNotification::EventAppended(event));
        if updated_session.status != session.status {
            self.publish(ChangeNotification::SessionUpdated(updated_session));
        }
        Ok(())
    }

    /// Append an event without the caller having to track its own sequence
    /// counter: the next `sequence` for `session_id` is computed from the
    /// current max in the same call. Used by the HTTP worker API, where the
    /// wire request carries no sequence number at all.
    pub async fn append_event_auto(
        &self,
        session_id: &SessionId,
        event_type: EventType,
        payload: Value,
    ) -> Result<Event, CoordinatorError> {
        let row = sqlx::query("SELECT COALESCE(MAX(sequence), -1) + 1 AS next_seq FROM events WHERE session_id = ?")
            .bind(session_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;
        let sequence: i64 = row.get("next_seq");

        let event = Event {
            session_id: session_id.clone(),
            sequence: sequence as u64,
            event_type,
            payload,
            created_at: Utc::now(),
        };
        self.append_event(event.clone()).await?;
        Ok(event)
    }

    /// A session's events in append order.
    pub async fn list_events(&self, session_id: &SessionId) -> Result<Vec<Event>, CoordinatorError> {
        self.get_session(session_id).await?;

        let rows = sqlx::query("SELECT * FROM events WHERE session_id = ? ORDER BY sequence ASC")
            .bind(session_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;

        rows.into_iter()
            .map(|row| {
                let payload: String = row.get("payload");
                let event_type: String = row.get("event_type");
                let created_at: String = row.get("created_at");
                Ok(Event {
                    session_id: session_id.clone(),
                    sequence: row.get::<i64, _>("sequence") as u64,
                    event_type: parse_event_type(&event_type)?,
                    payload: serde_json::from_str(&payload).unwrap_or(Value::Null),
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }

    pub async fn set_status(&self, session_id: &SessionId, status: SessionStatus) -> Result<Session, CoordinatorError> {
        let mut session = self.get_session(session_id).await?;
        if !allowed_transition(session.status, status) {
            return Err(CoordinatorError::BadState(format!(
                "session {session_id} cannot transition from {} to {status}",
                session.status
            )));
        }

        sqlx::query("UPDATE sessions SET status = ? WHERE session_id = ?")
            .bind(status.to_string())
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;

        session.status = status;
        self.publish(ChangeNotification::SessionUpdated(session.clone()));
        Ok(session)
    }

    /// The text of the last `message` event with `role: "assistant"` in the
    /// payload, if any.
    pub async fn get_result(&self, session_id: &SessionId) -> Result<Option<String>, CoordinatorError> {
        self.get_session(session_id).await?;

        let rows = sqlx::query(
            "SELECT payload FROM events
             WHERE session_id = ? AND event_type = ?
             ORDER BY sequence DESC",
        )
        .bind(session_id.as_str())
        .bind(EventType::Message.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoordinatorError::Internal(e.into()))?;

        for row in rows {
            let payload: String = row.get("payload");
            let value: Value = serde_json::from_str(&payload).unwrap_or(Value::Null);
            if value.get("role").and_then(Value::as_str) == Some("assistant") {
                if let Some(content) = value.get("content").and_then(Value::as_str) {
                    return Ok(Some(content.to_string()));
                }
            }
        }
        Ok(None)
    }

    pub async fn get_by_executor_session_id(&self, executor_session_id: &str) -> Result<Option<Session>, CoordinatorError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE executor_session_id = ?")
            .bind(executor_session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;

        row.map(session_from_row).transpose()
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>, CoordinatorError> {
        let rows = sqlx::query("SELECT * FROM sessions ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;

        rows.into_iter().map(session_from_row).collect()
    }

    pub async fn delete_session(&self, session_id: &SessionId) -> Result<(), CoordinatorError> {
        self.get_session(session_id).await?;
        sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;

        self.publish(ChangeNotification::SessionDeleted(session_id.clone()));
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), CoordinatorError> {
        sqlx::query("DELETE FROM sessions")
            .execute(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;
        Ok(())
    }

    /// Rename/retag a session (`PATCH /sessions/{id}/metadata`). Any field
    /// left `None` is left unchanged.
    pub async fn update_metadata(
        &self,
        session_id: &SessionId,
        project_dir: Option<String>,
        agent_name: Option<String>,
        last_resumed_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<Session, CoordinatorError> {
        let mut session = self.get_session(session_id).await?;

        sqlx::query(
            "UPDATE sessions
                SET project_dir = COALESCE(?, project_dir),
                    agent_name = COALESCE(?, agent_name),
                    last_resumed_at = COALESCE(?, last_resumed_at)
             WHERE session_id = ?",
        )
        .bind(&project_dir)
        .bind(&agent_name)
        .bind(last_resumed_at.map(|t| t.to_rfc3339()))
        .bind(session_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| CoordinatorError::Internal(e.into()))?;

        if let Some(pd) = project_dir {
            session.project_dir = Some(pd);
        }
        if let Some(an) = agent_name {
            session.agent_name = Some(an);
        }
        if let Some(lr) = last_resumed_at {
            session.last_resumed_at = Some(lr);
        }

        self.publish(ChangeNotification::SessionUpdated(session.clone()));
        Ok(session)
    }

    pub async fn get_affinity(&self, session_id: &SessionId) -> Result<Affinity, CoordinatorError> {
        let session = self.get_session(session_id).await?;
        Ok(session.affinity())
    }

    /// Reassign a session's parent, re-validating the acyclic-forest
    /// invariant with a full ancestor walk (not just a grandparent check).
    pub async fn update_parent(
        &self,
        session_id: &SessionId,
        new_parent_session_id: Option<SessionId>,
    ) -> Result<(), CoordinatorError> {
        self.get_session(session_id).await?;

        if let Some(parent) = &new_parent_session_id {
            if parent == session_id {
                return Err(CoordinatorError::Validation(
                    "a session cannot be its own parent".to_string(),
                ));
            }
            self.get_session(parent).await?;
            if self.is_ancestor(session_id, parent).await? {
                return Err(CoordinatorError::Conflict(format!(
                    "reassigning {session_id}'s parent to {parent} would create a cycle"
                )));
            }
        }

        sqlx::query("UPDATE sessions SET parent_session_id = ? WHERE session_id = ?")
            .bind(new_parent_session_id.as_ref().map(|id| id.as_str().to_string()))
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;

        Ok(())
    }

    /// Whether `candidate` is an ancestor of `session_id` (i.e. appears in
    /// the parent chain walking upward from `session_id`).
    async fn is_ancestor(&self, session_id: &SessionId, candidate: &SessionId) -> Result<bool, CoordinatorError> {
        let mut current = session_id.clone();
        loop {
            let session = self.get_session(&current).await?;
            match session.parent_session_id {
                None => return Ok(false),
                Some(parent) if &parent == candidate => return Ok(true),
                Some(parent) => current = parent,
            }
        }
    }

    pub async fn get_session(&self, session_id: &SessionId) -> Result<Session, CoordinatorError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE session_id = ?")
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoordinatorError::Internal(e.into()))?;

        match row {
            Some(row) => session_from_row(row),
            None => Err(CoordinatorError::not_found_session(session_id)),
        }
    }
}

fn session_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Session, CoordinatorError> {
    let status: String = row.get("status");
    let execution_mode: String = row.get("execution_mode");
    let created_at: String = row.get("created_at");
    let last_resumed_at: Option<String> = row.get("last_resumed_at");

    Ok(Session {
        session_id: SessionId::from_string(row.get::<String, _>("session_id")),
        status: parse_session_status(&status)?,
        created_at: parse_timestamp(&created_at)?,
        last_resumed_at: last_resumed_at.map(|s| parse_timestamp(&s)).transpose()?,
        project_dir: row.get("project_dir"),
        agent_name: row.get("agent_name"),
        parent_session_id: row.get::<Option<String>, _>("parent_session_id").map(SessionId::from_string),
        execution_mode: parse_execution_mode(&execution_mode)?,
        hostname: row.get("hostname"),
        executor_profile: row.get("executor_profile"),
        executor_session_id: row.get("executor_session_id"),
    })
}

fn parse_timestamp(s: &str) -> Result<chrono::DateTime<Utc>, CoordinatorError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoordinatorError::Internal(anyhow::anyhow!("corrupt timestamp {s:?}: {e}")))
}

fn parse_session_status(s: &str) -> Result<SessionStatus, CoordinatorError> {
    match s {
        "pending" => Ok(SessionStatus::Pending),
        "running" => Ok(SessionStatus::Running),
        "stopping" => Ok(SessionStatus::Stopping),
        "stopped" => Ok(SessionStatus::Stopped),
        "finished" => Ok(SessionStatus::Finished),
        "failed" => Ok(SessionStatus::Failed),
        other => Err(CoordinatorError::Internal(anyhow::anyhow!("unknown session status {other:?}"))),
    }
}

fn parse_event_type(s: &str) -> Result<EventType, CoordinatorError> {
    match s {
        "session_start" => Ok(EventType::SessionStart),
        "message" => Ok(EventType::Message),
        "tool_use" => Ok(EventType::ToolUse),
        "tool_result" => Ok(EventType::ToolResult),
        "session_stop" => Ok(EventType::SessionStop),
        "error" => Ok(EventType::Error),
        other => Err(CoordinatorError::Internal(anyhow::anyhow!("unknown event type {other:?}"))),
    }
}

fn parse_execution_mode(s: &str) -> Result<ExecutionMode, CoordinatorError> {
    match s {
        "sync" => Ok(ExecutionMode::Sync),
        "async_poll" => Ok(ExecutionMode::AsyncPoll),
        "async_callback" => Ok(ExecutionMode::AsyncCallback),
        other => Err(CoordinatorError::Internal(anyhow::anyhow!("unknown execution mode {other:?}"))),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
