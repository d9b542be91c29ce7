// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin `reqwest` wrapper over the Coordinator's Client API (§6.1). Unlike
//! the original's Unix-socket `DaemonClient`, this one speaks HTTP — the
//! Coordinator has no local control socket to connect to.

use anyhow::{bail, Context, Result};
use oj_core::{Run, RunId, RunStatus, Session, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
    bearer_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct EnqueueRunRequest {
    #[serde(rename = "type")]
    run_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRunResponse {
    pub run_id: RunId,
    pub session_id: SessionId,
    pub status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct SessionListResponse {
    sessions: Vec<Session>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session: Session,
}

#[derive(Debug, Deserialize)]
pub struct SessionEventsResponse {
    pub events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct StopResponse {
    pub ok: bool,
    pub status: RunStatus,
}

impl DaemonClient {
    pub fn new(base_url: String, bearer_token: Option<String>) -> Self {
        Self { base_url, http: reqwest::Client::new(), bearer_token }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let detail = response.json::<Value>().await.ok().and_then(|v| v["detail"].as_str().map(str::to_string));
        bail!("request failed ({status}): {}", detail.unwrap_or_else(|| "no detail".to_string()));
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let response = self.http.get(self.url("/sessions")).send().await.context("GET /sessions")?;
        let response = Self::check(response).await?;
        Ok(response.json::<SessionListResponse>().await?.sessions)
    }

    pub async fn get_session(&self, id: &SessionId) -> Result<Session> {
        let response = self.http.get(self.url(&format!("/sessions/{id}"))).send().await.context("GET /sessions/:id")?;
        let response = Self::check(response).await?;
        Ok(response.json::<SessionResponse>().await?.session)
    }

    pub async fn stop_session(&self, id: &SessionId) -> Result<StopResponse> {
        let request = self.authed(self.http.post(self.url(&format!("/sessions/{id}/stop"))));
        let response = request.send().await.context("POST /sessions/:id/stop")?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn get_events(&self, id: &SessionId) -> Result<SessionEventsResponse> {
        let response = self.http.get(self.url(&format!("/sessions/{id}/events"))).send().await.context("GET /sessions/:id/events")?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn get_run(&self, run_id: &RunId) -> Result<Run> {
        let response = self.http.get(self.url(&format!("/runs/{run_id}"))).send().await.context("GET /runs/:id")?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn start_run(&self, agent_name: String, prompt: String, project_dir: Option<String>) -> Result<EnqueueRunResponse> {
        let body = EnqueueRunRequest {
            run_type: "start_session",
            session_id: None,
            agent_name: Some(agent_name),
            project_dir,
            prompt: Some(prompt),
        };
        let request = self.authed(self.http.post(self.url("/runs"))).json(&body);
        let response = request.send().await.context("POST /runs")?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
