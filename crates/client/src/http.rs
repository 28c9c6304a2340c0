//! Typed wrapper over the REST endpoints.

use domain::models::{
    CreateProgramRequest, GeoActivity, GroupProgramProgress, MoveEntryRequest, Program,
    RecordSessionRequest, ReinviteRequest, ResolvedMessage, SessionLog, UpdateProgramRequest,
    Workout,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host, e.g. `https://programs.example.com`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub access_token: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Clone)]
pub struct ProgramsClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for ProgramsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramsClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl ProgramsClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(config.base_url));
        }
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url,
            access_token: config.access_token,
        })
    }

    pub async fn create_program(&self, request: &CreateProgramRequest) -> ClientResult<Program> {
        self.send(self.request(Method::POST, "/programs").json(request))
            .await
    }

    pub async fn list_programs(&self) -> ClientResult<Vec<Program>> {
        self.send(self.request(Method::GET, "/programs")).await
    }

    pub async fn list_pending_programs(&self) -> ClientResult<Vec<Program>> {
        self.send(self.request(Method::GET, "/programs/pending"))
            .await
    }

    pub async fn get_program(&self, program_id: Uuid) -> ClientResult<Program> {
        self.send(self.request(Method::GET, &format!("/programs/{}", program_id)))
            .await
    }

    pub async fn update_program(
        &self,
        program_id: Uuid,
        patch: &UpdateProgramRequest,
    ) -> ClientResult<Program> {
        self.send(
            self.request(Method::PUT, &format!("/programs/{}", program_id))
                .json(patch),
        )
        .await
    }

    pub async fn delete_program(&self, program_id: Uuid) -> ClientResult<()> {
        let response = self
            .request(Method::DELETE, &format!("/programs/{}", program_id))
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    pub async fn move_entry(
        &self,
        program_id: Uuid,
        request: MoveEntryRequest,
    ) -> ClientResult<Program> {
        self.send(
            self.request(Method::POST, &format!("/programs/{}/move", program_id))
                .json(&request),
        )
        .await
    }

    pub async fn accept_program(&self, program_id: Uuid) -> ClientResult<Program> {
        self.send(self.request(Method::PUT, &format!("/programs/{}/accept", program_id)))
            .await
    }

    pub async fn decline_program(&self, program_id: Uuid) -> ClientResult<Program> {
        self.send(self.request(Method::PUT, &format!("/programs/{}/decline", program_id)))
            .await
    }

    pub async fn reinvite_member(&self, program_id: Uuid, user_id: Uuid) -> ClientResult<Program> {
        self.send(
            self.request(Method::POST, &format!("/programs/{}/reinvite", program_id))
                .json(&ReinviteRequest { user_id }),
        )
        .await
    }

    pub async fn program_progress(&self, program_id: Uuid) -> ClientResult<GroupProgramProgress> {
        self.send(self.request(Method::GET, &format!("/programs/{}/progress", program_id)))
            .await
    }

    pub async fn record_session(
        &self,
        program_id: Uuid,
        request: &RecordSessionRequest,
    ) -> ClientResult<SessionLog> {
        self.send(
            self.request(Method::POST, &format!("/programs/{}/sessions", program_id))
                .json(request),
        )
        .await
    }

    pub async fn group_programs(&self, group_id: Uuid) -> ClientResult<Vec<Program>> {
        self.send(self.request(Method::GET, &format!("/groups/{}/programs", group_id)))
            .await
    }

    pub async fn group_messages(&self, group_id: Uuid) -> ClientResult<Vec<ResolvedMessage>> {
        self.send(self.request(Method::GET, &format!("/groups/{}/messages", group_id)))
            .await
    }

    pub async fn workouts(&self, force_refresh: bool) -> ClientResult<Vec<Workout>> {
        self.send(
            self.request(Method::GET, "/catalog/workouts")
                .query(&[("force_refresh", force_refresh)]),
        )
        .await
    }

    pub async fn geo_activities(&self, force_refresh: bool) -> ClientResult<Vec<GeoActivity>> {
        self.send(
            self.request(Method::GET, "/catalog/geo-activities")
                .query(&[("force_refresh", force_refresh)]),
        )
        .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/api/v1{}", self.base_url, path))
            .bearer_auth(&self.access_token)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => (parsed.error, parsed.message),
        Err(_) => ("http_error".to_string(), body),
    };
    debug!(status = status.as_u16(), code = %code, "Request failed");

    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
