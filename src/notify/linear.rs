//! Linear GraphQL client: issue creation plus read-only diagnostic queries.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{CreatedIssue, IssueDraft, IssuePublisher, PublishError};

pub const DEFAULT_LINEAR_API_URL: &str = "https://api.linear.app/graphql";

const ISSUE_CREATE: &str = r#"
mutation($input: IssueCreateInput!) {
    issueCreate(input: $input) {
        success
        issue { id identifier title url }
    }
}"#;

const VIEWER: &str = "query { viewer { id name email } }";
const TEAMS: &str = "query { teams { nodes { id name key } } }";
const TEAM_STATES: &str = r#"
query($teamId: String!) {
    team(id: $teamId) { states { nodes { id name type } } }
}"#;
const ISSUE: &str = r#"
query($id: String!) {
    issue(id: $id) {
        id identifier title description url createdAt
        state { name }
        team { name }
    }
}"#;

/// Authorization value for a Linear token.
///
/// OAuth tokens (`lin_oauth_`) use the Bearer scheme; personal keys and
/// anything unrecognized are sent raw.
pub fn authorization_value(token: &str) -> String {
    if token.starts_with("lin_oauth_") {
        format!("Bearer {token}")
    } else {
        token.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct LinearSettings {
    pub api_url: String,
    pub api_key: String,
    pub team_id: String,
    pub priority: u8,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct LinearClient {
    http: Client,
    settings: LinearSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Viewer {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetails {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub created_at: Option<String>,
    pub state: Option<Named>,
    pub team: Option<Named>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Named {
    pub name: String,
}

#[derive(Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

impl LinearClient {
    pub fn new(settings: LinearSettings) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&authorization_value(&settings.api_key))
            .context("LINEAR_API_KEY is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let http = Client::builder()
            .user_agent(concat!("sam-opportunity-monitor/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(settings.timeout)
            .build()
            .context("building linear http client")?;
        Ok(Self { http, settings })
    }

    pub fn team_id(&self) -> &str {
        &self.settings.team_id
    }

    async fn post(&self, query: &str, variables: Value) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(&self.settings.api_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
    }

    /// Run a read-only query and return its `data` member.
    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value, field: &str) -> Result<T> {
        let resp = self.post(query, variables).await.context("linear query")?;
        let status = resp.status();
        let text = resp.text().await.context("linear query body")?;
        if status != StatusCode::OK {
            return Err(anyhow!("linear query returned {status}: {text}"));
        }
        let body: Value = serde_json::from_str(&text).context("linear query json")?;
        if let Some(msg) = graphql_errors(&body) {
            return Err(anyhow!("GraphQL errors: {msg}"));
        }
        let data = body
            .pointer(&format!("/data/{field}"))
            .cloned()
            .ok_or_else(|| anyhow!("response has no data.{field}"))?;
        serde_json::from_value(data).with_context(|| format!("decoding data.{field}"))
    }

    pub async fn viewer(&self) -> Result<Viewer> {
        self.query(VIEWER, json!({}), "viewer").await
    }

    pub async fn teams(&self) -> Result<Vec<Team>> {
        let nodes: Nodes<Team> = self.query(TEAMS, json!({}), "teams").await?;
        Ok(nodes.nodes)
    }

    pub async fn team_states(&self, team_id: &str) -> Result<Vec<WorkflowState>> {
        #[derive(Deserialize)]
        struct TeamStates {
            states: Nodes<WorkflowState>,
        }
        let team: TeamStates = self
            .query(TEAM_STATES, json!({ "teamId": team_id }), "team")
            .await?;
        Ok(team.states.nodes)
    }

    pub async fn issue(&self, id: &str) -> Result<IssueDetails> {
        self.query(ISSUE, json!({ "id": id }), "issue").await
    }
}

/// Joined messages of a GraphQL `errors` member. Any non-null `errors`
/// counts, an empty array included.
fn graphql_errors(body: &Value) -> Option<String> {
    let errors = body.get("errors").filter(|e| !e.is_null())?;
    let Some(items) = errors.as_array() else {
        return Some(errors.to_string());
    };
    if items.is_empty() {
        return Some("empty errors array".to_string());
    }
    let msgs: Vec<String> = items
        .iter()
        .map(|e| {
            e.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        })
        .collect();
    Some(msgs.join(", "))
}

/// Interpret an `issueCreate` response body.
pub fn parse_issue_create(body: &Value) -> Result<CreatedIssue, PublishError> {
    if let Some(msg) = graphql_errors(body) {
        return Err(PublishError::GraphQl(msg));
    }
    let result = body
        .pointer("/data/issueCreate")
        .ok_or_else(|| PublishError::Malformed("missing data.issueCreate".into()))?;
    if !result.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return Err(PublishError::Unsuccessful);
    }
    let issue = result
        .get("issue")
        .filter(|v| v.is_object())
        .ok_or_else(|| PublishError::Malformed("missing issue".into()))?;
    serde_json::from_value(issue.clone()).map_err(|e| PublishError::Malformed(e.to_string()))
}

#[async_trait::async_trait]
impl IssuePublisher for LinearClient {
    async fn try_publish(&self, draft: &IssueDraft) -> Result<CreatedIssue, PublishError> {
        let input = json!({
            "input": {
                "teamId": self.settings.team_id,
                "title": draft.title,
                "description": draft.description,
                "priority": draft.priority,
            }
        });
        let resp = self.post(ISSUE_CREATE, input).await?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let text = resp.text().await?;
        let body: Value =
            serde_json::from_str(&text).map_err(|e| PublishError::Malformed(e.to_string()))?;
        parse_issue_create(&body)
    }

    fn priority(&self) -> u8 {
        self.settings.priority
    }
}
