//! Pinned repositories and public gists from the GitHub GraphQL API.
//!
//! Both listings are cursor paginated: every call returns one page plus
//! the cursor of the next one, and `has_more` tells whether asking again
//! makes sense.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use spdlog::{debug, warn};

use crate::config::CodeHost;
use crate::integrations::{credential, http_client, response_text, ExternalError};

const SERVICE: &str = "GitHub";
pub const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
pub const DEFAULT_PAGE_SIZE: u32 = 6;

const PINNED_QUERY: &str = r#"query($login: String!, $first: Int!, $after: String) {
  user(login: $login) {
    pinnedItems(first: $first, after: $after, types: REPOSITORY) {
      pageInfo { hasNextPage endCursor }
      nodes {
        ... on Repository {
          name description url homepageUrl stargazerCount forkCount
          primaryLanguage { name }
        }
      }
    }
  }
}"#;

const GISTS_QUERY: &str = r#"query($login: String!, $first: Int!, $after: String) {
  user(login: $login) {
    gists(first: $first, after: $after, privacy: PUBLIC, orderBy: { field: UPDATED_AT, direction: DESC }) {
      pageInfo { hasNextPage endCursor }
      nodes {
        name description url stargazerCount
        forks { totalCount }
        files { name language { name } }
      }
    }
  }
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Repositories,
    Gists,
}

impl ProjectKind {
    pub fn parse(value: &str) -> Option<ProjectKind> {
        match value {
            "repos" | "repositories" => Some(ProjectKind::Repositories),
            "gists" => Some(ProjectKind::Gists),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub homepage_url: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPage {
    pub items: Vec<Project>,
    pub has_more: bool,
    /// Pass back to fetch the following page.
    pub cursor: Option<String>,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<UserData<T>>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct UserData<T> {
    user: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PinnedUser {
    pinned_items: Connection<RepositoryNode>,
}

#[derive(Deserialize)]
struct GistUser {
    gists: Connection<GistNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    page_info: PageInfo,
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct TotalCount {
    #[serde(rename = "totalCount")]
    total_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name: String,
    description: Option<String>,
    url: String,
    homepage_url: Option<String>,
    stargazer_count: u32,
    fork_count: u32,
    primary_language: Option<Named>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GistNode {
    name: String,
    description: Option<String>,
    url: String,
    stargazer_count: u32,
    forks: Option<TotalCount>,
    #[serde(default)]
    files: Vec<Option<GistFile>>,
}

#[derive(Deserialize)]
struct GistFile {
    name: Option<String>,
    language: Option<Named>,
}

impl From<RepositoryNode> for Project {
    fn from(repo: RepositoryNode) -> Self {
        Project {
            name: repo.name,
            description: repo.description.filter(|d| !d.trim().is_empty()),
            url: repo.url,
            homepage_url: repo.homepage_url.filter(|h| !h.trim().is_empty()),
            stars: repo.stargazer_count,
            forks: repo.fork_count,
            language: repo.primary_language.map(|l| l.name),
        }
    }
}

impl From<GistNode> for Project {
    fn from(gist: GistNode) -> Self {
        let first_file = gist.files.into_iter().flatten().next();
        let (file_name, language) = match first_file {
            Some(file) => (file.name, file.language.map(|l| l.name)),
            None => (None, None),
        };
        Project {
            // gists have an id for a name; the first file reads better
            name: file_name.unwrap_or(gist.name),
            description: gist.description.filter(|d| !d.trim().is_empty()),
            url: gist.url,
            homepage_url: None,
            stars: gist.stargazer_count,
            forks: gist.forks.map_or(0, |f| f.total_count),
            language,
        }
    }
}

pub fn build_query(kind: ProjectKind, user: &str, first: u32, cursor: Option<&str>) -> serde_json::Value {
    let query = match kind {
        ProjectKind::Repositories => PINNED_QUERY,
        ProjectKind::Gists => GISTS_QUERY,
    };
    json!({
        "query": query,
        "variables": {
            "login": user,
            "first": first,
            "after": cursor,
        }
    })
}

fn decode_error(message: impl Into<String>) -> ExternalError {
    ExternalError::Decode {
        service: SERVICE,
        message: message.into(),
    }
}

fn into_page<N: Into<Project>>(connection: Connection<N>) -> ProjectPage {
    let has_more = connection.page_info.has_next_page;
    ProjectPage {
        items: connection.nodes.into_iter().flatten().map(Into::into).collect(),
        has_more,
        cursor: if has_more { connection.page_info.end_cursor } else { None },
    }
}

fn user_data<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ExternalError> {
    let response: GraphQlResponse<T> = serde_json::from_str(body).map_err(|e| decode_error(e.to_string()))?;
    if let Some(err) = response.errors.first() {
        return Err(decode_error(err.message.clone()));
    }
    response.data
        .and_then(|d| d.user)
        .ok_or_else(|| decode_error("user not found"))
}

pub fn parse_response(kind: ProjectKind, body: &str) -> Result<ProjectPage, ExternalError> {
    match kind {
        ProjectKind::Repositories => Ok(into_page(user_data::<PinnedUser>(body)?.pinned_items)),
        ProjectKind::Gists => Ok(into_page(user_data::<GistUser>(body)?.gists)),
    }
}

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    endpoint: String,
    token: String,
    user: String,
    page_size: u32,
}

impl GithubClient {
    pub fn new(user: &str, token: String, page_size: u32) -> Result<Self, ExternalError> {
        Ok(GithubClient {
            http: http_client()?,
            endpoint: GRAPHQL_ENDPOINT.to_string(),
            token,
            user: user.to_string(),
            page_size: page_size.max(1),
        })
    }

    pub fn from_config(cfg: &CodeHost) -> Result<Self, ExternalError> {
        let token = credential(&cfg.token_env)?;
        Self::new(&cfg.user, token, cfg.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    pub async fn pinned_repositories(&self, cursor: Option<&str>) -> Result<ProjectPage, ExternalError> {
        self.fetch(ProjectKind::Repositories, cursor).await
    }

    pub async fn gists(&self, cursor: Option<&str>) -> Result<ProjectPage, ExternalError> {
        self.fetch(ProjectKind::Gists, cursor).await
    }

    pub async fn fetch(&self, kind: ProjectKind, cursor: Option<&str>) -> Result<ProjectPage, ExternalError> {
        let body = build_query(kind, &self.user, self.page_size, cursor);
        debug!("Querying {:?} for {} (cursor={:?})", kind, self.user, cursor);

        let resp = self.http.post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let text = response_text(SERVICE, resp).await?;
        parse_response(kind, &text).inspect_err(|e| {
            warn!("Could not read {:?} for {}: {}", kind, self.user, e);
        })
    }
}
