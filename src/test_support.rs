//! In-process stand-in for the GitHub REST endpoints the client uses.

use std::collections::{BTreeMap, HashMap};
use std::path::Path as FsPath;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{FileCredentialStore, Session};
use crate::config::Config;
use crate::github::GitHubClient;

pub const OWNER: &str = "acme";
pub const REPO: &str = "handbook";
pub const BRANCH: &str = "main";
pub const LABEL: &str = "documentation-discussion";
pub const VALID_TOKEN: &str = "ghp_valid";

struct StoredFile {
    content: String,
    sha: String,
}

struct StoredCommit {
    sha: String,
    path: String,
    message: String,
    /// When the commit landed on the branch
    date: DateTime<Utc>,
    /// Author date; older than `date` for a cherry-pick
    authored: DateTime<Utc>,
    /// `None` records a deletion
    content: Option<String>,
}

struct StoredIssue {
    number: u64,
    title: String,
    body: String,
    labels: Vec<String>,
}

struct StoredComment {
    id: u64,
    body: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct MockRepo {
    seq: u64,
    files: BTreeMap<String, StoredFile>,
    commits: Vec<StoredCommit>,
    issues: Vec<StoredIssue>,
    comments: HashMap<u64, Vec<StoredComment>>,
}

impl MockRepo {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn clock(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default()
            + ChronoDuration::seconds(self.seq as i64)
    }

    fn commit(&mut self, path: &str, message: &str, content: Option<&str>) -> String {
        self.commit_authored(path, message, content, None)
    }

    fn commit_authored(
        &mut self,
        path: &str,
        message: &str,
        content: Option<&str>,
        authored: Option<DateTime<Utc>>,
    ) -> String {
        let seq = self.next_seq();
        let commit_sha = format!("c{:039x}", seq);
        let date = self.clock();

        let blob_sha = match content {
            Some(content) => {
                let blob_sha = format!("b{:039x}", seq);
                self.files.insert(
                    path.to_string(),
                    StoredFile {
                        content: content.to_string(),
                        sha: blob_sha.clone(),
                    },
                );
                blob_sha
            }
            None => {
                self.files.remove(path);
                String::new()
            }
        };

        self.commits.push(StoredCommit {
            sha: commit_sha,
            path: path.to_string(),
            message: message.to_string(),
            date,
            authored: authored.unwrap_or(date),
            content: content.map(str::to_string),
        });
        blob_sha
    }

    /// Content of `path` as of commit `sha`.
    fn content_at(&self, path: &str, sha: &str) -> Option<String> {
        let position = self.commits.iter().position(|c| c.sha == sha)?;
        self.commits[..=position]
            .iter()
            .rev()
            .find(|c| c.path == path)
            .and_then(|c| c.content.clone())
    }
}

struct MockState {
    valid_token: String,
    requests: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    repo: Mutex<MockRepo>,
}

/// A running fake remote.
#[derive(Clone)]
pub struct MockGitHub {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockGitHub {
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            valid_token: VALID_TOKEN.to_string(),
            requests: AtomicUsize::new(0),
            delay: Mutex::new(None),
            repo: Mutex::new(MockRepo::default()),
        });

        let app = Router::new()
            .route("/user", get(get_user))
            .route(
                "/repos/{owner}/{repo}/contents/{*path}",
                get(get_contents).put(put_contents).delete(delete_contents),
            )
            .route("/repos/{owner}/{repo}/commits", get(list_commits))
            .route(
                "/repos/{owner}/{repo}/issues",
                get(list_issues).post(create_issue),
            )
            .route(
                "/repos/{owner}/{repo}/issues/{number}/comments",
                get(list_comments).post(create_comment),
            )
            .layer(middleware::from_fn_with_state(state.clone(), gatekeeper))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock remote");
        let addr = listener.local_addr().expect("Failed to get addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Requests received so far, rejected ones included.
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.state.delay.lock().unwrap() = delay;
    }

    /// Commit a file directly, returning its blob hash.
    pub fn seed_file(&self, path: &str, content: &str) -> String {
        self.state
            .repo
            .lock()
            .unwrap()
            .commit(path, &format!("Seed {}", path), Some(content))
    }

    /// Like [`MockGitHub::seed_file`], but the commit keeps an older author
    /// date, as a cherry-picked commit does.
    pub fn seed_file_authored(&self, path: &str, content: &str, authored: DateTime<Utc>) -> String {
        self.state.repo.lock().unwrap().commit_authored(
            path,
            &format!("Pick {}", path),
            Some(content),
            Some(authored),
        )
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.state
            .repo
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|f| f.content.clone())
    }

    pub fn issue_count(&self) -> usize {
        self.state.repo.lock().unwrap().issues.len()
    }

    pub fn issue_body(&self, number: u64) -> Option<String> {
        self.state
            .repo
            .lock()
            .unwrap()
            .issues
            .iter()
            .find(|i| i.number == number)
            .map(|i| i.body.clone())
    }

    /// Configuration pointed at this remote.
    pub fn config(&self, scratch: &FsPath) -> Config {
        Config {
            api_psk: None,
            github_token: None,
            api_base: self.base_url.clone(),
            repo_owner: OWNER.to_string(),
            repo_name: REPO.to_string(),
            branch: BRANCH.to_string(),
            docs_dir: scratch.join("docs"),
            docs_prefix: "src/docs".to_string(),
            credential_path: scratch.join("credential"),
            discussion_label: LABEL.to_string(),
            http_timeout: Duration::from_secs(5),
            search_threshold: 0.3,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        }
    }

    /// A client and its session, holding `token` if given.
    pub async fn client(&self, config: &Config, token: Option<&str>) -> (Arc<GitHubClient>, Arc<Session>) {
        let store = Arc::new(FileCredentialStore::new(&config.credential_path));
        let session = Arc::new(
            Session::resolve(token.map(str::to_string), store)
                .await
                .unwrap(),
        );
        let client = Arc::new(GitHubClient::new(config, session.clone()).unwrap());
        (client, session)
    }
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn message(status: StatusCode, text: &str) -> Response {
    reply(status, json!({ "message": text }))
}

fn wrong_repo(owner: &str, repo: &str) -> bool {
    owner != OWNER || repo != REPO
}

async fn gatekeeper(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let delay = *state.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.valid_token);
    if !authorized {
        return message(StatusCode::UNAUTHORIZED, "Bad credentials");
    }

    next.run(request).await
}

async fn get_user() -> Response {
    reply(StatusCode::OK, json!({ "login": "octocat", "id": 1 }))
}

/// Base64 wrapped at 60 columns, as GitHub serves it.
fn wrapped_base64(content: &str) -> String {
    let encoded = STANDARD.encode(content.as_bytes());
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

async fn get_contents(
    State(state): State<Arc<MockState>>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if wrong_repo(&owner, &repo) {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }

    let repo = state.repo.lock().unwrap();
    let git_ref = query.get("ref").map(String::as_str).unwrap_or(BRANCH);

    let found = if git_ref == BRANCH {
        repo.files
            .get(&path)
            .map(|f| (f.content.clone(), f.sha.clone()))
    } else {
        repo.content_at(&path, git_ref)
            .map(|content| (content, format!("b-at-{}", git_ref)))
    };

    match found {
        Some((content, sha)) => reply(
            StatusCode::OK,
            json!({
                "type": "file",
                "path": path,
                "sha": sha,
                "content": wrapped_base64(&content),
                "encoding": "base64",
            }),
        ),
        None => message(StatusCode::NOT_FOUND, "Not Found"),
    }
}

#[derive(Deserialize)]
struct PutBody {
    message: String,
    content: String,
    branch: String,
    sha: Option<String>,
}

async fn put_contents(
    State(state): State<Arc<MockState>>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Json(body): Json<PutBody>,
) -> Response {
    if wrong_repo(&owner, &repo) || body.branch != BRANCH {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }
    let Ok(bytes) = STANDARD.decode(body.content.as_bytes()) else {
        return message(StatusCode::UNPROCESSABLE_ENTITY, "content is not valid Base64");
    };
    let Ok(content) = String::from_utf8(bytes) else {
        return message(StatusCode::UNPROCESSABLE_ENTITY, "content is not valid UTF-8");
    };

    let mut repo = state.repo.lock().unwrap();
    let current = repo.files.get(&path).map(|f| f.sha.clone());

    match (current, body.sha.as_deref()) {
        (Some(_), None) => {
            return message(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid request.\n\n\"sha\" wasn't supplied.",
            )
        }
        (None, Some(_)) => return message(StatusCode::NOT_FOUND, "Not Found"),
        (Some(current), Some(given)) if current != given => {
            return message(
                StatusCode::CONFLICT,
                &format!("{} does not match {}", path, given),
            )
        }
        _ => {}
    }

    let created = body.sha.is_none();
    let sha = repo.commit(&path, &body.message, Some(&content));
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    reply(status, json!({ "content": { "path": path, "sha": sha } }))
}

#[derive(Deserialize)]
struct DeleteBody {
    message: String,
    sha: String,
    branch: String,
}

async fn delete_contents(
    State(state): State<Arc<MockState>>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Json(body): Json<DeleteBody>,
) -> Response {
    if wrong_repo(&owner, &repo) || body.branch != BRANCH {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }

    let mut repo = state.repo.lock().unwrap();
    match repo.files.get(&path).map(|f| f.sha.clone()) {
        None => message(StatusCode::NOT_FOUND, "Not Found"),
        Some(current) if current != body.sha => message(
            StatusCode::CONFLICT,
            &format!("{} does not match {}", path, body.sha),
        ),
        Some(_) => {
            repo.commit(&path, &body.message, None);
            reply(StatusCode::OK, json!({ "content": null }))
        }
    }
}

fn page_of<T: Clone>(items: &[T], query: &HashMap<String, String>) -> Vec<T> {
    let per_page: usize = query
        .get("per_page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);
    let page: usize = query
        .get("page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    items
        .iter()
        .skip(per_page * page.saturating_sub(1))
        .take(per_page)
        .cloned()
        .collect()
}

async fn list_commits(
    State(state): State<Arc<MockState>>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if wrong_repo(&owner, &repo) {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }
    let path = query.get("path").cloned().unwrap_or_default();

    let repo = state.repo.lock().unwrap();
    let commits: Vec<Value> = repo
        .commits
        .iter()
        .rev()
        .filter(|c| c.path == path)
        .map(|c| {
            json!({
                "sha": c.sha,
                "html_url": format!("https://github.com/{}/{}/commit/{}", OWNER, REPO, c.sha),
                "commit": {
                    "message": c.message,
                    "author": { "name": "Mock Author", "email": "mock@example.com", "date": c.authored },
                    "committer": { "name": "Mock Committer", "email": "bot@example.com", "date": c.date },
                },
            })
        })
        .collect();

    reply(StatusCode::OK, Value::Array(page_of(&commits, &query)))
}

fn issue_json(issue: &StoredIssue, comments: usize) -> Value {
    json!({
        "number": issue.number,
        "title": issue.title,
        "body": issue.body,
        "html_url": format!("https://github.com/{}/{}/issues/{}", OWNER, REPO, issue.number),
        "comments": comments,
        "labels": issue.labels.iter().map(|l| json!({ "name": l })).collect::<Vec<_>>(),
    })
}

async fn list_issues(
    State(state): State<Arc<MockState>>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if wrong_repo(&owner, &repo) {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }
    let label = query.get("labels").cloned();

    let repo = state.repo.lock().unwrap();
    let issues: Vec<Value> = repo
        .issues
        .iter()
        .rev()
        .filter(|i| label.as_ref().map_or(true, |l| i.labels.contains(l)))
        .map(|i| issue_json(i, repo.comments.get(&i.number).map_or(0, Vec::len)))
        .collect();

    reply(StatusCode::OK, Value::Array(page_of(&issues, &query)))
}

#[derive(Deserialize)]
struct IssueBody {
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    labels: Vec<String>,
}

async fn create_issue(
    State(state): State<Arc<MockState>>,
    Path((owner, repo)): Path<(String, String)>,
    Json(body): Json<IssueBody>,
) -> Response {
    if wrong_repo(&owner, &repo) {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }

    let mut repo = state.repo.lock().unwrap();
    let number = repo.issues.len() as u64 + 1;
    repo.issues.push(StoredIssue {
        number,
        title: body.title,
        body: body.body,
        labels: body.labels,
    });
    let created = issue_json(&repo.issues[repo.issues.len() - 1], 0);
    reply(StatusCode::CREATED, created)
}

async fn list_comments(
    State(state): State<Arc<MockState>>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if wrong_repo(&owner, &repo) {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }

    let repo = state.repo.lock().unwrap();
    if !repo.issues.iter().any(|i| i.number == number) {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }

    // Served newest first so callers have to order them.
    let comments: Vec<Value> = repo
        .comments
        .get(&number)
        .map(|list| {
            list.iter()
                .rev()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "body": c.body,
                        "user": { "login": "octocat", "avatar_url": "https://avatars.example/octocat" },
                        "created_at": c.created_at,
                        "updated_at": c.created_at,
                        "html_url": format!("https://github.com/{}/{}/issues/{}#issuecomment-{}", OWNER, REPO, number, c.id),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    reply(StatusCode::OK, Value::Array(page_of(&comments, &query)))
}

#[derive(Deserialize)]
struct CommentBody {
    body: String,
}

async fn create_comment(
    State(state): State<Arc<MockState>>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    Json(body): Json<CommentBody>,
) -> Response {
    if wrong_repo(&owner, &repo) {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }

    let mut repo = state.repo.lock().unwrap();
    if !repo.issues.iter().any(|i| i.number == number) {
        return message(StatusCode::NOT_FOUND, "Not Found");
    }

    let id = repo.next_seq();
    let created_at = repo.clock();
    repo.comments.entry(number).or_default().push(StoredComment {
        id,
        body: body.body,
        created_at,
    });
    reply(StatusCode::CREATED, json!({ "id": id }))
}
