//! HTTP API tests.
//!
//! Each test starts the router on a free local port, backed either by the
//! in-memory store, by SQLite through the normal config path, or by nothing.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use startupmate::config::Config;
use startupmate::server::{self, AppState};
use startupmate_core::store::memory::InMemoryBackend;
use startupmate_core::store::DocumentBackend;

const PDF: &str = "application/pdf";
const PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

struct TestServer {
    base: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn upload(&self, bytes: Vec<u8>, filename: &str, mime: &str) -> (u16, Value) {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .unwrap();
        let resp = self
            .client
            .post(self.url("/api/score-deck"))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start(config: Config, backend: Option<Arc<dyn DocumentBackend>>) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let state = AppState::new(config, backend);
    let handle = tokio::spawn(async move {
        server::serve(listener, state).await.ok();
    });
    wait_for_server(port).await;
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        handle,
    }
}

async fn start_in_memory() -> (TestServer, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::new());
    let server = start(Config::default(), Some(backend.clone())).await;
    (server, backend)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_root_and_health() {
    let (server, _) = start_in_memory().await;

    let (status, body) = server.get_json("/").await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "StartupMate Backend Running");

    let (status, body) = server.get_json("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_validate_idea_returns_and_stores_analysis() {
    let (server, backend) = start_in_memory().await;

    let (status, body) = server
        .post_json(
            "/api/validate-idea",
            json!({"idea": "  Subscription service for refurbished office chairs  "}),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["id"].is_string());
    let analysis = &body["analysis"];
    assert_eq!(
        analysis["idea"],
        "Subscription service for refurbished office chairs"
    );
    assert_eq!(analysis["score_overall"], 72);
    assert_eq!(
        analysis["tags"],
        json!(["market", "problem-solution", "MVP", "risks", "growth"])
    );
    assert_eq!(backend.count("ideaanalysis"), 1);
}

#[tokio::test]
async fn test_short_idea_is_rejected_without_insert() {
    let (server, backend) = start_in_memory().await;

    for body in [
        json!({"idea": "tiny"}),
        json!({"idea": "          "}),
        json!({"idea": ""}),
        json!({}),
    ] {
        let (status, resp) = server.post_json("/api/validate-idea", body).await;
        assert_eq!(status, 400);
        assert_eq!(resp["error"]["code"], "bad_request");
        assert!(resp["error"]["message"]
            .as_str()
            .unwrap()
            .contains("at least 10 characters"));
    }
    assert_eq!(backend.count("ideaanalysis"), 0);
}

#[tokio::test]
async fn test_malformed_idea_body_is_bad_request() {
    let (server, backend) = start_in_memory().await;

    let (status, resp) = server
        .post_json("/api/validate-idea", json!({"idea": 42}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(resp["error"]["code"], "bad_request");

    let resp = server
        .client
        .post(server.url("/api/validate-idea"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(backend.count("ideaanalysis"), 0);
}

#[tokio::test]
async fn test_score_deck_accepts_pdf_and_pptx() {
    let (server, backend) = start_in_memory().await;

    let (status, body) = server.upload(b"%PDF-1.4 pitch".to_vec(), "pitch.pdf", PDF).await;
    assert_eq!(status, 200);
    let card = &body["scorecard"];
    assert_eq!(card["filename"], "pitch.pdf");
    assert_eq!(card["mime_type"], PDF);
    assert_eq!(card["overall_score"], 67);
    assert_eq!(card["size_bytes"], 14);
    assert_eq!(card["extracted_text_preview"], "%PDF-1.4 pitch");
    assert_eq!(card["category_scores"].as_object().unwrap().len(), 7);

    let (status, body) = server.upload(vec![0u8; 10_000], "deck.pptx", PPTX).await;
    assert_eq!(status, 200);
    assert_eq!(body["scorecard"]["size_bytes"], 2048);

    assert_eq!(backend.count("deckanalysis"), 2);
}

#[tokio::test]
async fn test_score_deck_rejects_other_types_without_insert() {
    let (server, backend) = start_in_memory().await;

    let (status, body) = server.upload(b"hello".to_vec(), "notes.txt", "text/plain").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Unsupported file type"));
    assert_eq!(backend.count("deckanalysis"), 0);
}

#[tokio::test]
async fn test_score_deck_requires_file_field() {
    let (server, backend) = start_in_memory().await;

    let form = Form::new().text("other", "value");
    let resp = server
        .client
        .post(server.url("/api/score-deck"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]["message"].as_str().unwrap().contains("'file'"));

    let resp = server
        .client
        .post(server.url("/api/score-deck"))
        .json(&json!({"file": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(backend.count("deckanalysis"), 0);
}

#[tokio::test]
async fn test_reports_limit_and_ids() {
    let (server, _) = start_in_memory().await;

    for name in ["first", "second", "third"] {
        let (status, _) = server
            .post_json(
                "/api/validate-idea",
                json!({"idea": format!("The {} detailed startup idea", name)}),
            )
            .await;
        assert_eq!(status, 200);
    }
    server.upload(b"deck".to_vec(), "a.pdf", PDF).await;

    let (status, body) = server.get_json("/api/reports?limit=2").await;
    assert_eq!(status, 200);
    let ideas = body["ideas"].as_array().unwrap();
    assert_eq!(ideas.len(), 2);
    assert_eq!(ideas[0]["idea"], "The third detailed startup idea");
    assert!(ideas.iter().all(|d| d["_id"].is_string()));
    assert_eq!(body["decks"].as_array().unwrap().len(), 1);
    assert!(body["decks"][0]["_id"].is_string());

    let (_, body) = server.get_json("/api/reports").await;
    assert_eq!(body["ideas"].as_array().unwrap().len(), 3);

    let (_, body) = server.get_json("/api/reports?limit=0").await;
    assert!(body["ideas"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reports_bad_limit() {
    let (server, _) = start_in_memory().await;
    for query in ["limit=-1", "limit=abc"] {
        let (status, body) = server.get_json(&format!("/api/reports?{}", query)).await;
        assert_eq!(status, 400, "{}", query);
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn test_contact_validation_and_storage() {
    let (server, backend) = start_in_memory().await;

    let (status, body) = server
        .post_json(
            "/api/contact",
            json!({"name": "Ada", "email": "not-an-email", "message": "Hi"}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "validation_failed");
    let details = body["error"]["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d["field"] == "email"));
    assert_eq!(backend.count("contactmessage"), 0);

    let (status, body) = server
        .post_json("/api/contact", json!({"email": "a@b.co"}))
        .await;
    assert_eq!(status, 400);
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"message"));

    let (status, body) = server
        .post_json(
            "/api/contact",
            json!({"name": "Ada", "email": "a@b.co", "message": "Hi"}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "received");
    assert!(body["id"].is_string());
    assert_eq!(backend.count("contactmessage"), 1);
}

#[tokio::test]
async fn test_no_store_answers_503() {
    let server = start(Config::default(), None).await;

    let (status, body) = server
        .post_json("/api/validate-idea", json!({"idea": "A sufficiently long idea"}))
        .await;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"], "store_unavailable");
    assert!(body["error"].get("details").is_none());

    let (status, _) = server.get_json("/api/reports").await;
    assert_eq!(status, 503);

    // Input errors still win over the missing store.
    let (status, _) = server
        .post_json("/api/validate-idea", json!({"idea": "short"}))
        .await;
    assert_eq!(status, 400);

    let (status, body) = server.get_json("/test").await;
    assert_eq!(status, 200);
    assert_eq!(body["backend"], "running");
    assert_eq!(body["connection_status"], "not connected");
    assert_eq!(body["database_url"], "not set");
}

#[tokio::test]
async fn test_offline_store_answers_503() {
    let (server, backend) = start_in_memory().await;
    backend.set_online(false);

    let (status, body) = server
        .post_json(
            "/api/contact",
            json!({"name": "Ada", "email": "a@b.co", "message": "Hi"}),
        )
        .await;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"], "store_unavailable");

    let (status, body) = server.get_json("/test").await;
    assert_eq!(status, 200);
    assert!(body["database"]
        .as_str()
        .unwrap()
        .starts_with("connected but error"));
}

#[tokio::test]
async fn test_undecodable_document_is_internal_error() {
    let (server, backend) = start_in_memory().await;
    let broken = json!({"idea": "missing everything else"});
    backend
        .insert("ideaanalysis", broken.as_object().unwrap())
        .await
        .unwrap();

    let (status, body) = server.get_json("/api/reports").await;
    assert_eq!(status, 500);
    assert_eq!(body["error"]["code"], "internal");
}

#[tokio::test]
async fn test_run_server_with_sqlite_store() {
    let tmp = TempDir::new().unwrap();
    let port = find_free_port();
    let config_content = format!(
        r#"[db]
url = "sqlite:{}/data/startupmate.sqlite"
name = "startupmate"

[server]
bind = "127.0.0.1:{}"
"#,
        tmp.path().display(),
        port
    );
    let cfg: Config = toml::from_str(&config_content).unwrap();

    let cfg_clone = cfg.clone();
    let handle = tokio::spawn(async move {
        server::run_server(&cfg_clone).await.ok();
    });
    wait_for_server(port).await;
    let server = TestServer {
        base: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        handle,
    };

    let (status, created) = server
        .post_json("/api/validate-idea", json!({"idea": "Peer-to-peer tool library"}))
        .await;
    assert_eq!(status, 200);

    let (_, body) = server.get_json("/api/reports").await;
    assert_eq!(body["ideas"][0]["_id"], created["id"]);
    assert_eq!(body["ideas"][0]["summary"], created["analysis"]["summary"]);

    let (_, status_body) = server.get_json("/test").await;
    assert_eq!(status_body["database"], "connected and working");
    assert_eq!(status_body["collections"], json!(["ideaanalysis"]));
}
