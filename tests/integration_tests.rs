use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lan_transfer_client::{
    api_client::TransferClient,
    chat::{MessageComposer, SendOutcome, SyncLoop, ViewUpdate},
    listing::ListingController,
    models::{Category, FileEntry, Message, StorageStats},
    notify::{ChatView, ListingView, Notification, Notifier, Severity},
    uploader::process_upload_batch,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Integration tests for the LAN Transfer client
/// These run the controllers against a mock transfer server

#[derive(Default)]
struct Recorder {
    notifications: Mutex<Vec<Notification>>,
    listings: Mutex<Vec<(Category, Vec<FileEntry>)>>,
    stats: Mutex<Vec<StorageStats>>,
    chat: Mutex<Vec<ViewUpdate>>,
}

impl Recorder {
    fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    fn last_notification(&self) -> Notification {
        self.notifications
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("at least one notification")
    }
}

impl Notifier for Recorder {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

impl ListingView for Recorder {
    fn show_files(&self, category: Category, files: &[FileEntry]) {
        self.listings
            .lock()
            .unwrap()
            .push((category, files.to_vec()));
    }

    fn show_stats(&self, stats: &StorageStats) {
        self.stats.lock().unwrap().push(stats.clone());
    }
}

impl ChatView for Recorder {
    fn apply(&self, update: &ViewUpdate) {
        self.chat.lock().unwrap().push(update.clone());
    }
}

fn client_for(server: &MockServer) -> TransferClient {
    TransferClient::new(&server.uri(), Duration::from_secs(5)).expect("valid mock server url")
}

/// Address with nothing listening on it.
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

async fn mount_empty_listings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/files/[a-z]+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"files": [], "category": "images"})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_files": 0,
            "total_size": "0 B",
            "stats": {}
        })))
        .mount(server)
        .await;
}

fn message(id: u64, sender: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "sender": sender,
        "content": content,
        "timestamp": "2024-05-01T10:00:00.000000"
    })
}

#[tokio::test]
async fn test_upload_batch_continues_past_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("filename=\"b.exe\""))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "File type not allowed"})),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(2)
        .mount(&server)
        .await;
    mount_empty_listings(&server).await;

    let dir = tempfile::tempdir().expect("create tempdir");
    let paths: Vec<PathBuf> = ["a.txt", "b.exe", "c.txt"]
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, "hello").unwrap();
            path
        })
        .collect();

    let client = client_for(&server);
    let recorder = Arc::new(Recorder::default());
    let listing = ListingController::new(client.clone(), recorder.clone(), recorder.clone());

    let result = process_upload_batch(&client, &paths, &*recorder, &listing).await;

    assert_eq!(result.success_count, 2);
    assert_eq!(result.failure_count, 1);
    assert_eq!(
        recorder.messages(),
        [
            "Uploading: a.txt (5 B)",
            "✓ a.txt",
            "Uploading: b.exe (5 B)",
            "✗ b.exe: File type not allowed",
            "Uploading: c.txt (5 B)",
            "✓ c.txt",
            "Done: 2 succeeded, 1 failed",
        ]
    );
    assert_eq!(recorder.last_notification().severity, Severity::Success);

    // Stats and the listing are refreshed once the batch is done
    assert_eq!(recorder.stats.lock().unwrap().len(), 1);
    assert_eq!(recorder.listings.lock().unwrap().len(), 1);

    println!("✅ Upload batch reported every file and a summary");
}

#[tokio::test]
async fn test_missing_file_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;
    mount_empty_listings(&server).await;

    let dir = tempfile::tempdir().expect("create tempdir");
    let present = dir.path().join("present.txt");
    std::fs::write(&present, "data").unwrap();
    let paths = vec![dir.path().join("missing.txt"), present];

    let client = client_for(&server);
    let recorder = Arc::new(Recorder::default());
    let listing = ListingController::new(client.clone(), recorder.clone(), recorder.clone());

    let result = process_upload_batch(&client, &paths, &*recorder, &listing).await;

    assert_eq!((result.success_count, result.failure_count), (1, 1));
    let messages = recorder.messages();
    assert!(messages[0].starts_with("✗ missing.txt:"));
    // Ties count as a success
    assert_eq!(recorder.last_notification().severity, Severity::Success);
}

#[tokio::test]
async fn test_transport_failure_is_reported_as_network_error() {
    let client = TransferClient::new(&unreachable_url(), Duration::from_secs(2)).unwrap();
    let recorder = Arc::new(Recorder::default());
    let listing = ListingController::new(client.clone(), recorder.clone(), recorder.clone());

    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hi").unwrap();

    let result = process_upload_batch(&client, &[path], &*recorder, &listing).await;

    assert_eq!(result.failure_count, 1);
    // Single-file batches get no summary
    assert_eq!(
        recorder.messages(),
        ["Uploading: notes.txt (2 B)", "✗ notes.txt: Network error"]
    );
    assert!(recorder.stats.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_sync_loop_reconciles_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [message(1, "Alice", "hi"), message(2, "Bob", "hello")]
        })))
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let sync = SyncLoop::new(client_for(&server), recorder.clone(), "Alice");

    let update = sync.sync_once().await.expect("sync succeeds");
    match update {
        Some(ViewUpdate::ReplaceAll(rendered)) => {
            assert_eq!(rendered.len(), 2);
            assert!(rendered[0].own);
            assert!(!rendered[1].own);
            assert_eq!(rendered[0].time_label, "10:00");
        }
        other => panic!("expected ReplaceAll, got {:?}", other),
    }

    // Same list again: nothing to do
    assert_eq!(
        sync.sync_once().await.unwrap(),
        Some(ViewUpdate::Unchanged)
    );

    // Server history cleared
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": []})))
        .mount(&server)
        .await;

    assert_eq!(sync.sync_once().await.unwrap(), Some(ViewUpdate::ShowEmpty));
    assert_eq!(sync.cursor().last_seen_id(), 2);
    assert_eq!(recorder.chat.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_sync_failure_leaves_view_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let sync = SyncLoop::new(client_for(&server), recorder.clone(), "");

    assert!(sync.sync_once().await.is_err());
    assert!(!sync.cursor().is_initialized());
    assert!(recorder.chat.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_polling_task_stops_on_shutdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"messages": [message(1, "Bob", "hi")]})),
        )
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let sync = Arc::new(SyncLoop::new(client_for(&server), recorder.clone(), ""));

    let handle = sync.spawn(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.shutdown().await;

    let requests_at_shutdown = server.received_requests().await.unwrap().len();
    assert!(requests_at_shutdown >= 2, "polled {} times", requests_at_shutdown);
    assert_eq!(recorder.chat.lock().unwrap().len(), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        requests_at_shutdown
    );
}

#[tokio::test]
async fn test_blank_draft_sends_nothing() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let recorder = Arc::new(Recorder::default());
    let sync = SyncLoop::new(client.clone(), recorder.clone(), "");

    let mut composer = MessageComposer::new();
    composer.set_draft("   \n\t");

    assert_eq!(
        composer.send(&client, &sync, &*recorder).await,
        SendOutcome::Empty
    );
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(recorder.messages().is_empty());
}

#[tokio::test]
async fn test_failed_send_keeps_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Server busy"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let recorder = Arc::new(Recorder::default());
    let sync = SyncLoop::new(client.clone(), recorder.clone(), "Alice");

    let mut composer = MessageComposer::new();
    composer.set_draft("hello there");

    assert_eq!(
        composer.send(&client, &sync, &*recorder).await,
        SendOutcome::Failed("Server busy".to_string())
    );
    assert_eq!(composer.draft(), "hello there");

    let notification = recorder.last_notification();
    assert_eq!(notification.message, "Server busy");
    assert_eq!(notification.severity, Severity::Error);
}

#[tokio::test]
async fn test_successful_send_clears_draft_and_resyncs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/messages"))
        .and(body_json(json!({"content": "hello", "sender": "Anonymous"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": message(2, "Anonymous", "hello")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let recorder = Arc::new(Recorder::default());
    let sync = SyncLoop::new(client.clone(), recorder.clone(), "  ");

    // Prime the view with the existing history
    let ticket = sync.issue_ticket();
    let existing: Vec<Message> = serde_json::from_value(json!([message(1, "Bob", "hi")])).unwrap();
    sync.apply(ticket, &existing);

    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [message(1, "Bob", "hi"), message(2, "Anonymous", "hello")]
        })))
        .mount(&server)
        .await;

    let mut composer = MessageComposer::new();
    composer.set_draft("  hello  ");

    assert_eq!(
        composer.send(&client, &sync, &*recorder).await,
        SendOutcome::Sent
    );
    assert_eq!(composer.draft(), "");

    let updates = recorder.chat.lock().unwrap().clone();
    match updates.last() {
        Some(ViewUpdate::Append(appended)) => {
            assert_eq!(appended.len(), 1);
            assert_eq!(appended[0].id, 2);
            assert!(appended[0].own, "blank display name matches Anonymous");
        }
        other => panic!("expected Append, got {:?}", other),
    }
}

#[tokio::test]
async fn test_all_category_merges_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{
                "name": "old.png",
                "size": "1.0 KB",
                "timestamp": "2024-05-01T09:00:00",
                "category": "images"
            }],
            "category": "images"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/files/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{
                "name": "new.pdf",
                "size": "2.0 MB",
                "timestamp": "2024-05-01T12:00:00",
                "category": "documents"
            }],
            "category": "documents"
        })))
        .mount(&server)
        .await;
    // Remaining categories fail and are skipped
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/files/"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(10)
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let listing = ListingController::new(client_for(&server), recorder.clone(), recorder.clone());

    assert!(listing.select_category(Category::All).await.unwrap());

    let listings = recorder.listings.lock().unwrap();
    let (category, files) = &listings[0];
    assert_eq!(*category, Category::All);
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["new.pdf", "old.png"]);
    assert_eq!(files[0].category, Category::Documents);
}

#[tokio::test]
async fn test_superseded_category_selection_is_not_rendered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files/images"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"files": [], "category": "images"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/files/documents"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"files": [], "category": "documents"})),
        )
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let listing = ListingController::new(client_for(&server), recorder.clone(), recorder.clone());

    let (slow, fast) = tokio::join!(
        listing.select_category(Category::Images),
        listing.select_category(Category::Documents)
    );

    assert!(!slow.unwrap());
    assert!(fast.unwrap());
    assert_eq!(listing.current_category(), Category::Documents);

    let listings = recorder.listings.lock().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].0, Category::Documents);
}

#[tokio::test]
async fn test_delete_reports_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/delete/documents/q1%20report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/delete/images/gone.png"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "File not found"})))
        .mount(&server)
        .await;
    mount_empty_listings(&server).await;

    let recorder = Arc::new(Recorder::default());
    let listing = ListingController::new(client_for(&server), recorder.clone(), recorder.clone());

    assert!(listing.delete_file(Category::Documents, "q1 report.pdf").await);
    assert_eq!(
        recorder.last_notification(),
        Notification::success("Deleted")
    );
    assert_eq!(recorder.listings.lock().unwrap().len(), 1);

    assert!(!listing.delete_file(Category::Images, "gone.png").await);
    let failure = recorder.last_notification();
    assert_eq!(failure.message, "File not found");
    assert_eq!(failure.severity, Severity::Error);
}

#[tokio::test]
async fn test_download_writes_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/images/pic.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/download/images/missing.png"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "File not found"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let dir = tempfile::tempdir().expect("create tempdir");

    let saved = client
        .download_file(Category::Images, "pic.png", dir.path())
        .await
        .expect("download succeeds");
    assert_eq!(saved, dir.path().join("pic.png"));
    assert_eq!(std::fs::read(&saved).unwrap(), vec![7u8; 4096]);

    let err = client
        .download_file(Category::Images, "missing.png", dir.path())
        .await
        .unwrap_err();
    assert_eq!(err.user_message("Download failed"), "File not found");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1, "no partial files left behind");
}

#[tokio::test]
async fn test_stats_are_rendered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_files": 3,
            "total_size": "4.5 MB",
            "stats": {"images": 2, "documents": 1}
        })))
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let listing = ListingController::new(client_for(&server), recorder.clone(), recorder.clone());

    let stats = listing.load_stats().await.unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.stats.get("images"), Some(&2));
    assert_eq!(recorder.stats.lock().unwrap()[0], stats);
}
