//! End-to-end tests for the source-chain fetcher against a local stub
//! endpoint, plus the cache sitting in front of it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, http::Uri, routing::any, Router};
use parking_lot::Mutex;
use tokio::net::TcpListener;

use trustflash_backend::cache::TtlCache;
use trustflash_backend::datasets::{
    fetch_series, DatasetError, DatasetSpec, Provenance, SeriesTable, Source, SourceKind,
};

#[derive(Clone)]
struct StubState {
    responses: Arc<HashMap<String, (u16, String)>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

async fn stub_handler(State(state): State<StubState>, uri: Uri) -> (StatusCode, String) {
    let path = uri.path().to_string();
    *state.hits.lock().entry(path.clone()).or_insert(0) += 1;
    match state.responses.get(&path) {
        Some((code, body)) => (
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body.clone(),
        ),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

/// Serve canned bodies on an ephemeral port; returns the base URL and a
/// per-path hit counter.
async fn spawn_stub(
    responses: HashMap<String, (u16, String)>,
) -> (String, Arc<Mutex<HashMap<String, usize>>>) {
    let hits = Arc::new(Mutex::new(HashMap::new()));
    let state = StubState {
        responses: Arc::new(responses),
        hits: hits.clone(),
    };
    let app = Router::new()
        .route("/", any(stub_handler))
        .route("/*path", any(stub_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), hits)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// `rows` days of `date,GEX` starting 2025-01-01, values 100 + i.
fn gex_csv(rows: usize) -> String {
    let mut body = String::from("date,GEX\n");
    let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    for i in 0..rows {
        let date = start + chrono::Days::new(i as u64);
        body.push_str(&format!("{date},{}\n", 100 + i));
    }
    body
}

fn remote(kind: SourceKind, base: &str, path: &str) -> Source {
    Source::remote(kind, format!("{base}{path}"), "date", "GEX")
}

fn spec_with(sources: Vec<Source>) -> DatasetSpec {
    DatasetSpec {
        name: "gex",
        sources,
        min_rows: 1,
        ma_window: None,
        window: 60,
        ttl_secs: 900,
    }
}

#[tokio::test]
async fn first_acceptable_source_wins_and_later_ones_are_untouched() {
    let mut responses = HashMap::new();
    responses.insert("/a.csv".to_string(), (500, String::new()));
    responses.insert("/b.csv".to_string(), (200, gex_csv(10)));
    responses.insert("/c.csv".to_string(), (200, gex_csv(40)));
    let (base, hits) = spawn_stub(responses).await;

    let spec = spec_with(vec![
        remote(SourceKind::RemotePrimary, &base, "/a.csv"),
        remote(SourceKind::RemoteMirror, &base, "/b.csv"),
        remote(SourceKind::RemoteMirror, &base, "/c.csv"),
    ]);

    let table = fetch_series(&client(), &spec).await.unwrap();
    assert_eq!(table.len(), 10);
    assert_eq!(table.provenance, Provenance::Remote(format!("{base}/b.csv")));

    let hits = hits.lock();
    assert_eq!(hits.get("/a.csv"), Some(&1));
    assert_eq!(hits.get("/b.csv"), Some(&1));
    assert_eq!(hits.get("/c.csv"), None);
}

#[tokio::test]
async fn hanging_source_times_out_and_falls_through() {
    // A listener that accepts connections and never answers.
    let hang = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let hang_addr = hang.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = hang.accept().await else { break };
            tokio::spawn(async move {
                let _socket = socket;
                std::future::pending::<()>().await;
            });
        }
    });

    let mut responses = HashMap::new();
    responses.insert("/b.csv".to_string(), (200, gex_csv(10)));
    let (base, _hits) = spawn_stub(responses).await;

    let spec = spec_with(vec![
        Source::remote(
            SourceKind::RemotePrimary,
            format!("http://{hang_addr}/a.csv"),
            "date",
            "GEX",
        ),
        remote(SourceKind::RemoteMirror, &base, "/b.csv"),
    ]);

    let started = std::time::Instant::now();
    let table = fetch_series(&client(), &spec).await.unwrap();

    assert_eq!(table.provenance, Provenance::Remote(format!("{base}/b.csv")));
    assert_eq!(table.len(), 10);
    // Bounded by the 2s client timeout; the chain never stalls on the primary.
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn all_remotes_down_falls_through_to_local_sample() {
    let mut responses = HashMap::new();
    responses.insert("/a.csv".to_string(), (500, String::new()));
    let (base, _hits) = spawn_stub(responses).await;

    let dir = tempfile::tempdir().unwrap();
    let sample = dir.path().join("sample_gex.csv");
    std::fs::write(&sample, gex_csv(20)).unwrap();

    let spec = spec_with(vec![
        remote(SourceKind::RemotePrimary, &base, "/a.csv"),
        remote(SourceKind::RemoteMirror, &base, "/missing.csv"),
        Source::local(sample, "date", "GEX"),
    ]);

    let table = fetch_series(&client(), &spec).await.unwrap();
    assert_eq!(table.len(), 20);
    assert_eq!(table.provenance, Provenance::LocalSample);
    assert_eq!(table.provenance.to_string(), "local_sample");
}

#[tokio::test]
async fn exhaustion_is_a_typed_terminal_error() {
    let (base, _hits) = spawn_stub(HashMap::new()).await;

    let spec = spec_with(vec![
        remote(SourceKind::RemotePrimary, &base, "/a.csv"),
        remote(SourceKind::RemoteMirror, &base, "/b.csv"),
        Source::local(PathBuf::from("/nonexistent/sample_gex.csv"), "date", "GEX"),
    ]);

    let err = fetch_series(&client(), &spec).await.unwrap_err();
    match err {
        DatasetError::Exhausted { dataset, reasons } => {
            assert_eq!(dataset, "gex");
            assert!(reasons.contains("/a.csv"));
            assert!(reasons.contains("sample_gex.csv"));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn schema_mismatch_is_skipped_like_a_network_failure() {
    let mut responses = HashMap::new();
    // Non-empty, parses as CSV, but carries no GEX column.
    responses.insert(
        "/a.csv".to_string(),
        (200, "date,Close\n2025-01-01,17.2\n".to_string()),
    );
    responses.insert("/b.csv".to_string(), (200, gex_csv(5)));
    let (base, _hits) = spawn_stub(responses).await;

    let spec = spec_with(vec![
        remote(SourceKind::RemotePrimary, &base, "/a.csv"),
        remote(SourceKind::RemoteMirror, &base, "/b.csv"),
    ]);

    let table = fetch_series(&client(), &spec).await.unwrap();
    assert_eq!(table.provenance, Provenance::Remote(format!("{base}/b.csv")));
    assert_eq!(table.len(), 5);
}

#[tokio::test]
async fn trailing_window_keeps_last_rows_in_order() {
    let mut responses = HashMap::new();
    responses.insert("/a.csv".to_string(), (200, gex_csv(200)));
    let (base, _hits) = spawn_stub(responses).await;

    let spec = spec_with(vec![remote(SourceKind::RemotePrimary, &base, "/a.csv")]);

    let table = fetch_series(&client(), &spec).await.unwrap();
    assert_eq!(table.len(), 60);
    // Values run 100..=299; the window keeps 240..=299 in original order.
    assert_eq!(table.points[0].value, 240.0);
    assert_eq!(table.last().unwrap().value, 299.0);
    assert!(table
        .points
        .windows(2)
        .all(|w| w[1].value == w[0].value + 1.0));
}

#[tokio::test]
async fn short_history_everywhere_reports_insufficient_data() {
    let mut responses = HashMap::new();
    responses.insert("/a.csv".to_string(), (200, gex_csv(12)));
    let (base, _hits) = spawn_stub(responses).await;

    let dir = tempfile::tempdir().unwrap();
    let sample = dir.path().join("sample_gex.csv");
    std::fs::write(&sample, gex_csv(8)).unwrap();

    let mut spec = spec_with(vec![
        remote(SourceKind::RemotePrimary, &base, "/a.csv"),
        Source::local(sample, "date", "GEX"),
    ]);
    spec.min_rows = 30;

    let err = fetch_series(&client(), &spec).await.unwrap_err();
    assert!(matches!(err, DatasetError::InsufficientHistory { .. }));
    assert_eq!(err.to_string(), "insufficient gex data");
}

#[tokio::test]
async fn moving_average_is_derived_before_the_trim() {
    let mut responses = HashMap::new();
    responses.insert("/vix.csv".to_string(), (200, gex_csv(130)));
    let (base, _hits) = spawn_stub(responses).await;

    let mut spec = spec_with(vec![remote(SourceKind::RemotePrimary, &base, "/vix.csv")]);
    spec.min_rows = 30;
    spec.ma_window = Some(20);
    spec.window = 90;

    let table = fetch_series(&client(), &spec).await.unwrap();
    assert_eq!(table.len(), 90);
    // Row 40 of the full series sits well past the 20-row warm-up, so every
    // retained point carries a mean.
    assert!(table.points.iter().all(|p| p.ma.is_some()));
    // Values are linear, so the trailing mean lags the value by (w-1)/2.
    let last = table.last().unwrap();
    assert_eq!(last.ma, Some(last.value - 9.5));
}

#[tokio::test]
async fn cached_fetch_contacts_the_source_once_per_window() {
    let mut responses = HashMap::new();
    responses.insert("/a.csv".to_string(), (200, gex_csv(10)));
    let (base, hits) = spawn_stub(responses).await;

    let spec = spec_with(vec![remote(SourceKind::RemotePrimary, &base, "/a.csv")]);
    let http = client();
    let cache: TtlCache<SeriesTable> = TtlCache::new();

    let first = cache
        .get_or_fetch(spec.name, spec.ttl_secs, || fetch_series(&http, &spec))
        .await
        .unwrap();
    let second = cache
        .get_or_fetch(spec.name, spec.ttl_secs, || fetch_series(&http, &spec))
        .await
        .unwrap();

    assert_eq!(first.points, second.points);
    assert_eq!(first.provenance, second.provenance);
    assert_eq!(hits.lock().get("/a.csv"), Some(&1));
}
