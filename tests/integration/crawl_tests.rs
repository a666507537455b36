use crate::support::{
    checkpoint_path, create_test_config, file_names, html, output_dir, SnapshotWhileServing,
    StopAfterServing,
};
use lex_archiver::config::{ContentRuleEntry, FilenameStyle, SourceEntry};
use lex_archiver::crawler::{Coordinator, FrontierEntry};
use lex_archiver::state::CrawlPhase;
use lex_archiver::storage::{CheckpointStore, JsonCheckpointStore};
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_blocked_extension_never_enqueued() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L001.htm"))
        .respond_with(html(
            r#"<html><head><title>Lei 1</title></head><body>
            <a href="L002.htm">Lei 2</a>
            <a href="https://example.gov/other/x.pdf">Anexo</a>
            <a href="/ccivil_03/other/x.pdf">Anexo local</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L002.htm"))
        .respond_with(html(
            r#"<html><head><title>Lei 2</title></head><body><a href="L003.htm">Lei 3</a></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Beyond max depth: never discovered
    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L003.htm"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ccivil_03/other/x.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let seed = format!("{}/ccivil_03/leis/L001.htm", base_url);
    let config = create_test_config(dir.path(), vec![seed.clone()], 1);

    let mut coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.phase, CrawlPhase::Drained);
    assert_eq!(report.stats.visited, 2);
    assert_eq!(report.stats.archived, 2);
    assert_eq!(report.stats.links_enqueued, 1);
    assert_eq!(report.stats.fetch_failures, 0);

    let out = output_dir(dir.path());
    assert_eq!(file_names(&out), vec!["leis_L001.html", "leis_L002.html"]);

    let archived = std::fs::read_to_string(out.join("leis_L001.html")).unwrap();
    assert!(archived.starts_with(&format!("<!-- source-url: {} -->\n", seed)));
    assert!(archived.contains("Lei 2"));

    let state = JsonCheckpointStore::new(checkpoint_path(dir.path()))
        .load()
        .unwrap()
        .expect("Final checkpoint missing");
    assert!(state.queue.is_empty());
    assert_eq!(state.visited.len(), 2);
}

#[tokio::test]
async fn test_navigation_pages_crawled_but_not_archived() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/quadro_lei.htm"))
        .respond_with(html(
            r#"<a href="L100.htm">Lei 100</a><a href="../decreto/D200.htm">Decreto 200</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L100.htm"))
        .respond_with(html("<p>Lei 100</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ccivil_03/decreto/D200.htm"))
        .respond_with(html("<p>Decreto 200</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![format!("{}/ccivil_03/leis/quadro_lei.htm", base_url)],
        1,
    );

    let report = Coordinator::new(config, true).unwrap().run().await.unwrap();

    assert_eq!(report.stats.navigation, 1);
    assert_eq!(report.stats.archived, 2);
    assert_eq!(
        file_names(&output_dir(dir.path())),
        vec!["decreto_D200.html", "leis_L100.html"]
    );
}

#[tokio::test]
async fn test_failed_page_does_not_abort_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L404.htm"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L500.htm"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L001.htm"))
        .respond_with(html("<p>Lei 1</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![
            format!("{}/ccivil_03/leis/L404.htm", base_url),
            format!("{}/ccivil_03/leis/L500.htm", base_url),
            format!("{}/ccivil_03/leis/L001.htm", base_url),
        ],
        1,
    );

    let report = Coordinator::new(config, true).unwrap().run().await.unwrap();

    assert_eq!(report.phase, CrawlPhase::Drained);
    assert_eq!(report.stats.visited, 3);
    assert_eq!(report.stats.fetch_failures, 2);
    assert_eq!(report.stats.archived, 1);
    assert_eq!(file_names(&output_dir(dir.path())), vec!["leis_L001.html"]);
}

/// Mounts a small statute graph: L001 -> {L002, L003}, L002 -> L004,
/// L003 -> L001, L004 -> L005 (beyond depth 2)
async fn mount_graph(server: &MockServer, stop_on_seed: Option<watch::Sender<bool>>) {
    let seed_body = r#"<a href="L002.htm">L2</a><a href="L003.htm#art1">L3</a>"#.to_string();
    let seed = Mock::given(method("GET")).and(path("/ccivil_03/leis/L001.htm"));
    match stop_on_seed {
        Some(stop) => {
            seed.respond_with(StopAfterServing {
                body: seed_body,
                stop,
            })
            .expect(1)
            .mount(server)
            .await
        }
        None => seed.respond_with(html(&seed_body)).expect(1).mount(server).await,
    }

    let pages = [
        ("/ccivil_03/leis/L002.htm", r#"<a href="L004.htm">L4</a>"#, 1),
        ("/ccivil_03/leis/L003.htm", r#"<a href="L001.htm">L1</a>"#, 1),
        ("/ccivil_03/leis/L004.htm", r#"<a href="L005.htm">L5</a>"#, 1),
        ("/ccivil_03/leis/L005.htm", "<p>too deep</p>", 0),
    ];
    for (page_path, body, expected) in pages {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(html(body))
            .expect(expected)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_resumed_crawl_archives_same_documents() {
    // Uninterrupted reference run
    let reference_server = MockServer::start().await;
    mount_graph(&reference_server, None).await;
    let reference_dir = TempDir::new().unwrap();
    let config = create_test_config(
        reference_dir.path(),
        vec![format!("{}/ccivil_03/leis/L001.htm", reference_server.uri())],
        2,
    );
    let reference = Coordinator::new(config, true).unwrap().run().await.unwrap();
    assert_eq!(reference.phase, CrawlPhase::Drained);
    assert_eq!(reference.stats.archived, 4);

    // Interrupted right after the seed, then resumed
    let server = MockServer::start().await;
    let (stop_tx, stop_rx) = watch::channel(false);
    mount_graph(&server, Some(stop_tx)).await;
    let seed = format!("{}/ccivil_03/leis/L001.htm", server.uri());

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), vec![seed.clone()], 2);

    let first = Coordinator::new(config.clone(), false)
        .unwrap()
        .with_shutdown(stop_rx)
        .run()
        .await
        .unwrap();
    assert_eq!(first.phase, CrawlPhase::Interrupted);
    assert_eq!(first.stats.visited, 1);

    let state = JsonCheckpointStore::new(checkpoint_path(dir.path()))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(state.visited, vec![seed.clone()]);
    assert_eq!(
        state.queue,
        vec![
            FrontierEntry::new(format!("{}/ccivil_03/leis/L002.htm", server.uri()), 1),
            FrontierEntry::new(format!("{}/ccivil_03/leis/L003.htm", server.uri()), 1),
        ]
    );

    let second = Coordinator::new(config, false).unwrap().run().await.unwrap();
    assert_eq!(second.phase, CrawlPhase::Drained);
    assert_eq!(second.stats.visited, 3);
    assert_eq!(second.stats.archived, 3);

    assert_eq!(
        file_names(&output_dir(dir.path())),
        file_names(&output_dir(reference_dir.path()))
    );
}

#[tokio::test]
async fn test_corrupt_checkpoint_starts_from_seeds() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L001.htm"))
        .respond_with(html("<p>Lei 1</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(checkpoint_path(dir.path()), "{\"visited\": [\"trunc").unwrap();

    let config = create_test_config(
        dir.path(),
        vec![format!("{}/ccivil_03/leis/L001.htm", mock_server.uri())],
        1,
    );

    let report = Coordinator::new(config, false).unwrap().run().await.unwrap();
    assert_eq!(report.phase, CrawlPhase::Drained);
    assert_eq!(report.stats.archived, 1);

    // Replaced by a well-formed checkpoint
    let state = JsonCheckpointStore::new(checkpoint_path(dir.path()))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(state.visited.len(), 1);
}

#[tokio::test]
async fn test_interrupt_preserves_queue() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>never</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let seeds = vec![
        format!("{}/ccivil_03/leis/L001.htm", mock_server.uri()),
        format!("{}/ccivil_03/leis/L002.htm", mock_server.uri()),
    ];
    let config = create_test_config(dir.path(), seeds.clone(), 1);

    let (stop_tx, stop_rx) = watch::channel(false);
    stop_tx.send(true).unwrap();

    let report = Coordinator::new(config, false)
        .unwrap()
        .with_config_hash("cafe".to_string())
        .with_shutdown(stop_rx)
        .run()
        .await
        .unwrap();
    assert_eq!(report.phase, CrawlPhase::Interrupted);
    assert_eq!(report.stats.checkpoints_written, 1);

    let state = JsonCheckpointStore::new(checkpoint_path(dir.path()))
        .load()
        .unwrap()
        .unwrap();
    assert!(state.visited.is_empty());
    assert_eq!(
        state.queue,
        seeds
            .into_iter()
            .map(|url| FrontierEntry::new(url, 0))
            .collect::<Vec<_>>()
    );
    assert_eq!(state.config_hash.as_deref(), Some("cafe"));
}

#[tokio::test]
async fn test_periodic_checkpoints() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>Lei</p>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let seeds = (1..=5)
        .map(|n| format!("{}/ccivil_03/leis/L00{}.htm", mock_server.uri(), n))
        .collect();
    let mut config = create_test_config(dir.path(), seeds, 1);
    config.crawler.checkpoint_interval = 2;

    let report = Coordinator::new(config, true).unwrap().run().await.unwrap();

    // Two periodic saves (after entries 2 and 4) plus the final one
    assert_eq!(report.stats.checkpoints_written, 3);
    assert_eq!(report.stats.checkpoint_failures, 0);
}

#[tokio::test]
async fn test_container_extraction_for_selector_source() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/web/dou/secao1"))
        .respond_with(html(
            r#"<a href="/web/dou/-/portaria-n-1-2024">P1</a>
               <a href="/web/dou/-/resolucao-n-2-2024">R2</a>
               <a href="/web/dou/-/portaria-n-1-2024?utm_source=x">P1 again</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/web/dou/-/portaria-n-1-2024"))
        .respond_with(html(
            r#"<html><head><title>Portaria 1</title></head><body>
               <header>Imprensa Nacional</header>
               <div class="texto-dou"><p>Art. 1º Portaria.</p></div>
               </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/web/dou/-/resolucao-n-2-2024"))
        .respond_with(html("<html><body><p>Resolução sem container</p></body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(
        dir.path(),
        vec![format!("{}/web/dou/secao1", mock_server.uri())],
        1,
    );
    config.sources = vec![SourceEntry {
        name: "dou-local".to_string(),
        hosts: vec!["127.0.0.1".to_string()],
        path_markers: vec![],
        selectors: vec!["div.texto-dou".to_string(), "div#materia".to_string()],
        fallback_encoding: None,
        filename: FilenameStyle::LastSegment,
        content: ContentRuleEntry::Keyword {
            keywords: vec!["portaria".to_string(), "resolucao".to_string()],
            ignore: vec!["busca".to_string()],
        },
    }];

    let report = Coordinator::new(config, true).unwrap().run().await.unwrap();

    assert_eq!(report.stats.archived, 2);
    assert_eq!(report.stats.extraction_fallbacks, 1);
    assert_eq!(report.stats.navigation, 1);
    assert_eq!(report.stats.links_enqueued, 2);

    let out = output_dir(dir.path());
    let portaria = std::fs::read_to_string(out.join("portaria-n-1-2024.html")).unwrap();
    assert!(portaria.contains("<p>Art. 1º Portaria.</p>"));
    assert!(portaria.contains("<title>Portaria 1</title>"));
    assert!(!portaria.contains("Imprensa Nacional"));

    let resolucao = std::fs::read_to_string(out.join("resolucao-n-2-2024.html")).unwrap();
    assert!(resolucao.contains("Resolução sem container"));
}

#[tokio::test]
async fn test_legacy_encoding_written_as_utf8() {
    let mock_server = MockServer::start().await;

    // "Constituição" in windows-1252, mislabeled as latin-1
    let mut body = b"<html><body><p>Constitui".to_vec();
    body.extend_from_slice(&[0xe7, 0xe3]);
    body.extend_from_slice(b"o</p></body></html>");

    Mock::given(method("GET"))
        .and(path("/ccivil_03/constituicao/constituicao.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=iso-8859-1"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        dir.path(),
        vec![format!(
            "{}/ccivil_03/constituicao/constituicao.htm",
            mock_server.uri()
        )],
        0,
    );

    let report = Coordinator::new(config, true).unwrap().run().await.unwrap();
    assert_eq!(report.stats.archived, 1);

    let archived = std::fs::read_to_string(
        output_dir(dir.path()).join("constituicao_constituicao.html"),
    )
    .unwrap();
    assert!(archived.contains("Constituição"));
}

/// Runs L001 -> L002 -> L003 with a checkpoint after every entry, captures
/// the on-disk state while `crash_page` is being served, then resumes from
/// that capture. Returns the resumed run's archive count.
async fn resume_after_crash_during(crash_page: &str) -> u64 {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let snapshot = TempDir::new().unwrap();

    let pages = [
        ("/ccivil_03/leis/L001.htm", r#"<a href="L002.htm">L2</a>"#),
        ("/ccivil_03/leis/L002.htm", r#"<a href="L003.htm">L3</a>"#),
        ("/ccivil_03/leis/L003.htm", "<p>Lei 3</p>"),
    ];
    for (page_path, body) in pages {
        let mock = Mock::given(method("GET")).and(path(page_path));
        if page_path == crash_page {
            mock.respond_with(SnapshotWhileServing::new(body, dir.path(), snapshot.path()))
                .mount(&server)
                .await;
        } else {
            mock.respond_with(html(body)).mount(&server).await;
        }
    }

    let seeds = vec![format!("{}/ccivil_03/leis/L001.htm", server.uri())];
    let expected = vec!["leis_L001.html", "leis_L002.html", "leis_L003.html"];

    let mut config = create_test_config(dir.path(), seeds.clone(), 2);
    config.crawler.checkpoint_interval = 1;
    let uninterrupted = Coordinator::new(config, true).unwrap().run().await.unwrap();
    assert_eq!(uninterrupted.stats.archived, 3);
    assert_eq!(file_names(&output_dir(dir.path())), expected);

    let mut config = create_test_config(snapshot.path(), seeds, 2);
    config.crawler.checkpoint_interval = 1;
    let resumed = Coordinator::new(config, false).unwrap().run().await.unwrap();
    assert_eq!(resumed.phase, CrawlPhase::Drained);

    // Documents written before the crash plus those of the resumed run
    assert_eq!(file_names(&output_dir(snapshot.path())), expected);
    resumed.stats.archived
}

#[tokio::test]
async fn test_crash_during_first_fetch_resumes_from_seeds() {
    assert_eq!(resume_after_crash_during("/ccivil_03/leis/L001.htm").await, 3);
}

#[tokio::test]
async fn test_crash_mid_fetch_keeps_in_flight_page_queued() {
    assert_eq!(resume_after_crash_during("/ccivil_03/leis/L002.htm").await, 2);
}

#[tokio::test]
async fn test_crash_during_last_fetch_loses_nothing() {
    assert_eq!(resume_after_crash_during("/ccivil_03/leis/L003.htm").await, 1);
}

#[tokio::test]
async fn test_checkpoint_failure_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L001.htm"))
        .respond_with(html(r#"<a href="L002.htm">L2</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L002.htm"))
        .respond_with(html("<p>Lei 2</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    // A regular file where the checkpoint directory should be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let mut config = create_test_config(
        dir.path(),
        vec![format!("{}/ccivil_03/leis/L001.htm", mock_server.uri())],
        1,
    );
    config.output.checkpoint_path = blocker.join("estado.json").display().to_string();
    config.crawler.checkpoint_interval = 1;

    let report = Coordinator::new(config, true).unwrap().run().await.unwrap();

    assert_eq!(report.phase, CrawlPhase::Drained);
    assert_eq!(report.stats.archived, 2);
    assert_eq!(report.stats.checkpoints_written, 0);
    // One after each entry plus the final save
    assert_eq!(report.stats.checkpoint_failures, 3);
    assert_eq!(
        file_names(&output_dir(dir.path())),
        vec!["leis_L001.html", "leis_L002.html"]
    );
}

#[tokio::test]
async fn test_output_write_failure_is_counted_and_skipped() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L001.htm"))
        .respond_with(html(r#"<a href="L002.htm">L2</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ccivil_03/leis/L002.htm"))
        .respond_with(html("<p>Lei 2</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = output_dir(dir.path());
    // A directory occupies the first document's file name
    std::fs::create_dir_all(out.join("leis_L001.html")).unwrap();

    let config = create_test_config(
        dir.path(),
        vec![format!("{}/ccivil_03/leis/L001.htm", mock_server.uri())],
        1,
    );

    let report = Coordinator::new(config, true).unwrap().run().await.unwrap();

    assert_eq!(report.phase, CrawlPhase::Drained);
    assert_eq!(report.stats.persist_failures, 1);
    assert_eq!(report.stats.archived, 1);
    // Links of the unwritable page were still followed
    assert_eq!(report.stats.links_enqueued, 1);
    assert!(out.join("leis_L001.html").is_dir());
    assert!(out.join("leis_L002.html").is_file());
}
