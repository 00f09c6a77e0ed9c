//! End-to-end batch runs against a mock resource site

mod common;

use common::*;
use media_harvester::{
    Capabilities, DownloadOutcome, Event, IdRange, MediaKind, ResourceId, render_report,
    write_report,
};
use wiremock::MockServer;

#[tokio::test]
async fn test_descending_range_with_every_outcome() {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // 103: page fine, download cut short
    let cut_url = truncating_media_server(1_000, 500).await;
    mount_page(&site, 103, video_page("Broken stream", &cut_url)).await;
    // 102: video and image
    mount_page(
        &site,
        102,
        video_and_image_page(
            "机械制图: 第1讲",
            &format!("{}/media/102.mp4", site.uri()),
            &format!("{}/media/102.jpeg?x=1", site.uri()),
        ),
    )
    .await;
    mount_media(&site, "/media/102.mp4", media_body(200_000), 1).await;
    mount_media(&site, "/media/102.jpeg", media_body(3_000), 1).await;
    // 101: no media
    mount_page(&site, 101, empty_page("Answers")).await;
    // 100: page missing
    mount_page_status(&site, 100, 404).await;

    let (mut harvester, mut rx) = create_harvester(test_config(&site, dir.path()));
    let stats = harvester.run_range(IdRange::new(103, 100).unwrap()).await;
    assert_eq!(stats.attempted, 4);

    let state = harvester.state();
    assert_eq!(
        state.successes().iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![ResourceId(102)]
    );
    assert_eq!(state.no_media(), &[ResourceId(101)]);
    assert_eq!(state.failed(), &[ResourceId(103), ResourceId(100)]);

    // Reserved ':' is sanitized away, image extension comes from the URL path
    assert_file_len(&dir.path().join("102_机械制图_ 第1讲.mp4"), 200_000);
    assert_file_len(&dir.path().join("102_机械制图_ 第1讲.jpeg"), 3_000);
    assert!(files_with_suffix(dir.path(), ".mp4").iter().all(|f| f.starts_with("102_")));
    assert!(files_with_suffix(dir.path(), ".tmp").is_empty());

    let events = collect_events(&mut rx);
    assert_eq!(
        events.first(),
        Some(&Event::RunStarted {
            start: ResourceId(103),
            end: ResourceId(100),
            total: 4,
        })
    );
    assert_eq!(classified(&events, "failed"), vec![ResourceId(103), ResourceId(100)]);

    let report = render_report(state);
    assert!(report.contains("ID 102: 机械制图_ 第1讲\n"));
    assert!(report.contains("No media: 1\n101\n"));
    assert!(report.contains("Failed: 2\n103, 100\n"));

    site.verify().await;
}

#[tokio::test]
async fn test_rerun_makes_no_media_requests() {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    for id in [21u64, 20] {
        mount_page(
            &site,
            id,
            video_page(&format!("Lesson {id}"), &format!("{}/media/{id}.mp4", site.uri())),
        )
        .await;
        mount_media(&site, &format!("/media/{id}.mp4"), media_body(10_000), 1).await;
    }
    let range = IdRange::new(21, 20).unwrap();

    let (mut first, _rx) = create_harvester(test_config(&site, dir.path()));
    first.run_range(range).await;
    assert_eq!(first.state().successes().len(), 2);

    let (mut second, mut rx) = create_harvester(test_config(&site, dir.path()));
    second.run_range(range).await;
    assert_eq!(second.state().successes().len(), 2);
    assert!(
        second
            .state()
            .successes()
            .iter()
            .all(|s| s.media.iter().all(|m| m.reused_existing))
    );

    let events = collect_events(&mut rx);
    assert_eq!(
        count_events(&events, |e| matches!(e, Event::AlreadyExists { .. })),
        2
    );
    assert_eq!(
        count_events(&events, |e| matches!(e, Event::DownloadStarted { .. })),
        0
    );

    // Each media mock expects exactly one request across both runs
    site.verify().await;
}

#[tokio::test]
async fn test_retry_pass_shrinks_failure_list() {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // The truncating server accepts one connection; the retry is refused
    let cut_url = truncating_media_server(4_096, 100).await;
    mount_page(&site, 42, video_page("Flaky", &cut_url)).await;
    mount_page_status(&site, 41, 500).await;
    mount_page(
        &site,
        40,
        script_video_page("Scripted player", &format!("{}/media/40.mp4", site.uri())),
    )
    .await;
    mount_media(&site, "/media/40.mp4", media_body(5_000), 1).await;

    let (mut harvester, mut rx) = create_harvester(test_config(&site, dir.path()));
    harvester.run_range(IdRange::new(42, 40).unwrap()).await;
    let before = harvester.state().failed().to_vec();
    assert_eq!(before, vec![ResourceId(42), ResourceId(41)]);
    assert!(!dir.path().join("42_Flaky.mp4").exists());
    assert_file_len(&dir.path().join("40_Scripted player.mp4"), 5_000);

    let retry = harvester.retry_failed().await;
    assert_eq!(retry.attempted, 2);
    assert_eq!(retry.recovered, 0);

    let after = harvester.state().failed();
    assert!(after.iter().all(|id| before.contains(id)));
    assert_eq!(after, before.as_slice());
    assert_eq!(harvester.state().total(), 3);

    let events = collect_events(&mut rx);
    assert!(events.contains(&Event::RetryFinished {
        recovered: 0,
        still_failing: 2,
    }));

    let report_path = dir.path().join("reports").join("run.txt");
    write_report(harvester.state(), &report_path).await.unwrap();
    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("Failed: 2\n42, 41\n"));
}

#[tokio::test]
async fn test_image_only_run_ignores_videos() {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &site,
        7,
        video_and_image_page(
            "Cross section",
            &format!("{}/media/7.mp4", site.uri()),
            &format!("{}/media/7.gif", site.uri()),
        ),
    )
    .await;
    mount_media(&site, "/media/7.mp4", media_body(1_000), 0).await;
    mount_media(&site, "/media/7.gif", media_body(600), 1).await;

    let mut config = test_config(&site, dir.path());
    config.capabilities = Capabilities::image_only();
    let (harvester, _rx) = create_harvester(config);

    let DownloadOutcome::Success(record) = harvester.process_id(ResourceId(7)).await else {
        panic!("expected success");
    };
    assert_eq!(record.media.len(), 1);
    assert_eq!(record.media[0].kind, MediaKind::Image);
    assert!(record.missing.is_empty());
    assert_file_len(&dir.path().join("7_Cross section.gif"), 600);

    site.verify().await;
}

#[tokio::test]
async fn test_video_only_run_treats_image_pages_as_empty() {
    let site = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_page(
        &site,
        3,
        format!(
            r#"<html><body><p>资源名称：Diagram</p><img id="image" src="{}/media/3.png"></body></html>"#,
            site.uri()
        ),
    )
    .await;

    let mut config = test_config(&site, dir.path());
    config.capabilities = Capabilities::video_only();
    let (harvester, _rx) = create_harvester(config);

    assert_eq!(
        harvester.process_id(ResourceId(3)).await,
        DownloadOutcome::NoMedia { id: ResourceId(3) }
    );
}
