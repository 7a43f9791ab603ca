use std::io::{Cursor, Write};
use std::time::Duration;

use cot_ingestor::download::{
    DownloadError, DownloaderConfig, ReportSource, cftc::CftcDownloader,
};
use cot_ingestor::models::report::{ReportType, SubType, Variant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::{SimpleFileOptions, ZipWriter};

const DISAGG_FO: Variant = Variant::new(ReportType::Disaggregated, SubType::FuturesOnly);

fn fast_config(base_url: String) -> DownloaderConfig {
    DownloaderConfig {
        base_url,
        timeout: Duration::from_secs(5),
        retries: 3,
        backoff: Duration::from_millis(5),
        requests_per_second: 1000,
        ..Default::default()
    }
}

fn zipped(name: &str, body: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(name, SimpleFileOptions::default()).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn year_archive_is_unzipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/dea/history/fut_disagg_txt_2024.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zipped("f_year.txt", "a,b\n1,2\n")))
        .expect(1)
        .mount(&server)
        .await;

    let downloader = CftcDownloader::new(fast_config(server.uri())).unwrap();
    let text = downloader.fetch_year_archive(DISAGG_FO, 2024).await.unwrap();
    assert_eq!(text, "a,b\n1,2\n");
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dea/newcot/f_disagg.txt"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dea/newcot/f_disagg.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("row\n"))
        .expect(1)
        .mount(&server)
        .await;

    let downloader = CftcDownloader::new(fast_config(server.uri())).unwrap();
    let text = downloader.fetch_current_period(DISAGG_FO).await.unwrap();
    assert_eq!(text, "row\n");
}

#[tokio::test]
async fn gives_up_after_configured_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/dea/history/fut_disagg_txt_2021.zip"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let downloader = CftcDownloader::new(fast_config(server.uri())).unwrap();
    let err = downloader.fetch_year_archive(DISAGG_FO, 2021).await.unwrap_err();
    match err {
        DownloadError::Exhausted { attempts, source, .. } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, DownloadError::Status { status: 404, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn corrupt_archive_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/dea/history/fut_disagg_txt_2022.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"definitely not a zip".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let downloader = CftcDownloader::new(fast_config(server.uri())).unwrap();
    let err = downloader.fetch_year_archive(DISAGG_FO, 2022).await.unwrap_err();
    assert!(matches!(err, DownloadError::Archive { .. }));
}
