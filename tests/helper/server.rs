//! Mock release server test utilities

use std::io::{Cursor, Write};

use mockito::{Mock, ServerGuard};
use tempfile::TempDir;
use tokio::net::TcpListener;

use schema_updater::config::SchemaConfig;
use schema_updater::schema::SchemaType;

/// Path of the releases listing on the mock server
pub const RELEASES_PATH: &str = "/repos/crackingshells/Hatch-Schemas/releases";

/// Config pointing every remote URL at `server` and the cache into `temp_dir`
pub fn test_config(temp_dir: &TempDir, server: &ServerGuard) -> SchemaConfig {
    SchemaConfig {
        cache_dir: temp_dir.path().join("schemas"),
        api_base_url: format!("{}/repos/crackingshells/Hatch-Schemas", server.url()),
        releases_base_url: server.url(),
        manifest_url: Some(format!("{}/latest.json", server.url())),
        metadata_timeout_secs: 5,
        download_timeout_secs: 5,
        ..SchemaConfig::default()
    }
}

/// JSON body of a releases listing, newest first
pub fn releases_body(tags: &[&str]) -> String {
    let releases: Vec<_> = tags
        .iter()
        .map(|tag| {
            serde_json::json!({
                "tag_name": tag,
                "html_url": format!("https://github.com/crackingshells/Hatch-Schemas/releases/tag/{tag}"),
            })
        })
        .collect();
    serde_json::Value::Array(releases).to_string()
}

/// Mocks the releases listing endpoint
pub async fn mock_releases(server: &mut ServerGuard, tags: &[&str]) -> Mock {
    server
        .mock("GET", RELEASES_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(releases_body(tags))
        .create_async()
        .await
}

/// Mocks the direct download of one schema file
pub async fn mock_schema_file(
    server: &mut ServerGuard,
    schema_type: SchemaType,
    version: &str,
    body: &str,
) -> Mock {
    let path = format!(
        "/{}/{}",
        schema_type.release_tag(version),
        schema_type.filename()
    );
    server
        .mock("GET", path.as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

/// Zip archive with a single wrapper directory holding `files`
pub fn wrapped_zip(wrapper: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer.add_directory(format!("{wrapper}/"), options).unwrap();
    for (name, content) in files {
        writer
            .start_file(format!("{wrapper}/{name}"), options)
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Starts a server that accepts connections and never answers them.
///
/// Returns its base URL. Accepted sockets are held open until the test ends.
pub async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    format!("http://{addr}")
}
