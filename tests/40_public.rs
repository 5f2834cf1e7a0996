mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server(|_| {}).await?;

    let res = common::client().get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn ui_missing_is_plain_not_found() -> Result<()> {
    let server = common::spawn_server(|_| {}).await?;

    for path in ["/", "/library"] {
        let res = common::client().get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            res.text().await?,
            "Library UI not found (missing library/library.html)"
        );
    }
    Ok(())
}

#[tokio::test]
async fn ui_and_assets_are_served_when_present() -> Result<()> {
    let server = common::spawn_server(|_| {}).await?;
    let ui_dir = server.dir.path().join("ui");
    std::fs::create_dir_all(&ui_dir)?;
    std::fs::write(ui_dir.join("library.html"), "<h1>Library</h1>")?;
    std::fs::write(ui_dir.join("library.js"), "console.log('ok');")?;

    let res = common::client().get(server.url("/library")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await?, "<h1>Library</h1>");

    let res = common::client().get(server.url("/library.js")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await?, "console.log('ok');");
    Ok(())
}
