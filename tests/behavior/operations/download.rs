use crate::*;
use blobnav::error::{ErrorKind, Result};

pub fn tests(ctx: &TestContext, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        ctx,
        test_download_returns_content,
        test_download_missing_is_not_found,
        test_download_directory_is_rejected,
        test_download_action_names_the_file,
        test_download_action_outside_root_is_rejected
    ));
}

pub async fn test_download_returns_content(ctx: TestContext) -> Result<()> {
    let path = TEST_FIXTURE.new_file_path();
    let (content, size) = TEST_FIXTURE.new_content();
    ctx.write(&path, content.clone()).await?;

    let data = ctx.client.download(&path).await?;
    assert_eq!(data.len(), size);
    assert_eq!(data.to_vec(), content);

    Ok(())
}

pub async fn test_download_missing_is_not_found(ctx: TestContext) -> Result<()> {
    let path = TEST_FIXTURE.new_file_path();

    let err = ctx.client.download(&path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains(&path));

    Ok(())
}

pub async fn test_download_directory_is_rejected(ctx: TestContext) -> Result<()> {
    let dir_path = TEST_FIXTURE.new_dir_path();
    ctx.write(&format!("{dir_path}inner.txt"), "x").await?;

    let err = ctx.client.download(&dir_path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    Ok(())
}

pub async fn test_download_action_names_the_file(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    let path = format!("{root}reports/summary.csv");
    ctx.write(&path, "pig,weight\n1,120\n").await?;

    let browser = ctx.connected_browser(&root).await?;
    let download = browser.download_action(&path).await?;

    assert_eq!(download.file_name, "summary.csv");
    assert!(!download.content_type.is_empty());
    assert_eq!(download.data.as_ref(), b"pig,weight\n1,120\n");

    let err = browser
        .download_action(&format!("{root}reports/"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    Ok(())
}

pub async fn test_download_action_outside_root_is_rejected(ctx: TestContext) -> Result<()> {
    let root = TEST_FIXTURE.new_dir_path();
    let outside = TEST_FIXTURE.new_file_path();
    ctx.write(&outside, "secret").await?;

    let browser = ctx.connected_browser(&root).await?;
    let err = browser.download_action(&outside).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = browser
        .download_action(&format!("{root}../{outside}"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    Ok(())
}
