use crate::*;
use blobnav::error::{ErrorKind, Result};

pub fn tests(ctx: &TestContext, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        ctx,
        test_list_empty_prefix,
        test_list_immediate_children_only,
        test_list_excludes_listed_directory,
        test_list_directory_entries_have_no_size,
        test_list_container_root,
        test_list_requires_connection
    ));
}

pub async fn test_list_empty_prefix(ctx: TestContext) -> Result<()> {
    let dir_path = TEST_FIXTURE.new_dir_path();

    let entries = ctx.client.list(&dir_path).await?;
    assert!(entries.is_empty(), "unexpected entries: {entries:?}");

    Ok(())
}

pub async fn test_list_immediate_children_only(ctx: TestContext) -> Result<()> {
    let dir_path = TEST_FIXTURE.new_dir_path();
    ctx.write(&format!("{dir_path}a.txt"), "a").await?;
    ctx.write(&format!("{dir_path}b.csv"), "b,c").await?;
    ctx.write(&format!("{dir_path}nested/deep/c.txt"), "c").await?;

    let mut entries = ctx.client.list(&dir_path).await?;
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();

    assert_eq!(
        paths,
        vec![
            format!("{dir_path}a.txt"),
            format!("{dir_path}b.csv"),
            format!("{dir_path}nested/"),
        ]
    );
    assert!(entries[2].is_directory);
    assert_eq!(entries[2].name, "nested");
    assert_eq!(entries[0].name, "a.txt");

    Ok(())
}

pub async fn test_list_excludes_listed_directory(ctx: TestContext) -> Result<()> {
    let dir_path = TEST_FIXTURE.new_dir_path();
    ctx.write(&format!("{dir_path}only.txt"), "x").await?;

    let entries = ctx.client.list(&dir_path).await?;
    assert!(entries.iter().all(|e| e.path != dir_path));
    assert_eq!(entries.len(), 1);

    Ok(())
}

pub async fn test_list_directory_entries_have_no_size(ctx: TestContext) -> Result<()> {
    let dir_path = TEST_FIXTURE.new_dir_path();
    let (content, size) = TEST_FIXTURE.new_content();
    ctx.write(&format!("{dir_path}data.bin"), content).await?;
    ctx.write(&format!("{dir_path}sub/x.bin"), "x").await?;

    let entries = ctx.client.list(&dir_path).await?;
    for entry in entries {
        if entry.is_directory {
            assert_eq!(entry.size, None);
        } else {
            assert_eq!(entry.size, Some(size as u64));
        }
    }

    Ok(())
}

pub async fn test_list_container_root(ctx: TestContext) -> Result<()> {
    let dir_path = TEST_FIXTURE.new_dir_path();
    ctx.write(&format!("{dir_path}root-visible.txt"), "x").await?;

    let entries = ctx.client.list("").await?;
    assert!(
        entries.iter().any(|e| e.path == dir_path && e.is_directory),
        "{dir_path} missing from root listing"
    );
    assert!(entries.iter().all(|e| !e.path.is_empty() && e.path != "/"));

    Ok(())
}

pub async fn test_list_requires_connection(_ctx: TestContext) -> Result<()> {
    let browser = blobnav::browser::Browser::new(std::sync::Arc::default())?;
    let err = browser.listing(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    Ok(())
}
