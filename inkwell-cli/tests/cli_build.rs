use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_site(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(root.join("content"))?;
    fs::create_dir_all(root.join("templates"))?;
    fs::create_dir_all(root.join("assets"))?;

    fs::write(
        root.join("content/hello-world.md"),
        "---\ntitle: \"Hi\"\ndate: 2024-01-01\ndescription: test\n---\nBody **text**.",
    )?;
    fs::write(
        root.join("templates/layout.html"),
        "<html><head><title>{{title}}</title></head><body>{{content}}</body></html>",
    )?;
    fs::write(
        root.join("templates/home.html"),
        "<html><body><ul>{{postlist}}</ul></body></html>",
    )?;
    fs::write(root.join("assets/style.css"), "body { margin: 0; }")?;
    Ok(())
}

#[test]
fn build_renders_posts_home_and_assets() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    #[allow(deprecated)]
    Command::cargo_bin("inkwell")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success();

    let page = fs::read_to_string(dir.path().join("dist/hello-world.html"))?;
    assert!(page.contains("<title>Hi</title>"));
    assert!(page.contains("<strong>text</strong>"));

    let home = fs::read_to_string(dir.path().join("dist/index.html"))?;
    assert!(home.contains(r#"<a href="/hello-world.html">Hi</a>"#));

    assert_eq!(
        fs::read_to_string(dir.path().join("dist/assets/style.css"))?,
        "body { margin: 0; }"
    );
    Ok(())
}

#[test]
fn build_skips_files_without_header() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;
    fs::write(dir.path().join("content/broken.md"), "no header here")?;

    #[allow(deprecated)]
    Command::cargo_bin("inkwell")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success();

    assert!(dir.path().join("dist/hello-world.html").exists());
    assert!(!dir.path().join("dist/broken.html").exists());
    Ok(())
}

#[test]
fn build_fails_when_template_is_missing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;
    fs::remove_file(dir.path().join("templates/layout.html"))?;

    #[allow(deprecated)]
    Command::cargo_bin("inkwell")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("render stage"))
        .stderr(predicate::str::contains("layout.html"));
    Ok(())
}

#[test]
fn init_then_build() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let site = dir.path().join("blog");

    #[allow(deprecated)]
    Command::cargo_bin("inkwell")?
        .arg("init")
        .arg(&site)
        .assert()
        .success()
        .stdout(predicate::str::contains("inkwell initialized"));

    #[allow(deprecated)]
    Command::cargo_bin("inkwell")?
        .arg("--config")
        .arg(site.join("inkwell.yml"))
        .arg("build")
        .assert()
        .success();

    assert!(site.join("dist/index.html").exists());
    assert!(site.join("dist/hello-world.html").exists());
    Ok(())
}
