use plugin_sorter::config::Config;
use plugin_sorter::error::PluginError;
use plugin_sorter::placer::{Conflict, NeverOverwrite, PlacementKind, RepositoryPlacer};
use plugin_sorter::record::PluginRecord;
use plugin_sorter::report::scan_repository;
use plugin_sorter::sort::Sorter;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> anyhow::Result<()> {
    use std::io::Write;
    use zip::write::FileOptions;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(content)?;
    }
    zip.finish()?;
    Ok(())
}

fn plugin_jar(path: &Path, name: &str, version: &str, class_body: &[u8]) -> anyhow::Result<()> {
    let yml = format!("name: {name}\nversion: '{version}'\nmain: com.example.Main\n");
    write_jar(
        path,
        &[
            ("plugin.yml", yml.as_bytes()),
            ("com/example/Main.class", class_body),
        ],
    )
}

fn setup() -> anyhow::Result<(tempfile::TempDir, Config)> {
    let dir = tempfile::tempdir()?;
    let config = Config::new(dir.path())?;
    std::fs::create_dir_all(&config.staging_dir)?;
    Ok((dir, config))
}

#[test]
fn sort_round_trip_and_idempotent_rerun() -> anyhow::Result<()> {
    let (_dir, config) = setup()?;
    let staged = config.staging_dir.join("Foo-1.0.jar");
    plugin_jar(&staged, "Foo", "1.0", b"\x00")?;
    let original = std::fs::read(&staged)?;

    let sorter = Sorter::new(config.clone());
    let first = sorter.run(&mut NeverOverwrite)?;
    assert_eq!(first.placed, 1);

    let placed = config.repository_dir.join("Foo").join("1.0").join("foo.jar");
    assert_eq!(std::fs::read(&placed)?, original);
    assert!(!staged.exists());
    let files: Vec<_> = std::fs::read_dir(placed.parent().unwrap())?.collect();
    assert_eq!(files.len(), 1);

    std::fs::write(&staged, &original)?;
    let mut prompts = 0;
    let mut resolver = |_: &Conflict<'_>| {
        prompts += 1;
        true
    };
    let second = sorter.run(&mut resolver)?;
    assert_eq!(second.already_present, 1);
    assert_eq!(second.placed + second.overwritten + second.skipped, 0);
    assert!(second.is_clean());
    assert_eq!(prompts, 0);
    assert!(!staged.exists());
    Ok(())
}

#[test]
fn conflict_is_escalated_once_and_honoured() -> anyhow::Result<()> {
    let (_dir, config) = setup()?;
    let placer = RepositoryPlacer::new(config.repository_dir.clone());

    let old = config.staging_dir.join("old.jar");
    plugin_jar(&old, "Foo", "1.0", b"old bytes")?;
    let dest = placer.place(&PluginRecord::open(&old)?, &mut NeverOverwrite)?.destination;
    let existing = std::fs::read(&dest)?;

    let new = config.staging_dir.join("new.jar");
    plugin_jar(&new, "Foo", "1.0", b"new bytes")?;
    let incoming = std::fs::read(&new)?;

    let mut asked = 0;
    let mut decline = |_: &Conflict<'_>| {
        asked += 1;
        false
    };
    let outcome = placer.place(&PluginRecord::open(&new)?, &mut decline)?;
    assert_eq!(outcome.kind, PlacementKind::Skipped);
    assert_eq!(asked, 1);
    assert_eq!(std::fs::read(&dest)?, existing);
    assert!(new.exists());

    let mut asked = 0;
    let mut accept = |_: &Conflict<'_>| {
        asked += 1;
        true
    };
    let outcome = placer.place(&PluginRecord::open(&new)?, &mut accept)?;
    assert_eq!(outcome.kind, PlacementKind::Overwritten);
    assert_eq!(asked, 1);
    assert_eq!(std::fs::read(&dest)?, incoming);
    assert!(!new.exists());
    Ok(())
}

#[test]
fn version_separator_yields_single_segment() -> anyhow::Result<()> {
    let (_dir, config) = setup()?;
    plugin_jar(&config.staging_dir.join("a.jar"), "Foo", "1.2/beta", b"")?;

    Sorter::new(config.clone()).run(&mut NeverOverwrite)?;
    let foo = config.repository_dir.join("Foo");
    let versions: Vec<String> = std::fs::read_dir(&foo)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(versions, vec!["1.2_beta".to_string()]);
    assert!(foo.join("1.2_beta").join("foo.jar").is_file());
    Ok(())
}

#[test]
fn traversal_values_never_write_outside_repository() -> anyhow::Result<()> {
    for (name, version) in [("../../etc", "1.0"), ("Foo", "../../etc")] {
        let (dir, config) = setup()?;
        let staged = config.staging_dir.join("evil.jar");
        plugin_jar(&staged, name, version, b"")?;

        let err = Sorter::new(config.clone())
            .run(&mut NeverOverwrite)
            .unwrap_err();
        assert!(matches!(err, PluginError::PathTraversal { .. }));
        assert!(staged.exists());
        assert!(!dir.path().join("etc").exists());
        assert!(!config.repository_dir.join("Foo").exists());
    }
    Ok(())
}

#[test]
fn concurrent_report_is_complete_for_any_pool_size() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let n = 12;
    let mut expected = Vec::new();
    for i in 0..n {
        let name = format!("Plugin{i}");
        let body = format!("\x01net/minecraft/server/v1_{i}_R1/Entity\x02");
        let path = dir.path().join(&name).join("1.0").join(format!("plugin{i}.jar"));
        plugin_jar(&path, &name, "1.0", body.as_bytes())?;
        expected.push(name);
    }
    expected.sort();

    for workers in [1, 4, n + 10] {
        let mut names: Vec<String> = scan_repository(dir.path(), workers)?
            .map(|entry| entry.outcome.map(|line| line.name))
            .collect::<Result<_, _>>()?;
        names.sort();
        assert_eq!(names, expected, "workers = {workers}");
    }
    Ok(())
}

fn run(bin: &str, args: &[&str]) -> anyhow::Result<std::process::Output> {
    Ok(Command::new(bin).args(args).env_remove("RUST_LOG").output()?)
}

#[test]
fn binary_sort_then_report_json() -> anyhow::Result<()> {
    let (dir, config) = setup()?;
    let root = dir.path().to_string_lossy().into_owned();
    plugin_jar(
        &config.staging_dir.join("nms.jar"),
        "Nms",
        "2.0",
        b"\xca\xfe\xba\xbe\x01\x00\x1aorg/bukkit/craftbukkit/v1_16_R3/CraftServer",
    )?;
    std::fs::create_dir_all(config.repository_dir.join("Broken"))?;
    std::fs::write(config.repository_dir.join("Broken").join("broken.jar"), b"junk")?;

    let bin = env!("CARGO_BIN_EXE_plugin-sorter");
    let sort = run(bin, &["--root", &root, "sort", "--on-conflict", "skip"])?;
    assert!(
        sort.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&sort.stderr)
    );
    assert!(String::from_utf8_lossy(&sort.stdout).contains("placed: 1"));

    let report = run(bin, &["--root", &root, "report", "--format", "json", "-j", "3"])?;
    assert!(!report.status.success(), "broken jar must fail the exit code");

    let mut lines: Vec<Value> = String::from_utf8(report.stdout)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    lines.sort_by_key(|v| v["path"].as_str().unwrap_or_default().to_string());
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["error"], Value::String("archive".to_string()));
    assert_eq!(lines[1]["name"], Value::String("Nms".to_string()));
    assert_eq!(lines[1]["nms_versions"], serde_json::json!(["1_16_R3"]));

    let text = run(bin, &["--root", &root, "report", "--path", "plugins/Nms"])?;
    assert!(text.status.success());
    assert_eq!(
        String::from_utf8(text.stdout)?.trim(),
        "Nms v2.0 requires platform versions: 1_16_R3"
    );
    Ok(())
}
