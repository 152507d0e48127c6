use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

// Ground plane under the character at the origin, a board slab on the
// screen centre line and Snorlax off to the right of it.
const SCENE: &str = r#"<scene>
  <object>
    <name>ground_collider</name>
    <object>
      <name>Plane</name>
      <mesh>plane</mesh>
      <scale>80 1 80</scale>
    </object>
  </object>
  <object>
    <name>character</name>
    <object>
      <name>Body</name>
      <mesh>cube</mesh>
      <position>0 0.5 0</position>
      <scale>0.5 0.5 0.5</scale>
    </object>
  </object>
  <object>
    <name>board</name>
    <position>0 10 0</position>
    <object>
      <name>Cube.010</name>
      <mesh>cube</mesh>
      <scale>8 0.2 8</scale>
    </object>
  </object>
  <object>
    <name>Snorlax</name>
    <mesh>cube</mesh>
    <position>10 10 -10</position>
    <scale>4 0.2 4</scale>
  </object>
</scene>
"#;

const CONFIG: &str = r#"
[panels.board]
title = "Web Dev"
description = "Point of sale system for a garage"
"#;

fn write_fixture(dir: &Path, scene: &str) -> PathBuf {
    let path = dir.join("scene.xml");
    fs::write(&path, scene).expect("write scene");
    fs::write(dir.join("world.toml"), CONFIG).expect("write config");
    path
}

#[test]
fn cli_runs_script_and_prints_final_state() {
    let dir = TempDir::new().expect("temp dir");
    let scene = write_fixture(dir.path(), SCENE);
    let script = dir.path().join("input.txt");
    fs::write(
        &script,
        "\
pointer 640 360
click
tick
# overlay is open, this click is swallowed
pointer 844 360
click
tick
close
tick
click
tick
press up
tick 3
release up
tick 40
",
    )
    .expect("write script");

    let mut cmd = Command::cargo_bin("garden-explorer").expect("binary exists");
    cmd.arg(&scene)
        .arg("--config")
        .arg(dir.path().join("world.toml"))
        .arg("--script")
        .arg(&script)
        .arg("--ticks")
        .arg("5");
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 7 nodes (2 collider triangles, 3 interactables)"))
        .stdout(contains("Character: character"))
        .stdout(contains("Intent: info panel board \"Web Dev\""))
        .stdout(contains("Intent: reactive animation Snorlax (0.75s)"))
        .stdout(contains("Final character state:"))
        .stdout(contains("grounded=true moving=false"))
        .stdout(contains("overlay open: false"));
}

#[test]
fn cli_reports_world_without_character() {
    let dir = TempDir::new().expect("temp dir");
    let scene = write_fixture(
        dir.path(),
        "<scene><object><name>statue</name><mesh>cube</mesh></object></scene>",
    );

    let mut cmd = Command::cargo_bin("garden-explorer").expect("binary exists");
    cmd.arg(&scene).arg("--ticks").arg("2");
    cmd.assert()
        .success()
        .stdout(contains("No character node found"))
        .stdout(contains("not loaded"));
}

#[test]
fn cli_fails_on_missing_scene() {
    let dir = TempDir::new().expect("temp dir");
    let mut cmd = Command::cargo_bin("garden-explorer").expect("binary exists");
    cmd.arg(dir.path().join("missing.xml"));
    cmd.assert()
        .failure()
        .stderr(contains("failed to load scene"));
}

#[test]
fn cli_rejects_unknown_script_commands() {
    let dir = TempDir::new().expect("temp dir");
    let scene = write_fixture(dir.path(), SCENE);
    let script = dir.path().join("input.txt");
    fs::write(&script, "press up\nteleport 0 0\n").expect("write script");

    let mut cmd = Command::cargo_bin("garden-explorer").expect("binary exists");
    cmd.arg(&scene).arg("--script").arg(&script);
    cmd.assert()
        .failure()
        .stderr(contains("script line 2"))
        .stderr(contains("unknown command"));
}
