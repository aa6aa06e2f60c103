use assert_cmd::Command;
use predicates::prelude::*;

mod common;
use common::{write_pools, write_table, write_thermal_tiff};

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("thermalprep 0.1.0\n");
}

// Prepare subcommand tests

#[test]
fn prepare_prints_text_summary() {
    let temp = tempfile::tempdir().unwrap();
    write_pools(temp.path(), 7, 3);
    write_table(temp.path(), &["pos_000.png,1,1,2,2"]);

    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.arg("prepare").arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Prepared dataset in"))
        .stdout(predicate::str::contains("corpus: 10 image(s) (7 positive, 3 negative)"))
        .stdout(predicate::str::contains("split: train=7 | val=2 | test=1"));

    assert!(temp.path().join("data.yaml").is_file());
    assert!(temp.path().join("classes.txt").is_file());
}

#[test]
fn prepare_json_report() {
    let temp = tempfile::tempdir().unwrap();
    write_pools(temp.path(), 2, 2);
    write_table(temp.path(), &["missing.png,0,0,1,1"]);

    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.args(["prepare", "--report", "json", "--quiet"])
        .arg(temp.path());
    let output = cmd.assert().success().get_output().stdout.clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["rows_read"], 1);
    assert_eq!(report["boxes_written"], 0);
    assert_eq!(report["issues"][0]["code"], "image_not_found");
    assert_eq!(report["issues"][0]["severity"], "warning");
}

#[test]
fn prepare_honours_output_and_seed_options() {
    let temp = tempfile::tempdir().unwrap();
    let data = temp.path().join("data");
    let out = temp.path().join("out");
    write_pools(&data, 5, 5);
    write_table(&data, &[]);

    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.arg("prepare")
        .arg(&data)
        .arg("--output")
        .arg(&out)
        .args(["--manifest-name", "thermal.yaml", "--train-fraction", "0.5"]);
    cmd.env("THERMALPREP_SEED", "7");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("split: train=5 | val=3 | test=2"));

    assert!(out.join("thermal.yaml").is_file());
    assert!(out.join("images/train").is_dir());
    assert!(!data.join("images").exists());
}

#[test]
fn prepare_malformed_table_fails() {
    let temp = tempfile::tempdir().unwrap();
    write_pools(temp.path(), 1, 1);
    std::fs::write(
        temp.path().join("Bounding Box Label.csv"),
        "imageFilename,x,y,width,height\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.arg("prepare").arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing required column(s)"))
        .stderr(predicate::str::contains("x(column), y(row)"));
}

#[test]
fn prepare_missing_data_dir_fails() {
    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.args(["prepare", "nonexistent_data_dir"]);
    cmd.assert().failure();
}

#[test]
fn prepare_unsupported_report_format_fails() {
    let temp = tempfile::tempdir().unwrap();
    write_pools(temp.path(), 1, 1);
    write_table(temp.path(), &[]);

    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.args(["prepare", "--report", "xml"]).arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
    assert!(!temp.path().join("images").exists());
}

#[test]
fn prepare_rejects_unknown_box_policy() {
    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.args(["prepare", ".", "--box-policy", "shrink"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// Conversion subcommand tests

#[test]
fn convert_writes_png_next_to_tif() {
    let temp = tempfile::tempdir().unwrap();
    write_thermal_tiff(&temp.path().join("Positive/a.tif"), 6, 4);
    write_thermal_tiff(&temp.path().join("Negative/b.tif"), 6, 4);

    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.args(["convert", "--to", "png", "--keep-originals"])
        .arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Converted 2 image(s)"));

    assert!(temp.path().join("Positive/a.png").is_file());
    assert!(temp.path().join("Positive/a.tif").is_file());
    assert!(temp.path().join("Negative/b.png").is_file());
}

#[test]
fn rgb_rewrites_in_place() {
    let temp = tempfile::tempdir().unwrap();
    let frame = temp.path().join("images/train/frame.tif");
    write_thermal_tiff(&frame, 5, 5);

    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.arg("rgb").arg(temp.path().join("images"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Converted 1 image(s)"));

    let img = image::open(&frame).unwrap();
    assert_eq!(img.color(), image::ColorType::Rgb8);
}

#[test]
fn rgb_requires_a_directory() {
    let mut cmd = Command::cargo_bin("thermalprep").unwrap();
    cmd.arg("rgb");
    cmd.assert().failure();
}
