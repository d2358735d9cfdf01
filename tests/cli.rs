use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const PLACED: &str = r#"<Interchange>
    <Object>
        <ObjectIdentity>
            <Number>JB001</Number>
        </ObjectIdentity>
        <ObjectLocation elementtype="normal location">
            <Location>S1</Location>
        </ObjectLocation>
        <ObjectLocation elementtype="current location">
            <Location>S1</Location>
            <Date>
                <DateBegin>1.1.2020</DateBegin>
            </Date>
        </ObjectLocation>
    </Object>
</Interchange>
"#;

const TWO_CURRENTS: &str = r#"<Interchange>
    <Object>
        <ObjectIdentity>
            <Number>JB002</Number>
        </ObjectIdentity>
        <ObjectLocation elementtype="normal location">
            <Location>S1</Location>
        </ObjectLocation>
        <ObjectLocation elementtype="current location">
            <Location>S1</Location>
            <Date>
                <DateBegin>1.1.2020</DateBegin>
            </Date>
        </ObjectLocation>
        <ObjectLocation elementtype="current location">
            <Location>G1</Location>
            <Date>
                <DateBegin>1.1.2021</DateBegin>
            </Date>
        </ObjectLocation>
    </Object>
</Interchange>
"#;

fn modes_locations() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("modes-locations")
}

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).expect("fixture written");
    path.display().to_string()
}

#[test]
fn validate_exits_zero_for_a_clean_export() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = write(temp_dir.path(), "export.xml", PLACED);

    modes_locations()
        .args(["validate", "--input", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 object(s) checked, 0 failed"));
}

#[test]
fn validate_exits_non_zero_when_an_object_fails() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = write(temp_dir.path(), "export.xml", TWO_CURRENTS);

    modes_locations()
        .args(["validate", "--input", &input])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("E09 JB002"))
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn update_writes_nothing_when_a_directive_is_blank() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = write(temp_dir.path(), "export.xml", PLACED);
    let directives = write(temp_dir.path(), "moves.csv", "object,location\nJB001,\n");
    let output = temp_dir.path().join("updated.xml");

    modes_locations()
        .args(["update", "--input", &input, "--directives", &directives])
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no location"));

    assert!(!output.exists());
}

#[test]
fn update_records_the_move_and_exits_zero() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = write(temp_dir.path(), "export.xml", PLACED);
    let output = temp_dir.path().join("updated.xml");

    modes_locations()
        .args(["update", "--input", &input, "--ids", "JB001"])
        .args(["--location", "S12", "--date", "1.6.2023"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 updated"));

    let written = fs::read_to_string(&output).expect("output read");
    assert!(written.contains("<DateEnd>1.6.2023</DateEnd>"));
}
