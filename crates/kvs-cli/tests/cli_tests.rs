use std::io::Cursor;
use std::path::Path;

use kvs_cli::{cli, run, Outcome};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const SCHEMA_YAML: &str = r"
name: signup
members:
  - { name: Name, kind: simple, mandatory: true }
  - { name: Age, kind: simple, type: integer }
  - { name: Tags, kind: value_collection }
  - name: Address
    kind: class
    flag: { key: HasAddress }
    members:
      - { name: Street, kind: simple, mandatory: true }
";

struct Output {
    outcome: anyhow::Result<Outcome>,
    stdout: String,
    stderr: String,
}

fn write_schema(dir: &Path) -> String {
    let path = dir.join("signup.yaml");
    std::fs::write(&path, SCHEMA_YAML).unwrap();
    path.display().to_string()
}

fn invoke(args: &[&str], stdin: &str) -> Output {
    let matches = cli().try_get_matches_from(args).unwrap();
    let mut input = Cursor::new(stdin.as_bytes().to_vec());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let outcome = run(&matches, &mut input, &mut stdout, &mut stderr);
    Output {
        outcome,
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
    }
}

#[test]
fn test_decode_query_argument() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());

    let output = invoke(
        &["kvs", "decode", "--schema", &schema, "Name=Ann&Age=41&Tags=a,b"],
        "",
    );

    assert_eq!(output.outcome.unwrap(), Outcome::Success);
    let value: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(value, json!({"Name": "Ann", "Age": 41, "Tags": ["a", "b"]}));
}

#[test]
fn test_decode_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());

    let output = invoke(&["kvs", "decode", "--schema", &schema, "--pretty"], "Name=Bo\n");

    assert_eq!(output.outcome.unwrap(), Outcome::Success);
    let value: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(value, json!({"Name": "Bo"}));
    assert!(output.stdout.contains('\n'));
}

#[test]
fn test_decode_report_goes_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());

    let output = invoke(
        &[
            "kvs",
            "decode",
            "--schema",
            &schema,
            "--report",
            "Name=Ann&Age=old",
        ],
        "",
    );

    assert_eq!(output.outcome.unwrap(), Outcome::Success);
    let value: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(value, json!({"Name": "Ann"}));
    assert!(output.stderr.starts_with("warning: "));
    assert!(output.stderr.contains("Age"));
}

#[test]
fn test_decode_missing_mandatory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());

    let output = invoke(&["kvs", "decode", "--schema", &schema, "Age=41"], "");

    let err = output.outcome.unwrap_err();
    assert!(format!("{err:#}").contains("mandatory value missing: Name"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_decode_without_data_reports_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("paging.json");
    std::fs::write(
        &path,
        r#"{"name": "paging", "members": [{"name": "Page", "kind": "simple", "type": "integer"}]}"#,
    )
    .unwrap();

    let output = invoke(
        &["kvs", "decode", "--schema", &path.display().to_string(), ""],
        "",
    );

    let outcome = output.outcome.unwrap();
    assert_eq!(outcome, Outcome::NoData);
    assert_eq!(outcome.exit_code(), 2);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_encode_query_and_lines() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());
    let input = r#"{"Name": "Ann Lee", "Address": {"Street": "1 Main St"}}"#;

    let output = invoke(&["kvs", "encode", "--schema", &schema], input);
    assert_eq!(output.outcome.unwrap(), Outcome::Success);
    assert_eq!(
        output.stdout,
        "Name=Ann+Lee&Address.Street=1+Main+St&HasAddress=true\n"
    );

    let output = invoke(&["kvs", "encode", "--schema", &schema, "--lines"], input);
    assert_eq!(output.outcome.unwrap(), Outcome::Success);
    assert_eq!(
        output.stdout,
        "Name=Ann Lee\nAddress.Street=1 Main St\nHasAddress=true\n"
    );
}

#[test]
fn test_encode_reads_file_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());
    let config = dir.path().join("kvs.yaml");
    std::fs::write(&config, "naming:\n  prefix: form\n").unwrap();
    let data = dir.path().join("data.json");
    std::fs::write(&data, r#"{"Name": "Ann", "Tags": ["x", "y"]}"#).unwrap();

    let output = invoke(
        &[
            "kvs",
            "encode",
            "--schema",
            &schema,
            "--config",
            &config.display().to_string(),
            &data.display().to_string(),
        ],
        "",
    );

    assert_eq!(output.outcome.unwrap(), Outcome::Success);
    assert_eq!(output.stdout, "form.Name=Ann&form.Tags=x%2Cy\n");
}

#[test]
fn test_encode_rejects_non_object_input() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());

    let output = invoke(&["kvs", "encode", "--schema", &schema], "[1, 2]");
    let err = output.outcome.unwrap_err();
    assert!(err.to_string().contains("must be an object"));
}

#[test]
fn test_check_lists_keys() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_schema(dir.path());

    let output = invoke(&["kvs", "check", "--schema", &schema], "");

    assert_eq!(output.outcome.unwrap(), Outcome::Success);
    let lines: Vec<&str> = output.stdout.lines().collect();
    assert_eq!(lines[0], "Name\tsimple\tmandatory");
    assert_eq!(lines[1], "Age\tsimple");
    assert!(lines.iter().any(|line| line.starts_with("Address\tclass")
        && line.ends_with("flag=HasAddress")));
    assert!(lines.contains(&"Address.Street\tsimple\tmandatory"));
}

#[test]
fn test_check_lists_collection_item_members() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("owner.yaml");
    std::fs::write(
        &path,
        r"
name: owner
members:
  - name: Pets
    kind: class_collection
    members:
      - { name: Name, kind: simple, mandatory: true }
      - { name: Age, kind: simple, type: integer }
",
    )
    .unwrap();

    let output = invoke(&["kvs", "check", "--schema", &path.display().to_string()], "");

    assert_eq!(output.outcome.unwrap(), Outcome::Success);
    assert_eq!(
        output.stdout,
        "Pets\tclass_collection\nPets[0].Name\tsimple\tmandatory\nPets[0].Age\tsimple\n"
    );
}

#[test]
fn test_missing_schema_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");

    let output = invoke(
        &["kvs", "check", "--schema", &missing.display().to_string()],
        "",
    );
    let err = output.outcome.unwrap_err();
    assert!(format!("{err:#}").contains("loading schema"));
}

#[test]
fn test_schema_argument_is_required() {
    assert!(cli().try_get_matches_from(["kvs", "decode"]).is_err());
}
