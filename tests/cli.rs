mod common;

use assert_cmd::Command;
use common::{TestWorkspace, unquoted_lines};
use predicates::str::contains;
use serde_json::Value;

fn csv_unify() -> Command {
    Command::cargo_bin("csv-unify").expect("binary exists")
}

#[test]
fn merge_two_files_into_output_file() {
    let workspace = TestWorkspace::new();
    let first = workspace.write("first.csv", "ID,Name\n1,A\n2,B\n");
    let second = workspace.write("second.csv", "ID,Name,Score\n1,,Y\n3,C,Z\n");
    let output = workspace.path().join("merged.csv");

    csv_unify()
        .args(["merge", "-i"])
        .arg(&first)
        .arg("-i")
        .arg(&second)
        .args(["-k", "ID", "-o"])
        .arg(&output)
        .assert()
        .success();

    let contents = workspace.read("merged.csv");
    assert!(contents.starts_with("\"ID\",\"Name\",\"Score\""));
    assert_eq!(
        unquoted_lines(&contents),
        vec!["ID,Name,Score", "1,A,Y", "2,B,", "3,C,Z"]
    );
}

#[test]
fn merge_writes_to_stdout_without_output_path() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("only.csv", "Name,ID\nAna,1\n");

    csv_unify()
        .args(["merge", "-i"])
        .arg(&input)
        .args(["--key", "id"])
        .assert()
        .success()
        .stdout(contains("\"id\",\"Name\""))
        .stdout(contains("\"1\",\"Ana\""));
}

#[test]
fn merge_walks_folders_in_name_order_and_skips_its_own_output() {
    let workspace = TestWorkspace::new();
    workspace.write("data/b.csv", "ID,Grade\n1,late\n");
    workspace.write("data/a.csv", "ID,Grade\n1,early\n2,solo\n");
    workspace.write("data/notes.txt", "ID,Grade\n9,ignored\n");
    workspace.write("data/merged.csv", "ID,Grade\n1,stale\n");
    let folder = workspace.path().join("data");
    let output = folder.join("merged.csv");

    csv_unify()
        .args(["merge", "-i"])
        .arg(&folder)
        .args(["-k", "ID", "-o"])
        .arg(&output)
        .assert()
        .success();

    assert_eq!(
        unquoted_lines(&workspace.read("data/merged.csv")),
        vec!["ID,Grade", "1,late", "2,solo"]
    );
}

#[test]
fn merge_reads_config_file_with_preprocessing() {
    let workspace = TestWorkspace::new();
    let config = workspace.write(
        "merge.yaml",
        r#"
fixed_columns: [RUT]
merge_columns: [Nombre]
ignore_columns: [Sede]
tag_pattern: '- (\d+)\.csv$'
preprocess:
  trim_blank_rows: true
  add_columns:
    - { header: YEAR, pattern: '(\d{4})' }
"#,
    );
    workspace.write("in/curso 2019 - 1.csv", "Sede,RUT,Nombre,Nota\nLS,11,Ana,5\n,,,\n");
    workspace.write("in/curso 2019 - 2.csv", "RUT,Nota\n11,6\n12,7\n");

    let assert = csv_unify()
        .args(["merge", "-i"])
        .arg(workspace.path().join("in"))
        .arg("-c")
        .arg(&config)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("stdout utf8");
    assert_eq!(
        unquoted_lines(&stdout),
        vec![
            "RUT,Nombre,1 - Nota,1 - YEAR,2 - Nota,2 - YEAR",
            "11,Ana,5,2019,6,2019",
            "12,,,,7,2019",
        ]
    );
}

#[test]
fn command_line_keys_override_config() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("merge.yaml", "fixed_columns: [Missing]\n");
    let input = workspace.write("a.csv", "Code,Value\nx,1\n");

    csv_unify()
        .args(["merge", "-i"])
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .args(["-k", "Code"])
        .assert()
        .success()
        .stdout(contains("\"x\",\"1\""));
}

#[test]
fn merge_honours_delimiters() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("a.csv", "ID;Name\n1;\"A;B\"\n");
    let output = workspace.path().join("out.tsv");

    csv_unify()
        .args(["merge", "-i"])
        .arg(&input)
        .args(["-k", "ID", "--delimiter", ";", "-o"])
        .arg(&output)
        .assert()
        .success();

    assert_eq!(
        workspace.read("out.tsv").lines().collect::<Vec<_>>(),
        vec!["\"ID\"\t\"Name\"", "\"1\"\t\"A;B\""]
    );
}

#[test]
fn merge_renders_table_and_writes_report() {
    let workspace = TestWorkspace::new();
    let first = workspace.write("first.csv", "ID,Name\n1,Ana\n");
    let second = workspace.write("second.csv", ",Group\nID,Town\n1,Lima\n\n,\n");
    let report = workspace.path().join("report.json");

    csv_unify()
        .args(["merge", "-i"])
        .arg(&first)
        .arg("-i")
        .arg(&second)
        .args(["-k", "ID", "--table", "--report"])
        .arg(&report)
        .assert()
        .success()
        .stdout(contains("ID  Name  Group Town"))
        .stdout(contains("1   Ana   Lima"));

    let parsed: Value = serde_json::from_str(&workspace.read("report.json")).unwrap();
    assert_eq!(parsed["identifiers"], 1);
    assert_eq!(parsed["files"][1]["name"], "second.csv");
    assert_eq!(parsed["files"][1]["header_rows"], 2);
    assert_eq!(parsed["files"][1]["skipped_rows"], 1);
    assert_eq!(parsed["columns"][2], "Group Town");
}

#[test]
fn merge_without_keys_fails() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("a.csv", "ID\n1\n");

    csv_unify()
        .args(["merge", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("fixed key column"));
}

#[test]
fn merge_of_empty_folder_fails() {
    let workspace = TestWorkspace::new();
    workspace.write("empty/readme.txt", "nothing here");

    csv_unify()
        .args(["merge", "-i"])
        .arg(workspace.path().join("empty"))
        .args(["-k", "ID"])
        .assert()
        .failure()
        .stderr(contains("no input tables"));
}

#[test]
fn merge_of_missing_path_fails() {
    let workspace = TestWorkspace::new();

    csv_unify()
        .args(["merge", "-i"])
        .arg(workspace.path().join("nope.csv"))
        .args(["-k", "ID"])
        .assert()
        .failure()
        .stderr(contains("does not exist"));
}

#[test]
fn inspect_lists_column_mapping() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("notas.csv", ",1,\nRUT,NOTA,Sede\n11,6.5,LS\n");

    csv_unify()
        .args(["inspect", "-i"])
        .arg(&input)
        .args(["-k", "RUT", "--ignore", "Sede"])
        .assert()
        .success()
        .stdout(contains("header"))
        .stdout(contains("RUT"))
        .stdout(contains("1 NOTA"))
        .stdout(contains("ignored"));
}
