//! Integration tests for the cosplit CLI
//!
//! The methods used here are small shell scripts, so most tests only run on
//! unix.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::Stdio;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Helper to get the path to a test fixture
fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

fn write_method(root: &Path, name: &str, run: Value) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("run.json"), serde_json::to_string_pretty(&run).unwrap()).unwrap();
}

/// A methods directory with a dictionary splitter and an identity splitter
fn methods_dir() -> TempDir {
    let root = TempDir::new().unwrap();
    write_method(
        root.path(),
        "dict",
        json!({
            "display_name": "Dictionary",
            "protocol": "process",
            "command": "sh",
            "args": [
                "-c",
                "case \"$0\" in huisjacht) echo huis jacht;; *) echo \"$0\";; esac",
                "{word}"
            ]
        }),
    );
    write_method(
        root.path(),
        "echo",
        json!({ "protocol": "process", "command": "echo" }),
    );
    root
}

fn cosplit_cmd(subcommand: &str, methods: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cosplit").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg(subcommand)
        .arg("--methods-dir")
        .arg(methods.path());
    cmd
}

#[test]
fn test_list_methods() {
    let methods = methods_dir();
    cosplit_cmd("list", &methods)
        .assert()
        .success()
        .stdout(predicate::str::contains("dict"))
        .stdout(predicate::str::contains("Dictionary"))
        .stdout(predicate::str::contains("process"));
}

#[test]
fn test_list_json() {
    let methods = methods_dir();
    let output = cosplit_cmd("list", &methods)
        .args(["-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let listed: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["name"], "dict");
    // display name defaults to the directory name
    assert_eq!(listed[1]["display_name"], "echo");
}

#[test]
fn test_split_words() {
    let methods = methods_dir();
    cosplit_cmd("split", &methods)
        .args(["-m", "dict", "huisjacht", "tafel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("huisjacht\thuis_jacht"))
        .stdout(predicate::str::contains("tafel\ttafel"));
}

#[test]
fn test_split_unknown_method() {
    let methods = methods_dir();
    cosplit_cmd("split", &methods)
        .args(["-m", "nope", "huisjacht"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown method 'nope'"));
}

#[test]
fn test_evaluate_method() {
    let methods = methods_dir();
    cosplit_cmd("evaluate", &methods)
        .args(["-m", "dict", "-t", &fixture_path("nouns.csv")])
        .assert()
        .success()
        .stdout(predicate::str::contains("dict"))
        .stdout(predicate::str::contains("precision  1.000"))
        .stdout(predicate::str::contains("recall     0.500"))
        .stdout(predicate::str::contains("accuracy   0.667"))
        .stdout(predicate::str::contains("evaluated  3 of 3 (skipped 0, failed 0)"));
}

#[test]
fn test_evaluate_all_ranks_methods() {
    let methods = methods_dir();
    let output = cosplit_cmd("evaluate", &methods)
        .args(["--all", "-t", "tests/fixtures/*.csv", "-f", "json", "-q"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    let ranked: Vec<&str> = rows.iter().map(|r| r["method"].as_str().unwrap()).collect();
    assert_eq!(ranked, vec!["dict", "echo"]);
    // echo never splits, so precision is undefined
    assert!(rows[1]["precision"].is_null());
}

#[test]
fn test_evaluate_requires_methods() {
    let methods = methods_dir();
    cosplit_cmd("evaluate", &methods)
        .args(["-t", &fixture_path("nouns.csv")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No methods selected"));
}

#[test]
fn test_evaluate_missing_test_set() {
    let methods = methods_dir();
    cosplit_cmd("evaluate", &methods)
        .args(["-m", "dict", "-t", "tests/fixtures/missing-*.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_evaluate_sample_with_config() {
    let methods = methods_dir();
    let output = cosplit_cmd("evaluate", &methods)
        .args(["-c", &fixture_path("cosplit.toml")])
        .args(["-m", "dict", "-t", &fixture_path("nouns.csv")])
        .args(["--max-cases", "2", "-f", "json", "-q"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["total"], 2);
}

#[test]
fn test_evaluate_markdown_to_file() {
    let methods = methods_dir();
    let out_dir = TempDir::new().unwrap();
    let report = out_dir.path().join("report.md");

    cosplit_cmd("evaluate", &methods)
        .args(["-m", "dict", "-m", "echo", "-t", &fixture_path("nouns.csv")])
        .args(["-f", "markdown", "-q", "-o"])
        .arg(&report)
        .assert()
        .success();

    let content = fs::read_to_string(&report).unwrap();
    assert!(content.contains("| Method | Precision"));
    assert!(content.contains("| `dict` | 1.000 | 0.500 | 0.667 | 3 | 0 | 0 |"));
    assert!(content.contains("| `echo` | n/a | 0.000 | 0.333 | 3 | 0 | 0 |"));
}

#[test]
fn test_prepare_runs_once() {
    let methods = methods_dir();
    write_method(
        methods.path(),
        "fetch",
        json!({
            "protocol": "process",
            "command": "echo",
            "prepare": {
                "command": ["sh", "-c", "echo run >> log && touch ready"],
                "creates": "ready"
            }
        }),
    );

    for _ in 0..2 {
        cosplit_cmd("prepare", &methods)
            .args(["-m", "fetch"])
            .assert()
            .success()
            .stdout(predicate::str::contains("✓ fetch"));
    }

    let log = fs::read_to_string(methods.path().join("fetch").join("log")).unwrap();
    assert_eq!(log.lines().count(), 1);
}

#[test]
fn test_prepare_failure() {
    let methods = methods_dir();
    write_method(
        methods.path(),
        "broken",
        json!({
            "protocol": "process",
            "command": "echo",
            "prepare": { "command": ["false"], "creates": "never" }
        }),
    );

    cosplit_cmd("prepare", &methods)
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗ broken"))
        .stdout(predicate::str::contains("✓ dict"));
}

#[test]
fn test_serve_answers_requests() {
    let methods = methods_dir();
    let (mut child, addr) = spawn_server(&methods, &["--max-connections", "2"]);

    assert_eq!(ask(&addr, "huisjacht,dict"), "huis,jacht");
    assert!(ask(&addr, "huisjacht,nope").starts_with("error: unknown method"));

    assert!(child.wait().unwrap().success());
}

fn spawn_server(methods: &TempDir, extra: &[&str]) -> (std::process::Child, String) {
    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("cosplit"))
        .args(["serve", "--port", "0", "--methods-dir"])
        .arg(methods.path())
        .args(extra)
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stderr = BufReader::new(child.stderr.take().unwrap());
    let mut line = String::new();
    stderr.read_line(&mut line).unwrap();
    let addr = line.trim().trim_start_matches("Listening at ").to_string();
    // keep the pipe open so later log lines do not hit a closed stderr
    thread::spawn(move || std::io::copy(&mut stderr, &mut std::io::sink()));
    (child, addr)
}

fn ask(addr: &str, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    stream.shutdown(std::net::Shutdown::Write).unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).unwrap();
    reply
}

fn is_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .args(["-0", pid])
        .stderr(Stdio::null())
        .status()
        .unwrap()
        .success()
}

#[test]
fn test_terminated_server_stops_engines() {
    // stand-in for the engine's port; the engine process itself just sleeps
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = stream.unwrap();
            let mut line = String::new();
            if BufReader::new(&stream).read_line(&mut line).unwrap_or(0) > 0 {
                let _ = stream.write_all(b"huis jacht\n");
            }
        }
    });

    let methods = TempDir::new().unwrap();
    write_method(
        methods.path(),
        "svc",
        json!({
            "protocol": "service",
            "server": { "command": "sh", "args": ["-c", "echo $$ > pid; exec sleep 600"] },
            "host": "127.0.0.1",
            "port": port,
            "warmup_secs": 10,
            "retry": { "max_attempts": 1 }
        }),
    );

    let (mut child, addr) = spawn_server(&methods, &[]);
    assert_eq!(ask(&addr, "huisjacht,svc"), "huis,jacht");

    let pid_file = methods.path().join("svc").join("pid");
    let deadline = Instant::now() + Duration::from_secs(10);
    let engine_pid = loop {
        match fs::read_to_string(&pid_file) {
            Ok(pid) if !pid.trim().is_empty() => break pid.trim().to_string(),
            _ if Instant::now() < deadline => thread::sleep(Duration::from_millis(20)),
            _ => panic!("engine never wrote its pid"),
        }
    };
    assert!(is_alive(&engine_pid));

    let status = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(20);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        assert!(Instant::now() < deadline, "server did not exit");
        thread::sleep(Duration::from_millis(50));
    };
    assert!(exit.success());
    assert!(!is_alive(&engine_pid), "engine process {engine_pid} outlived the server");
}

#[test]
fn test_help() {
    Command::cargo_bin("cosplit")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("serve"));
}
