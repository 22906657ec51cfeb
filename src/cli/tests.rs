use super::shell::{Shell, ShellControl};
use super::*;
use crate::core::app::ChatSettings;
use crate::core::shortcut::Focus;
use crate::core::store::MemoryStateStore;
use crate::core::workspace::Workspace;
use crate::utils::logging::TranscriptLog;
use crate::utils::test_utils::serve_once;
use tempfile::TempDir;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    pub(super) fn shell_in(dir: &TempDir, endpoint: &str) -> Shell<MemoryStateStore> {
        Shell::new(
            Workspace::load(MemoryStateStore::new()),
            ChatSettings {
                client: reqwest::Client::new(),
                endpoint: endpoint.to_string(),
                api_key: None,
            },
            TranscriptLog::new(None).unwrap(),
            dir.path().to_path_buf(),
            "bundle.zip".to_string(),
        )
    }

    pub(super) async fn run(shell: &mut Shell<MemoryStateStore>, line: &str) -> String {
        let mut out = Vec::new();
        let control = shell.handle_line(line, &mut out).await.unwrap();
        assert_eq!(control, ShellControl::Continue, "line {line:?} ended the shell");
        String::from_utf8(out).unwrap()
    }
}

use test_helpers::{parse_args, run, shell_in};

#[test]
fn no_command_means_shell() {
    let args = parse_args(&["extshift"]);
    assert!(args.command.is_none());
    assert!(args.log.is_none());
}

#[test]
fn add_accepts_extension_and_flat() {
    let argv = ["extshift", "add", "-e", "md", "--flat", "a.txt", "b.txt"];
    match parse_args(&argv).command {
        Some(Commands::Add { paths, ext, flat }) => {
            assert_eq!(paths, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
            assert_eq!(ext.as_deref(), Some("md"));
            assert!(flat);
        }
        _ => panic!("expected add subcommand for argv={argv:?}"),
    }
}

#[test]
fn add_requires_a_path() {
    assert!(Args::try_parse_from(["extshift", "add"]).is_err());
}

#[test]
fn preserve_folders_parses_toggles() {
    for (word, expected) in [("on", true), ("off", false), ("yes", true)] {
        let argv = ["extshift", "preserve-folders", word];
        match parse_args(&argv).command {
            Some(Commands::PreserveFolders { state }) => assert_eq!(state, Some(expected)),
            _ => panic!("expected preserve-folders subcommand for argv={argv:?}"),
        }
    }
    assert!(Args::try_parse_from(["extshift", "preserve-folders", "sideways"]).is_err());
}

#[test]
fn ask_collects_question_words_and_image() {
    let argv = ["extshift", "-l", "chat.log", "ask", "-i", "pic.png", "what", "is", "-this"];
    let args = parse_args(&argv);
    assert_eq!(args.log, Some(PathBuf::from("chat.log")));
    match args.command {
        Some(Commands::Ask { image, question }) => {
            assert_eq!(image, Some(PathBuf::from("pic.png")));
            assert_eq!(question, vec!["what", "is", "-this"]);
        }
        _ => panic!("expected ask subcommand for argv={argv:?}"),
    }
}

#[test]
fn export_and_download_targets() {
    match parse_args(&["extshift", "export", "text", "all.txt"]).command {
        Some(Commands::Export {
            target: ExportTarget::Text { output },
        }) => assert_eq!(output, PathBuf::from("all.txt")),
        _ => panic!("expected export text"),
    }
    match parse_args(&["extshift", "download"]).command {
        Some(Commands::Download { dir }) => assert_eq!(dir, PathBuf::from(".")),
        _ => panic!("expected download"),
    }
}

#[test]
fn set_joins_value_words() {
    match parse_args(&["extshift", "set", "archive-name", "my", "files.zip"]).command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key.as_deref(), Some("archive-name"));
            assert_eq!(value, Some(vec!["my".to_string(), "files.zip".to_string()]));
        }
        _ => panic!("expected set"),
    }
}

#[test]
fn global_state_dir_after_subcommand() {
    let args = parse_args(&["extshift", "list", "--state-dir", "/tmp/x"]);
    assert_eq!(args.state_dir, Some(PathBuf::from("/tmp/x")));
}

#[tokio::test]
async fn download_key_saves_in_command_focus() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("notes.md");
    std::fs::write(&source, "# hi").unwrap();
    let out_dir = TempDir::new().unwrap();

    let mut shell = shell_in(&out_dir, "http://127.0.0.1:9/api/generate");
    run(&mut shell, &format!("add {}", source.display())).await;
    let output = run(&mut shell, "d").await;

    assert!(output.contains("✅ Saved"), "unexpected output: {output}");
    assert_eq!(
        std::fs::read_to_string(out_dir.path().join("notes.txt")).unwrap(),
        "# hi"
    );
}

#[tokio::test]
async fn download_key_in_select_focus_sets_extension() {
    let out_dir = TempDir::new().unwrap();
    let mut shell = shell_in(&out_dir, "http://127.0.0.1:9/api/generate");

    let listing = run(&mut shell, "ext").await;
    assert!(listing.contains("1. txt"));
    assert_eq!(shell.focus(), Focus::Select);

    let output = run(&mut shell, "d").await;
    assert_eq!(shell.focus(), Focus::Command);
    assert!(output.contains("Target extension set to .d"));
    assert_eq!(shell.workspace().target_extension().as_str(), "d");
    assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn select_accepts_a_list_number() {
    let out_dir = TempDir::new().unwrap();
    let mut shell = shell_in(&out_dir, "http://127.0.0.1:9/api/generate");
    run(&mut shell, "ext").await;
    run(&mut shell, "2").await;
    assert_eq!(shell.workspace().target_extension().as_str(), "md");
}

#[tokio::test]
async fn download_key_in_text_focus_is_sent_as_question() {
    let (endpoint, server) = serve_once("200 OK", vec![b"ok".to_vec()]).await;
    let out_dir = TempDir::new().unwrap();
    let mut shell = shell_in(&out_dir, &endpoint);

    run(&mut shell, "ask").await;
    assert_eq!(shell.focus(), Focus::TextInput);

    let output = run(&mut shell, "d").await;
    assert_eq!(output, "ok\n");
    assert_eq!(shell.focus(), Focus::Command);

    let (_, body) = server.await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["contents"][0]["text"], "d");
    assert_eq!(shell.workspace().conversation().len(), 2);
}

#[tokio::test]
async fn empty_line_cancels_text_focus() {
    let out_dir = TempDir::new().unwrap();
    let mut shell = shell_in(&out_dir, "http://127.0.0.1:9/api/generate");
    run(&mut shell, "ask").await;
    assert_eq!(run(&mut shell, "").await, "Cancelled.\n");
    assert_eq!(shell.focus(), Focus::Command);
    assert!(shell.workspace().conversation().is_empty());
}

#[tokio::test]
async fn failures_are_reported_and_session_continues() {
    let out_dir = TempDir::new().unwrap();
    let mut shell = shell_in(&out_dir, "http://127.0.0.1:9/api/generate");

    let output = run(&mut shell, "ext a/b").await;
    assert!(output.starts_with("❌"), "unexpected output: {output}");
    let output = run(&mut shell, "zip out.zip").await;
    assert!(output.starts_with("❌"), "unexpected output: {output}");
    let output = run(&mut shell, "bogus").await;
    assert!(output.contains("Unknown command: bogus"));

    let mut out = Vec::new();
    assert_eq!(
        shell.handle_line("quit", &mut out).await.unwrap(),
        ShellControl::Quit
    );
}
