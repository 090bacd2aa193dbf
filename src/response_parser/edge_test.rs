use super::*;
use std::path::PathBuf;

#[test]
fn empty_reply_yields_empty_list() {
    assert!(parse_reply("").is_empty());
}

#[test]
fn reply_with_no_fences_yields_empty_list() {
    let reply = "I could not produce any code for that request, sorry.";
    assert!(parse_reply(reply).is_empty());
}

#[test]
fn unterminated_fence_runs_to_end_of_input() {
    let reply = "```python main.py\nprint(1)\nprint(2)";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, "print(1)\nprint(2)");
}

#[test]
fn empty_block_produces_empty_file() {
    let reply = "```python main.py\n```";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, "");
}

#[test]
fn indented_fences_are_recognized() {
    let reply = "  ```python main.py\n  print(1)\n  ```";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, PathBuf::from("main.py"));
}

#[test]
fn malformed_json_manifest_falls_back_to_fence_scan() {
    // Looks like a manifest but is not valid JSON; the scanner finds nothing.
    let reply = "{'files': broken";
    assert!(parse_reply(reply).is_empty());
}

#[test]
fn json_manifest_with_empty_files_array_falls_through() {
    let reply = "{\"files\": []}";
    assert!(parse_reply(reply).is_empty());
}

#[test]
fn json_manifest_entries_with_blank_names_are_dropped() {
    let reply = r#"{"files": [
        {"filename": "  ", "content": "lost"},
        {"filename": "kept.py", "content": "x = 1"}
    ]}"#;
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, PathBuf::from("kept.py"));
}

#[test]
fn json_manifest_duplicate_names_last_write_wins() {
    let reply = r#"{"files": [
        {"filename": "main.py", "content": "old"},
        {"filename": "main.py", "content": "new"}
    ]}"#;
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, "new");
}

#[test]
fn longer_fences_close_their_blocks() {
    let reply = "````python main.py\nprint(1)\n````";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, "print(1)");
}
