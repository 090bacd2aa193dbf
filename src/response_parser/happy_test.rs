use super::*;
use std::path::PathBuf;

#[test]
fn parses_single_labeled_block() {
    let reply = "\
Here is the program.

```python main.py
print(\"hello\")
```

Run it with python3.
";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, PathBuf::from("main.py"));
    assert_eq!(files[0].content, "print(\"hello\")");
}

#[test]
fn parses_multiple_blocks_in_order_of_appearance() {
    let reply = "\
```python main.py
import utils
utils.go()
```
```python utils.py
def go():
    pass
```
";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].path, PathBuf::from("main.py"));
    assert_eq!(files[1].path, PathBuf::from("utils.py"));
    assert_eq!(files[1].content, "def go():\n    pass");
}

#[test]
fn filename_without_language_tag_in_info_string() {
    let reply = "```index.js\nconsole.log(1)\n```";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, PathBuf::from("index.js"));
}

#[test]
fn nested_relative_paths_are_preserved() {
    let reply = "```python src/app/main.py\nprint(1)\n```";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("src/app/main.py"));
}

#[test]
fn duplicate_filenames_last_write_wins_keeping_first_position() {
    let reply = "\
```python main.py
print(\"first\")
```
```python other.py
print(\"other\")
```
```python main.py
print(\"second\")
```
";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 2);
    // main.py keeps its original slot but carries the later content.
    assert_eq!(files[0].path, PathBuf::from("main.py"));
    assert_eq!(files[0].content, "print(\"second\")");
    assert_eq!(files[1].path, PathBuf::from("other.py"));
}

#[test]
fn parses_json_manifest_reply() {
    let reply = r##"{"files": [
        {"filename": "main.py", "content": "print('hi')"},
        {"filename": "README.md", "content": "# demo"}
    ]}"##;
    let files = parse_reply(reply);
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].path, PathBuf::from("main.py"));
    assert_eq!(files[0].content, "print('hi')");
    assert_eq!(files[1].path, PathBuf::from("README.md"));
}

#[test]
fn parses_json_manifest_wrapped_in_a_fence() {
    let reply = "```json\n{\"files\": [{\"filename\": \"a.py\", \"content\": \"x = 1\"}]}\n```";
    let files = parse_reply(reply);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, PathBuf::from("a.py"));
    assert_eq!(files[0].content, "x = 1");
}

#[test]
fn detected_language_comes_from_the_extension() {
    let reply = "```python main.py\nprint(1)\n```";
    let files = parse_reply(reply);
    let spec = files[0].language().expect("python should be detected");
    assert_eq!(spec.name, "Python");
}
