//! Characterization tests for the filename recovery policy. The exact
//! heuristic is a policy choice, not a contract; these pin the current
//! behavior so a change is a deliberate decision.

use super::*;
use std::path::PathBuf;

#[test]
fn bold_preceding_line_names_the_file() {
    let reply = "\
**main.py**
```python
print(1)
```
";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("main.py"));
}

#[test]
fn backticked_preceding_line_names_the_file() {
    let reply = "\
Here is `app.js`:
```javascript
console.log(1)
```
";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("app.js"));
}

#[test]
fn heading_style_preceding_line_names_the_file() {
    let reply = "\
### File: server.rb
```ruby
puts 1
```
";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("server.rb"));
}

#[test]
fn prose_preceding_line_is_not_mistaken_for_a_filename() {
    let reply = "\
Here is the code.
```python
print(1)
```
";
    let files = parse_reply(reply);
    // "code." is not a filename; the name is synthesized from the tag.
    assert_eq!(files[0].path, PathBuf::from("output_1.py"));
}

#[test]
fn unlabeled_block_synthesizes_name_from_language_tag() {
    let reply = "```go\npackage main\n```";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("output_1.go"));
}

#[test]
fn unlabeled_untagged_block_synthesizes_untyped_name() {
    let reply = "```\nsome text\n```";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("output_1"));
}

#[test]
fn synthesized_names_are_keyed_by_block_position() {
    let reply = "\
```python main.py
print(1)
```
```javascript
console.log(1)
```
";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("main.py"));
    // Second block overall, so the default name uses index 2.
    assert_eq!(files[1].path, PathBuf::from("output_2.js"));
}

#[test]
fn info_string_filename_beats_preceding_line() {
    let reply = "\
**wrong.py**
```python right.py
print(1)
```
";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("right.py"));
}

#[test]
fn blank_line_between_label_and_fence_still_recovers_name() {
    let reply = "\
**main.py**

```python
print(1)
```
";
    let files = parse_reply(reply);
    assert_eq!(files[0].path, PathBuf::from("main.py"));
}
