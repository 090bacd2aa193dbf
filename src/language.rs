//! Static per-language metadata: how to build and run a file based on its
//! extension, and which file in a generated project is the entry point.

use std::path::Path;

/// Everything the runner needs to know about one language.
///
/// Command templates support two placeholders: `{file}` expands to the entry
/// file name and `{stem}` to the file name without its extension.
#[derive(Debug)]
pub struct LanguageSpec {
    pub extension: &'static str,
    pub name: &'static str,
    pub executable: bool,
    pub build: Option<&'static [&'static str]>,
    pub run: &'static [&'static str],
}

static LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        extension: "py",
        name: "Python",
        executable: true,
        build: None,
        run: &["python3", "{file}"],
    },
    LanguageSpec {
        extension: "js",
        name: "JavaScript (Node.js)",
        executable: true,
        build: None,
        run: &["node", "{file}"],
    },
    LanguageSpec {
        extension: "ts",
        name: "TypeScript",
        executable: true,
        build: Some(&["tsc", "{file}"]),
        run: &["node", "{stem}.js"],
    },
    LanguageSpec {
        extension: "java",
        name: "Java",
        executable: true,
        build: Some(&["javac", "{file}"]),
        run: &["java", "{stem}"],
    },
    LanguageSpec {
        extension: "cpp",
        name: "C++",
        executable: true,
        build: Some(&["g++", "{file}", "-o", "{stem}"]),
        run: &["./{stem}"],
    },
    LanguageSpec {
        extension: "c",
        name: "C",
        executable: true,
        build: Some(&["gcc", "{file}", "-o", "{stem}"]),
        run: &["./{stem}"],
    },
    LanguageSpec {
        extension: "cs",
        name: "C#",
        executable: true,
        build: Some(&["csc", "/out:{stem}.exe", "{file}"]),
        run: &["mono", "{stem}.exe"],
    },
    LanguageSpec {
        extension: "go",
        name: "Go",
        executable: true,
        build: None,
        run: &["go", "run", "{file}"],
    },
    LanguageSpec {
        extension: "rs",
        name: "Rust",
        executable: true,
        build: Some(&["rustc", "{file}", "-o", "{stem}"]),
        run: &["./{stem}"],
    },
    LanguageSpec {
        extension: "rb",
        name: "Ruby",
        executable: true,
        build: None,
        run: &["ruby", "{file}"],
    },
    LanguageSpec {
        extension: "php",
        name: "PHP",
        executable: true,
        build: None,
        run: &["php", "{file}"],
    },
    // Markup and data formats are recognized so the runner can report
    // "nothing to execute" instead of treating them as unknown.
    LanguageSpec {
        extension: "html",
        name: "HTML",
        executable: false,
        build: None,
        run: &[],
    },
    LanguageSpec {
        extension: "css",
        name: "CSS",
        executable: false,
        build: None,
        run: &[],
    },
    LanguageSpec {
        extension: "json",
        name: "JSON",
        executable: false,
        build: None,
        run: &[],
    },
    LanguageSpec {
        extension: "md",
        name: "Markdown",
        executable: false,
        build: None,
        run: &[],
    },
    LanguageSpec {
        extension: "txt",
        name: "Text",
        executable: false,
        build: None,
        run: &[],
    },
    LanguageSpec {
        extension: "xml",
        name: "XML",
        executable: false,
        build: None,
        run: &[],
    },
    LanguageSpec {
        extension: "yml",
        name: "YAML",
        executable: false,
        build: None,
        run: &[],
    },
    LanguageSpec {
        extension: "yaml",
        name: "YAML",
        executable: false,
        build: None,
        run: &[],
    },
];

pub fn spec_for_extension(extension: &str) -> Option<&'static LanguageSpec> {
    let ext = extension.trim_start_matches('.');
    LANGUAGES
        .iter()
        .find(|spec| spec.extension.eq_ignore_ascii_case(ext))
}

pub fn spec_for_path(path: &Path) -> Option<&'static LanguageSpec> {
    let ext = path.extension()?.to_str()?;
    spec_for_extension(ext)
}

/// Expand a command template against the entry file, producing the argv to
/// spawn. Returns `None` for an empty template.
pub fn expand_template(template: &[&str], entry: &Path) -> Option<Vec<String>> {
    let file = entry.to_string_lossy();
    let stem = entry
        .with_extension("")
        .to_string_lossy()
        .into_owned();

    let argv: Vec<String> = template
        .iter()
        .map(|part| part.replace("{file}", &file).replace("{stem}", &stem))
        .collect();

    if argv.is_empty() {
        None
    } else {
        Some(argv)
    }
}

/// Map a fenced-code-block language tag to a file extension, for synthesizing
/// names when the model forgot to label a block with a filename.
pub fn extension_for_language_tag(tag: &str) -> Option<&'static str> {
    match tag.to_ascii_lowercase().as_str() {
        "python" | "py" => Some("py"),
        "javascript" | "js" | "node" => Some("js"),
        "typescript" | "ts" => Some("ts"),
        "java" => Some("java"),
        "cpp" | "c++" => Some("cpp"),
        "c" => Some("c"),
        "csharp" | "cs" | "c#" => Some("cs"),
        "go" | "golang" => Some("go"),
        "rust" | "rs" => Some("rs"),
        "ruby" | "rb" => Some("rb"),
        "php" => Some("php"),
        "html" => Some("html"),
        "css" => Some("css"),
        "json" => Some("json"),
        "markdown" | "md" => Some("md"),
        "xml" => Some("xml"),
        "yaml" | "yml" => Some("yaml"),
        "text" | "txt" | "plaintext" => Some("txt"),
        _ => None,
    }
}

// Well-known entry file names, strongest first.
const ENTRY_NAME_PRIORITY: &[(&str, u32)] = &[
    ("main.py", 100),
    ("app.py", 90),
    ("run.py", 85),
    ("main.go", 85),
    ("index.js", 80),
    ("main.js", 80),
    ("main.rs", 80),
    ("app.js", 75),
    ("main.rb", 75),
    ("server.js", 70),
    ("main.php", 70),
    ("Main.java", 65),
    ("App.java", 60),
    ("main.cpp", 55),
    ("main.c", 50),
    ("Program.cs", 45),
    ("main.cs", 40),
    ("index.html", 35),
    ("main.html", 30),
];

// Fallback scores when no well-known name is present.
const ENTRY_EXTENSION_SCORE: &[(&str, u32)] = &[
    ("py", 90),
    ("go", 85),
    ("js", 80),
    ("rs", 80),
    ("rb", 75),
    ("java", 70),
    ("php", 70),
    ("cpp", 60),
    ("c", 50),
    ("cs", 40),
    ("ts", 35),
    ("html", 20),
];

/// Pick the file most likely to be the program's entry point.
///
/// Exact well-known basenames win outright; otherwise files are scored by
/// extension with a bonus for `main`/`app`/`index` in the name. Ties keep
/// the earlier file.
pub fn detect_entry_file<'a, I>(paths: I) -> Option<&'a Path>
where
    I: IntoIterator<Item = &'a Path>,
{
    let paths: Vec<&Path> = paths.into_iter().collect();

    let mut best_known: Option<(&Path, u32)> = None;
    for path in &paths {
        let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        for (name, score) in ENTRY_NAME_PRIORITY {
            if basename == *name && best_known.map_or(true, |(_, s)| *score > s) {
                best_known = Some((path, *score));
            }
        }
    }
    if let Some((path, _)) = best_known {
        return Some(path);
    }

    let mut best: Option<(&Path, u32)> = None;
    for path in &paths {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some((_, base_score)) = ENTRY_EXTENSION_SCORE
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        else {
            continue;
        };

        let mut score = *base_score;
        let basename = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if basename.contains("main") {
            score += 20;
        } else if basename.contains("app") {
            score += 15;
        } else if basename.contains("index") {
            score += 10;
        }

        if best.map_or(true, |(_, s)| score > s) {
            best = Some((path, score));
        }
    }

    best.map(|(path, _)| path)
}
