//! Developer snippet detectors: shell commands, SQL statements and file paths

use crate::detector::{compile, single_token, Detector};
use aho_corasick::{AhoCorasick, Anchored, Input, MatchKind, StartKind};
use magicinput_core::{ClassificationResult, Error, FormatType, Result};
use regex::Regex;

/// Programs recognized as the first word of a shell command
const SHELL_PROGRAMS: &[&str] = &[
    "apt", "apt-get", "awk", "aws", "az", "brew", "cargo", "cat", "cd", "chmod", "chown", "cp",
    "curl", "dnf", "docker", "docker-compose", "echo", "export", "find", "gcloud", "git", "go",
    "grep", "helm", "kill", "kubectl", "ln", "ls", "make", "mkdir", "mv", "node", "npm", "npx",
    "ping", "pip", "pip3", "pnpm", "ps", "python", "python3", "rm", "rsync", "rustc", "rustup",
    "scp", "sed", "ssh", "sudo", "systemctl", "tail", "tar", "terraform", "touch", "unzip",
    "wget", "yarn", "yum",
];

/// Programs whose names are also everyday English words. These only count
/// as commands when the line carries some shell syntax.
const PROSE_PROGRAMS: &[&str] = &[
    "awk", "cat", "cd", "cp", "echo", "export", "find", "go", "grep", "kill", "ln", "ls", "make",
    "mv", "node", "ping", "ps", "python", "python3", "rm", "sed", "ssh", "tail", "tar", "touch",
];

/// Shell command detector.
///
/// The first word (after an optional `$ ` prompt and `sudo`) is matched
/// against [`SHELL_PROGRAMS`] with an anchored Aho-Corasick automaton.
pub struct CommandDetector {
    programs: AhoCorasick,
}

impl CommandDetector {
    pub fn new() -> Result<Self> {
        let programs = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .start_kind(StartKind::Anchored)
            .build(SHELL_PROGRAMS)
            .map_err(|e| Error::detector(format!("Failed to build command matcher: {}", e)))?;
        Ok(Self { programs })
    }

    /// Whole-word program lookup
    fn program<'a>(&self, word: &'a str) -> Option<&'a str> {
        let found = self
            .programs
            .try_find(Input::new(word).anchored(Anchored::Yes))
            .ok()??;
        (found.end() == word.len()).then_some(word)
    }

    /// Whether the line carries syntax that prose practically never has
    fn has_shell_syntax(args: &[&str]) -> bool {
        args.iter().any(|arg| {
            arg.starts_with('-')
                || arg.starts_with('~')
                || arg.starts_with('.')
                || arg.starts_with('\'')
                || arg.starts_with('"')
                || arg.contains(['/', '=', '$', '*', '|', '>', '<'])
                || *arg == "&&"
        })
    }

    fn unquote(arg: &str) -> &str {
        arg.trim_matches(|c| c == '\'' || c == '"')
    }

    fn describe_curl(args: &[&str]) -> ClassificationResult {
        let mut method: Option<String> = None;
        let mut target: Option<&str> = None;
        let mut headers = 0usize;
        let mut has_body = false;

        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            match arg {
                "-X" | "--request" => method = iter.next().map(|m| Self::unquote(m).to_uppercase()),
                "-H" | "--header" => {
                    headers += 1;
                    iter.next();
                }
                "-d" | "--data" | "--data-raw" | "--data-binary" | "--json" | "-F" | "--form" => {
                    has_body = true;
                    iter.next();
                }
                _ => {
                    let value = Self::unquote(arg);
                    if target.is_none()
                        && (value.starts_with("http://") || value.starts_with("https://"))
                    {
                        target = Some(value);
                    }
                }
            }
        }

        let default_method = if has_body { "POST" } else { "GET" };
        let method = method.unwrap_or_else(|| default_method.to_string());
        let mut result = ClassificationResult::new(FormatType::Command, 85, "curl Request")
            .with_field("Program", "curl")
            .with_field("Method", method);
        if let Some(url) = target {
            result = result.with_field("URL", url);
        }
        if headers > 0 {
            result = result.with_field("Headers", headers.to_string());
        }
        result
    }
}

impl Detector for CommandDetector {
    fn name(&self) -> &str {
        "command"
    }

    fn format(&self) -> FormatType {
        FormatType::Command
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let trimmed = content.trim();
        let prompt = trimmed.strip_prefix("$ ");
        let body = prompt.unwrap_or(trimmed);
        let joined = body.replace("\\\n", " ");
        let mut words: Vec<&str> = joined.split_whitespace().collect();

        let elevated = words.first() == Some(&"sudo");
        if elevated {
            words.remove(0);
        }
        let (&first, args) = words.split_first()?;
        let program = self.program(first)?;
        // A lone word ("make", "find") is more often prose than a command.
        if args.is_empty() {
            return None;
        }
        let explicit = prompt.is_some() || elevated;
        if PROSE_PROGRAMS.contains(&program) && !explicit && !Self::has_shell_syntax(args) {
            return None;
        }

        if program == "curl" {
            return Some(Self::describe_curl(args));
        }

        let mut result = ClassificationResult::new(FormatType::Command, 75, "Shell Command")
            .with_field("Program", program)
            .with_field("Arguments", args.len().to_string());
        if elevated {
            result = result.with_field("Elevated", "sudo");
        }
        if joined.contains(" | ") {
            result = result.with_field("Pipeline", "yes");
        }
        Some(result)
    }
}

/// SQL statement detector
pub struct SqlDetector {
    statement: Regex,
    tables: Regex,
}

impl SqlDetector {
    pub fn new() -> Result<Self> {
        let ident = r#"[\w.`"\[\]]+"#;
        let column = r#"[\w.`"\[\]()*]+(?:\s+AS\s+\w+)?"#;
        let statement = format!(
            r"(?is)^\s*(?:SELECT\s+(?:DISTINCT\s+)?(?:\*|{column}(?:\s*,\s*{column})*)\s+FROM\s+{ident}|INSERT\s+INTO\s+{ident}|UPDATE\s+{ident}\s+SET\s+\w+\s*=|DELETE\s+FROM\s+{ident}|(?:CREATE|ALTER|DROP)\s+(?:TABLE|INDEX|VIEW|DATABASE)\s)",
            column = column,
            ident = ident,
        );
        let tables = format!(
            r"(?i)\b(?:FROM|INTO|UPDATE|JOIN|TABLE|INDEX|VIEW|DATABASE)\s+(?:IF\s+(?:NOT\s+)?EXISTS\s+)?({ident})",
            ident = ident,
        );
        Ok(Self {
            statement: compile("sql statement", &statement)?,
            tables: compile("sql tables", &tables)?,
        })
    }
}

impl Detector for SqlDetector {
    fn name(&self) -> &str {
        "sql"
    }

    fn format(&self) -> FormatType {
        FormatType::Sql
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        if !self.statement.is_match(content) {
            return None;
        }
        let verb = content.split_whitespace().next()?.to_ascii_uppercase();

        let mut tables: Vec<&str> = Vec::new();
        for caps in self.tables.captures_iter(content) {
            if let Some(name) = caps.get(1).map(|m| m.as_str()) {
                if !tables.contains(&name) {
                    tables.push(name);
                }
            }
        }

        let mut result = ClassificationResult::new(FormatType::Sql, 78, "SQL")
            .with_field("Statement", verb)
            .with_field("Statements", content.matches(';').count().max(1).to_string());
        if !tables.is_empty() {
            result = result.with_field("Tables", tables.join(", "));
        }
        Some(result)
    }
}

/// File system path detector (Unix and Windows)
pub struct FilePathDetector {
    windows: Regex,
}

impl FilePathDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            windows: compile("windows path", r"^(?:[A-Za-z]:[\\/]|\\\\[^\\/]+[\\/])")?,
        })
    }

    fn classify(&self, token: &str) -> Option<(&'static str, &'static str)> {
        if self.windows.is_match(token) {
            Some(("Windows", "absolute"))
        } else if token.starts_with("~/") {
            Some(("Unix", "home"))
        } else if token.starts_with("./") || token.starts_with("../") {
            Some(("Unix", "relative"))
        } else if token.len() > 1 && token.starts_with('/') && !token.starts_with("//") {
            Some(("Unix", "absolute"))
        } else {
            None
        }
    }
}

impl Detector for FilePathDetector {
    fn name(&self) -> &str {
        "file_path"
    }

    fn format(&self) -> FormatType {
        FormatType::FilePath
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        let (platform, kind) = self.classify(token)?;

        let separators: &[char] = if platform == "Windows" { &['\\', '/'] } else { &['/'] };
        let (directory, file) = match token.rfind(separators) {
            Some(idx) => (&token[..=idx], &token[idx + 1..]),
            None => ("", token),
        };

        let mut result = ClassificationResult::new(FormatType::FilePath, 60, "File Path")
            .with_field("Platform", platform)
            .with_field("Kind", kind)
            .with_field("Directory", directory);
        if !file.is_empty() && file != "." && file != ".." {
            result = result.with_field("File name", file);
            if let Some((stem, ext)) = file.rsplit_once('.') {
                if !stem.is_empty() && !ext.is_empty() {
                    result = result.with_field("Extension", ext.to_ascii_lowercase());
                }
            }
        }
        Some(result)
    }
}
