use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::adapter::rule_from_json;
use crate::error::RuleError;
use crate::rule::Rule;

/// Loads rules from a YAML/JSON file or from every such file in a directory.
///
/// Files may hold a `{rules: [...]}` document, a bare list, or one rule.
/// Every entry goes through the same normalization as API payloads.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    let mut rules = if path.is_dir() {
        load_from_directory(path)?
    } else {
        load_from_file(path)?
    };

    deduplicate(&rules)?;
    rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
    debug!(path = %path.display(), count = rules.len(), "loaded rules");

    Ok(rules)
}

fn load_from_directory(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| RuleError::from_io(path, err))? {
        let entry = entry.map_err(|err| RuleError::from_io(path, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| RuleError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        let candidate = entry.path();
        if let Some(ext) = candidate.extension().and_then(|value| value.to_str()) {
            if matches!(ext, "json" | "yaml" | "yml") {
                files.push(candidate);
            }
        }
    }
    files.sort();

    let mut rules = Vec::new();
    for file in files {
        rules.append(&mut load_from_file(&file)?);
    }
    Ok(rules)
}

fn load_from_file(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    parse_rules(&raw, path)
}

fn parse_rules(raw: &str, path: &Path) -> Result<Vec<Rule>, RuleError> {
    let document: Value =
        serde_yaml::from_str(raw).map_err(|err| RuleError::parse_error(path, err.to_string()))?;

    let entries: Vec<&Value> = match &document {
        Value::Object(map) => match map.get("rules") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(_) => {
                return Err(RuleError::parse_error(path, "'rules' must be a list of rules"));
            }
            None => vec![&document],
        },
        Value::Array(items) => items.iter().collect(),
        _ => {
            return Err(RuleError::parse_error(
                path,
                "expected a rules document, a list of rules, or a single rule",
            ));
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            rule_from_json(entry).map_err(|err| match err {
                RuleError::Shape { path: at, message } => RuleError::Shape {
                    path: format!("{}: rules[{}].{}", path.display(), position, at),
                    message,
                },
                other => other,
            })
        })
        .collect()
}

fn deduplicate(rules: &[Rule]) -> Result<(), RuleError> {
    let mut seen = HashSet::new();
    for id in rules.iter().filter_map(|rule| rule.id.as_deref()) {
        if !seen.insert(id) {
            return Err(RuleError::DuplicateRule { id: id.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, body: &str) {
        let mut file = fs::File::create(dir.join(name)).expect("create file");
        file.write_all(body.as_bytes()).expect("write file");
    }

    #[test]
    fn loads_documents_lists_and_single_rules() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "a.yaml",
            "rules:\n  - id: r1\n    name: Zeta\n    priority: 2\n    conditions:\n      - field: age\n        operator: gte\n        value: 20\n",
        );
        write(
            dir.path(),
            "b.json",
            r#"[{"id": "r2", "name": "Alpha", "priority": 2, "conditions": []}]"#,
        );
        write(dir.path(), "c.yml", "name: Single\npriority: 1\nconditions: []\n");
        write(dir.path(), "notes.txt", "ignored");

        let rules = load_rules(dir.path()).expect("rules");
        let names: Vec<&str> = rules.iter().map(|rule| rule.name.as_str()).collect();
        assert_eq!(names, vec!["Single", "Alpha", "Zeta"]);
        let zeta = &rules[2];
        assert_eq!(zeta.conditions[0].as_comparison().map(|c| c.operator.as_str()), Some(">="));
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.json", r#"{"id": "same", "name": "one"}"#);
        write(dir.path(), "b.json", r#"{"id": "same", "name": "two"}"#);

        let err = load_rules(dir.path()).expect_err("duplicate");
        assert!(matches!(err, RuleError::DuplicateRule { ref id } if id == "same"));
    }

    #[test]
    fn rules_without_ids_are_not_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.json", r#"[{"name": "one"}, {"name": "two"}]"#);
        assert_eq!(load_rules(dir.path()).expect("rules").len(), 2);
    }

    #[test]
    fn reports_missing_paths_and_bad_shapes() {
        assert!(matches!(
            load_rules("/definitely/not/here"),
            Err(RuleError::MissingPath(_))
        ));

        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "bad.yaml", "rules:\n  - name: x\n    conditions: 5\n");
        let err = load_rules(dir.path().join("bad.yaml")).expect_err("bad shape");
        match err {
            RuleError::Shape { path, .. } => assert!(path.ends_with("rules[0].conditions"), "{}", path),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
