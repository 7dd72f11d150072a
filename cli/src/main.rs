//! docmatch CLI — driving adapter for the docmatch query engine.
//!
//! Subcommands:
//! - `explain <query> <document>` — print the verdict and its reasons as JSON
//! - `filter <query> <documents>` — print the matching documents as a JSON array
//! - `check <query>` — validate a query without a document
//!
//! Files are JSON when the extension is `.json`, YAML otherwise. Both use
//! extended JSON for dates, object ids, patterns and `undefined`.

use std::path::Path;
use std::process;

use docmatch::{Document, Matcher, Value};
use tracing::{debug, Level};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (verbosity, args) = split_verbosity(&args);
    init_logging(verbosity);

    if args.is_empty() {
        print_usage();
        process::exit(1);
    }

    let result = match args[0].as_str() {
        "explain" => cmd_explain(&args[1..]),
        "filter" => cmd_filter(&args[1..]),
        "check" => cmd_check(&args[1..]),
        "--help" | "-h" | "help" => {
            print_usage();
            return;
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_explain(args: &[String]) -> Result<String, String> {
    let [query_path, doc_path] = args else {
        return Err("explain requires a query file and a document file".into());
    };

    let matcher = Matcher::new(load_query(query_path)?);
    let doc = load_value(doc_path)?;

    let result = matcher
        .evaluate(&doc)
        .map_err(|e| format!("query rejected: {e}"))?;
    debug!(matched = result.matched, reasons = result.reasons.len(), "explained");

    serde_json::to_string_pretty(&result).map_err(|e| format!("JSON encode error: {e}"))
}

fn cmd_filter(args: &[String]) -> Result<String, String> {
    let [query_path, docs_path] = args else {
        return Err("filter requires a query file and a documents file".into());
    };

    let matcher = Matcher::new(load_query(query_path)?);
    let docs = match load_value(docs_path)? {
        Value::Array(docs) => docs,
        other => {
            return Err(format!(
                "\"{docs_path}\" must hold an array of documents, found {}",
                other.type_name()
            ))
        }
    };

    let selected = matcher
        .filter(&docs)
        .map_err(|e| format!("query rejected: {e}"))?;
    debug!(total = docs.len(), selected = selected.len(), "filtered");

    let json = serde_json::Value::Array(selected.into_iter().map(serde_json::Value::from).collect());
    serde_json::to_string_pretty(&json).map_err(|e| format!("JSON encode error: {e}"))
}

fn cmd_check(args: &[String]) -> Result<String, String> {
    let [query_path] = args else {
        return Err("check requires a query file".into());
    };

    let query = load_query(query_path)?;
    docmatch::validate(&query).map_err(|e| format!("query invalid: {e}"))?;

    Ok("Query valid".into())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_json(path: &str) -> Result<serde_json::Value, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

fn load_query(path: &str) -> Result<Document, String> {
    Document::try_from(load_json(path)?).map_err(|e| format!("invalid query \"{path}\": {e}"))
}

fn load_value(path: &str) -> Result<Value, String> {
    Value::try_from(load_json(path)?).map_err(|e| format!("invalid document \"{path}\": {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

/// Strip leading `-v` / `-vv` / `--verbose` flags, returning their count.
fn split_verbosity(args: &[String]) -> (u8, &[String]) {
    let mut verbosity = 0u8;
    let mut rest = args;
    while let Some((first, tail)) = rest.split_first() {
        match first.as_str() {
            "-v" | "--verbose" => verbosity = verbosity.saturating_add(1),
            "-vv" => verbosity = verbosity.saturating_add(2),
            _ => break,
        }
        rest = tail;
    }
    (verbosity, rest)
}

fn print_usage() {
    eprintln!(
        "Usage: docmatch [-v|-vv] <command> [options]

Commands:
  explain <query> <document>     Print the match verdict and its reasons
  filter <query> <documents>     Print the documents that match
  check <query>                  Validate a query
  help                           Show this help

Files ending in .json are read as JSON, anything else as YAML."
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Write `content` to a fresh file under the system temp dir.
    fn temp_file(name: &str, content: &str) -> String {
        let dir: PathBuf = std::env::temp_dir().join(format!("docmatch-cli-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn split_verbosity_counts_leading_flags() {
        let all = args(&["-v", "--verbose", "explain", "-v"]);
        let (verbosity, rest) = split_verbosity(&all);
        assert_eq!(verbosity, 2);
        assert_eq!(rest, &all[2..]);

        let (verbosity, rest) = split_verbosity(&[]);
        assert_eq!(verbosity, 0);
        assert!(rest.is_empty());
    }

    #[test]
    fn explain_prints_wire_shape() {
        let query = temp_file("explain-query.yaml", "$or:\n  - { name: Amanda }\n  - { id: 2 }\n");
        let doc = temp_file("explain-doc.json", r#"{"name": "Amanda", "id": 1}"#);

        let output = cmd_explain(&args(&[&query, &doc])).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "match": true,
                "reasons": [{"propertyPath": "name", "queryPath": "$or.[0].name", "type": "EQUAL"}]
            })
        );
    }

    #[test]
    fn explain_requires_two_files() {
        assert!(cmd_explain(&args(&["only-one"])).is_err());
    }

    #[test]
    fn filter_selects_matching_documents() {
        let query = temp_file("filter-query.json", r#"{"name": {"$regex": "^[AB]"}}"#);
        let docs = temp_file(
            "filter-docs.yaml",
            "- { id: 1, name: Amanda }\n- { id: 2, name: Ben }\n- { id: 3, name: Chris }\n",
        );

        let output = cmd_filter(&args(&[&query, &docs])).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"id": 1, "name": "Amanda"}, {"id": 2, "name": "Ben"}])
        );
    }

    #[test]
    fn filter_rejects_non_array_input() {
        let query = temp_file("filter-any.json", "{}");
        let doc = temp_file("filter-single.json", r#"{"id": 1}"#);
        let err = cmd_filter(&args(&[&query, &doc])).unwrap_err();
        assert!(err.contains("array"));
    }

    #[test]
    fn check_reports_invalid_operator() {
        let good = temp_file("check-good.yaml", "age: { $gte: 21 }\n");
        assert_eq!(cmd_check(&args(&[&good])).unwrap(), "Query valid");

        let bad = temp_file("check-bad.yaml", "age: { $between: [1, 2] }\n");
        let err = cmd_check(&args(&[&bad])).unwrap_err();
        assert!(err.contains("$between"), "{err}");
    }

    #[test]
    fn load_query_rejects_non_document() {
        let path = temp_file("not-a-query.json", "[1, 2]");
        assert!(load_query(&path).unwrap_err().contains("expected a document"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_json("/nonexistent/docmatch/query.yaml").unwrap_err();
        assert!(err.starts_with("failed to read"));
    }
}
