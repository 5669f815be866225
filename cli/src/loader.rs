use anyhow::{bail, Context, Result};
use search_core::{DocId, DocumentStatus, SearchEngine};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub id: DocId,
    #[serde(alias = "body")]
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

/// `.json` and `.jsonl` files under `input`, or `input` itself if it is a file.
/// Directory entries are returned in path order.
pub fn input_files(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")))
        .collect();
    files.sort();
    files
}

/// Add every document found under `input` to `engine`. Returns the number added.
pub fn load_documents(engine: &mut SearchEngine, input: &Path) -> Result<usize> {
    let mut added = 0;
    for file in input_files(input) {
        let docs = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)?
        } else {
            read_json(&file)?
        };
        for doc in docs {
            engine
                .add_document(doc.id, &doc.text, doc.status, &doc.ratings)
                .with_context(|| format!("adding document {} from {}", doc.id, file.display()))?;
            added += 1;
        }
        tracing::debug!(file = %file.display(), "loaded file");
    }
    tracing::info!(added, "loaded documents");
    Ok(added)
}

fn read_jsonl(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let mut docs = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid document", file.display(), n + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

fn read_json(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value = serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr.into_iter().map(serde_json::from_value).collect::<Result<Vec<InputDoc>, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        other => bail!("{}: expected a document object or an array of them, found {other}", file.display()),
    };
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_json_and_jsonl_from_a_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("a.jsonl"),
            "{\"id\": 1, \"text\": \"cat in the city\", \"ratings\": [1, 2]}\n\n{\"id\": 2, \"body\": \"dog\", \"status\": \"BANNED\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("nested/b.json"), "[{\"id\": 3, \"text\": \"city cat\"}]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut engine = SearchEngine::from_stop_words_text("in the").unwrap();
        assert_eq!(load_documents(&mut engine, dir.path()).unwrap(), 3);
        assert_eq!(engine.document_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(engine.document_status(2), Some(DocumentStatus::Banned));
        assert_eq!(engine.find_top_documents("cat").unwrap().len(), 2);
    }

    #[test]
    fn reports_the_bad_line() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("docs.jsonl");
        fs::write(&file, "{\"id\": 1, \"text\": \"ok\"}\nnot json\n").unwrap();
        let mut engine = SearchEngine::from_stop_words_text("").unwrap();
        let err = load_documents(&mut engine, &file).unwrap_err();
        assert!(format!("{err:#}").contains("docs.jsonl:2"));
    }

    #[test]
    fn rejects_json_that_is_not_documents() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("scalar.json");
        fs::write(&file, "\"just a string\"").unwrap();
        let mut engine = SearchEngine::from_stop_words_text("").unwrap();
        let err = load_documents(&mut engine, &file).unwrap_err();
        assert!(format!("{err:#}").contains("scalar.json"));
        assert_eq!(engine.document_count(), 0);
    }

    #[test]
    fn duplicate_ids_fail_loading() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("docs.json");
        fs::write(&file, "[{\"id\": 1, \"text\": \"a\"}, {\"id\": 1, \"text\": \"b\"}]").unwrap();
        let mut engine = SearchEngine::from_stop_words_text("").unwrap();
        assert!(load_documents(&mut engine, &file).is_err());
        assert_eq!(engine.document_count(), 1);
    }
}
