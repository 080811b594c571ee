//! Corpus ingestion: chunking, file and directory loading, sample data.
//!
//! Corpus files are plain text; one passage per paragraph, packed into chunks
//! by `TextSplitter`. Directory loading walks recursively and sorts paths so
//! index builds are deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::WorkflowError;
use crate::state::Passage;

/// Paragraph-aware text chunker.
///
/// Paragraphs are packed into chunks of at most `chunk_size` characters;
/// paragraphs longer than a whole chunk are hard-split with `chunk_overlap`
/// characters of carry-over between consecutive pieces.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Creates a splitter; `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Splits text into chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            let para_len = para.chars().count();
            if para_len > self.chunk_size {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                chunks.extend(self.hard_split(para));
                continue;
            }
            if current.is_empty() {
                current.push_str(para);
                current_len = para_len;
            } else if current_len + 2 + para_len <= self.chunk_size {
                current.push_str("\n\n");
                current.push_str(para);
                current_len += 2 + para_len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current.push_str(para);
                current_len = para_len;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    fn hard_split(&self, para: &str) -> Vec<String> {
        let chars: Vec<char> = para.chars().collect();
        let step = (self.chunk_size - self.chunk_overlap).max(1);
        let mut out = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        out
    }
}

/// Loads one text file as corpus passages.
pub fn load_text_file(path: &Path, splitter: &TextSplitter) -> Result<Vec<Passage>, WorkflowError> {
    let text = fs::read_to_string(path)?;
    Ok(splitter.split(&text).into_iter().map(Passage::corpus).collect())
}

/// Loads every `*.{extension}` file under `dir` (recursively, sorted by path)
/// as corpus passages.
pub fn load_directory(
    dir: &Path,
    extension: &str,
    splitter: &TextSplitter,
) -> Result<Vec<Passage>, WorkflowError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry
            .map_err(|e| WorkflowError::ExecutionFailed(format!("walking {}: {e}", dir.display())))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|x| x.to_str()) == Some(extension)
        {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut passages = Vec::new();
    for file in files {
        passages.extend(load_text_file(&file, splitter)?);
    }
    Ok(passages)
}

const SAMPLE_CORPUS: &[&str] = &[
    "Interlibrary loan (abbreviated ILL) is a service that enables patrons of one library to \
     borrow physical materials and receive electronic documents that are held by another \
     library. The service expands library patrons' access to resources beyond their local \
     library's holdings.",
    "After receiving a request from their patron, the borrowing library identifies potential \
     lending libraries with the desired item. The lending library then delivers the item \
     physically or electronically, and the borrowing library receives the item, delivers it \
     to their patron, and if necessary, arranges for its return.",
    "Machine learning is a method of data analysis that automates analytical model building. \
     It is a branch of artificial intelligence based on the idea that systems can learn from \
     data, identify patterns and make decisions with minimal human intervention.",
    "Retrieval-Augmented Generation (RAG) is a technique that combines retrieval systems with \
     generative language models to provide more accurate and contextually relevant responses \
     by incorporating external knowledge sources.",
    "Python is a high-level, interpreted programming language with dynamic semantics. Its \
     high-level built-in data structures, combined with dynamic typing and dynamic binding, \
     make it very attractive for Rapid Application Development.",
    "The solar system consists of the Sun and the objects that orbit it, including eight \
     planets, their moons, and smaller bodies like asteroids and comets. Earth is the third \
     planet from the Sun and the only known planet to harbor life.",
];

/// Writes a small bundled corpus to `path` (one passage per paragraph) and
/// returns the path. Useful for smoke tests and first runs.
pub fn write_sample_corpus(path: &Path) -> Result<PathBuf, WorkflowError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, SAMPLE_CORPUS.join("\n\n"))?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: short paragraphs pack together; packing respects the size cap.
    #[test]
    fn split_packs_paragraphs() {
        let splitter = TextSplitter::new(30, 0);
        let chunks = splitter.split("one fish\n\ntwo fish\n\nred fish blue fish");
        assert_eq!(chunks, vec!["one fish\n\ntwo fish", "red fish blue fish"]);
    }

    /// **Scenario**: an oversized paragraph hard-splits with overlap carry-over.
    #[test]
    fn split_hard_splits_with_overlap() {
        let splitter = TextSplitter::new(10, 3);
        let text = "abcdefghijklmnopqrst";
        let chunks = splitter.split(text);
        assert_eq!(chunks[0], "abcdefghij");
        assert!(chunks[1].starts_with("hij"), "overlap missing: {:?}", chunks[1]);
    }

    /// **Scenario**: blank input produces no chunks.
    #[test]
    fn split_empty_is_empty() {
        let splitter = TextSplitter::new(100, 0);
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("\n\n  \n\n").is_empty());
    }

    /// **Scenario**: sample corpus writes, loads back, and covers its topics.
    #[test]
    fn sample_corpus_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("sample.txt");
        write_sample_corpus(&path).unwrap();

        let splitter = TextSplitter::new(500, 0);
        let passages = load_text_file(&path, &splitter).unwrap();
        assert!(!passages.is_empty());
        let all = passages.iter().map(|p| p.content.as_str()).collect::<String>();
        assert!(all.contains("Interlibrary loan"));
        assert!(all.contains("solar system"));
    }

    /// **Scenario**: directory loading picks only the requested extension, in
    /// sorted order.
    #[test]
    fn load_directory_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "from b").unwrap();
        fs::write(dir.path().join("a.txt"), "from a").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let splitter = TextSplitter::new(100, 0);
        let passages = load_directory(dir.path(), "txt", &splitter).unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].content, "from a");
        assert_eq!(passages[1].content, "from b");
    }
}
