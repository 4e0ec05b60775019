//! Ticker list input and the candidates output file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Reads one ticker symbol per line, trimming whitespace and skipping
/// blank lines.
pub async fn load_tickers<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path.as_ref())
        .await
        .with_context(|| format!("reading tickers file {:?}", path.as_ref()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Accepted tickers from the current run, one symbol per line. The file
/// is truncated when opened and only appended to afterwards.
pub struct CandidatesFile {
    path: PathBuf,
}

impl CandidatesFile {
    pub async fn create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::write(&path, b"")
            .await
            .with_context(|| format!("truncating candidates file {path:?}"))?;
        Ok(Self { path })
    }

    pub async fn append(&self, ticker: &str) -> anyhow::Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening candidates file {:?}", self.path))?;
        file.write_all(format!("{ticker}\n").as_bytes()).await?;
        Ok(())
    }
}
