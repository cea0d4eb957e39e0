//! JSON presentation and document files

use anyhow::Context;
use ebp_reader::{AssetSummary, OnChainData, ReconstructedDocument};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutput<'a> {
    pub asset: &'a AssetSummary,
    pub documents: Vec<DocumentOutput<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub valid: bool,
    pub terminal_hash: &'a str,
    pub height: u64,
    pub timestamp: u64,
    pub chunks: usize,
    pub size: usize,
    /// Document bytes as text; absent for binary documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl<'a> DocumentOutput<'a> {
    fn new(document: &'a ReconstructedDocument, file: Option<PathBuf>) -> Self {
        Self {
            title: &document.title,
            description: &document.description,
            valid: document.valid,
            terminal_hash: document.terminal_hash.as_str(),
            height: document.height,
            timestamp: document.timestamp,
            chunks: document.chunks,
            size: document.data.len(),
            data: document.data_as_str(),
            file,
        }
    }
}

/// `DIR/<asset>-<n>.dat`, numbered from 1 in document order
pub fn document_path(dir: &Path, asset: &AssetSummary, index: usize) -> PathBuf {
    dir.join(format!("{}-{}.dat", asset.asset_id, index + 1))
}

/// Write each document's bytes under `dir`, returning the paths.
pub fn write_documents(dir: &Path, data: &OnChainData) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    data.documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let path = document_path(dir, &data.asset, index);
            std::fs::write(&path, &document.data)
                .with_context(|| format!("writing {}", path.display()))?;
            Ok(path)
        })
        .collect()
}

/// Pretty JSON for a read, with file paths when documents were written.
pub fn render(data: &OnChainData, files: &[PathBuf]) -> anyhow::Result<String> {
    let output = ReadOutput {
        asset: &data.asset,
        documents: data
            .documents
            .iter()
            .enumerate()
            .map(|(index, document)| DocumentOutput::new(document, files.get(index).cloned()))
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
