//! File tools: read, write and list.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{resolve_path, ParamKind, ParamSpec, Tool};

const READ_FILE_PARAMS: &[ParamSpec] = &[ParamSpec::required(
    "filePath",
    ParamKind::String,
    "Path of the file to read",
)];

const WRITE_FILE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("filePath", ParamKind::String, "Path of the file to write"),
    ParamSpec::required("content", ParamKind::String, "Content to write to the file"),
];

const LIST_DIRECTORY_PARAMS: &[ParamSpec] = &[ParamSpec::required(
    "directoryPath",
    ParamKind::String,
    "Path of the directory to list",
)];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadFileArgs {
    file_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteFileArgs {
    file_path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDirectoryArgs {
    directory_path: String,
}

/// Read the full contents of a text file.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of the file at the given path."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        READ_FILE_PARAMS
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let args: ReadFileArgs = serde_json::from_value(args)?;
        let path = resolve_path(workspace, &args.file_path);

        let content = tokio::fs::read_to_string(&path)
            .await
            .context("Failed to read file")?;

        tracing::info!(path = %args.file_path, bytes = content.len(), "read_file");
        Ok(format!("File content:\n{}", content))
    }
}

/// Write a file, creating missing parent directories.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to the file at the given path, creating parent directories as needed. \
         Overwrites existing files."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        WRITE_FILE_PARAMS
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let args: WriteFileArgs = serde_json::from_value(args)?;
        let path = resolve_path(workspace, &args.file_path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to write file")?;
        }
        tokio::fs::write(&path, &args.content)
            .await
            .context("Failed to write file")?;

        tracing::info!(path = %args.file_path, bytes = args.content.len(), "write_file");
        Ok(format!("File written successfully: {}", args.file_path))
    }
}

/// List the entries of a directory in filesystem order.
pub struct ListDirectory;

#[async_trait]
impl Tool for ListDirectory {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List all files and folders in the given directory."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        LIST_DIRECTORY_PARAMS
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let args: ListDirectoryArgs = serde_json::from_value(args)?;
        let path = resolve_path(workspace, &args.directory_path);

        let mut reader = tokio::fs::read_dir(&path)
            .await
            .context("Failed to list directory")?;
        let mut names = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .context("Failed to list directory")?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        tracing::info!(path = %args.directory_path, entries = names.len(), "list_directory");

        let listing = names
            .iter()
            .map(|name| format!("- {}", name))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!("Directory contents:\n{}", listing))
    }
}
