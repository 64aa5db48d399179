//! Diagram export for the compiled workflow
//!
//! The output file's extension picks the format:
//!
//! | extension            | output                                  |
//! |----------------------|-----------------------------------------|
//! | `.mmd`, `.mermaid`   | Mermaid source                          |
//! | `.dot`, `.gv`        | Graphviz DOT source                     |
//! | `.txt`               | ASCII overview                          |
//! | `.png`, `.svg`, `.pdf` | DOT rendered by the Graphviz `dot` tool |
//!
//! Image formats need Graphviz installed (override the executable with
//! `GRAPHVIZ_DOT`). Export is cosmetic: [`save_graph_image`] turns every
//! [`RenderError`] into a warning and the run carries on.

use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use stepgraph_core::{CompiledGraph, GraphState, NodeKey, VisualizationOptions};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Environment variable overriding the Graphviz executable
pub const GRAPHVIZ_ENV: &str = "GRAPHVIZ_DOT";

/// Title drawn on exported diagrams
const DIAGRAM_TITLE: &str = "Research Assistant";

/// Diagram export failures; never fatal to a run
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unsupported diagram format for {path}; use .mmd, .dot, .txt, .png, .svg or .pdf")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer '{program}' is not available: {source}")]
    RendererUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer '{program}' failed with {status}: {stderr}")]
    RendererFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Output format selected from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramFormat {
    Mermaid,
    Dot,
    Ascii,
    /// Rendered by Graphviz; holds the `-T` format name
    Image(&'static str),
}

impl DiagramFormat {
    /// Pick the format for `path` from its extension
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("mmd") | Some("mermaid") => Ok(Self::Mermaid),
            Some("dot") | Some("gv") => Ok(Self::Dot),
            Some("txt") => Ok(Self::Ascii),
            Some("png") => Ok(Self::Image("png")),
            Some("svg") => Ok(Self::Image("svg")),
            Some("pdf") => Ok(Self::Image("pdf")),
            _ => Err(RenderError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Writes diagrams of a compiled graph to files
#[derive(Debug, Clone)]
pub struct DiagramExporter {
    renderer: String,
}

impl DiagramExporter {
    /// Exporter using `$GRAPHVIZ_DOT`, or `dot` from `PATH`
    pub fn new() -> Self {
        Self {
            renderer: std::env::var(GRAPHVIZ_ENV).unwrap_or_else(|_| "dot".to_string()),
        }
    }

    /// Exporter using a specific Graphviz executable
    pub fn with_renderer(renderer: impl Into<String>) -> Self {
        Self {
            renderer: renderer.into(),
        }
    }

    /// Render `graph` into `path`, returning the written path
    pub async fn export<K: NodeKey, S: GraphState>(
        &self,
        graph: &CompiledGraph<K, S>,
        path: &Path,
    ) -> Result<PathBuf, RenderError> {
        let format = DiagramFormat::from_path(path)?;
        tracing::debug!(path = %path.display(), ?format, "Exporting diagram");

        match format {
            DiagramFormat::Mermaid => {
                let source = graph.visualize(&VisualizationOptions::mermaid().with_title(DIAGRAM_TITLE));
                write_text(path, &source).await?;
            }
            DiagramFormat::Dot => {
                let source = graph.visualize(&VisualizationOptions::dot().with_title(DIAGRAM_TITLE));
                write_text(path, &source).await?;
            }
            DiagramFormat::Ascii => {
                write_text(path, &graph.visualize(&VisualizationOptions::ascii())).await?;
            }
            DiagramFormat::Image(kind) => {
                let source = graph.visualize(&VisualizationOptions::dot().with_title(DIAGRAM_TITLE));
                self.render_image(&source, kind, path).await?;
            }
        }

        Ok(path.to_path_buf())
    }

    async fn render_image(&self, dot: &str, kind: &str, path: &Path) -> Result<(), RenderError> {
        let mut child = Command::new(&self.renderer)
            .arg(format!("-T{}", kind))
            .arg("-o")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::RendererUnavailable {
                program: self.renderer.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(dot.as_bytes())
                .await
                .map_err(|source| RenderError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| RenderError::RendererUnavailable {
                program: self.renderer.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::RendererFailed {
                program: self.renderer.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for DiagramExporter {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_text(path: &Path, content: &str) -> Result<(), RenderError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Render `graph` into `path` with the default exporter
pub async fn export_diagram<K: NodeKey, S: GraphState>(
    graph: &CompiledGraph<K, S>,
    path: &Path,
) -> Result<PathBuf, RenderError> {
    DiagramExporter::new().export(graph, path).await
}

/// Export the diagram, downgrading any failure to a warning
pub async fn save_graph_image<K: NodeKey, S: GraphState>(
    exporter: &DiagramExporter,
    graph: &CompiledGraph<K, S>,
    path: &Path,
) -> Option<PathBuf> {
    match exporter.export(graph, path).await {
        Ok(written) => {
            tracing::info!(path = %written.display(), "Diagram saved");
            println!("{} {}", "✓ Graph diagram saved to".green(), written.display());
            Some(written)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not export graph diagram");
            println!("{} {}", "⚠ Could not export graph diagram:".yellow(), e);
            None
        }
    }
}
