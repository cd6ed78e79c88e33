//! Aggregation of processed files into output artifacts.
//!
//! Script outputs are concatenated, in input order, into a single bundle.
//! Style outputs are concatenated into one extracted stylesheet, or kept as
//! one stylesheet per source when styles are split. Each fragment in a merged
//! artifact is preceded by a `/* <relative path> */` marker.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::process::TransformedOutput;
use crate::rule::normalize_path;
use crate::transform::AssetKind;
use crate::{Error, Result};

/// Naming of the artifacts produced by [`aggregate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub bundle_filename: String,
    pub style_filename: String,
    /// Emit one stylesheet per style source instead of a single merged one.
    pub split_styles: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            bundle_filename: "index.bundle.js".to_string(),
            style_filename: "main.css".to_string(),
            split_styles: false,
        }
    }
}

/// A named output file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub name: String,
    pub kind: AssetKind,
    pub content: Vec<u8>,
}

impl OutputArtifact {
    /// Where this artifact lands under `out_dir`.
    pub fn destination(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(&self.name)
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// The artifacts of one build: the script bundle plus extracted stylesheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub bundle: OutputArtifact,
    pub stylesheets: Vec<OutputArtifact>,
}

impl ArtifactSet {
    /// Bundle first, then stylesheets in order.
    pub fn iter(&self) -> impl Iterator<Item = &OutputArtifact> {
        std::iter::once(&self.bundle).chain(self.stylesheets.iter())
    }

    pub fn get(&self, name: &str) -> Option<&OutputArtifact> {
        self.iter().find(|artifact| artifact.name == name)
    }

    pub fn total_size(&self) -> usize {
        self.iter().map(OutputArtifact::size).sum()
    }
}

/// Merge processed outputs into an [`ArtifactSet`], preserving input order.
///
/// The bundle is always present, even when no scripts were processed.
///
/// # Errors
///
/// [`Error::ArtifactConflict`] when two artifacts would share a name, e.g.
/// `theme.scss` and `theme.sass` with split styles.
pub fn aggregate<O: Borrow<TransformedOutput>>(
    outputs: &[O],
    options: &OutputOptions,
) -> Result<ArtifactSet> {
    let mut bundle = Vec::new();
    let mut merged_styles = Vec::new();
    let mut stylesheets = Vec::new();
    let mut claimed = NameClaims::new(&options.bundle_filename);

    for output in outputs {
        let output = output.borrow();
        match output.kind {
            AssetKind::Script => append_fragment(&mut bundle, output),
            AssetKind::Style if options.split_styles => {
                let name = split_style_name(&output.path);
                claimed.claim(&name, &output.path)?;
                stylesheets.push(OutputArtifact {
                    name,
                    kind: AssetKind::Style,
                    content: output.content.clone(),
                });
            }
            AssetKind::Style => append_fragment(&mut merged_styles, output),
        }
    }

    if !options.split_styles && !merged_styles.is_empty() {
        claimed.claim(&options.style_filename, Path::new(&options.style_filename))?;
        stylesheets.push(OutputArtifact {
            name: options.style_filename.clone(),
            kind: AssetKind::Style,
            content: merged_styles,
        });
    }

    Ok(ArtifactSet {
        bundle: OutputArtifact {
            name: options.bundle_filename.clone(),
            kind: AssetKind::Script,
            content: bundle,
        },
        stylesheets,
    })
}

/// Artifact names taken so far, with the source that took each one.
struct NameClaims(HashMap<String, PathBuf>);

impl NameClaims {
    fn new(bundle: &str) -> Self {
        Self(HashMap::from([(bundle.to_string(), PathBuf::from(bundle))]))
    }

    fn claim(&mut self, name: &str, source: &Path) -> Result<()> {
        if let Some(first) = self.0.get(name) {
            return Err(Error::ArtifactConflict {
                name: name.to_string(),
                first: first.clone(),
                second: source.to_path_buf(),
            });
        }
        self.0.insert(name.to_string(), source.to_path_buf());
        Ok(())
    }
}

fn append_fragment(target: &mut Vec<u8>, output: &TransformedOutput) {
    if !target.is_empty() {
        target.push(b'\n');
    }
    target.extend_from_slice(format!("/* {} */\n", normalize_path(&output.path)).as_bytes());
    target.extend_from_slice(&output.content);
    if !output.content.ends_with(b"\n") {
        target.push(b'\n');
    }
}

fn split_style_name(path: &Path) -> String {
    normalize_path(&path.with_extension("css"))
}
