//! # Shader Hot-Reloading
//!
//! Watches a shader directory and signals the frame loop whenever a `.wgsl`
//! file is created or modified. The frame loop recomposes and validates the
//! kernel before swapping pipelines, so a half-saved or broken file never
//! replaces a working one.
//!
//! Signals are coalesced by the receiver: an editor save that fires several
//! events still triggers a single reload per frame.

use std::path::Path;
use std::sync::mpsc::Sender;

use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tracing::{debug, error, info};

const SHADER_EXTENSION: &str = "wgsl";

fn is_shader_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SHADER_EXTENSION)
}

/// Whether `event` touches a shader in a way that warrants a reload.
fn is_shader_change(event: &Event) -> bool {
    (event.kind.is_modify() || event.kind.is_create()) && event.paths.iter().any(|p| is_shader_file(p))
}

/// Starts watching `dir`. Every relevant change sends `()` on `notify_tx`.
///
/// The returned watcher must be kept alive for as long as reloads are wanted.
pub fn start(dir: &Path, notify_tx: Sender<()>) -> Result<RecommendedWatcher> {
    info!(dir = %dir.display(), "initializing shader hot-reload watcher");

    if !dir.is_dir() {
        anyhow::bail!("shader directory '{}' not found", dir.display());
    }

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
        Ok(event) if is_shader_change(&event) => {
            debug!(paths = ?event.paths, "shader change detected");
            let _ = notify_tx.send(());
        }
        Ok(_) => {}
        Err(e) => error!("file watcher error: {e:?}"),
    })
    .context("failed to create file watcher")?;

    watcher
        .watch(dir, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;

    info!(dir = %dir.display(), "shader watcher active");
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use notify::EventKind;
    use std::path::PathBuf;

    #[test]
    fn wgsl_modifications_trigger_reload() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("shaders/mandelbulb.wgsl"));
        assert!(is_shader_change(&event));
        let event = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("de_f64.wgsl"));
        assert!(is_shader_change(&event));
    }

    #[test]
    fn other_files_and_removals_are_ignored() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("notes.txt"));
        assert!(!is_shader_change(&event));
        let event = Event::new(EventKind::Remove(RemoveKind::File)).add_path(PathBuf::from("mandelbulb.wgsl"));
        assert!(!is_shader_change(&event));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let (tx, _rx) = std::sync::mpsc::channel();
        assert!(start(Path::new("definitely/not/a/shader/dir"), tx).is_err());
    }
}
