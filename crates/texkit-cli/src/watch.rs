use crate::report;
use anyhow::Context;
use log::{debug, error};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use texkit_build::{BuildRequest, Orchestrator};
use texkit_core::Environment;

const WATCHED_EXTENSIONS: [&str; 4] = ["tex", "bib", "sty", "cls"];
// Editors write a burst of events per save.
const SETTLE: Duration = Duration::from_millis(300);

/// Builds once, then rebuilds on every relevant change until the process is
/// interrupted. Build failures are reported and the loop carries on.
pub fn run(
    env: &Environment,
    orchestrator: &Orchestrator,
    request: &BuildRequest,
) -> anyhow::Result<()> {
    report(orchestrator.build(env, request));

    let source = if request.source.is_absolute() {
        request.source.clone()
    } else {
        env.base_dir.join(&request.source)
    };
    let watch_dir = source
        .parent()
        .context("Source document has no parent directory")?
        .to_path_buf();

    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher
        .watch(&watch_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", watch_dir.display()))?;
    println!("Watching {} for changes (Ctrl+C to stop)", watch_dir.display());

    let layout = orchestrator.layout();
    let ignored = [layout.build.as_path(), layout.logs.as_path()];

    while let Ok(res) = rx.recv() {
        match res {
            Ok(event) if is_relevant(&event, &ignored) => {
                debug!("Change detected: {:?}", event.paths);
                while rx.recv_timeout(SETTLE).is_ok() {}
                report(orchestrator.build(env, request));
            }
            Ok(_) => {}
            Err(e) => error!("watch error: {:?}", e),
        }
    }
    Ok(())
}

/// A create/modify of a TeX source outside the output directories.
fn is_relevant(event: &Event, ignored: &[&Path]) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    event.paths.iter().any(|path| {
        let watched = path
            .extension()
            .map_or(false, |ext| WATCHED_EXTENSIONS.iter().any(|w| ext == *w));
        watched && !ignored.iter().any(|dir| path.starts_with(dir))
    })
}
