// Shared helpers for integration tests.
//
// Provides in-memory stand-ins for the logger, the download transports and
// the OS font facility, plus small filesystem builders, so each integration
// test can run the engine against temporary directories only.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;
use profile_bootstrap::fetch::Transport;
use profile_bootstrap::logging::{Log, TaskStatus};
use profile_bootstrap::resources::font::FontRegistrar;

/// [`Log`] that keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
    tasks: Mutex<Vec<(String, TaskStatus)>>,
}

impl MemoryLog {
    /// Every message logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Messages starting with `tag` (e.g. `"COPY "`).
    pub fn tagged(&self, tag: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with(tag))
            .collect()
    }

    /// Status recorded for each step, in order.
    pub fn tasks(&self) -> Vec<(String, TaskStatus)> {
        self.tasks.lock().unwrap().clone()
    }

    fn push(&self, msg: &str) {
        self.lines.lock().unwrap().push(msg.to_string());
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push(msg);
    }
    fn info(&self, msg: &str) {
        self.push(msg);
    }
    fn debug(&self, msg: &str) {
        self.push(msg);
    }
    fn warn(&self, msg: &str) {
        self.push(msg);
    }
    fn error(&self, msg: &str) {
        self.push(msg);
    }
    fn record_task(&self, name: &str, status: TaskStatus, _message: Option<&str>) {
        self.tasks.lock().unwrap().push((name.to_string(), status));
    }
}

/// Transport serving canned bodies by URL; any other URL fails.
#[derive(Debug, Default)]
pub struct CannedTransport {
    bodies: HashMap<String, Vec<u8>>,
}

impl CannedTransport {
    pub fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }
}

impl Transport for CannedTransport {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn download(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        let body = self
            .bodies
            .get(url)
            .with_context(|| format!("404 for {url}"))?;
        std::fs::write(dest, body)?;
        Ok(())
    }
}

/// [`FontRegistrar`] installing into a plain directory.
#[derive(Debug)]
pub struct DirFonts {
    pub dir: PathBuf,
    pub registered: Mutex<Vec<PathBuf>>,
}

impl DirFonts {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            registered: Mutex::new(Vec::new()),
        }
    }
}

impl FontRegistrar for DirFonts {
    fn fonts_dir(&self) -> &Path {
        &self.dir
    }

    fn register(&self, installed: &Path) -> anyhow::Result<()> {
        self.registered.lock().unwrap().push(installed.to_path_buf());
        Ok(())
    }

    fn broadcast(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Build an in-memory zip archive from `(name, body)` pairs.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(body).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Write `files` (relative path, contents) below `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (name, body) in files {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        std::fs::write(path, body).expect("write file");
    }
}
