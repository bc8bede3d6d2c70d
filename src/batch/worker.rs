use crate::cli::{EXIT_CLEAN, EXIT_VIOLATIONS};
use crate::render;
use crate::scan::{self, ScanError};
use crate::util;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, error, info, trace};

/// Failure of a job; a scan that finds violations is not one
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to execute scan for {}: {source}", file.display())]
    Spawn {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan of {} exited with {status}", file.display())]
    ExitStatus { file: PathBuf, status: String },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Failed to render report for {}: {source}", file.display())]
    Render {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Scan task for {} panicked", file.display())]
    Panicked { file: PathBuf },

    #[error("Failed to write artifact {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Both renderings for one file plus any execution errors met producing them
#[derive(Debug, Default)]
pub struct JobOutput {
    pub structured: String,
    pub human: String,
    pub violations_found: bool,
    pub errors: Vec<JobError>,
}

/// Produces the structured and human reports for one file
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, file: &Path) -> JobOutput;
}

/// Scans once in this process and derives both renderings from the result
pub struct InProcessRunner;

#[async_trait]
impl JobRunner for InProcessRunner {
    async fn run(&self, file: &Path) -> JobOutput {
        let path = file.to_path_buf();
        let scanned = tokio::task::spawn_blocking(move || scan::scan_file(&path)).await;

        let result = match scanned {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                return JobOutput {
                    errors: vec![e.into()],
                    ..Default::default()
                };
            }
            Err(_) => {
                return JobOutput {
                    errors: vec![JobError::Panicked {
                        file: file.to_path_buf(),
                    }],
                    ..Default::default()
                };
            }
        };

        let mut output = JobOutput {
            human: render::human(&result),
            violations_found: result.has_violations(),
            ..Default::default()
        };
        match render::structured_json(&result) {
            Ok(json) => output.structured = json,
            Err(source) => output.errors.push(JobError::Render {
                file: file.to_path_buf(),
                source,
            }),
        }
        output
    }
}

/// Re-invokes an a11yscan executable once per output format
pub struct ProcessRunner {
    exe: PathBuf,
}

/// Result of one external pass
enum PassOutcome {
    Clean,
    ViolationsFound,
}

impl ProcessRunner {
    pub fn new(exe: PathBuf) -> Self {
        Self { exe }
    }

    /// Runner that re-invokes the running executable
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    async fn pass(&self, file: &Path, structured: bool) -> (String, Result<PassOutcome, JobError>) {
        let mut command = Command::new(&self.exe);
        command.arg("scan").arg(file);
        if structured {
            command.arg("--structured");
        }
        trace!("Running {:?}", command);

        let output = match command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
        {
            Ok(output) => output,
            Err(source) => {
                return (
                    String::new(),
                    Err(JobError::Spawn {
                        file: file.to_path_buf(),
                        source,
                    }),
                );
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let outcome = classify_exit(output.status.code()).ok_or_else(|| {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                debug!("stderr of scan for {}: {}", file.display(), stderr.trim());
            }
            JobError::ExitStatus {
                file: file.to_path_buf(),
                status: output.status.to_string(),
            }
        });
        (stdout, outcome)
    }
}

/// Map a single-file exit code to a scan outcome; `None` means execution error
fn classify_exit(code: Option<i32>) -> Option<PassOutcome> {
    match code {
        Some(EXIT_CLEAN) => Some(PassOutcome::Clean),
        Some(EXIT_VIOLATIONS) => Some(PassOutcome::ViolationsFound),
        _ => None,
    }
}

#[async_trait]
impl JobRunner for ProcessRunner {
    async fn run(&self, file: &Path) -> JobOutput {
        let mut output = JobOutput::default();

        // The human pass starts only after the structured pass has exited
        let passes = [true, false];
        for structured in passes {
            let (stdout, outcome) = self.pass(file, structured).await;
            match outcome {
                Ok(PassOutcome::ViolationsFound) => output.violations_found = true,
                Ok(PassOutcome::Clean) => {}
                Err(e) => output.errors.push(e),
            }
            if structured {
                output.structured = stdout;
            } else {
                output.human = stdout;
            }
        }
        output
    }
}

/// Where a batch writes its per-file artifacts
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    dir: PathBuf,
}

impl ArtifactLayout {
    /// Subdirectory holding the human-readable reports
    pub const HUMAN_DIR: &'static str = "reports";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the artifact directory and its human-report subdirectory
    pub fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.dir.join(Self::HUMAN_DIR))
    }

    pub fn structured_path(&self, file: &Path) -> PathBuf {
        self.dir.join(format!("{}.json", util::artifact_stem(file)))
    }

    pub fn human_path(&self, file: &Path) -> PathBuf {
        self.dir
            .join(Self::HUMAN_DIR)
            .join(format!("{}.txt", util::artifact_stem(file)))
    }
}

/// Completed job
#[derive(Debug)]
pub struct JobResult {
    pub job_id: usize,
    pub file: PathBuf,
    pub violations_found: bool,
    pub errors: Vec<JobError>,
    pub elapsed_secs: f64,
}

impl JobResult {
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Run one job: produce both reports for `file` and write them as artifacts
///
/// Artifacts are written even when a pass failed, so partial output survives.
pub async fn worker(
    job_id: usize,
    file: PathBuf,
    runner: Arc<dyn JobRunner>,
    artifacts: Arc<ArtifactLayout>,
) -> JobResult {
    let start = std::time::Instant::now();
    info!("[Job {}] Running: {}", job_id, file.display());

    let output = runner.run(&file).await;
    let mut errors = output.errors;

    for (path, content) in [
        (artifacts.structured_path(&file), output.structured),
        (artifacts.human_path(&file), output.human),
    ] {
        trace!("[Job {}] Writing {}", job_id, path.display());
        if let Err(source) = tokio::fs::write(&path, content).await {
            errors.push(JobError::Artifact { path, source });
        }
    }

    for e in &errors {
        error!("[Job {}] {}", job_id, e);
    }

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "[Job {}] Completed {} ({:.2}s, {})",
        job_id,
        file.display(),
        elapsed,
        if errors.is_empty() { "ok" } else { "failed" }
    );

    JobResult {
        job_id,
        file,
        violations_found: output.violations_found,
        errors,
        elapsed_secs: elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_exit() {
        assert!(matches!(classify_exit(Some(0)), Some(PassOutcome::Clean)));
        assert!(matches!(classify_exit(Some(3)), Some(PassOutcome::ViolationsFound)));
        assert!(classify_exit(Some(1)).is_none());
        assert!(classify_exit(Some(2)).is_none());
        assert!(classify_exit(None).is_none());
    }

    #[test]
    fn test_artifact_paths() {
        let layout = ArtifactLayout::new("/tmp/out");
        let file = Path::new("web/src/Button.tsx");
        assert_eq!(layout.structured_path(file), PathBuf::from("/tmp/out/Button.tsx.json"));
        assert_eq!(
            layout.human_path(file),
            PathBuf::from("/tmp/out/reports/Button.tsx.txt")
        );
    }

    #[tokio::test]
    async fn test_in_process_runner_renders_both() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "<html><head></head></html>").unwrap();

        let output = InProcessRunner.run(&file).await;
        assert!(output.errors.is_empty());
        assert!(output.violations_found);
        let json: serde_json::Value = serde_json::from_str(&output.structured).unwrap();
        assert_eq!(json["summary"]["errors"], 2);
        assert!(output.human.contains("html-missing-lang"));
    }

    #[tokio::test]
    async fn test_in_process_runner_missing_file() {
        let output = InProcessRunner.run(Path::new("/nonexistent/a.css")).await;
        assert_eq!(output.errors.len(), 1);
        assert!(matches!(output.errors[0], JobError::Scan(ScanError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_process_runner_spawn_failure_fails_both_passes() {
        let runner = ProcessRunner::new(PathBuf::from("/nonexistent/a11yscan"));
        let output = runner.run(Path::new("x.css")).await;
        assert_eq!(output.errors.len(), 2);
        assert!(output.errors.iter().all(|e| matches!(e, JobError::Spawn { .. })));
    }

    /// Stand-in executable following the single-file exit code contract
    #[cfg(unix)]
    fn stub_scanner(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let exe = dir.join("a11yscan-stub");
        std::fs::write(
            &exe,
            "#!/bin/sh\n\
             case \"$2\" in\n\
               *dirty*) echo \"found $3\"; exit 3 ;;\n\
               *broken*) echo \"boom\" >&2; exit 1 ;;\n\
               *) echo \"clean $3\"; exit 0 ;;\n\
             esac\n",
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        exe
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_exit_codes_are_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(stub_scanner(dir.path()));

        let clean = runner.run(Path::new("ok.css")).await;
        assert!(clean.errors.is_empty());
        assert!(!clean.violations_found);
        assert_eq!(clean.structured.trim(), "clean --structured");
        assert_eq!(clean.human.trim(), "clean");

        let dirty = runner.run(Path::new("dirty.css")).await;
        assert!(dirty.errors.is_empty());
        assert!(dirty.violations_found);
        assert_eq!(dirty.structured.trim(), "found --structured");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_other_exit_fails_both_passes() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(stub_scanner(dir.path()));

        let output = runner.run(Path::new("broken.css")).await;
        assert_eq!(output.errors.len(), 2);
        assert!(output.errors.iter().all(|e| matches!(e, JobError::ExitStatus { .. })));
        assert!(!output.violations_found);
    }

    #[tokio::test]
    async fn test_worker_writes_artifacts_even_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Arc::new(ArtifactLayout::new(dir.path().join("out")));
        layout.prepare().unwrap();

        let missing = dir.path().join("gone.html");
        let result = worker(7, missing.clone(), Arc::new(InProcessRunner), layout.clone()).await;
        assert!(result.failed());
        assert_eq!(result.job_id, 7);
        assert!(layout.structured_path(&missing).exists());
        assert!(layout.human_path(&missing).exists());
    }

    #[tokio::test]
    async fn test_worker_missing_artifact_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ok.css");
        std::fs::write(&file, "a:focus { outline: 2px solid; }").unwrap();
        let layout = Arc::new(ArtifactLayout::new(dir.path().join("not-prepared")));

        let result = worker(0, file, Arc::new(InProcessRunner), layout).await;
        assert!(result.failed());
        assert_eq!(result.errors.len(), 2);
        assert!(!result.violations_found);
    }
}
