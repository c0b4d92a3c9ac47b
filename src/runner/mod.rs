//! Invocation of the MAPPINGS executable.
//!
//! The executable is interactive: it is driven by replaying a compiled control
//! script as its standard input, with the lab directory as working directory.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::error::{AppError, RunError};

pub const DEFAULT_LAB_SUBDIR: &str = "mappings520/lab";
pub const DEFAULT_EXECUTABLE: &str = "map52";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Where MAPPINGS is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lab {
    pub dir: PathBuf,
    pub executable: String,
}

impl Lab {
    pub fn new(dir: impl Into<PathBuf>, executable: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            executable: executable.into(),
        }
    }

    /// Resolve the lab from `MAPPINGS_LAB_DIR` / `MAPPINGS_EXE` (a `.env` file is
    /// honored), defaulting to `~/mappings520/lab/map52`.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let dir = match std::env::var_os("MAPPINGS_LAB_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var_os("HOME")
                    .ok_or_else(|| AppError::new(2, "Neither MAPPINGS_LAB_DIR nor HOME is set."))?;
                PathBuf::from(home).join(DEFAULT_LAB_SUBDIR)
            }
        };
        let executable = std::env::var("MAPPINGS_EXE").unwrap_or_else(|_| DEFAULT_EXECUTABLE.to_string());
        Ok(Self::new(dir, executable))
    }

    pub fn executable_path(&self) -> PathBuf {
        self.dir.join(&self.executable)
    }

    /// Default location of the control script for `model_name`.
    pub fn script_path(&self, model_name: &str) -> PathBuf {
        self.dir.join(format!("{model_name}.mv"))
    }
}

/// Outcome of one MAPPINGS invocation.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub model: String,
    pub input_file: PathBuf,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run MAPPINGS on `input_file`, blocking until it exits or `deadline` passes.
pub fn run_mappings(
    lab: &Lab,
    model: &str,
    input_file: &Path,
    deadline: Option<Duration>,
) -> Result<RunReport, RunError> {
    let exe = lab.executable_path();
    if !exe.is_file() {
        return Err(RunError::ExecutableNotFound(exe));
    }
    if !input_file.is_file() {
        return Err(RunError::InputNotFound(input_file.to_path_buf()));
    }
    let input = fs::read(input_file)?;

    tracing::info!(model, exe = %exe.display(), "running MAPPINGS model");
    let started_at = Local::now();
    let start = Instant::now();

    let mut child = Command::new(&exe)
        .current_dir(&lab.dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let feeder = child.stdin.take().map(|mut stdin| {
        thread::spawn(move || -> std::io::Result<()> {
            stdin.write_all(&input)?;
            Ok(())
        })
    });
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let waited = match deadline {
        None => child.wait().map(Some),
        Some(limit) => wait_until(&mut child, start, limit),
    };
    let status = match waited {
        Ok(Some(status)) => status,
        Ok(None) => {
            reap(&mut child, feeder, stdout, stderr);
            tracing::warn!(model, limit = ?deadline, "MAPPINGS timed out and was killed");
            return Err(RunError::Timeout(deadline.unwrap_or_default()));
        }
        Err(err) => {
            reap(&mut child, feeder, stdout, stderr);
            return Err(err.into());
        }
    };

    if let Some(feeder) = feeder {
        // The tool may exit before reading all of its input.
        let _ = join(feeder)?;
    }
    let stdout = collect(stdout)?;
    let stderr = collect(stderr)?;
    let elapsed = start.elapsed();

    tracing::info!(
        model,
        code = ?status.code(),
        elapsed = %crate::report::format_elapsed(elapsed),
        "MAPPINGS model finished"
    );

    Ok(RunReport {
        model: model.to_string(),
        input_file: input_file.to_path_buf(),
        started_at,
        elapsed,
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

fn wait_until(
    child: &mut Child,
    start: Instant,
    limit: Duration,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

type Pipe = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

/// Kill the child, wait for it, and join its pipe threads. Errors are ignored:
/// this only runs on a path that is already failing.
fn reap(child: &mut Child, feeder: Option<JoinHandle<std::io::Result<()>>>, stdout: Pipe, stderr: Pipe) {
    let _ = child.kill();
    let _ = child.wait();
    if let Some(feeder) = feeder {
        let _ = join(feeder);
    }
    let _ = collect(stdout);
    let _ = collect(stderr);
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join<T>(handle: JoinHandle<T>) -> std::io::Result<T> {
    handle
        .join()
        .map_err(|_| std::io::Error::other("pipe thread panicked"))
}

fn collect(handle: Pipe) -> std::io::Result<String> {
    match handle {
        Some(h) => Ok(String::from_utf8_lossy(&join(h)??).into_owned()),
        None => Ok(String::new()),
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::testing::{fake_lab, serial};
    use super::*;

    #[test]
    fn script_is_fed_as_stdin_in_the_lab_dir() {
        let _guard = serial();
        let (dir, lab) = fake_lab("cat > received.mv\necho finished\necho note >&2");
        let input = dir.path().join("n159.mv");
        fs::write(&input, "no    : no offsets\nX   : end model\n").unwrap();

        let report = run_mappings(&lab, "n159", &input, None).unwrap();
        assert!(report.success());
        assert_eq!(report.stdout, "finished\n");
        assert_eq!(report.stderr, "note\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("received.mv")).unwrap(),
            "no    : no offsets\nX   : end model\n"
        );
    }

    #[test]
    fn non_zero_exit_is_reported() {
        let _guard = serial();
        let (dir, lab) = fake_lab("exit 3");
        let input = dir.path().join("m.mv");
        fs::write(&input, "X   : end model\n").unwrap();

        let report = run_mappings(&lab, "m", &input, Some(Duration::from_secs(10))).unwrap();
        assert!(!report.success());
        assert_eq!(report.exit_code, Some(3));
    }

    #[test]
    fn deadline_kills_a_hung_process() {
        let _guard = serial();
        let (dir, lab) = fake_lab("exec sleep 5");
        let input = dir.path().join("m.mv");
        fs::write(&input, "X   : end model\n").unwrap();

        let err = run_mappings(&lab, "m", &input, Some(Duration::from_millis(200))).unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));
    }

    #[test]
    fn timed_out_process_is_reaped() {
        let _guard = serial();
        let (dir, lab) = fake_lab("echo $$ > pid\nexec sleep 5");
        let input = dir.path().join("m.mv");
        fs::write(&input, "X   : end model\n").unwrap();

        let err = run_mappings(&lab, "m", &input, Some(Duration::from_millis(300))).unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));

        // An unreaped child would linger as a zombie and still answer `kill -0`.
        let pid = fs::read_to_string(dir.path().join("pid")).unwrap();
        let alive = Command::new("/bin/sh")
            .args(["-c", &format!("kill -0 {}", pid.trim())])
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(!alive.success());
    }

    #[test]
    fn missing_executable_and_input_are_distinguished() {
        let _guard = serial();
        let dir = tempfile::tempdir().unwrap();
        let lab = Lab::new(dir.path(), "map52");
        let input = dir.path().join("m.mv");
        assert!(matches!(
            run_mappings(&lab, "m", &input, None),
            Err(RunError::ExecutableNotFound(_))
        ));

        let (_dir, lab) = fake_lab("true");
        assert!(matches!(
            run_mappings(&lab, "m", Path::new("/no/such/m.mv"), None),
            Err(RunError::InputNotFound(_))
        ));
    }

    #[test]
    fn script_path_uses_model_name() {
        let lab = Lab::new("/opt/mappings/lab", "map52");
        assert_eq!(lab.script_path("n159"), PathBuf::from("/opt/mappings/lab/n159.mv"));
        assert_eq!(lab.executable_path(), PathBuf::from("/opt/mappings/lab/map52"));
    }
}
