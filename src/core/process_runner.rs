/*
 * Spawns the external tools and relays their output.
 *
 * A running child has its stdout and stderr attached to the write end of a
 * single anonymous pipe, so both streams arrive interleaved in the order the
 * child wrote them. A background thread reads that pipe line by line and
 * forwards each line over an `mpsc` channel; the UI thread drains the
 * channel from a timer tick via `RunningProcess::poll` and never blocks on
 * the child. Every line is delivered before the final `Exited` event.
 *
 * Short probes (`-v`, `-l`) use `ProcessLauncherOperations::capture`, which
 * runs to completion and keeps the two streams separate.
 */
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

// After the child has exited, how long to keep waiting for the output pipe to
// close. A grandchild that inherited the pipe can hold it open indefinitely.
const STREAM_DRAIN_GRACE: Duration = Duration::from_millis(500);

const REDACTED: &str = "********";

#[derive(Debug)]
pub enum RunnerError {
    Spawn { program: PathBuf, source: io::Error },
    Io(io::Error),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::Spawn { program, source } => {
                write!(f, "Failed to start {}: {source}", program.display())
            }
            RunnerError::Io(e) => write!(f, "Process I/O error: {e}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunnerError::Spawn { source, .. } => Some(source),
            RunnerError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for RunnerError {
    fn from(err: io::Error) -> Self {
        RunnerError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;

// A literal argument vector; it is never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ProcessInvocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        ProcessInvocation {
            program: program.into(),
            args,
        }
    }

    /*
     * Renders the invocation for the log view. The value following `-p` is a
     * certificate password and is masked. Tokens containing whitespace are
     * quoted so the echoed line stays readable.
     */
    pub fn display_redacted(&self) -> String {
        let mut parts = vec![quote_token(&self.program.to_string_lossy())];
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                parts.push(REDACTED.to_string());
                mask_next = false;
                continue;
            }
            mask_next = arg == "-p";
            parts.push(quote_token(arg));
        }
        parts.join(" ")
    }
}

fn quote_token(value: &str) -> String {
    if value.contains(' ') || value.contains('\t') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/*
 * How a child ended. `code` is `None` when the child was terminated by a
 * signal, which includes a cancellation.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => code.to_string(),
            None => "terminated".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Line(String),
    Exited(ExitOutcome),
}

pub trait RunningProcess: Send {
    // Returns everything that arrived since the last call. `Exited` is
    // returned exactly once, after all output lines.
    fn poll(&mut self) -> Vec<ProcessEvent>;

    fn cancel(&mut self) -> Result<()>;
}

pub trait ProcessLauncherOperations: Send + Sync {
    fn spawn(&self, invocation: &ProcessInvocation) -> Result<Box<dyn RunningProcess>>;

    fn capture(&self, invocation: &ProcessInvocation) -> Result<CapturedOutput>;
}

enum ReaderMessage {
    Line(String),
    Closed,
}

struct ChildProcess {
    child: Child,
    events: Receiver<ReaderMessage>,
    stream_closed: bool,
    exit_seen: Option<(ExitOutcome, Instant)>,
    finished: bool,
}

impl RunningProcess for ChildProcess {
    fn poll(&mut self) -> Vec<ProcessEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        while !self.stream_closed {
            match self.events.try_recv() {
                Ok(ReaderMessage::Line(line)) => events.push(ProcessEvent::Line(line)),
                Ok(ReaderMessage::Closed) | Err(TryRecvError::Disconnected) => {
                    self.stream_closed = true;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if self.exit_seen.is_none() {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    log::debug!("ProcessRunner: Child exited with {status}.");
                    self.exit_seen = Some((ExitOutcome { code: status.code() }, Instant::now()));
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("ProcessRunner: Waiting for child failed: {e}");
                    self.exit_seen = Some((ExitOutcome { code: None }, Instant::now()));
                }
            }
        }

        if let Some((outcome, seen_at)) = self.exit_seen {
            if self.stream_closed || seen_at.elapsed() >= STREAM_DRAIN_GRACE {
                if !self.stream_closed {
                    log::warn!("ProcessRunner: Output pipe still open after exit; giving up on it.");
                }
                self.finished = true;
                events.push(ProcessEvent::Exited(outcome));
            }
        }
        events
    }

    fn cancel(&mut self) -> Result<()> {
        if self.exit_seen.is_some() {
            return Ok(());
        }
        log::info!("ProcessRunner: Killing child process {}.", self.child.id());
        self.child.kill()?;
        Ok(())
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        if self.exit_seen.is_none() {
            if let Ok(None) = self.child.try_wait() {
                log::warn!(
                    "ProcessRunner: Dropping running child {}; killing it.",
                    self.child.id()
                );
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn spawn_output_reader<R: Read + Send + 'static>(
    reader: R,
    sender: Sender<ReaderMessage>,
) -> io::Result<()> {
    thread::Builder::new()
        .name("process-output".to_string())
        .spawn(move || {
            let mut buf = BufReader::new(reader);
            let mut raw = Vec::new();
            loop {
                raw.clear();
                match buf.read_until(b'\n', &mut raw) {
                    Ok(0) => break,
                    Ok(_) => {
                        if sender.send(ReaderMessage::Line(decode_line(&raw))).is_err() {
                            return;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        log::warn!("ProcessRunner: Reading child output failed: {e}");
                        break;
                    }
                }
            }
            let _ = sender.send(ReaderMessage::Closed);
        })?;
    Ok(())
}

#[cfg(windows)]
fn configure_child_process(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x08000000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_child_process(_command: &mut Command) {}

pub struct CoreProcessLauncher {}

impl CoreProcessLauncher {
    pub fn new() -> Self {
        CoreProcessLauncher {}
    }
}

impl Default for CoreProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncherOperations for CoreProcessLauncher {
    fn spawn(&self, invocation: &ProcessInvocation) -> Result<Box<dyn RunningProcess>> {
        log::debug!(
            "ProcessRunner: Spawning {:?} with {} argument(s).",
            invocation.program,
            invocation.args.len()
        );
        let (reader, writer) = io::pipe()?;
        let writer_for_stderr = writer.try_clone()?;

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(writer_for_stderr);
        configure_child_process(&mut command);

        let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        // The command still owns copies of the pipe's write end; the reader
        // only sees end-of-stream once they are closed.
        drop(command);

        let (sender, receiver) = mpsc::channel();
        if let Err(e) = spawn_output_reader(reader, sender) {
            log::error!("ProcessRunner: Could not start output reader thread: {e}");
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunnerError::Io(e));
        }

        Ok(Box::new(ChildProcess {
            child,
            events: receiver,
            stream_closed: false,
            exit_seen: None,
            finished: false,
        }))
    }

    fn capture(&self, invocation: &ProcessInvocation) -> Result<CapturedOutput> {
        log::debug!(
            "ProcessRunner: Capturing output of {}",
            invocation.display_redacted()
        );
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::null());
        configure_child_process(&mut command);
        let output = command.output().map_err(|source| RunnerError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}
