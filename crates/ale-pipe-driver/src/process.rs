//! Simulator process supervision
//!
//! Launches the ALE executable with its fifo controller enabled and wires
//! the child's stdout/stdin into a [`Session`].

use crate::session::{Session, SessionConfig};
use crate::transport::{LineReader, StreamReader, StreamWriter, TimedLineReader};
use ale_pipe_core::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for launching the simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// ALE executable (default: `ale` on the PATH)
    pub ale_path: PathBuf,
    /// Cartridge image to load
    pub rom_path: PathBuf,
    /// Directory the simulator runs in
    pub working_dir: Option<PathBuf>,
    /// Simulator stderr goes here; relative paths resolve against
    /// `working_dir` (default: ale_err.txt)
    pub error_log: PathBuf,
    pub disable_color_averaging: bool,
    /// Have the simulator dump every frame as an image into this directory
    pub record_screen_dir: Option<PathBuf>,
    /// Extra flags placed before the ROM path
    pub extra_args: Vec<String>,
    /// Give up on a silent simulator after this many milliseconds
    pub read_timeout_ms: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ale_path: "ale".into(),
            rom_path: PathBuf::new(),
            working_dir: None,
            error_log: "ale_err.txt".into(),
            disable_color_averaging: true,
            record_screen_dir: None,
            extra_args: Vec::new(),
            read_timeout_ms: None,
        }
    }
}

impl SimulatorConfig {
    pub fn new(ale_path: impl Into<PathBuf>, rom_path: impl Into<PathBuf>) -> Self {
        Self {
            ale_path: ale_path.into(),
            rom_path: rom_path.into(),
            ..Self::default()
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_record_screen_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.record_screen_dir = Some(dir.into());
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Command-line arguments, excluding the executable itself
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-game_controller",
            "fifo",
            "-frame_skip",
            "0",
            "-repeat_action_probability",
            "0",
            "-disable_color_averaging",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(self.disable_color_averaging.to_string());

        if let Some(dir) = &self.record_screen_dir {
            args.push("-record_screen_dir".into());
            args.push(dir.display().to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(self.rom_path.display().to_string());
        args
    }

    fn error_log_path(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) if self.error_log.is_relative() => dir.join(&self.error_log),
            _ => self.error_log.clone(),
        }
    }
}

/// Reader half of a supervised session
pub enum PipeReader {
    Blocking(StreamReader<BufReader<ChildStdout>>),
    Timed(TimedLineReader),
}

impl LineReader for PipeReader {
    fn read_line(&mut self) -> Result<Option<String>> {
        match self {
            PipeReader::Blocking(reader) => reader.read_line(),
            PipeReader::Timed(reader) => reader.read_line(),
        }
    }
}

/// Session over a supervised simulator's pipes
pub type PipeSession = Session<PipeReader, StreamWriter<BufWriter<ChildStdin>>>;

/// A running simulator process. The child is killed on [`close`] or drop.
///
/// [`close`]: SimulatorProcess::close
pub struct SimulatorProcess {
    config: SimulatorConfig,
    child: Child,
}

impl SimulatorProcess {
    /// Spawn the simulator
    pub fn spawn(config: SimulatorConfig) -> Result<Self> {
        let log_path = config.error_log_path();
        let error_log = File::create(&log_path).map_err(|e| {
            ProtocolError::Io(format!("Failed to create {}: {}", log_path.display(), e))
        })?;

        let mut command = Command::new(&config.ale_path);
        command
            .args(config.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(error_log));
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        debug!("Launching {:?} {:?}", config.ale_path, config.args());
        let child = command.spawn().map_err(|e| {
            ProtocolError::Io(format!(
                "Failed to start {}: {}. See {} for more info",
                config.ale_path.display(),
                e,
                log_path.display()
            ))
        })?;
        info!("Simulator started (pid {})", child.id());

        Ok(Self { config, child })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Take the child's pipes and build a session over them. Can only be
    /// done once per process.
    pub fn session(&mut self, config: SessionConfig) -> Result<PipeSession> {
        let (stdout, stdin) = match (self.child.stdout.take(), self.child.stdin.take()) {
            (Some(stdout), Some(stdin)) => (stdout, stdin),
            _ => {
                return Err(ProtocolError::Io(
                    "Simulator pipes already handed to a session".into(),
                ));
            }
        };

        let stdout = BufReader::new(stdout);
        let reader = match self.config.read_timeout() {
            Some(timeout) => PipeReader::Timed(TimedLineReader::spawn(stdout, timeout)?),
            None => PipeReader::Blocking(StreamReader(stdout)),
        };
        Ok(Session::new(reader, StreamWriter(BufWriter::new(stdin)), config))
    }

    /// Whether the child has not exited yet
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill the simulator and reap it
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.is_running() {
            info!("Stopping simulator (pid {})", self.child.id());
            self.child.kill()?;
        }
        self.child.wait()?;
        Ok(())
    }
}

impl Drop for SimulatorProcess {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to stop simulator: {}", e);
        }
    }
}
