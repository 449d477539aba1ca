//! Session management
//!
//! A session is one run of an executable. Each session gets its own directory under
//! `$CTRL_SW_ROOT/<sessions_dir>` holding the log file and a copy of the parameter files the run
//! was started with.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Time at which the session was started, shared by the log formatter.
static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp in session directory names, see
/// https://docs.rs/chrono/0.4/chrono/format/strftime/index.html.
const DIR_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the directory within the session holding the parameter copies.
const PARAMS_DIR_NAME: &str = "params";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Information about the current session
#[derive(Clone, Debug)]
pub struct Session {
    /// Directory of this session
    pub session_root: PathBuf,

    /// Log file of this session
    pub log_file_path: PathBuf,

    /// When the session started
    pub epoch: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (CTRL_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error("A session has already been started in this process")]
    AlreadyStarted,

    #[error("Cannot archive parameter file {0}: {1}")]
    CannotArchiveParams(String, std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the session of this process, creating `{sessions_dir}/{exec_name}_{timestamp}`.
    ///
    /// Only one session may be started per process.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let epoch = Utc::now();
        SESSION_EPOCH
            .try_init_once(|| epoch)
            .map_err(|_| SessionError::AlreadyStarted)?;

        let mut session_root = crate::host::get_ctrl_sw_root()
            .map_err(|_| SessionError::SwRootNotSet)?;
        session_root.push(sessions_dir);
        session_root.push(format!("{}_{}", exec_name, epoch.format(DIR_TIMESTAMP_FORMAT)));

        fs::create_dir_all(&session_root).map_err(SessionError::CannotCreateDir)?;

        let log_file_path = session_root.join(format!("{}.log", exec_name));

        Ok(Session {
            session_root,
            log_file_path,
            epoch,
        })
    }

    /// Copy a parameter file from `$CTRL_SW_ROOT/params` into the session, so the run can be
    /// reproduced later.
    pub fn archive_params(&self, param_file_name: &str) -> Result<(), SessionError> {
        let mut src = crate::host::get_ctrl_sw_root()
            .map_err(|_| SessionError::SwRootNotSet)?;
        src.push(PARAMS_DIR_NAME);
        src.push(param_file_name);

        let dst_dir = self.session_root.join(PARAMS_DIR_NAME);
        fs::create_dir_all(&dst_dir).map_err(SessionError::CannotCreateDir)?;

        fs::copy(&src, dst_dir.join(param_file_name))
            .map(|_| ())
            .map_err(|e| SessionError::CannotArchiveParams(param_file_name.into(), e))
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds elapsed since the session started.
///
/// `NAN` before a session exists, so that early log lines are still printed.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => time::duration_to_seconds(Utc::now() - *e).unwrap_or(std::f64::NAN),
        None => std::f64::NAN,
    }
}
