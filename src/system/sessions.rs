use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::Duration;

use super::sample::{MetricKind, SessionSnapshot};
use super::source::{MetricSource, SourceError};

/// Size of one glibc `struct utmp` record on 64-bit Linux.
pub const RECORD_SIZE: usize = 384;

const USER_PROCESS: i16 = 7;
const HOST_DISPLAY_WIDTH: usize = 15;

const LINE: std::ops::Range<usize> = 8..40;
const USER: std::ops::Range<usize> = 44..76;
const HOST: std::ops::Range<usize> = 76..332;
const SESSION: std::ops::Range<usize> = 336..340;

/// The fields of a utmp record that describe a login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtmpRecord {
    pub kind: i16,
    pub line: String,
    pub user: String,
    pub host: String,
    pub session: i32,
}

impl UtmpRecord {
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < RECORD_SIZE {
            return None;
        }
        let text = |range: std::ops::Range<usize>| {
            let bytes = &raw[range];
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        };

        Some(UtmpRecord {
            kind: i16::from_ne_bytes([raw[0], raw[1]]),
            line: text(LINE),
            user: text(USER),
            host: text(HOST),
            session: i32::from_ne_bytes(raw[SESSION].try_into().ok()?),
        })
    }

    pub fn is_login(&self) -> bool {
        self.kind == USER_PROCESS
    }

    /// `user<TAB>line (origin)`, where origin is the remote host, or the
    /// multiplexer session for a pseudo-terminal with no host.
    pub fn describe(&self) -> String {
        let origin = if self.line.contains("pts") && self.host.is_empty() {
            format!("tmux({}).%0", self.session)
        } else {
            self.host.chars().take(HOST_DISPLAY_WIDTH).collect()
        };
        format!("{}\t{} ({})", self.user, self.line, origin)
    }
}

/// Parses every login in a utmp image; trailing partial records are ignored.
pub fn logins(image: &[u8]) -> Vec<String> {
    image
        .chunks_exact(RECORD_SIZE)
        .filter_map(UtmpRecord::parse)
        .filter(UtmpRecord::is_login)
        .map(|record| record.describe())
        .collect()
}

/// Lists active logins from a utmp file held open for the whole run.
pub struct SessionSource {
    path: PathBuf,
    file: Option<File>,
}

impl SessionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionSource {
            path: path.into(),
            file: None,
        }
    }

    fn read_image(&mut self) -> Result<Vec<u8>, SourceError> {
        let path = &self.path;
        let file = match self.file.take() {
            Some(file) => file,
            None => File::open(path).map_err(|e| SourceError::io(path, e))?,
        };
        let file = self.file.insert(file);

        let mut image = Vec::new();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_end(&mut image))
            .map_err(|e| SourceError::io(path, e))?;
        Ok(image)
    }
}

impl MetricSource for SessionSource {
    type Sample = SessionSnapshot;

    const KIND: MetricKind = MetricKind::Sessions;

    async fn sample(&mut self, _window: Duration) -> Result<SessionSnapshot, SourceError> {
        let image = self.read_image()?;
        Ok(SessionSnapshot::new(logins(&image)))
    }
}
