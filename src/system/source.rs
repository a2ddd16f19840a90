use std::io;
use std::path::PathBuf;

pub const PROC_STAT: &str = "/proc/stat";
pub const PROC_MEMINFO: &str = "/proc/meminfo";

/// Somewhere raw counter text can be read from.
///
/// Every call opens, fully reads and closes the underlying resource; nothing
/// is held between calls.
pub trait CounterSource {
    fn read(&self) -> io::Result<String>;

    /// Human-readable origin used in log and error messages.
    fn describe(&self) -> String;
}

/// A counter file such as `/proc/stat`.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CounterSource for FileSource {
    fn read(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl<S: CounterSource + ?Sized> CounterSource for &S {
    fn read(&self) -> io::Result<String> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
