//! Scratch tokens.
//!
//! Every compile request gets a [`ScratchToken`] that names its scratch file and,
//! in per-request isolation, its working directory. Tokens are ULIDs, unique
//! without coordination, so concurrent requests never collide on a name.

use std::fmt;

use ulid::Ulid;

/// A unique identifier for one compile operation's scratch resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScratchToken(Ulid);

impl ScratchToken {
    /// Generates a new unique token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// File name of the scratch file holding submitted source.
    #[must_use]
    pub fn scratch_file_name(&self) -> String {
        format!("input_{}.txt", self.0)
    }

    /// Directory name of the per-request working directory.
    #[must_use]
    pub fn work_dir_name(&self) -> String {
        format!("run_{}", self.0)
    }
}

impl fmt::Display for ScratchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
