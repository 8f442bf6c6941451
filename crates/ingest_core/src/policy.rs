use std::fmt;

use crate::FileDescriptor;

/// 50 MiB, the limit advertised on the upload zone.
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Which submissions are accepted into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPolicy {
    /// Lower-case extensions without the leading dot. Empty means any extension.
    pub allowed_extensions: Vec<String>,
    pub max_size_bytes: Option<u64>,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["csv".to_string(), "xlsx".to_string(), "xls".to_string()],
            max_size_bytes: Some(DEFAULT_MAX_SIZE_BYTES),
        }
    }
}

impl SubmissionPolicy {
    /// Accepts everything except empty names.
    pub fn permissive() -> Self {
        Self {
            allowed_extensions: Vec::new(),
            max_size_bytes: None,
        }
    }

    pub fn check(&self, file: &FileDescriptor) -> Result<(), RejectReason> {
        if file.name.trim().is_empty() {
            return Err(RejectReason::EmptyName);
        }
        if !self.is_extension_allowed(&file.name) {
            return Err(RejectReason::UnsupportedType);
        }
        if let Some(max) = self.max_size_bytes {
            if file.size_bytes > max {
                return Err(RejectReason::TooLarge {
                    max_bytes: max,
                    actual: file.size_bytes,
                });
            }
        }
        Ok(())
    }

    fn is_extension_allowed(&self, name: &str) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        let Some((_, ext)) = name.rsplit_once('.') else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyName,
    DuplicateName,
    UnsupportedType,
    TooLarge { max_bytes: u64, actual: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyName => write!(f, "empty file name"),
            RejectReason::DuplicateName => write!(f, "a file with this name is already tracked"),
            RejectReason::UnsupportedType => write!(f, "unsupported file type"),
            RejectReason::TooLarge { max_bytes, actual } => {
                write!(f, "file too large (max {max_bytes}, actual {actual})")
            }
        }
    }
}
