//! Bearer-credential loading.

use std::path::Path;

use crate::error::ConnectError;

/// Read a bearer token from `path`, trimming surrounding whitespace.
///
/// Never touches the network: a missing, unreadable or effectively empty
/// file is a [`ConnectError::Credential`].
pub fn load(path: &Path) -> Result<String, ConnectError> {
    let raw = std::fs::read_to_string(path).map_err(|e| credential_err(path, e))?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(credential_err(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "credential file is empty"),
        ));
    }
    Ok(token.to_owned())
}

fn credential_err(path: &Path, source: std::io::Error) -> ConnectError {
    ConnectError::Credential {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
