//! Profile blob upload.

use std::path::Path;

use anyhow::Context;
use k90_transport::BlobKind;

use super::{open_channel, CommandResult};

/// Upload the contents of `file` as one blob of `kind` to `profile`
pub fn write_blob(device: Option<(u8, u8)>, kind: BlobKind, profile: u8, file: &Path) -> CommandResult {
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    if data.len() > kind.max_len() {
        anyhow::bail!(
            "{} is {} bytes, {} blobs are limited to {} bytes",
            file.display(),
            data.len(),
            kind,
            kind.max_len()
        );
    }
    open_channel(device)?.write_profile_blob(kind, profile, &data)?;
    println!("Wrote {} bytes of {} to profile {}", data.len(), kind, profile);
    Ok(())
}
