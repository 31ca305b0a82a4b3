//! Reads image uploads through a capability handle on the parent directory.

use std::io::{self, Read};

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;

use crate::domain::ImageAttachment;

/// Largest upload the shell will read into memory.
const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

pub(super) fn read_image(path: &Utf8Path) -> io::Result<ImageAttachment> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "image path must be a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|error| io::Error::other(format!("open image directory '{parent}': {error}")))?;
    let file = directory
        .open(file_name)
        .map_err(|error| io::Error::other(format!("open image '{path}': {error}")))?;

    let mut bytes = Vec::new();
    file.take(MAX_IMAGE_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|error| io::Error::other(format!("read image '{path}': {error}")))?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > MAX_IMAGE_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("image '{path}' is larger than {MAX_IMAGE_BYTES} bytes"),
        ));
    }
    Ok(ImageAttachment {
        file_name: file_name.to_owned(),
        bytes,
    })
}
