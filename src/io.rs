use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use crate::{error::QueueError, types::QueueResult};

/// Read up to `length` bytes at `offset`. A read past the end of the file
/// returns whatever bytes are there, which may be none.
pub fn read_bytes(path: &Path, offset: u64, length: usize) -> Result<Vec<u8>, QueueError> {
    let mut file = File::open(path).map_err(|e| QueueError::io("open", path, e))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| QueueError::io("seek", path, e))?;

    let mut buffer = vec![0u8; length];
    let mut filled = 0;
    while filled < length {
        let n = file
            .read(&mut buffer[filled..])
            .map_err(|e| QueueError::io("read", path, e))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buffer.truncate(filled);
    Ok(buffer)
}

/// Positional overwrite at `offset`, creating the file if missing and
/// extending it as needed.
pub fn write_bytes(path: &Path, offset: u64, data: &[u8]) -> QueueResult {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| QueueError::io("open", path, e))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| QueueError::io("seek", path, e))?;
    file.write_all(data)
        .map_err(|e| QueueError::io("write", path, e))?;
    Ok(())
}

/// Append to the end of the file, creating it if missing.
pub fn append_bytes(path: &Path, data: &[u8]) -> QueueResult {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| QueueError::io("open", path, e))?;
    file.write_all(data)
        .map_err(|e| QueueError::io("append", path, e))?;
    Ok(())
}

pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

pub fn ensure_file_created(path: &Path) -> QueueResult {
    if !path.exists() {
        File::create(path).map_err(|e| QueueError::io("create", path, e))?;
    }
    Ok(())
}

pub fn ensure_file_deleted(path: &Path) -> QueueResult {
    if path.exists() {
        fs::remove_file(path).map_err(|e| QueueError::io("remove", path, e))?;
    }
    Ok(())
}

pub fn ensure_dir_created(path: &Path) -> QueueResult {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| QueueError::io("mkdir", path, e))?;
    }
    Ok(())
}

pub fn ensure_dir_deleted(path: &Path) -> QueueResult {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| QueueError::io("rmdir", path, e))?;
    }
    Ok(())
}
