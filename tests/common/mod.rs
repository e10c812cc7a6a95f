#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Writes `<dir>/<name>.zip` holding one entry per `(entry_name, body)`.
pub fn write_archive(dir: &Path, name: &str, entries: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.join(format!("{name}.zip"));
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    for (entry, body) in entries {
        writer.start_file(*entry, FileOptions::default()).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap();
    path
}

pub fn json_entry<'a>(name: &'a str, value: &Value) -> (&'a str, Vec<u8>) {
    (name, serde_json::to_vec(value).unwrap())
}

pub fn chat(assistant: &str, user: &str, original: &str, specified: &str) -> Value {
    json!({
        "role_1": format!("{assistant}_RoleType.ASSISTANT"),
        "role_2": format!("{user}_RoleType.USER"),
        "original_task": original,
        "specified_task": specified,
        "message_0": "hi",
    })
}

/// Writes `<dir>/<name>.zip` with a single stored entry `a.json` holding `{}`
/// whose zip64 extra field declares an uncompressed size of `u64::MAX - 1`.
pub fn write_oversized_entry_archive(dir: &Path, name: &str) -> PathBuf {
    const BODY: &[u8] = b"{}";
    const BODY_CRC32: u32 = 0xa3a6_bf43;
    const ENTRY: &[u8] = b"a.json";

    let mut bytes = Vec::new();

    // Local file header.
    bytes.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    bytes.extend_from_slice(&20u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&BODY_CRC32.to_le_bytes());
    bytes.extend_from_slice(&(BODY.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(BODY.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(ENTRY.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(ENTRY);
    bytes.extend_from_slice(BODY);

    // Central directory header.
    let central_offset = bytes.len() as u32;
    bytes.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    bytes.extend_from_slice(&45u16.to_le_bytes());
    bytes.extend_from_slice(&45u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&BODY_CRC32.to_le_bytes());
    bytes.extend_from_slice(&(BODY.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    bytes.extend_from_slice(&(ENTRY.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&12u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(ENTRY);
    // Zip64 extended information: uncompressed size only.
    bytes.extend_from_slice(&0x0001u16.to_le_bytes());
    bytes.extend_from_slice(&8u16.to_le_bytes());
    bytes.extend_from_slice(&(u64::MAX - 1).to_le_bytes());
    let central_size = bytes.len() as u32 - central_offset;

    // End of central directory.
    bytes.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&central_size.to_le_bytes());
    bytes.extend_from_slice(&central_offset.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());

    let path = dir.join(format!("{name}.zip"));
    std::fs::write(&path, bytes).unwrap();
    path
}
