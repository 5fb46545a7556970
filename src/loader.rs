use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::witness::WitnessMap;

pub fn load_bytecode(path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    File::open(path)?.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Reads a JSON object of `"index": "0x…"` entries.
pub fn load_witness(path: impl AsRef<Path>) -> std::io::Result<WitnessMap> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn write_witness<W: Write>(witness: &WitnessMap, mut writer: W) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, witness)?;
    writeln!(writer)
}
