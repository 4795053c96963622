#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HEADER: &str = "Ora,Data,Chiamante,Chiamato,Durata";

/// A June export mixing every category the built-in table knows.
pub const JUNE_CSV: &str = "\
Ora,Data,Chiamante,Chiamato,Durata
10:15:00,01-06-2024,0511111111,0558494133,00:01:30
10:20:00,01-06-2024,0511111111,3391234567,45
10:25:00,01-06-2024,0511111111,3391234567,10
10:30:00,02-06-2024,0522222222,+33612345678,00:03:01
10:35:00,02-06-2024,0522222222,800123456,00:02:00
10:40:00,03-06-2024,0533333333,899123456,61
10:45:00,03-06-2024,0533333333,12,30
";

pub const JULY_CSV: &str = "\
10:15:00,01-07-2024,0511111111,0612345678,00:05:00
10:20:00,01-07-2024,0522222222,3471234567,120
too,short
";

pub const CLIENT_BOOK: &str = r##"{
  "clients": [
    { "id": "acme", "name": "Acme Srl" },
    { "id": "bruno", "name": "Bruno & Figli", "color": "#ff0000" }
  ],
  "pricing": [
    { "clientId": "acme", "mobileRate": 0.20, "landlineRate": 0.05, "monthlyFlatFee": 20 },
    { "clientId": "bruno", "monthlyFlatFee": 50, "forfaitOnly": true }
  ],
  "globalPricing": { "internationalRate": 0.40 },
  "assignments": [
    { "clientId": "acme", "callerNumber": "0511111111" },
    { "clientId": "acme", "callerNumber": "+39 0544 444444" },
    { "clientId": "acme", "callerNumber": "0555555555" },
    { "clientId": "bruno", "callerNumber": "0522222222" }
  ]
}"##;

pub fn write_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Temp dir holding the two monthly exports and the client book.
pub fn fixture_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "2024-06.csv", JUNE_CSV).unwrap();
    write_file(dir.path(), "2024-07.csv", JULY_CSV).unwrap();
    write_file(dir.path(), "clients.json", CLIENT_BOOK).unwrap();
    dir
}
