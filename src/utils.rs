use std::path::{Path, PathBuf};

use byte_unit::{Byte, UnitType};
use dirs_next as dirs;

/// `~/reports/image-vuln-report.json (12.34 KB)`: where a file landed and how big it is.
pub fn describe_file(path: &Path, bytes: u64) -> String {
    format!("{} ({})", shorten_home(path).display(), human_size(bytes))
}

fn human_size(bytes: u64) -> String {
    if bytes == 0 {
        return "empty".to_string();
    }
    let unit = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Decimal);
    format!("{unit:#.2}")
}

/// Paths under the home directory are shown relative to `~`.
pub fn shorten_home(path: &Path) -> PathBuf {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) => Path::new("~").join(rest),
            Err(_) => path.to_path_buf(),
        },
        None => path.to_path_buf(),
    }
}
