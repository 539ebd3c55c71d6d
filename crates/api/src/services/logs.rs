//! Log export: archive the kernel log directory into a zip file.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Zip every regular file directly under `log_dir` into `<temp_dir>/export/`.
///
/// Returns the path of the written archive. A missing log directory yields an
/// empty archive rather than an error.
pub async fn export_logs(log_dir: PathBuf, temp_dir: PathBuf) -> io::Result<PathBuf> {
    tokio::task::spawn_blocking(move || write_archive(&log_dir, &temp_dir))
        .await
        .map_err(io::Error::other)?
}

fn write_archive(log_dir: &Path, temp_dir: &Path) -> io::Result<PathBuf> {
    let export_dir = temp_dir.join("export");
    std::fs::create_dir_all(&export_dir)?;

    let name = format!("log-{}.zip", Utc::now().format("%Y%m%d%H%M%S%3f"));
    let archive_path = export_dir.join(name);

    let mut zip = ZipWriter::new(File::create(&archive_path)?);
    let options = SimpleFileOptions::default();

    let mut files = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.path())
            .collect::<Vec<_>>(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };
    files.sort();

    for path in &files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        zip.start_file(file_name, options).map_err(io::Error::other)?;
        let bytes = std::fs::read(path)?;
        zip.write_all(&bytes)?;
    }

    zip.finish().map_err(io::Error::other)?;
    tracing::info!(
        archive = %archive_path.display(),
        files = files.len(),
        "Exported kernel logs"
    );
    Ok(archive_path)
}
