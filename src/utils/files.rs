use std::path::Path;

use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt, AsyncWriteExt, BufWriter, Lines},
};

/// Read a file from the given path into a list of strings
pub async fn read_file(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let mut r = file_reader(path).await?;
    let mut lines = Vec::new();

    while let Some(line) = r.next_line().await? {
        lines.push(line);
    }

    Ok(lines)
}

/// Write each line to the given path, terminated by a newline
pub async fn write_file<S: AsRef<str>>(path: impl AsRef<Path>, lines: &[S]) -> io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut w = BufWriter::new(File::create(path).await?);

    for line in lines {
        w.write_all(line.as_ref().as_bytes()).await?;
        w.write_all(b"\n").await?;
    }

    w.flush().await
}

async fn file_reader(path: impl AsRef<Path>) -> io::Result<Lines<io::BufReader<File>>> {
    let f = File::open(path).await?;

    Ok(io::BufReader::new(f).lines())
}
