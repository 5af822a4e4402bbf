use crate::{
    atoms::Atom,
    parser::ParseError,
    program::{SyntaxError, compile},
    reader::{Extraction, execute, execute_with_file_type},
};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

/// Failure of a compile-then-traverse run, tagged with the phase that failed.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("compile: {0}")]
    Compile(#[from] SyntaxError),
    #[error("decode: {0}")]
    Decode(#[from] ParseError),
    #[error("open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Compile `program` and run it against `r`.
///
/// The program is compiled before the source is touched, so a syntax error
/// never consumes any input.
///
/// # Example
/// ```no_run
/// use std::fs::File;
///
/// let mut file = File::open("clip.mov")?;
/// let atoms = qtwalk::extract(&mut file, "step into moov\nread mvhd")?;
/// if let Some(mvhd) = atoms[0].as_movie_header() {
///     println!("created {}", mvhd.creation_time());
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn extract<R: Read>(r: &mut R, program: &str) -> Result<Vec<Atom>, Error> {
    let directives = compile(program)?;
    Ok(execute(r, &directives)?)
}

/// Open `path` and run `program` over it, keeping the file type as well.
pub fn extract_file(path: impl AsRef<Path>, program: &str) -> Result<Extraction, Error> {
    let directives = compile(program)?;
    let path = path.as_ref();
    let f = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut r = BufReader::new(f);
    Ok(execute_with_file_type(&mut r, &directives)?)
}
