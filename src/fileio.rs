//! Code regarding file input (reading source files of the stage-appropriate
//! extension) and output (writing generated artifacts) actions.
//!
//! ## Input
//! `hackc` accepts either a single source file or a directory; a directory
//! is scanned (non-recursively) for all files with the expected extension,
//! in sorted order so that repeated runs over the same sources produce
//! identical output.
//!
//! ## Output
//! Artifacts are written as siblings of their input, named after the input
//! stem with the stage's output extension.

pub mod input {
    use std::{
        fs, io,
        path::{Path, PathBuf},
    };

    /// One source file held in memory, paired with the path it came from.
    #[derive(Debug)]
    pub struct SourceFile {
        path: PathBuf,
        content: String,
    }

    impl SourceFile {
        pub fn load(path: &Path) -> io::Result<Self> {
            Ok(Self {
                path: path.to_path_buf(),
                content: fs::read_to_string(path)?,
            })
        }

        /// Construct a source file from already-loaded text.
        pub fn from_parts(path: impl Into<PathBuf>, content: String) -> Self {
            Self {
                path: path.into(),
                content,
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        pub fn content(&self) -> &str {
            &self.content
        }

        /// The file's stem — the compilation unit name the artifacts of
        /// this file are keyed by (class name, static namespace).
        pub fn unit_name(&self) -> String {
            self.path
                .file_stem()
                .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned())
        }
    }

    /// Collect the source files a path refers to: the file itself, or
    /// every direct child of a directory carrying `extension`, sorted
    /// by name.
    pub fn collect_sources(path: &Path, extension: &str) -> io::Result<Vec<SourceFile>> {
        if !path.is_dir() {
            return Ok(vec![SourceFile::load(path)?]);
        }

        let mut paths: Vec<_> = fs::read_dir(path)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == extension))
            .collect();

        paths.sort();

        paths.iter().map(|path| SourceFile::load(path)).collect()
    }
}

pub mod output {
    use std::{
        fs,
        io::{self, Write},
        path::{Path, PathBuf},
    };

    /// A generated artifact, not yet bound to a location on disk.
    #[derive(Debug)]
    pub struct OutputFile {
        name: String,
        content: String,
    }

    impl OutputFile {
        pub const fn new(name: String, content: String) -> Self {
            Self { name, content }
        }

        pub fn name(&self) -> &str {
            &self.name
        }

        pub fn content(&self) -> &str {
            &self.content
        }
    }

    /// Write an artifact as a sibling of `input`, named after the input
    /// stem with `extension`.
    pub fn generate_sibling(input: &Path, content: &str, extension: &str) -> io::Result<PathBuf> {
        let file_path = input.with_extension(extension);

        fs::File::create(&file_path)?.write_all(content.as_bytes())?;

        Ok(file_path)
    }
}
