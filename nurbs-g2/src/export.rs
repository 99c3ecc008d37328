//! Writing a converted model as G2.
use crate::g2::G2Writer;
use crate::model::{Model, ModelObject};
use crate::session::Session;
use crate::Result;
use log::debug;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Decides where the G2 output of each object goes.
pub trait OutputRouter {
    /// The writer for `object`'s descriptors.
    fn writer_for(&mut self, object: &ModelObject) -> Result<&mut dyn Write>;

    /// Flushes every writer handed out so far.
    fn flush(&mut self) -> Result<()>;
}

/// Routes every object to the same writer.
#[derive(Debug)]
pub struct SingleStream<W: Write> {
    writer: W,
}

impl<W: Write> SingleStream<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputRouter for SingleStream<W> {
    fn writer_for(&mut self, _object: &ModelObject) -> Result<&mut dyn Write> {
        Ok(&mut self.writer)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}

/// Routes named objects to `<directory>/<name>.g2` and unnamed ones to a
/// fallback writer.
///
/// Files are opened in append mode, so objects sharing a name end up in the
/// same file. Path separators in names are replaced by `_`.
pub struct NamedFiles {
    directory: PathBuf,
    fallback: Box<dyn Write>,
    files: HashMap<String, BufWriter<File>>,
}

impl NamedFiles {
    pub fn new(directory: impl AsRef<Path>, fallback: impl Write + 'static) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            fallback: Box::new(fallback),
            files: HashMap::new(),
        }
    }

    /// The file named objects called `name` are written to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file_name: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.directory.join(format!("{file_name}.g2"))
    }
}

impl std::fmt::Debug for NamedFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedFiles")
            .field("directory", &self.directory)
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl OutputRouter for NamedFiles {
    fn writer_for(&mut self, object: &ModelObject) -> Result<&mut dyn Write> {
        let Some(name) = &object.name else {
            return Ok(&mut self.fallback);
        };
        if !self.files.contains_key(name) {
            let path = self.path_for(name);
            debug!("Appending objects named {name:?} to {}", path.display());
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            self.files.insert(name.clone(), BufWriter::new(file));
        }
        match self.files.get_mut(name) {
            Some(writer) => Ok(writer),
            None => Ok(&mut self.fallback),
        }
    }

    fn flush(&mut self) -> Result<()> {
        for writer in self.files.values_mut() {
            writer.flush()?;
        }
        Ok(self.fallback.flush()?)
    }
}

/// Converts `model` object by object and writes the result through `router`.
///
/// Each object is converted completely before any of it is written, so an
/// object that fails leaves no partial output behind. A fatal error stops the
/// export; everything written before it stays.
pub fn export_model(
    session: &mut Session,
    model: &Model,
    router: &mut dyn OutputRouter,
) -> Result<()> {
    for (index, object) in model.iter() {
        let descriptors = session.convert_object(index, object)?.into_descriptors();
        if descriptors.is_empty() {
            continue;
        }
        let mut writer = G2Writer::new(router.writer_for(object)?);
        for descriptor in &descriptors {
            writer.write_object(descriptor)?;
        }
    }
    router.flush()
}
