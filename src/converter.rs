//! Single-file to multipart conversion.
//!
//! [`convert`] is the stream-level pipeline: copy the header once, then for every
//! tensor read frame and data, classify, partition, and append shard `i` to part `i`.
//! [`split_file`] wraps it with backup handling and the on-disk naming scheme:
//! header at `<base>`, parts at `<base>.0 .. <base>.{N-1}`.

use crate::config::SplitConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{ConvertError, Result};
use crate::model::io::{read_bytes, write_bytes};
use crate::model::{
    ensure_ggml, read_frame, read_header, write_frame, BlockLayouts, Encoding, Hyperparameters,
    VocabSummary,
};
use crate::split::{partition, SplitAxis};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What happened to one source tensor.
#[derive(Debug, Clone, Serialize)]
pub struct TensorRecord {
    pub name: String,
    pub encoding: Encoding,
    pub extents: Vec<usize>,
    pub axis: SplitAxis,
    pub data_bytes: usize,
    /// Extents written to each part, in part order.
    pub shard_extents: Vec<Vec<usize>>,
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub hparams: Hyperparameters,
    pub vocab: VocabSummary,
    pub parts: usize,
    pub header_bytes: u64,
    pub part_bytes: Vec<u64>,
    pub tensors: Vec<TensorRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Writer that counts the bytes passed through it.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Convert one source stream into a header stream and `parts.len()` part streams.
///
/// Any error aborts immediately; outputs written so far are left as they are.
pub fn convert<R: Read, H: Write, P: Write>(
    source: &mut R,
    header_out: &mut H,
    parts: &mut [P],
    layouts: &BlockLayouts,
) -> Result<ConversionReport> {
    if parts.is_empty() {
        return Err(ConvertError::InvalidPartCount(0));
    }
    layouts.validate()?;
    let n_parts = parts.len();

    let mut header = CountingWriter::new(header_out);
    let (hparams, vocab) = read_header(source, &mut header)?;
    header.flush()?;
    info!(
        n_vocab = hparams.n_vocab,
        n_embd = hparams.n_embd,
        n_layer = hparams.n_layer,
        encoding = hparams.encoding,
        "header copied"
    );

    let mut outs: Vec<CountingWriter<&mut P>> = parts.iter_mut().map(CountingWriter::new).collect();
    let mut diagnostics = Diagnostics::new();
    let mut tensors = Vec::new();

    while let Some(frame) = read_frame(source, hparams.encoding, &mut diagnostics)? {
        let data_bytes = frame.data_len(layouts)?;
        let raw = read_bytes(source, data_bytes, "tensor data")?;
        let axis = SplitAxis::for_frame(&frame);
        let shards = partition(&frame, &raw, axis, layouts, n_parts)?;
        drop(raw);

        debug!(
            tensor = %frame.name,
            encoding = %frame.encoding,
            extents = ?frame.extents,
            %axis,
            bytes = data_bytes,
            "splitting tensor"
        );

        let mut shard_extents = Vec::with_capacity(n_parts);
        for (out, shard) in outs.iter_mut().zip(&shards) {
            write_frame(out, &shard.frame(&frame))?;
            write_bytes(out, &shard.data)?;
            shard_extents.push(shard.extents.clone());
        }
        tensors.push(TensorRecord {
            name: frame.name,
            encoding: frame.encoding,
            extents: frame.extents,
            axis,
            data_bytes,
            shard_extents,
        });
    }

    for out in outs.iter_mut() {
        out.flush()?;
    }
    info!(tensors = tensors.len(), parts = n_parts, "conversion finished");

    Ok(ConversionReport {
        hparams,
        vocab: vocab.summary(),
        parts: n_parts,
        header_bytes: header.written,
        part_bytes: outs.iter().map(|o| o.written).collect(),
        tensors,
        diagnostics: diagnostics.into_vec(),
    })
}

/// Path of part `index` for output base `base`: `<base>.<index>`.
pub fn part_path(base: &Path, index: usize) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(format!(".{}", index));
    PathBuf::from(s)
}

/// Backup location for `path`: `<path>.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".bak");
    PathBuf::from(s)
}

/// Copy `path` to its backup location unless a backup already exists.
/// Returns the backup path.
pub fn backup_source(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path);
    if backup.exists() {
        debug!(backup = %backup.display(), "backup already present");
    } else {
        info!(from = %path.display(), to = %backup.display(), "backing up source");
        std::fs::copy(path, &backup)?;
    }
    Ok(backup)
}

/// Files involved in one [`split_file`] run.
#[derive(Debug, Clone, Serialize)]
pub struct SplitPaths {
    /// File the tensors were read from.
    pub source: PathBuf,
    pub header: PathBuf,
    pub parts: Vec<PathBuf>,
    /// Set in in-place mode.
    pub backup: Option<PathBuf>,
}

/// Split a model file on disk.
///
/// With `output == None` the conversion is in place: `input` is backed up to
/// `<input>.bak` (kept if already there), the backup becomes the source, and the
/// header replaces `input`. Otherwise `input` is only read and the outputs go to
/// `output` and `<output>.<i>`.
///
/// The source magic is checked before any file is created or copied.
pub fn split_file(
    input: &Path,
    output: Option<&Path>,
    config: &SplitConfig,
) -> Result<(SplitPaths, ConversionReport)> {
    config.validate()?;

    let (source, header, backup) = match output {
        Some(out) => {
            if out == input {
                return Err(ConvertError::InvalidConfig(
                    "output base equals the input file; omit --output to convert in place".into(),
                ));
            }
            ensure_ggml(input)?;
            (input.to_path_buf(), out.to_path_buf(), None)
        }
        None => {
            let existing = backup_path(input);
            let backup = if existing.exists() {
                ensure_ggml(&existing)?;
                existing
            } else {
                ensure_ggml(input)?;
                backup_source(input)?
            };
            (backup.clone(), input.to_path_buf(), Some(backup))
        }
    };

    let paths = SplitPaths {
        parts: (0..config.parts).map(|i| part_path(&header, i)).collect(),
        source,
        header,
        backup,
    };
    info!(
        source = %paths.source.display(),
        header = %paths.header.display(),
        parts = config.parts,
        "converting to multipart"
    );

    let mut reader = BufReader::new(File::open(&paths.source)?);
    let mut header_out = BufWriter::new(File::create(&paths.header)?);
    let mut part_outs = paths
        .parts
        .iter()
        .map(|p| File::create(p).map(BufWriter::new))
        .collect::<io::Result<Vec<_>>>()?;

    let report = convert(&mut reader, &mut header_out, &mut part_outs, &config.blocks)?;
    Ok((paths, report))
}
