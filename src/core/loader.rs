//! File-level dispatch: classify the container, decode its root record.
//!
//! Every load owns a fresh [`Decoder`] and therefore a fresh identity cache;
//! nothing is shared between loads, so distinct files may be decoded on
//! different threads.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use rayon::prelude::*;

use super::record::{Record, RecordRef};
use crate::stream::{ContainerFormat, Decoder};
use crate::util::{Error, Result};

/// Runtime load settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Memory-map files instead of reading them into a buffer.
    pub use_mmap: bool,
    /// Fail with [`Error::TrailingBytes`] when bytes follow the root record.
    pub strict_trailing_bytes: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_mmap: cfg!(feature = "mmap"),
            strict_trailing_bytes: false,
        }
    }
}

impl LoadOptions {
    pub fn strict(mut self) -> Self {
        self.strict_trailing_bytes = true;
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }
}

/// What one load consumed and produced.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LoadStats {
    pub format: ContainerFormat,
    /// Bytes read, magic included.
    pub bytes_consumed: u64,
    /// Bytes left after the root record.
    pub trailing_bytes: usize,
    /// Distinct shared records decoded.
    pub records_decoded: usize,
    /// Pointers resolved from the identity cache.
    pub cache_hits: usize,
    /// Strings recovered lossily.
    pub lossy_strings: usize,
}

/// Root record plus load statistics.
#[derive(Clone, Debug)]
pub struct Loaded {
    pub root: RecordRef,
    pub stats: LoadStats,
}

/// A file loaded from disk.
#[derive(Clone, Debug)]
pub struct Asset {
    /// File name without directories.
    pub name: String,
    pub path: PathBuf,
    pub root: RecordRef,
    pub stats: LoadStats,
}

/// Decode a complete asset held in memory.
///
/// ```no_run
/// let bytes = std::fs::read("tr_mo_kitin.shape")?;
/// let root = nel3d::load(&bytes)?;
/// println!("{}", root.type_tag());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load(bytes: &[u8]) -> Result<RecordRef> {
    load_with_options(bytes, &LoadOptions::default()).map(|l| l.root)
}

/// Decode a complete asset held in memory, with statistics.
pub fn load_with_options(bytes: &[u8], options: &LoadOptions) -> Result<Loaded> {
    let format = ContainerFormat::detect(bytes)?;
    let mut d = Decoder::new(bytes);
    d.skip(format.magic().len())?;
    let root = match format {
        ContainerFormat::Shape => {
            let offset = d.position();
            d.read_ptr()?
                .ok_or_else(|| Error::invalid(offset, "null root pointer"))?
        }
        ContainerFormat::Animation => Arc::new(Record::Animation(d.read()?)),
        ContainerFormat::InstanceGroup => Arc::new(Record::InstanceGroup(d.read()?)),
        ContainerFormat::AnimationSet => {
            return Err(Error::UnsupportedContainerFormat { format });
        }
    };

    let stats = LoadStats {
        format,
        bytes_consumed: d.position(),
        trailing_bytes: d.remaining(),
        records_decoded: d.cache().len(),
        cache_hits: d.cache().hits(),
        lossy_strings: d.lossy_strings(),
    };
    if stats.trailing_bytes > 0 {
        if options.strict_trailing_bytes {
            return Err(Error::TrailingBytes {
                offset: stats.bytes_consumed,
                remaining: stats.trailing_bytes,
            });
        }
        tracing::warn!(
            offset = stats.bytes_consumed,
            remaining = stats.trailing_bytes,
            "trailing bytes after root record"
        );
    }
    tracing::debug!(
        %format,
        root = root.type_tag(),
        version = root.version(),
        records = stats.records_decoded,
        hits = stats.cache_hits,
        "loaded"
    );
    Ok(Loaded { root, stats })
}

/// Load a file with default options.
pub fn load_file(path: impl AsRef<Path>) -> Result<Asset> {
    load_file_with_options(path, &LoadOptions::default())
}

/// Load a file, mapping it into memory when `options.use_mmap` is set.
pub fn load_file_with_options(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Asset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    let size = file.metadata()?.len();

    let loaded = if options.use_mmap && size > 0 {
        // Safety: the map is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
        load_with_options(&mmap, options)?
    } else {
        let mut bytes = Vec::with_capacity(size as usize);
        (&file).read_to_end(&mut bytes)?;
        load_with_options(&bytes, options)?
    };
    tracing::info!(path = %path.display(), root = loaded.root.type_tag(), "loaded file");

    Ok(Asset {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        root: loaded.root,
        stats: loaded.stats,
    })
}

/// Load many files in parallel, one decode session per file.
///
/// Results keep the order of `paths`.
pub fn load_files<P>(paths: &[P], options: &LoadOptions) -> Vec<(PathBuf, Result<Asset>)>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|p| {
            let path = p.as_ref().to_path_buf();
            let result = load_file_with_options(&path, options);
            (path, result)
        })
        .collect()
}
