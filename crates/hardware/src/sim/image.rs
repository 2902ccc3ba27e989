//! Executable images.
//!
//! The driver only needs three things from an executable: where to start, which bytes go
//! where, and the address of a few named symbols. This module defines that narrow view
//! (`ImageResolver`) and an ELF implementation on top of the `object` crate.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use object::{Object, ObjectSegment, ObjectSymbol, SymbolKind};
use tracing::debug;

use crate::common::{BusAddr, DriverError, Result};

/// One block of bytes to place in the bus address space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Absolute bus address of the first byte.
    pub addr: BusAddr,
    /// Contents, including zero fill.
    pub data: Vec<u8>,
}

impl Segment {
    /// Creates a segment.
    pub fn new(addr: u64, data: Vec<u8>) -> Self {
        Self {
            addr: BusAddr(addr),
            data,
        }
    }
}

/// Read-only view of a loaded executable.
pub trait ImageResolver {
    /// Address execution starts at.
    fn entry_point(&self) -> u64;

    /// Address of `name`, or 0 if the image does not define it.
    fn symbol(&self, name: &str) -> u64;

    /// Loadable segments in image order.
    fn segments(&self) -> Vec<Segment>;

    /// Resolves several symbols at once; unresolved names map to 0.
    fn resolve_symbols(&self, names: &[&str]) -> BTreeMap<String, u64> {
        names
            .iter()
            .map(|name| ((*name).to_owned(), self.symbol(name)))
            .collect()
    }
}

/// An ELF executable parsed into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElfImage {
    entry: u64,
    segments: Vec<Segment>,
    symbols: HashMap<String, u64>,
}

impl ElfImage {
    /// Reads and parses the ELF file at `path`.
    ///
    /// # Errors
    ///
    /// `DriverError::ImageIo` if the file cannot be read, `DriverError::Image` if it is
    /// not a valid ELF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| DriverError::ImageIo {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Self::parse(&data)?;
        debug!(
            path = %path.display(),
            entry = format_args!("{:#x}", image.entry),
            segments = image.segments.len(),
            symbols = image.symbols.len(),
            "parsed image"
        );
        Ok(image)
    }

    /// Parses an ELF file held in memory (32- or 64-bit, either endianness).
    ///
    /// Segments with `memsz > filesz` are zero-filled to `memsz`; empty segments are
    /// dropped. Undefined, section and file symbols are ignored; the first definition
    /// of a name wins.
    ///
    /// # Errors
    ///
    /// `DriverError::Image` if the data is not a valid ELF file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let file = object::File::parse(data)?;

        let mut segments = Vec::new();
        for segment in file.segments() {
            let mut bytes = segment.data()?.to_vec();
            let mem_size = segment.size() as usize;
            if mem_size > bytes.len() {
                bytes.resize(mem_size, 0);
            }
            if bytes.is_empty() {
                continue;
            }
            segments.push(Segment::new(segment.address(), bytes));
        }

        let mut symbols = HashMap::new();
        for symbol in file.symbols() {
            if symbol.is_undefined() || matches!(symbol.kind(), SymbolKind::Section | SymbolKind::File) {
                continue;
            }
            match symbol.name() {
                Ok(name) if !name.is_empty() => {
                    let _ = symbols.entry(name.to_owned()).or_insert(symbol.address());
                }
                _ => {}
            }
        }

        Ok(Self {
            entry: file.entry(),
            segments,
            symbols,
        })
    }
}

impl ImageResolver for ElfImage {
    fn entry_point(&self) -> u64 {
        self.entry
    }

    fn symbol(&self, name: &str) -> u64 {
        self.symbols.get(name).copied().unwrap_or(0)
    }

    fn segments(&self) -> Vec<Segment> {
        self.segments.clone()
    }
}
