//! Filter Pipeline (§4.3): an ordered list of at most `MAX_FILTERS` reversible
//! transforms applied to a block before it reaches the codec.

mod bitshuffle;
mod delta;
mod shuffle;
mod trunc_prec;

use crate::constants::MAX_FILTERS;
use crate::error::{Error, Result};

/// One reversible (or documented-lossy) transform in a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    None,
    Shuffle,
    BitShuffle,
    Delta,
    TruncPrec,
}

impl Filter {
    pub fn id(self) -> u8 {
        match self {
            Filter::None => 0,
            Filter::Shuffle => 1,
            Filter::BitShuffle => 2,
            Filter::Delta => 3,
            Filter::TruncPrec => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Filter::None),
            1 => Some(Filter::Shuffle),
            2 => Some(Filter::BitShuffle),
            3 => Some(Filter::Delta),
            4 => Some(Filter::TruncPrec),
            _ => None,
        }
    }
}

/// A pipeline entry: a filter plus its one byte of filter-specific metadata
/// (the truncation bit count for `TruncPrec`, unused for the rest).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub filter: Filter,
    pub meta: u8,
}

impl FilterSpec {
    pub fn new(filter: Filter, meta: u8) -> Self {
        FilterSpec { filter, meta }
    }
}

/// An ordered, validated list of filters (§9 redesign note: a `Vec` of
/// tagged entries, not a sentinel-padded fixed array — `Filter::None` only
/// reappears at the serialization boundary in [`to_header_arrays`]).
#[derive(Clone, Debug, Default)]
pub struct FilterPipeline {
    entries: Vec<FilterSpec>,
}

impl FilterPipeline {
    /// Validate and build a pipeline for a chunk with the given `typesize`
    /// and (already-resolved, non-zero) `blocksize`.
    pub fn new(entries: Vec<FilterSpec>, typesize: u8, blocksize: usize) -> Result<Self> {
        if entries.len() > MAX_FILTERS {
            return Err(Error::config(format!(
                "pipeline has {} entries, max is {MAX_FILTERS}",
                entries.len()
            )));
        }
        if entries.iter().any(|e| e.filter == Filter::None) {
            return Err(Error::config("Filter::None must not appear in a pipeline entry list"));
        }

        let has_shuffle = entries.iter().any(|e| e.filter == Filter::Shuffle);
        let has_bitshuffle = entries.iter().any(|e| e.filter == Filter::BitShuffle);
        if has_shuffle && has_bitshuffle {
            return Err(Error::config("Shuffle and BitShuffle are mutually exclusive"));
        }

        for entry in &entries {
            match entry.filter {
                Filter::TruncPrec => {
                    let width = trunc_prec::mantissa_width(typesize).ok_or_else(|| {
                        Error::config(format!("TruncPrec requires typesize 4 or 8, got {typesize}"))
                    })?;
                    if entry.meta >= width {
                        return Err(Error::config(format!(
                            "TruncPrec meta {} must be less than mantissa width {width}",
                            entry.meta
                        )));
                    }
                }
                Filter::Delta => {
                    if typesize == 0 || blocksize % typesize as usize != 0 {
                        return Err(Error::config(format!(
                            "Delta requires blocksize ({blocksize}) to be a multiple of typesize ({typesize})"
                        )));
                    }
                }
                Filter::None | Filter::Shuffle | Filter::BitShuffle => {}
            }
        }

        Ok(FilterPipeline { entries })
    }

    pub fn entries(&self) -> &[FilterSpec] {
        &self.entries
    }

    pub fn has_delta(&self) -> bool {
        self.delta_index().is_some()
    }

    pub fn has_shuffle(&self) -> bool {
        self.entries.iter().any(|e| e.filter == Filter::Shuffle)
    }

    pub fn has_bitshuffle(&self) -> bool {
        self.entries.iter().any(|e| e.filter == Filter::BitShuffle)
    }

    fn delta_index(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.filter == Filter::Delta)
    }

    /// Serialize to the header's fixed-width filter id/meta arrays, padding
    /// unused slots with `Filter::None` (id 0).
    pub fn to_header_arrays(&self) -> ([u8; MAX_FILTERS], [u8; MAX_FILTERS]) {
        let mut ids = [0u8; MAX_FILTERS];
        let mut metas = [0u8; MAX_FILTERS];
        for (i, entry) in self.entries.iter().enumerate() {
            ids[i] = entry.filter.id();
            metas[i] = entry.meta;
        }
        (ids, metas)
    }

    /// Parse a pipeline back out of the header arrays, re-validating it
    /// against the chunk's own `typesize`/`blocksize`. Errors surface as
    /// `Format` errors (a corrupt header), not `Config` ones.
    pub fn from_header_arrays(
        ids: [u8; MAX_FILTERS],
        metas: [u8; MAX_FILTERS],
        typesize: u8,
        blocksize: usize,
    ) -> Result<Self> {
        let mut entries = Vec::new();
        let mut seen_none = false;
        for i in 0..MAX_FILTERS {
            if ids[i] == 0 {
                seen_none = true;
                continue;
            }
            if seen_none {
                return Err(Error::format("filter id array has a gap before its end"));
            }
            let filter = Filter::from_id(ids[i])
                .ok_or_else(|| Error::format(format!("unrecognized filter id {}", ids[i])))?;
            entries.push(FilterSpec::new(filter, metas[i]));
        }
        Self::new(entries, typesize, blocksize)
            .map_err(|e| Error::format(format!("invalid filter pipeline in header: {}", e.message)))
    }

    /// Apply every filter's forward transform, in listed order.
    ///
    /// `is_reference_block` selects Delta's prefix-chain rule for a chunk's
    /// block 0; every other block needs `delta_ref`, the reference bytes
    /// captured by [`Self::state_before_delta`] (see SPEC_FULL.md §4.2).
    pub fn apply_forward(
        &self,
        block: &[u8],
        typesize: u8,
        is_reference_block: bool,
        delta_ref: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let mut current = block.to_vec();
        for entry in &self.entries {
            current = self.apply_one_forward(current, *entry, typesize, is_reference_block, delta_ref)?;
        }
        Ok(current)
    }

    /// Apply every filter's reverse transform, in reverse listed order.
    pub fn apply_reverse(
        &self,
        block: &[u8],
        typesize: u8,
        is_reference_block: bool,
        delta_ref: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let mut current = block.to_vec();
        for entry in self.entries.iter().rev() {
            current = self.apply_one_reverse(current, *entry, typesize, is_reference_block, delta_ref)?;
        }
        Ok(current)
    }

    /// Run only the filters preceding Delta in the pipeline over block 0's
    /// original bytes, producing the reference every other block's Delta
    /// stage XORs against. Returns `None` if the pipeline has no Delta.
    pub fn state_before_delta(&self, block0_original: &[u8], typesize: u8) -> Result<Option<Vec<u8>>> {
        let Some(idx) = self.delta_index() else {
            return Ok(None);
        };
        let mut current = block0_original.to_vec();
        for entry in &self.entries[..idx] {
            current = self.apply_one_forward(current, *entry, typesize, true, None)?;
        }
        Ok(Some(current))
    }

    fn apply_one_forward(
        &self,
        current: Vec<u8>,
        entry: FilterSpec,
        typesize: u8,
        is_reference_block: bool,
        delta_ref: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let typesize = typesize as usize;
        Ok(match entry.filter {
            Filter::None => current,
            Filter::Shuffle => shuffle::forward(&current, typesize),
            Filter::BitShuffle => bitshuffle::forward(&current, typesize)?,
            Filter::Delta => {
                if is_reference_block {
                    delta::prefix_forward(&current, typesize)
                } else {
                    let reference = delta_ref.ok_or_else(|| {
                        Error::config("Delta on a non-reference block requires a reference")
                    })?;
                    delta::xor_with_ref(&current, reference)
                }
            }
            Filter::TruncPrec => trunc_prec::forward(&current, typesize, entry.meta),
        })
    }

    fn apply_one_reverse(
        &self,
        current: Vec<u8>,
        entry: FilterSpec,
        typesize: u8,
        is_reference_block: bool,
        delta_ref: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let typesize = typesize as usize;
        Ok(match entry.filter {
            Filter::None => current,
            Filter::Shuffle => shuffle::reverse(&current, typesize),
            Filter::BitShuffle => bitshuffle::reverse(&current, typesize)?,
            Filter::Delta => {
                if is_reference_block {
                    delta::prefix_reverse(&current, typesize)
                } else {
                    let reference = delta_ref.ok_or_else(|| {
                        Error::config("Delta on a non-reference block requires a reference")
                    })?;
                    delta::xor_with_ref(&current, reference)
                }
            }
            // Lossy by design: reverse is identity.
            Filter::TruncPrec => current,
        })
    }
}
