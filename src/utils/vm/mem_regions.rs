use crate::proto::InputDataRegion;
use crate::utils::vm::opcodes::AccessWidth;
use crate::utils::vm::version::SbpfVersion;
use crate::utils::vm::{
    MM_HEAP_START, MM_INPUT_START, MM_RODATA_START, MM_STACK_START, STACK_GAP_SIZE, STACK_SIZE,
};
use std::collections::BTreeSet;

/// Virtual address range `[start, start + len)` of one mapped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBounds {
    pub start: u64,
    pub len: u64,
}

impl RegionBounds {
    pub const fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }

    pub const fn end(&self) -> u64 {
        self.start + self.len
    }

    /// Addresses straddling both edges of the region for a `width`-byte
    /// access: one below the start, the start, the last in-bounds address and
    /// the first address whose access runs past the end.
    pub fn probes(&self, width: AccessWidth) -> [u64; 4] {
        let last = self.end().saturating_sub(width.bytes());
        [self.start.wrapping_sub(1), self.start, last, last + 1]
    }
}

/* Lay out input regions the way the target maps them: contiguous from
MM_INPUT_START in list order, empty regions skipped without taking space.
The `offset` of each region is filled in accordingly. */
pub fn setup_input_regions(presets: &[(Vec<u8>, bool)]) -> Vec<InputDataRegion> {
    let mut input_data_off: u64 = 0;
    let mut regions = Vec::with_capacity(presets.len());
    for (content, is_writable) in presets {
        regions.push(InputDataRegion {
            offset: input_data_off,
            content: content.clone(),
            is_writable: *is_writable,
        });
        input_data_off += content.len() as u64;
    }
    regions
}

/// Bounds of every non-empty input region, sorted by address.
pub fn input_region_bounds(input_data_regions: &[InputDataRegion]) -> Vec<RegionBounds> {
    let mut input_data_off: u64 = 0;
    let mut bounds = Vec::new();
    for input_data_region in input_data_regions {
        if input_data_region.content.is_empty() {
            continue; // follow Agave, skip empty regions
        }
        let len = input_data_region.content.len() as u64;
        bounds.push(RegionBounds::new(MM_INPUT_START + input_data_off, len));
        input_data_off += len;
    }
    bounds
}

/// Frame `r10` points into at entry. Without dynamic frames the stack is
/// split into gapped 4 KiB frames, with them it is one flat region.
pub fn stack_frame_bounds(version: SbpfVersion) -> RegionBounds {
    if version.dynamic_stack_frames() {
        RegionBounds::new(MM_STACK_START, STACK_SIZE as u64)
    } else {
        RegionBounds::new(MM_STACK_START, STACK_GAP_SIZE)
    }
}

/// Every region a program of `rodata_len` bytes can touch, in address order.
pub fn memory_layout(
    rodata_len: u64,
    heap_max: u64,
    input_data_regions: &[InputDataRegion],
) -> Vec<RegionBounds> {
    let mut layout = vec![RegionBounds::new(MM_RODATA_START, rodata_len)];
    let mut frames: Vec<RegionBounds> = Vec::new();
    for version in SbpfVersion::ALL {
        let frame = stack_frame_bounds(version);
        if !frames.contains(&frame) {
            frames.push(frame);
        }
    }
    layout.extend(frames);
    layout.push(RegionBounds::new(MM_HEAP_START, heap_max));
    layout.extend(input_region_bounds(input_data_regions));
    layout
}

/// Boundary probe addresses of every region for one access width, deduplicated
/// and in ascending order.
pub fn boundary_addresses(layout: &[RegionBounds], width: AccessWidth) -> Vec<u64> {
    layout
        .iter()
        .flat_map(|region| region.probes(width))
        .collect::<BTreeSet<u64>>()
        .into_iter()
        .collect()
}
