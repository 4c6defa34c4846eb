//! Single-slot offscreen surface used to measure and rasterize one block at a time.
//!
//! Lifecycle per block: `acquire` -> `attach` -> rasterize -> `detach` -> release.
//! Release happens when the [`StageLease`] is dropped, so every exit path,
//! including an early return on a rasterizer error, leaves the area vacant.

use crate::error::Error;
use crate::report::BlockSpec;

pub struct StagingArea {
    width_px: u32,
    leased: bool,
    slot: Option<BlockSpec>,
    leases_issued: usize,
}

/// A block mounted on the staging surface, as seen by a rasterizer.
pub struct MountedBlock<'a> {
    block: &'a BlockSpec,
    width_px: u32,
}

impl MountedBlock<'_> {
    pub fn block(&self) -> &BlockSpec {
        self.block
    }

    /// Fixed surface width; every block is laid out at this width.
    pub fn width_px(&self) -> u32 {
        self.width_px
    }
}

impl StagingArea {
    pub fn new(width_px: u32) -> Self {
        Self {
            width_px,
            leased: false,
            slot: None,
            leases_issued: 0,
        }
    }

    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    pub fn is_vacant(&self) -> bool {
        !self.leased && self.slot.is_none()
    }

    pub fn leases_issued(&self) -> usize {
        self.leases_issued
    }

    pub fn acquire(&mut self) -> Result<StageLease<'_>, Error> {
        if self.leased {
            return Err(Error::StageOccupied);
        }
        self.leased = true;
        self.leases_issued += 1;
        Ok(StageLease { area: self })
    }
}

pub struct StageLease<'a> {
    area: &'a mut StagingArea,
}

impl StageLease<'_> {
    pub fn attach(&mut self, block: &BlockSpec) -> Result<MountedBlock<'_>, Error> {
        if self.area.slot.is_some() {
            return Err(Error::StageOccupied);
        }
        let width_px = self.area.width_px;
        let block = self.area.slot.insert(block.clone());
        Ok(MountedBlock { block, width_px })
    }

    pub fn detach(&mut self) {
        if let Some(block) = self.area.slot.take() {
            log::trace!("staging: detached {}", block.label);
        }
    }
}

impl Drop for StageLease<'_> {
    fn drop(&mut self) {
        self.detach();
        self.area.leased = false;
    }
}
