//! Monotonic port allocation, scoped to one compilation.

use crate::topology::TopologyError;

pub const DEFAULT_PORT_BASE: u16 = 22000;

#[derive(Debug, Clone)]
pub struct PortAllocator {
    base: u16,
    // u32 so that stepping past u16::MAX is observable instead of wrapping.
    next: u32,
}

impl PortAllocator {
    pub fn new(base: u16) -> Self {
        Self {
            base,
            next: u32::from(base),
        }
    }

    /// Hand out the next port. Ports are never reused.
    pub fn allocate(&mut self) -> Result<u16, TopologyError> {
        let port = u16::try_from(self.next)
            .map_err(|_| TopologyError::PortRangeExhausted { base: self.base })?;
        self.next += 1;
        Ok(port)
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    /// Number of ports handed out so far.
    pub fn allocated(&self) -> usize {
        (self.next - u32::from(self.base)) as usize
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_PORT_BASE)
    }
}
