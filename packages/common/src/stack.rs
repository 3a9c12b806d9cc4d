//! Native stack budget for recursive walkers.
//!
//! The parser, markup compiler and interpreter recurse on user input. Each
//! creates a [`StackGuard`] at its entry point and fails with an error once
//! the stack has grown past the budget, instead of overflowing the thread.

/// Stack bytes a walk may use below its guard. Spawned native threads get
/// 2 MiB and wasm modules 1 MiB.
#[cfg(not(target_arch = "wasm32"))]
pub const DEFAULT_STACK_BUDGET: usize = 1024 * 1024;
#[cfg(target_arch = "wasm32")]
pub const DEFAULT_STACK_BUDGET: usize = 256 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct StackGuard {
    base: usize,
    budget: usize,
}

impl StackGuard {
    /// Guard measuring from the caller's frame
    #[inline(always)]
    pub fn new(budget: usize) -> Self {
        Self {
            base: stack_position(),
            budget,
        }
    }

    /// Bytes used between the guard and the caller's frame
    #[inline(always)]
    pub fn used(&self) -> usize {
        self.base.saturating_sub(stack_position())
    }

    #[inline(always)]
    pub fn exhausted(&self) -> bool {
        self.used() > self.budget
    }
}

impl Default for StackGuard {
    #[inline(always)]
    fn default() -> Self {
        Self::new(DEFAULT_STACK_BUDGET)
    }
}

/// Address of a local in the current frame; stacks grow downwards on every
/// supported target
#[inline(always)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(std::ptr::addr_of!(marker)) as usize
}
