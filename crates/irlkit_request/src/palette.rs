//! Deterministic platform color allocation for tracking-grid headers.

use crate::spec::SpecTrackingStyle;

/// Hands out palette colors in order, one per platform.
#[derive(Debug, Clone)]
pub struct PaletteAllocator {
    l_palette: Vec<String>,
    n_allocated: usize,
}

impl PaletteAllocator {
    /// Allocator over `style.palette`.
    pub fn new(style: &SpecTrackingStyle) -> Self {
        Self {
            l_palette: style.palette.clone(),
            n_allocated: 0,
        }
    }

    /// Next color, wrapping after the last one. `None` for an empty palette.
    pub fn next_color(&mut self) -> Option<String> {
        if self.l_palette.is_empty() {
            return None;
        }
        let color = self.l_palette[self.n_allocated % self.l_palette.len()].clone();
        self.n_allocated += 1;
        Some(color)
    }

    /// Number of colors handed out so far.
    pub fn allocated(&self) -> usize {
        self.n_allocated
    }

    /// `true` once more colors were requested than the palette holds.
    pub fn has_wrapped(&self) -> bool {
        self.n_allocated > self.l_palette.len()
    }
}
