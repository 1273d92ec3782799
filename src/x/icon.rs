//! Window icons
//!
//! `_NET_WM_ICON` decoding plus the plain-colour default icon used when a
//! window publishes none.

use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::error::Result;
use crate::x::XContext;

/// Largest icon we accept from a client (pixels)
const MAX_ICON_PIXELS: usize = 1024 * 1024;

/// ARGB32 icon image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Icon {
    /// Solid square with a one pixel frame
    pub fn placeholder(size: u32, fill: u32, frame: u32) -> Self {
        let mut pixels = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                let edge = x == 0 || y == 0 || x + 1 == size || y + 1 == size;
                pixels.push(0xFF00_0000 | if edge { frame } else { fill });
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// Nearest-neighbour resample to `size` x `size`
    pub fn scaled(&self, size: u32) -> Self {
        if self.width == size && self.height == size {
            return self.clone();
        }
        let mut pixels = Vec::with_capacity((size * size) as usize);
        let size64 = u64::from(size);
        for y in 0..size {
            let sy = (u64::from(y) * u64::from(self.height) / size64) as usize;
            for x in 0..size {
                let sx = (u64::from(x) * u64::from(self.width) / size64) as usize;
                pixels.push(self.pixels[sy * self.width as usize + sx]);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }
}

/// Split a `_NET_WM_ICON` value into its images. Each image is
/// `width, height, width * height` ARGB pixels; a truncated tail is ignored.
pub fn decode_net_wm_icon(values: &[u32]) -> Vec<Icon> {
    let mut icons = Vec::new();
    let mut rest = values;
    while rest.len() >= 2 {
        let (width, height) = (rest[0], rest[1]);
        let Some(count) = (width as usize).checked_mul(height as usize) else {
            break;
        };
        if count == 0 || count > MAX_ICON_PIXELS || rest.len() - 2 < count {
            break;
        }
        icons.push(Icon {
            width,
            height,
            pixels: rest[2..2 + count].to_vec(),
        });
        rest = &rest[2 + count..];
    }
    icons
}

/// Pick the image closest to `size`, preferring ones at least that large
pub fn best_icon(icons: Vec<Icon>, size: u32) -> Option<Icon> {
    icons.into_iter().min_by_key(|icon| {
        let edge = icon.width.max(icon.height);
        if edge >= size { (0, edge - size) } else { (1, size - edge) }
    })
}

/// Read a window's icon, scaled to `size`. `None` when the window has no
/// usable `_NET_WM_ICON`.
pub fn load_window_icon(x: &XContext, window: Window, size: u32) -> Result<Option<Icon>> {
    let values = x.get_prop_cardinals(window, x.atoms.net_wm_icon)?;
    let icon = best_icon(decode_net_wm_icon(&values), size).map(|icon| icon.scaled(size));
    if let Some(icon) = &icon {
        debug!("Loaded icon for window {}: {}x{}", window, icon.width, icon.height);
    }
    Ok(icon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_multiple_images() {
        let mut data = vec![1, 1, 0xFFFF_0000];
        data.extend([2, 2, 1, 2, 3, 4]);
        let icons = decode_net_wm_icon(&data);
        assert_eq!(icons.len(), 2);
        assert_eq!(icons[1].pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_truncated_image_is_dropped() {
        let icons = decode_net_wm_icon(&[4, 4, 1, 2, 3]);
        assert!(icons.is_empty());
    }

    #[test]
    fn test_best_icon_prefers_next_size_up() {
        let icon = |edge: u32| Icon {
            width: edge,
            height: edge,
            pixels: vec![0; (edge * edge) as usize],
        };
        let best = best_icon(vec![icon(8), icon(48), icon(24)], 16).unwrap();
        assert_eq!(best.width, 24);

        let best = best_icon(vec![icon(8), icon(12)], 16).unwrap();
        assert_eq!(best.width, 12);
    }

    #[test]
    fn test_scaled_keeps_corners() {
        let icon = Icon {
            width: 2,
            height: 2,
            pixels: vec![1, 2, 3, 4],
        };
        let big = icon.scaled(4);
        assert_eq!(big.pixels[0], 1);
        assert_eq!(big.pixels[3], 2);
        assert_eq!(big.pixels[15], 4);
    }

    #[test]
    fn test_scaled_very_wide_icon() {
        let width: u32 = 1 << 22;
        let icon = Icon {
            width,
            height: 1,
            pixels: (0..width).collect(),
        };
        let scaled = icon.scaled(1100);
        assert_eq!(scaled.pixels.len(), 1100 * 1100);
        assert_eq!(scaled.pixels[1099], 4_190_490);
    }
}
