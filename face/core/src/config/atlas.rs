//! Sprite Atlas Layout
//!
//! Per-layer bitmap, base anchor and transparency key, plus the shared
//! sprite frame size. The layout is fixed to one face rig; only anchors,
//! paths and the key color are adjustable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compositor::LayerId;

/// Default sprite frame width (one matrix panel)
pub const DEFAULT_FRAME_WIDTH: i32 = 64;

/// Default sprite frame height (one matrix panel)
pub const DEFAULT_FRAME_HEIGHT: i32 = 32;

/// Default key color, magenta
pub const DEFAULT_TRANSPARENT: Rgb = Rgb(255, 0, 255);

/// An RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// A layer's base position in the atlas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Anchor {
    /// Horizontal position
    pub x: i32,
    /// Vertical position
    pub y: i32,
}

impl From<[i32; 2]> for Anchor {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

/// One layer's bitmap and base anchor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerSpec {
    /// Bitmap file, relative to the sprites directory unless absolute
    pub bitmap: PathBuf,
    /// Base anchor
    pub anchor: Anchor,
}

/// Geometry and assets of the five-layer face
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Sprite frame width in pixels
    pub frame_width: i32,
    /// Sprite frame height in pixels
    pub frame_height: i32,
    /// Color keyed out of the transparent layers
    pub transparent: Rgb,
    /// Directory holding the layer bitmaps
    pub sprites_dir: PathBuf,
    layers: [LayerSpec; 5],
}

impl Default for AtlasConfig {
    fn default() -> Self {
        let spec = |file: &str, x: i32, y: i32| LayerSpec {
            bitmap: PathBuf::from(file),
            anchor: Anchor { x, y },
        };
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            transparent: DEFAULT_TRANSPARENT,
            sprites_dir: PathBuf::from("sprites"),
            layers: [
                spec("base.bmp", 0, 0),
                spec("pupil.bmp", 0, 0),
                spec("eyes.bmp", 0, 0),
                spec("mouth.bmp", 0, 0),
                spec("exp.bmp", 0, DEFAULT_FRAME_HEIGHT),
            ],
        }
    }
}

impl AtlasConfig {
    /// One layer's bitmap and anchor
    #[must_use]
    pub fn layer(&self, layer: LayerId) -> &LayerSpec {
        &self.layers[layer.z_index()]
    }

    /// Mutable access to one layer's bitmap and anchor
    pub fn layer_mut(&mut self, layer: LayerId) -> &mut LayerSpec {
        &mut self.layers[layer.z_index()]
    }

    /// One layer's base anchor
    #[must_use]
    pub fn anchor(&self, layer: LayerId) -> Anchor {
        self.layer(layer).anchor
    }

    /// Resolved bitmap path for a layer
    #[must_use]
    pub fn bitmap_path(&self, layer: LayerId) -> PathBuf {
        let bitmap = &self.layer(layer).bitmap;
        if bitmap.is_absolute() {
            bitmap.clone()
        } else {
            self.sprites_dir.join(bitmap)
        }
    }

    /// Key color for a layer, `None` for the opaque layers
    #[must_use]
    pub fn transparency_key(&self, layer: LayerId) -> Option<Rgb> {
        layer.is_keyed().then_some(self.transparent)
    }

    /// Point relative bitmap paths at a different directory
    pub fn set_sprites_dir(&mut self, dir: impl AsRef<Path>) {
        self.sprites_dir = dir.as_ref().to_path_buf();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_rig() {
        let atlas = AtlasConfig::default();

        assert_eq!(atlas.frame_width, 64);
        assert_eq!(atlas.frame_height, 32);
        assert_eq!(atlas.anchor(LayerId::Expression), Anchor { x: 0, y: 32 });
        assert_eq!(atlas.anchor(LayerId::Mouth), Anchor::default());
        assert_eq!(
            atlas.bitmap_path(LayerId::Expression),
            PathBuf::from("sprites/exp.bmp")
        );
    }

    #[test]
    fn test_only_overlays_are_keyed() {
        let atlas = AtlasConfig::default();

        assert_eq!(atlas.transparency_key(LayerId::Base), None);
        assert_eq!(atlas.transparency_key(LayerId::Expression), None);
        assert_eq!(
            atlas.transparency_key(LayerId::Eyes),
            Some(Rgb(255, 0, 255))
        );
    }

    #[test]
    fn test_absolute_bitmap_ignores_sprites_dir() {
        let mut atlas = AtlasConfig::default();
        atlas.set_sprites_dir("/opt/face");
        atlas.layer_mut(LayerId::Base).bitmap = PathBuf::from("/srv/base.bmp");

        assert_eq!(atlas.bitmap_path(LayerId::Base), PathBuf::from("/srv/base.bmp"));
        assert_eq!(
            atlas.bitmap_path(LayerId::Pupil),
            PathBuf::from("/opt/face/pupil.bmp")
        );
    }

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb(255, 0, 255).to_string(), "#ff00ff");
    }
}
