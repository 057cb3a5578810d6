//! Layer Compositor
//!
//! The face is five stacked sprite layers sharing one atlas geometry. The
//! compositor turns the state machines' outputs into integer pixel
//! placements for every layer, bottom to top:
//!
//! ```text
//! z  layer       x                          y
//! 0  base        anchor.x                   anchor.y
//! 1  pupil       anchor.x + pupil.x         anchor.y + pupil.y
//! 2  eyes        anchor.x                   anchor.y - eyelid_frame * height
//! 3  mouth       anchor.x                   anchor.y - mouth_level  * height
//! 4  expression  anchor.x - column * width  anchor.y - intensity    * height
//! ```
//!
//! Only the base layer is static; it is placed once by the initial frame.

use serde::{Deserialize, Serialize};

use crate::config::AtlasConfig;
use crate::expression::Intensity;
use crate::mouth::MouthLevel;

/// One of the rig's five sprite layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    /// Opaque face background
    Base,
    /// Pupils
    Pupil,
    /// Eyelid overlay
    Eyes,
    /// Mouth overlay
    Mouth,
    /// Opaque expression overlay
    Expression,
}

impl LayerId {
    /// All layers in render order, bottom to top
    pub const ALL: [LayerId; 5] = [
        LayerId::Base,
        LayerId::Pupil,
        LayerId::Eyes,
        LayerId::Mouth,
        LayerId::Expression,
    ];

    /// Stack position, 0 at the bottom
    #[must_use]
    pub fn z_index(self) -> usize {
        match self {
            Self::Base => 0,
            Self::Pupil => 1,
            Self::Eyes => 2,
            Self::Mouth => 3,
            Self::Expression => 4,
        }
    }

    /// Whether the layer's background is keyed out with the atlas
    /// transparency color
    #[must_use]
    pub fn is_keyed(self) -> bool {
        matches!(self, Self::Pupil | Self::Eyes | Self::Mouth)
    }

    /// Whether the layer is repositioned every tick
    #[must_use]
    pub fn is_movable(self) -> bool {
        !matches!(self, Self::Base)
    }

    /// Short lowercase name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Pupil => "pupil",
            Self::Eyes => "eyes",
            Self::Mouth => "mouth",
            Self::Expression => "expression",
        }
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Integer pixel placement of one layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerPlacement {
    /// Which layer
    pub layer: LayerId,
    /// Horizontal offset into the atlas
    pub x: i32,
    /// Vertical offset into the atlas
    pub y: i32,
}

/// Placements for all five layers, bottom to top
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFrame {
    layers: [LayerPlacement; 5],
}

impl LayerFrame {
    /// All placements in render order
    #[must_use]
    pub fn layers(&self) -> &[LayerPlacement; 5] {
        &self.layers
    }

    /// Placement of one layer
    #[must_use]
    pub fn get(&self, layer: LayerId) -> LayerPlacement {
        self.layers[layer.z_index()]
    }

    /// Placement of one layer as an `(x, y)` pair
    #[must_use]
    pub fn position(&self, layer: LayerId) -> (i32, i32) {
        let placement = self.get(layer);
        (placement.x, placement.y)
    }

    /// Placements of the four layers that move every tick
    pub fn movable(&self) -> impl Iterator<Item = &LayerPlacement> {
        self.layers.iter().filter(|p| p.layer.is_movable())
    }
}

/// Per-tick outputs of the four state machines
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceOutputs {
    /// Pupil offset in whole pixels
    pub pupil: (i32, i32),
    /// Eyelid sprite row
    pub eyelid_frame: u8,
    /// Mouth sprite row
    pub mouth: MouthLevel,
    /// Expression sprite column
    pub expression_column: u8,
    /// Expression sprite row
    pub intensity: Intensity,
}

/// Maps state machine outputs onto atlas placements
#[derive(Clone, Debug)]
pub struct Compositor {
    atlas: AtlasConfig,
}

impl Compositor {
    /// Create a compositor for an atlas layout
    #[must_use]
    pub fn new(atlas: AtlasConfig) -> Self {
        Self { atlas }
    }

    /// The atlas layout in use
    #[must_use]
    pub fn atlas(&self) -> &AtlasConfig {
        &self.atlas
    }

    /// Placement for the rig at rest: eyes open, pupils centered, mouth
    /// closed, neutral expression
    #[must_use]
    pub fn initial_frame(&self) -> LayerFrame {
        self.compose(&FaceOutputs::default())
    }

    /// Compute every layer's placement for one tick
    #[must_use]
    pub fn compose(&self, outputs: &FaceOutputs) -> LayerFrame {
        let width = self.atlas.frame_width;
        let height = self.atlas.frame_height;

        let place = |layer: LayerId, dx: i32, dy: i32| {
            let anchor = self.atlas.anchor(layer);
            LayerPlacement {
                layer,
                x: anchor.x + dx,
                y: anchor.y + dy,
            }
        };

        LayerFrame {
            layers: [
                place(LayerId::Base, 0, 0),
                place(LayerId::Pupil, outputs.pupil.0, outputs.pupil.1),
                place(LayerId::Eyes, 0, -i32::from(outputs.eyelid_frame) * height),
                place(LayerId::Mouth, 0, -i32::from(outputs.mouth.get()) * height),
                place(
                    LayerId::Expression,
                    -i32::from(outputs.expression_column) * width,
                    -i32::from(outputs.intensity.get()) * height,
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Anchor;
    use pretty_assertions::assert_eq;

    fn compositor() -> Compositor {
        Compositor::new(AtlasConfig::default())
    }

    #[test]
    fn test_layer_order() {
        for (z, layer) in LayerId::ALL.iter().enumerate() {
            assert_eq!(layer.z_index(), z);
        }
        assert!(LayerId::Pupil.is_keyed());
        assert!(!LayerId::Base.is_keyed());
        assert!(!LayerId::Expression.is_keyed());
    }

    #[test]
    fn test_initial_frame_uses_anchors() {
        let frame = compositor().initial_frame();

        assert_eq!(frame.position(LayerId::Base), (0, 0));
        assert_eq!(frame.position(LayerId::Pupil), (0, 0));
        assert_eq!(frame.position(LayerId::Eyes), (0, 0));
        assert_eq!(frame.position(LayerId::Mouth), (0, 0));
        assert_eq!(frame.position(LayerId::Expression), (0, 32));
        assert_eq!(frame.movable().count(), 4);
    }

    #[test]
    fn test_compose_applies_sprite_geometry() {
        let outputs = FaceOutputs {
            pupil: (-5, 3),
            eyelid_frame: 3,
            mouth: MouthLevel::clamped(2),
            expression_column: 2,
            intensity: Intensity::clamped(3),
        };
        let frame = compositor().compose(&outputs);

        let expected = [
            LayerPlacement { layer: LayerId::Base, x: 0, y: 0 },
            LayerPlacement { layer: LayerId::Pupil, x: -5, y: 3 },
            LayerPlacement { layer: LayerId::Eyes, x: 0, y: -96 },
            LayerPlacement { layer: LayerId::Mouth, x: 0, y: -64 },
            LayerPlacement { layer: LayerId::Expression, x: -128, y: -64 },
        ];
        assert_eq!(frame.layers(), &expected);
    }

    #[test]
    fn test_compose_offsets_from_custom_anchors() {
        let mut atlas = AtlasConfig::default();
        atlas.layer_mut(LayerId::Pupil).anchor = Anchor { x: 10, y: 4 };
        atlas.layer_mut(LayerId::Mouth).anchor = Anchor { x: 0, y: 8 };
        let compositor = Compositor::new(atlas);

        let frame = compositor.compose(&FaceOutputs {
            pupil: (2, -1),
            mouth: MouthLevel::clamped(1),
            ..FaceOutputs::default()
        });

        assert_eq!(frame.position(LayerId::Pupil), (12, 3));
        assert_eq!(frame.position(LayerId::Mouth), (0, -24));
    }

    #[test]
    fn test_frame_serializes_layer_names() {
        let frame = compositor().initial_frame();
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"layer\":\"expression\""));
        assert!(json.contains("\"y\":32"));
    }
}
