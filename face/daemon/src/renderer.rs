//! Frame Sinks
//!
//! The daemon has no panel attached, so frames go either to the log or to
//! a JSON-lines stream that a panel driver or visualizer can consume.

use std::io::Write;

use face_core::{AtlasConfig, HardwareError, LayerFrame, LayerId, LayerPlacement, Renderer};
use serde::Serialize;
use tracing::{debug, info};

/// One layer's setup line, written before the first frame
#[derive(Debug, Serialize)]
struct LayerRecord {
    layer: LayerId,
    bitmap: String,
    anchor: [i32; 2],
    transparent: Option<String>,
}

/// One emitted line
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record<'a> {
    Atlas {
        frame_width: i32,
        frame_height: i32,
        layers: Vec<LayerRecord>,
    },
    Frame {
        tick: u64,
        layers: &'a [LayerPlacement; 5],
    },
}

/// Writes the atlas and every frame as JSON, one object per line
#[derive(Debug)]
pub struct JsonLinesRenderer<W: Write> {
    out: W,
    frames: u64,
}

impl<W: Write> JsonLinesRenderer<W> {
    /// Write to `out`
    pub fn new(out: W) -> Self {
        Self { out, frames: 0 }
    }

    fn emit(&mut self, record: &Record<'_>) -> Result<(), HardwareError> {
        serde_json::to_writer(&mut self.out, record)
            .map_err(|e| HardwareError::Render(e.to_string()))?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn load_atlas(&mut self, atlas: &AtlasConfig) -> Result<(), HardwareError> {
        let layers = LayerId::ALL
            .iter()
            .map(|&layer| {
                let anchor = atlas.anchor(layer);
                LayerRecord {
                    layer,
                    bitmap: atlas.bitmap_path(layer).display().to_string(),
                    anchor: [anchor.x, anchor.y],
                    transparent: atlas.transparency_key(layer).map(|c| c.to_string()),
                }
            })
            .collect();
        self.emit(&Record::Atlas {
            frame_width: atlas.frame_width,
            frame_height: atlas.frame_height,
            layers,
        })
    }

    fn render(&mut self, frame: &LayerFrame) -> Result<(), HardwareError> {
        self.emit(&Record::Frame {
            tick: self.frames,
            layers: frame.layers(),
        })?;
        self.frames += 1;
        Ok(())
    }
}

/// Logs frames through tracing, only when something moved
#[derive(Debug, Default)]
pub struct LogRenderer {
    last: Option<LayerFrame>,
}

impl LogRenderer {
    /// Create a renderer with no frame drawn yet
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for LogRenderer {
    fn load_atlas(&mut self, atlas: &AtlasConfig) -> Result<(), HardwareError> {
        for layer in LayerId::ALL {
            let anchor = atlas.anchor(layer);
            info!(
                %layer,
                bitmap = %atlas.bitmap_path(layer).display(),
                x = anchor.x,
                y = anchor.y,
                key = ?atlas.transparency_key(layer).map(|c| c.to_string()),
                "Layer loaded"
            );
        }
        Ok(())
    }

    fn render(&mut self, frame: &LayerFrame) -> Result<(), HardwareError> {
        if self.last.as_ref() == Some(frame) {
            return Ok(());
        }
        for placement in frame.movable() {
            let moved = self
                .last
                .as_ref()
                .map_or(true, |last| last.get(placement.layer) != *placement);
            if moved {
                debug!(layer = %placement.layer, x = placement.x, y = placement.y, "Layer moved");
            }
        }
        self.last = Some(frame.clone());
        Ok(())
    }
}
