//! Render snapshot
//!
//! A read-only, serializable view of the simulation for whatever paints the
//! canvas. Nothing here feeds back into the world.

use glam::Vec2;
use serde::Serialize;

use super::body::Shape;
use super::state::{RemoteCursor, Simulation, Tool};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyView {
    pub id: String,
    pub position: Vec2,
    pub angle: f32,
    /// World-space outline (empty for circles)
    pub vertices: Vec<Vec2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// CSS colour
    pub fill: String,
    pub opacity: f32,
    pub category: u16,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainView {
    pub id: String,
    pub from: Vec2,
    pub to: Vec2,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub level: u32,
    pub tool: Tool,
    pub current_turn: String,
    pub my_turn: bool,
    pub level_complete: bool,
    pub completed_levels: Vec<u32>,
    pub bodies: Vec<BodyView>,
    pub chains: Vec<ChainView>,
    pub stroke: Vec<Vec2>,
    pub cursors: Vec<RemoteCursor>,
}

impl Snapshot {
    pub fn capture(sim: &Simulation) -> Self {
        let bodies = sim
            .world
            .bodies()
            .iter()
            .map(|body| BodyView {
                id: body.id.to_string(),
                position: body.position,
                angle: body.angle,
                vertices: body.world_vertices(),
                radius: match body.shape {
                    Shape::Circle { radius } => Some(radius),
                    Shape::Polygon { .. } => None,
                },
                fill: format!("#{:06x}", body.render.fill),
                opacity: body.render.opacity,
                category: body.filter.category,
            })
            .collect();

        let chains = sim
            .world
            .constraints()
            .filter(|(_, c)| c.is_chain())
            .filter_map(|(_, c)| {
                let (from, to) = sim.world.endpoints(c)?;
                Some(ChainView {
                    id: c.label.as_ref()?.to_string(),
                    from,
                    to,
                })
            })
            .collect();

        Self {
            level: sim.level,
            tool: sim.tool,
            current_turn: sim.current_turn.clone(),
            my_turn: sim.is_my_turn(),
            level_complete: sim.level_complete,
            completed_levels: sim.completed.levels.clone(),
            bodies,
            chains,
            stroke: sim.stroke.clone(),
            cursors: sim.cursors.clone(),
        }
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
