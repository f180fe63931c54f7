//! Wire protocol exchanged with the relay
//!
//! Every message is a JSON envelope `{"type": "<event>", "payload": {...}}`
//! with camelCase payload fields. `currentLevel` fields are advisory and are
//! never checked against the receiver's level.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sim::{EntityId, Tool};

/// 2D point as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawShape {
    pub points: Vec<Point>,
    pub custom_id: EntityId,
    pub current_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision_category: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_number: Option<i32>,
    /// Comma-separated ids of the pins the shape covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nails_id_string: Option<String>,
}

impl DrawShape {
    /// Pin ids listed in `nails_id_string`
    pub fn nail_ids(&self) -> Vec<EntityId> {
        self.nails_id_string
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(EntityId::parse)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawPin {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    pub custom_id: EntityId,
    pub target_body_custom_id: EntityId,
    pub nail_group_number: i32,
    pub nail_category: u16,
    pub current_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChain {
    pub custom_id: EntityId,
    pub pin_a_id: EntityId,
    pub pin_b_id: EntityId,
    pub stiffness: f32,
    pub damping: f32,
    pub length: f32,
    pub current_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erase {
    pub custom_id: EntityId,
    pub current_level: u32,
    /// Set when the simulation (cascade or fade-out) asked for the erase
    /// rather than a player; such erases do not consume a turn.
    #[serde(default)]
    pub is_release: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseCategory {
    pub category: u16,
    pub current_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Push {
    pub force: Point,
    pub current_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeTool {
    pub tool: Tool,
    pub current_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeTurn {
    pub next_player_id: String,
    #[serde(default)]
    pub current_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTurn {
    pub current_turn: String,
}

/// Level navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLevel {
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetLevel {
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLevel {
    pub completed_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelList {
    pub levels: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseMove {
    pub x: f32,
    pub y: f32,
    pub player_id: String,
}

/// One relay message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum NetEvent {
    DrawShape(DrawShape),
    DrawPin(DrawPin),
    CreateChain(CreateChain),
    Erase(Erase),
    ReleaseCategory(ReleaseCategory),
    Push(Push),
    ChangeTool(ChangeTool),
    ChangeTurn(ChangeTurn),
    GetTurn,
    UpdateTurn(UpdateTurn),
    ChangeLevel(ChangeLevel),
    ResetLevel(ResetLevel),
    CompleteLevel(CompleteLevel),
    GetCompletedLevels,
    CompletedLevelsResponse(LevelList),
    CompletedLevelsUpdated(LevelList),
    MouseMove(MouseMove),
}

impl NetEvent {
    /// Wire event name
    pub fn name(&self) -> &'static str {
        match self {
            NetEvent::DrawShape(_) => "drawShape",
            NetEvent::DrawPin(_) => "drawPin",
            NetEvent::CreateChain(_) => "createChain",
            NetEvent::Erase(_) => "erase",
            NetEvent::ReleaseCategory(_) => "releaseCategory",
            NetEvent::Push(_) => "push",
            NetEvent::ChangeTool(_) => "changeTool",
            NetEvent::ChangeTurn(_) => "changeTurn",
            NetEvent::GetTurn => "getTurn",
            NetEvent::UpdateTurn(_) => "updateTurn",
            NetEvent::ChangeLevel(_) => "changeLevel",
            NetEvent::ResetLevel(_) => "resetLevel",
            NetEvent::CompleteLevel(_) => "completeLevel",
            NetEvent::GetCompletedLevels => "getCompletedLevels",
            NetEvent::CompletedLevelsResponse(_) => "completedLevelsResponse",
            NetEvent::CompletedLevelsUpdated(_) => "completedLevelsUpdated",
            NetEvent::MouseMove(_) => "mouseMove",
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let event = NetEvent::Erase(Erase {
            custom_id: EntityId::parse("nail_ab-1"),
            current_level: 3,
            is_release: false,
        });
        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "erase");
        assert_eq!(json["payload"]["customId"], "nail_ab-1");
        assert_eq!(json["payload"]["currentLevel"], 3);
    }

    #[test]
    fn test_decode_legacy_draw_shape() {
        let json = r#"{"type":"drawShape","payload":{
            "points":[{"x":1,"y":2},{"x":30,"y":2},{"x":15,"y":40}],
            "customId":"custom_1700000000000","currentLevel":1}}"#;
        let NetEvent::DrawShape(shape) = NetEvent::from_json(json).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(shape.points.len(), 3);
        assert_eq!(shape.custom_id.to_string(), "custom_1700000000000");
        assert!(shape.collision_category.is_none());
        assert!(shape.nail_ids().is_empty());
    }

    #[test]
    fn test_nail_id_list() {
        let shape = DrawShape {
            points: vec![],
            custom_id: EntityId::parse("custom_1"),
            current_level: 1,
            collision_category: Some(4),
            group_number: Some(-2),
            nails_id_string: Some("nail_a, nail_b,".into()),
        };
        let ids = shape.nail_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(EntityId::is_pin));
    }

    #[test]
    fn test_unit_variants_and_names() {
        let json = NetEvent::GetTurn.to_json().unwrap();
        assert_eq!(json, r#"{"type":"getTurn"}"#);
        assert_eq!(NetEvent::from_json(&json).unwrap().name(), "getTurn");
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(NetEvent::from_json(r#"{"type":"drawPin","payload":{"centerX":1}}"#).is_err());
        assert!(NetEvent::from_json("not json").is_err());
    }

    #[test]
    fn test_tool_is_lowercase() {
        let event = NetEvent::ChangeTool(ChangeTool {
            tool: Tool::Eraser,
            current_level: 1,
        });
        assert!(event.to_json().unwrap().contains(r#""tool":"eraser""#));
    }
}
