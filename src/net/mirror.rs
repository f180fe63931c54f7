//! Remote event mirror
//!
//! Applies inbound relay events to the local simulation. Objects are rebuilt
//! through the same factory and graph code as local ones, with the
//! transmitted ids and filters, so both worlds agree on labels and
//! categories. References to entities this client does not have are
//! silently ignored.

use glam::Vec2;

use super::protocol::{CreateChain, DrawPin, DrawShape, NetEvent};
use crate::error::{ProtocolError, Result};
use crate::sim::factory::{self, Created, Origin};
use crate::sim::graph;
use crate::sim::input;
use crate::sim::state::Simulation;

/// Decode a JSON message and apply it. Malformed messages are logged and
/// returned as errors; the simulation is left untouched.
pub fn handle_message(sim: &mut Simulation, json: &str) -> Result<()> {
    let event = NetEvent::from_json(json).inspect_err(|e| {
        log::warn!("Dropping malformed message: {}", e);
    })?;
    apply(sim, event).inspect_err(|e| {
        log::warn!("Dropping event: {}", e);
    })
}

/// Apply one inbound event
pub fn apply(sim: &mut Simulation, event: NetEvent) -> Result<()> {
    log::debug!("<- {}", event.name());
    match event {
        NetEvent::DrawShape(shape) => mirror_shape(sim, shape)?,
        NetEvent::DrawPin(pin) => mirror_pin(sim, pin)?,
        NetEvent::CreateChain(chain) => mirror_chain(sim, chain)?,
        NetEvent::Erase(erase) => {
            graph::erase(sim, &erase.custom_id);
        }
        NetEvent::ReleaseCategory(release) => {
            check_category(release.category)?;
            let carried = sim
                .world
                .bodies()
                .iter()
                .any(|b| b.filter.category == release.category);
            if !carried {
                sim.categories.release(release.category);
            }
        }
        NetEvent::Push(push) => {
            input::apply_push(sim, push.force.into());
        }
        NetEvent::ChangeTool(change) => {
            sim.tool = change.tool;
            sim.drawing = false;
            sim.stroke.clear();
            sim.chain_anchor = None;
        }
        NetEvent::ChangeTurn(change) => sim.current_turn = change.next_player_id,
        NetEvent::UpdateTurn(update) => sim.current_turn = update.current_turn,
        NetEvent::ChangeLevel(change) => {
            if !sim.load_level(change.level) {
                return Err(ProtocolError::UnknownLevel(change.level));
            }
        }
        NetEvent::ResetLevel(reset) => {
            if !sim.load_level(reset.level) {
                return Err(ProtocolError::UnknownLevel(reset.level));
            }
        }
        NetEvent::CompleteLevel(complete) => {
            sim.completed.mark(complete.completed_level);
        }
        NetEvent::CompletedLevelsResponse(list) | NetEvent::CompletedLevelsUpdated(list) => {
            sim.completed.replace(&list.levels);
        }
        NetEvent::MouseMove(cursor) => {
            if cursor.player_id != sim.settings.player_id {
                sim.update_cursor(&cursor.player_id, Vec2::new(cursor.x, cursor.y));
            }
        }
        // Requests meant for the relay
        NetEvent::GetTurn | NetEvent::GetCompletedLevels => {}
    }
    Ok(())
}

fn check_category(category: u16) -> Result<()> {
    if category == 0 {
        return Err(ProtocolError::InvalidCategory(category));
    }
    Ok(())
}

fn check_finite(field: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(ProtocolError::InvalidValue { field, value });
    }
    Ok(())
}

fn mirror_shape(sim: &mut Simulation, shape: DrawShape) -> Result<()> {
    if let Some(category) = shape.collision_category {
        check_category(category)?;
    }
    for p in &shape.points {
        check_finite("points", p.x)?;
        check_finite("points", p.y)?;
    }
    if sim.world.contains_body(&shape.custom_id) {
        log::debug!("Already have {}", shape.custom_id);
        return Ok(());
    }

    let listed = shape.nail_ids();
    let points: Vec<Vec2> = shape.points.iter().map(|&p| p.into()).collect();
    let created = factory::create_shape(
        sim,
        &points,
        Origin::Remote,
        shape.collision_category,
        shape.group_number,
        Some(shape.custom_id),
    );
    let Some(Created::Shape { body, pins }) = created else {
        return Ok(());
    };

    // Trust the sender's pin list over our own overlap test
    let pins = if listed.is_empty() {
        pins
    } else {
        listed
            .into_iter()
            .filter(|id| id.is_pin() && sim.world.contains_body(id))
            .collect()
    };
    factory::install_shape(sim, body, &pins);
    Ok(())
}

fn mirror_pin(sim: &mut Simulation, pin: DrawPin) -> Result<()> {
    check_category(pin.nail_category)?;
    check_finite("centerX", pin.center_x)?;
    check_finite("centerY", pin.center_y)?;
    if !pin.radius.is_finite() || pin.radius <= 0.0 {
        return Err(ProtocolError::InvalidValue {
            field: "radius",
            value: pin.radius,
        });
    }
    if sim.world.contains_body(&pin.custom_id) {
        log::debug!("Already have {}", pin.custom_id);
        return Ok(());
    }

    factory::create_pin(
        sim,
        Vec2::new(pin.center_x, pin.center_y),
        pin.radius,
        Some(&pin.target_body_custom_id),
        Origin::Remote,
        Some(pin.nail_category),
        Some(pin.nail_group_number),
        Some(pin.custom_id),
    );
    Ok(())
}

fn mirror_chain(sim: &mut Simulation, chain: CreateChain) -> Result<()> {
    check_finite("stiffness", chain.stiffness)?;
    check_finite("damping", chain.damping)?;
    if !chain.length.is_finite() || chain.length < 0.0 {
        return Err(ProtocolError::InvalidValue {
            field: "length",
            value: chain.length,
        });
    }
    graph::create_chain(
        &mut sim.world,
        &chain.custom_id,
        &chain.pin_a_id,
        &chain.pin_b_id,
        chain.stiffness,
        chain.damping,
        Some(chain.length),
    );
    Ok(())
}
