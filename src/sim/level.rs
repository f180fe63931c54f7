//! Static level geometry
//!
//! Each level is a fixed table: the four boundaries, the ball spawn, the
//! goal and a handful of static platforms. Nothing here is synchronized;
//! both clients build the same world from the level number.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyRole, Material};
use super::geometry::{center_on_area_centroid, trapezoid_vertices};
use super::ids::EntityId;
use super::world::World;
use crate::consts::{BALL_RADIUS, CANVAS_HEIGHT, CANVAS_WIDTH, TOTAL_LEVELS};

const WALL_FILL: u32 = 0x94a3b8;
const PLATFORM_FILL: u32 = 0x6b7280;
const GREEN_FILL: u32 = 0x10b981;
const RED_FILL: u32 = 0xef4444;
const BLUE_FILL: u32 = 0x3b82f6;
const GOAL_FILL: u32 = 0xfbbf24;

/// Name of the bottom boundary on the wire
pub const FLOOR_NAME: &str = "wall_bottom";
pub const BALL_NAME: &str = "ball";
pub const GOAL_NAME: &str = "balloon";

/// What the simulation needs to remember about a built level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub level: u32,
    pub ball_spawn: Vec2,
}

/// Axis-aligned static block: name, center, size, fill
type Block = (&'static str, (f32, f32), (f32, f32), u32);

struct LevelTable {
    ball_spawn: (f32, f32),
    ball_friction: f32,
    goal: (f32, f32),
    /// Level 1 uses grippy, slightly bouncy walls
    grippy_walls: bool,
    blocks: &'static [Block],
}

const LEVEL_1: LevelTable = LevelTable {
    ball_spawn: (200.0, 300.0),
    ball_friction: 0.01,
    goal: (600.0, 290.0),
    grippy_walls: true,
    blocks: &[
        ("tower1", (200.0, 400.0), (50.0, 200.0), PLATFORM_FILL),
        ("tower2", (300.0, 400.0), (50.0, 200.0), PLATFORM_FILL),
        ("tower3", (400.0, 400.0), (50.0, 200.0), PLATFORM_FILL),
        ("tower4", (500.0, 400.0), (50.0, 200.0), PLATFORM_FILL),
        ("tower5", (600.0, 400.0), (50.0, 200.0), PLATFORM_FILL),
    ],
};

const LEVEL_2: LevelTable = LevelTable {
    ball_spawn: (200.0, 500.0),
    ball_friction: 0.01,
    goal: (650.0, 430.0),
    grippy_walls: false,
    blocks: &[("horizontal_platform", (400.0, 550.0), (700.0, 200.0), PLATFORM_FILL)],
};

const LEVEL_3: LevelTable = LevelTable {
    ball_spawn: (400.0, 180.0),
    ball_friction: 0.05,
    goal: (400.0, 350.0),
    grippy_walls: false,
    blocks: &[
        ("top_bar", (400.0, 200.0), (150.0, 10.0), PLATFORM_FILL),
        ("vertical_bar", (400.0, 250.0), (10.0, 100.0), PLATFORM_FILL),
        ("red_box", (400.0, 375.0), (30.0, 30.0), RED_FILL),
        ("left_up_green_platform", (200.0, 300.0), (60.0, 10.0), GREEN_FILL),
        ("left_down_green_platform", (250.0, 500.0), (60.0, 10.0), GREEN_FILL),
        ("right_up_green_platform", (550.0, 300.0), (60.0, 10.0), GREEN_FILL),
        ("right_down_green_platform", (500.0, 500.0), (60.0, 10.0), GREEN_FILL),
    ],
};

const LEVEL_4: LevelTable = LevelTable {
    ball_spawn: (150.0, 400.0),
    ball_friction: 0.05,
    goal: (700.0, 350.0),
    grippy_walls: false,
    blocks: &[("horizontal_down_platform", (150.0, 450.0), (200.0, 150.0), PLATFORM_FILL)],
};

const LEVEL_5: LevelTable = LevelTable {
    ball_spawn: (100.0, 300.0),
    ball_friction: 0.05,
    goal: (650.0, 520.0),
    grippy_walls: false,
    blocks: &[
        ("left_red_wall", (600.0, 335.0), (40.0, 450.0), RED_FILL),
        ("right_red_wall", (700.0, 335.0), (40.0, 450.0), RED_FILL),
        ("bottom_red_wall", (650.0, 550.0), (140.0, 30.0), RED_FILL),
    ],
};

const LEVEL_6: LevelTable = LevelTable {
    ball_spawn: (500.0, 250.0),
    ball_friction: 0.05,
    goal: (150.0, 310.0),
    grippy_walls: false,
    blocks: &[
        ("red_platform", (120.0, 340.0), (250.0, 30.0), RED_FILL),
        ("central_obstacle_up", (400.0, 170.0), (90.0, 350.0), BLUE_FILL),
        ("central_obstacle_down", (400.0, 550.0), (90.0, 100.0), BLUE_FILL),
    ],
};

const LEVEL_7: LevelTable = LevelTable {
    ball_spawn: (150.0, 400.0),
    ball_friction: 0.05,
    goal: (700.0, 180.0),
    grippy_walls: false,
    blocks: &[
        ("horizontal_down_platform", (300.0, 450.0), (450.0, 150.0), PLATFORM_FILL),
        ("horizontal_up_platform", (550.0, 200.0), (400.0, 20.0), PLATFORM_FILL),
    ],
};

const LEVEL_8: LevelTable = LevelTable {
    ball_spawn: (80.0, 200.0),
    ball_friction: 0.01,
    goal: (750.0, 380.0),
    grippy_walls: false,
    blocks: &[
        ("pillar1", (750.0, 500.0), (80.0, 200.0), PLATFORM_FILL),
        ("pillar2", (670.0, 550.0), (80.0, 170.0), PLATFORM_FILL),
        ("pillar3", (490.0, 550.0), (100.0, 170.0), PLATFORM_FILL),
    ],
};

const LEVEL_9: LevelTable = LevelTable {
    ball_spawn: (150.0, 500.0),
    ball_friction: 0.05,
    goal: (600.0, 130.0),
    grippy_walls: false,
    blocks: &[
        ("horizontal_platform", (150.0, 550.0), (150.0, 100.0), PLATFORM_FILL),
        ("frame_top", (600.0, 80.0), (100.0, 25.0), WALL_FILL),
        ("frame_left", (550.0, 110.0), (25.0, 85.0), WALL_FILL),
        ("frame_right", (650.0, 110.0), (25.0, 85.0), WALL_FILL),
    ],
};

fn table(level: u32) -> Option<&'static LevelTable> {
    Some(match level {
        1 => &LEVEL_1,
        2 => &LEVEL_2,
        3 => &LEVEL_3,
        4 => &LEVEL_4,
        5 => &LEVEL_5,
        6 => &LEVEL_6,
        7 => &LEVEL_7,
        8 => &LEVEL_8,
        9 => &LEVEL_9,
        _ => return None,
    })
}

/// Whether `level` has geometry
pub fn is_valid_level(level: u32) -> bool {
    (1..=TOTAL_LEVELS).contains(&level)
}

/// Add the geometry of `level` to `world`. Returns None for unknown levels.
pub fn build_level(world: &mut World, level: u32) -> Option<LevelLayout> {
    let table = table(level)?;

    add_boundaries(world, table.grippy_walls);

    let ball_spawn = Vec2::new(table.ball_spawn.0, table.ball_spawn.1);
    world.add_body(
        Body::circle(
            EntityId::scenery(BALL_NAME),
            BodyRole::Ball,
            ball_spawn,
            BALL_RADIUS,
            Material {
                friction: table.ball_friction,
                restitution: 0.3,
                air_friction: 0.01,
                ..Material::default()
            },
        )
        .filled(RED_FILL),
    );

    world.add_body(
        Body::polygon(
            EntityId::scenery(GOAL_NAME),
            BodyRole::Goal,
            Vec2::new(table.goal.0, table.goal.1),
            center_on_area_centroid(&trapezoid_vertices(20.0, 20.0, 1.0)),
            Material::default(),
        )
        .fixed()
        .filled(GOAL_FILL),
    );

    for &(name, (x, y), (w, h), fill) in table.blocks {
        world.add_body(
            Body::rectangle(
                EntityId::scenery(name),
                BodyRole::Scenery,
                Vec2::new(x, y),
                w,
                h,
                Material::default(),
            )
            .fixed()
            .filled(fill),
        );
    }

    match level {
        6 => {
            let ramp = center_on_area_centroid(&trapezoid_vertices(220.0, 100.0, 2.0));
            world.add_body(
                Body::polygon(
                    EntityId::scenery("green_ramp"),
                    BodyRole::Scenery,
                    Vec2::new(520.0, 310.0),
                    ramp,
                    Material::default(),
                )
                .fixed()
                .filled(GREEN_FILL),
            );
        }
        8 => world.add_body(rounded_slope()),
        _ => {}
    }

    log::info!("Built level {} ({} bodies)", level, world.bodies().len());
    Some(LevelLayout { level, ball_spawn })
}

fn add_boundaries(world: &mut World, grippy: bool) {
    let material = if grippy {
        Material {
            friction: 1.0,
            friction_static: 1.0,
            restitution: 0.2,
            ..Material::default()
        }
    } else {
        Material::default()
    };

    let w = CANVAS_WIDTH;
    let h = CANVAS_HEIGHT;
    let walls = [
        (FLOOR_NAME, BodyRole::Floor, Vec2::new(w / 2.0, h + 10.0), w + 10.0, 20.0),
        ("wall_top", BodyRole::Wall, Vec2::new(w / 2.0, -10.0), w + 10.0, 20.0),
        ("wall_left", BodyRole::Wall, Vec2::new(-10.0, h / 2.0), 20.0, h + 20.0),
        ("wall_right", BodyRole::Wall, Vec2::new(w + 10.0, h / 2.0), 20.0, h + 20.0),
    ];
    for (name, role, center, width, height) in walls {
        world.add_body(
            Body::rectangle(EntityId::scenery(name), role, center, width, height, material)
                .fixed()
                .filled(WALL_FILL),
        );
    }
}

/// Half-dome rising from the floor on the left of level 8
fn rounded_slope() -> Body {
    const SEGMENTS: usize = 30;
    const RADIUS: f32 = 450.0;
    let center = Vec2::new(30.0, 410.0);

    let arc: Vec<Vec2> = (0..=SEGMENTS)
        .map(|i| {
            let angle = std::f32::consts::PI * (i as f32 / SEGMENTS as f32);
            Vec2::new(center.x + RADIUS * angle.cos(), center.y - RADIUS * angle.sin())
        })
        .collect();

    Body::polygon(
        EntityId::scenery("rounded_slope"),
        BodyRole::Scenery,
        center,
        center_on_area_centroid(&arc),
        Material::default(),
    )
    .fixed()
    .filled(PLATFORM_FILL)
}
