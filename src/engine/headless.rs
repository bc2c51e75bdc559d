//! Headless Scene Engine
//!
//! Minimal [`PhysicsWorld`] and [`SceneView`] used by tests and the demo:
//! axis-aligned boxes, gravity on dynamic bodies, solid tiles, and
//! overlap contacts between registered groups. Resolution moves X first,
//! then Y, sweeping the tiles crossed on each axis.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_clamp, fixed_over_duration};
use crate::core::vec2::FixedVec2;
use crate::engine::{BodyGroup, BodyMotion, BodySpec, Contact, PhysicsWorld, SceneView};
use crate::game::actor::EntityId;
use crate::game::level::{LevelData, TileGrid};

#[derive(Clone, Debug)]
struct Body {
    group: BodyGroup,
    motion: BodyMotion,
    position: FixedVec2,
    half: FixedVec2,
    velocity: FixedVec2,
    grounded: bool,
}

impl Body {
    fn overlaps(&self, other: &Body) -> bool {
        let dx = (self.position.x as i64 - other.position.x as i64).abs();
        let dy = (self.position.y as i64 - other.position.y as i64).abs();
        dx < self.half.x as i64 + other.half.x as i64 && dy < self.half.y as i64 + other.half.y as i64
    }
}

/// Deterministic box physics over a tile grid.
#[derive(Clone, Debug)]
pub struct HeadlessWorld {
    gravity: Fixed,
    tiles: TileGrid,
    world: FixedVec2,
    bodies: BTreeMap<EntityId, Body>,
    /// Groups blocked by solid tiles
    tile_colliders: Vec<BodyGroup>,
    /// Group pairs whose overlaps are reported, in registration order
    overlap_pairs: Vec<(BodyGroup, BodyGroup)>,
    paused: bool,
    steps: u64,
}

impl HeadlessWorld {
    /// Empty world with `gravity` (fixed px/s², down).
    pub fn new(gravity: Fixed) -> Self {
        Self {
            gravity,
            tiles: TileGrid::new(0, 0, 1, 1),
            world: FixedVec2::ZERO,
            bodies: BTreeMap::new(),
            tile_colliders: Vec::new(),
            overlap_pairs: Vec::new(),
            paused: false,
            steps: 0,
        }
    }

    /// Number of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Does a body exist?
    pub fn has_body(&self, id: EntityId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Current velocity of a body.
    pub fn velocity(&self, id: EntityId) -> Option<FixedVec2> {
        self.bodies.get(&id).map(|body| body.velocity)
    }

    /// Steps taken since the last load (paused steps excluded).
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    fn collect_contacts(&self) -> Vec<Contact> {
        let mut contacts = Vec::new();
        for &(group_a, group_b) in &self.overlap_pairs {
            let side_a = self.bodies.iter().filter(|(_, body)| body.group == group_a);
            for (id_a, body_a) in side_a {
                let side_b = self.bodies.iter().filter(|(_, body)| body.group == group_b);
                for (id_b, body_b) in side_b {
                    if id_a != id_b && body_a.overlaps(body_b) {
                        contacts.push(Contact::new(*id_a, *id_b));
                    }
                }
            }
        }
        contacts
    }
}

impl PhysicsWorld for HeadlessWorld {
    fn load(&mut self, level: &LevelData) {
        self.tiles = level.platform().clone();
        self.world = FixedVec2::new(level.width(), level.height());
        self.bodies.clear();
        self.tile_colliders.clear();
        self.overlap_pairs.clear();
        self.paused = false;
        self.steps = 0;
    }

    fn spawn_body(&mut self, spec: BodySpec) {
        self.bodies.insert(spec.id, Body {
            group: spec.group,
            motion: spec.motion,
            position: spec.position,
            half: FixedVec2::new(spec.size.x / 2, spec.size.y / 2),
            velocity: FixedVec2::ZERO,
            grounded: false,
        });
    }

    fn remove_body(&mut self, id: EntityId) {
        self.bodies.remove(&id);
    }

    fn set_velocity_x(&mut self, id: EntityId, velocity: Fixed) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity.x = velocity;
        }
    }

    fn set_velocity_y(&mut self, id: EntityId, velocity: Fixed) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity.y = velocity;
        }
    }

    fn set_position(&mut self, id: EntityId, position: FixedVec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
        }
    }

    fn position(&self, id: EntityId) -> Option<FixedVec2> {
        self.bodies.get(&id).map(|body| body.position)
    }

    fn is_grounded(&self, id: EntityId) -> bool {
        self.bodies.get(&id).is_some_and(|body| body.grounded)
    }

    fn register_collider(&mut self, a: BodyGroup, b: BodyGroup) {
        match (a, b) {
            (BodyGroup::Platform, BodyGroup::Platform) => {}
            (BodyGroup::Platform, group) | (group, BodyGroup::Platform) => {
                if !self.tile_colliders.contains(&group) {
                    self.tile_colliders.push(group);
                }
            }
            pair => {
                if !self.overlap_pairs.contains(&pair) {
                    self.overlap_pairs.push(pair);
                }
            }
        }
    }

    fn step(&mut self, dt: Duration) -> Vec<Contact> {
        if self.paused {
            return Vec::new();
        }
        self.steps += 1;

        let tiles = &self.tiles;
        let world = self.world;
        for body in self.bodies.values_mut() {
            if body.motion != BodyMotion::Dynamic {
                continue;
            }
            let blocking = self.tile_colliders.contains(&body.group).then_some(tiles);
            integrate(body, self.gravity, dt, blocking, world);
        }

        self.collect_contacts()
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Any solid tile in the given columns and rows?
fn any_solid(tiles: &TileGrid, columns: RangeInclusive<i64>, row: i64) -> bool {
    columns.into_iter().any(|column| tiles.is_solid(column, row))
}

/// Displacement at `rate` over `dt`, saturated to the fixed range.
fn displacement(rate: Fixed, dt: Duration) -> Fixed {
    fixed_over_duration(rate, dt).clamp(Fixed::MIN as i64, Fixed::MAX as i64) as Fixed
}

/// Move one dynamic body by `dt`.
fn integrate(body: &mut Body, gravity: Fixed, dt: Duration, tiles: Option<&TileGrid>, world: FixedVec2) {
    body.velocity.y = body.velocity.y.saturating_add(displacement(gravity, dt));
    let dx = displacement(body.velocity.x, dt);
    let dy = displacement(body.velocity.y, dt);
    let half = body.half;
    let old = body.position;

    // Box edges; the far edge is exclusive
    let near = |center: Fixed, half: Fixed| center.saturating_sub(half);
    let far = |center: Fixed, half: Fixed| center.saturating_add(half).saturating_sub(1);

    // X axis
    let mut x = old.x.saturating_add(dx);
    if let Some(tiles) = tiles {
        let rows = tiles.row_of(near(old.y, half.y))..=tiles.row_of(far(old.y, half.y));
        let crossing = |column: i64| rows.clone().any(|row| tiles.is_solid(column, row));

        if dx > 0 {
            let columns = tiles.column_of(far(old.x, half.x) + 1)..=tiles.column_of(far(x, half.x));
            if let Some(column) = columns.into_iter().find(|c| crossing(*c)) {
                x = tiles.column_left(column) - half.x;
                body.velocity.x = 0;
            }
        } else if dx < 0 {
            let columns = tiles.column_of(near(x, half.x))..=tiles.column_of(near(old.x, half.x) - 1);
            if let Some(column) = columns.into_iter().rev().find(|c| crossing(*c)) {
                x = tiles.column_left(column + 1) + half.x;
                body.velocity.x = 0;
            }
        }
    }
    x = fixed_clamp(x, half.x, world.x - half.x);

    // Y axis
    let mut y = old.y.saturating_add(dy);
    if let Some(tiles) = tiles {
        let columns = tiles.column_of(near(x, half.x))..=tiles.column_of(far(x, half.x));

        if dy > 0 {
            let rows = tiles.row_of(far(old.y, half.y) + 1)..=tiles.row_of(far(y, half.y));
            if let Some(row) = rows.into_iter().find(|r| any_solid(tiles, columns.clone(), *r)) {
                y = tiles.row_top(row) - half.y;
                body.velocity.y = 0;
            }
        } else if dy < 0 {
            let rows = tiles.row_of(near(y, half.y))..=tiles.row_of(near(old.y, half.y) - 1);
            if let Some(row) = rows.into_iter().rev().find(|r| any_solid(tiles, columns.clone(), *r)) {
                y = tiles.row_top(row + 1) + half.y;
                body.velocity.y = 0;
            }
        }
    }
    if y > world.y - half.y {
        y = world.y - half.y;
        body.velocity.y = 0;
    } else if y < half.y {
        y = half.y;
        body.velocity.y = 0;
    }

    body.position = FixedVec2::new(x, y);

    // Standing on the world floor or a tile one pixel below the feet
    let on_floor = y >= world.y - half.y;
    let on_tile = tiles.is_some_and(|tiles| {
        tiles.overlaps_solid(
            FixedVec2::new(x - half.x, y + half.y),
            FixedVec2::new(x + half.x, y + half.y + FIXED_ONE),
        )
    });
    body.grounded = on_floor || on_tile;
}

// =============================================================================
// VIEW
// =============================================================================

/// Records what the level pushed to the view.
#[derive(Clone, Debug, Default)]
pub struct HeadlessView {
    bounds: Option<(FixedVec2, FixedVec2)>,
    target: FixedVec2,
    scroll: FixedVec2,
    parallax: BTreeMap<&'static str, Fixed>,
    frames: u64,
}

impl HeadlessView {
    /// Empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last camera bounds.
    pub fn bounds(&self) -> Option<(FixedVec2, FixedVec2)> {
        self.bounds
    }

    /// Last follow target.
    pub fn target(&self) -> FixedVec2 {
        self.target
    }

    /// Last scroll.
    pub fn scroll(&self) -> FixedVec2 {
        self.scroll
    }

    /// Last offset of a parallax layer.
    pub fn parallax(&self, layer: &str) -> Option<Fixed> {
        self.parallax.get(layer).copied()
    }

    /// Frames presented.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl SceneView for HeadlessView {
    fn set_camera_bounds(&mut self, min: FixedVec2, max: FixedVec2) {
        self.bounds = Some((min, max));
    }

    fn follow(&mut self, target: FixedVec2, scroll: FixedVec2) {
        self.target = target;
        self.scroll = scroll;
        self.frames += 1;
    }

    fn set_parallax(&mut self, layer: &'static str, offset_x: Fixed) {
        self.parallax.insert(layer, offset_x);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_int, GRAVITY};
    use crate::game::level::LevelData;

    const TICK: Duration = Duration::from_micros(16_667);

    /// 20x10 tiles of 16 px, floor on row 8, wall at column 10 rows 5-7.
    fn world() -> HeadlessWorld {
        let level = LevelData::builder(20, 10, 16, 16)
            .solid_row(8, 0, 19)
            .solid_row(5, 10, 10)
            .solid_row(6, 10, 10)
            .solid_row(7, 10, 10)
            .player_spawn(FixedVec2::from_ints(40, 40))
            .patrol_path(vec![FixedVec2::from_ints(0, 0), FixedVec2::from_ints(10, 0)])
            .build()
            .unwrap();

        let mut world = HeadlessWorld::new(GRAVITY);
        world.load(&level);
        world.register_collider(BodyGroup::Player, BodyGroup::Platform);
        world.register_collider(BodyGroup::Player, BodyGroup::Crates);
        world
    }

    fn run(world: &mut HeadlessWorld, ticks: usize) -> Vec<Contact> {
        let mut contacts = Vec::new();
        for _ in 0..ticks {
            contacts.extend(world.step(TICK));
        }
        contacts
    }

    #[test]
    fn test_falls_and_lands() {
        let mut world = world();
        world.spawn_body(BodySpec::player(FixedVec2::from_ints(40, 40)));

        run(&mut world, 120);

        // Floor top is 128, body is 22 tall
        assert_eq!(world.position(EntityId::PLAYER), Some(FixedVec2::from_ints(40, 117)));
        assert!(world.is_grounded(EntityId::PLAYER));
        assert_eq!(world.velocity(EntityId::PLAYER).unwrap().y, 0);
    }

    #[test]
    fn test_long_frame_still_lands() {
        let mut world = world();
        world.spawn_body(BodySpec::player(FixedVec2::from_ints(40, 40)));
        world.step(Duration::from_secs(90));
        assert_eq!(world.position(EntityId::PLAYER), Some(FixedVec2::from_ints(40, 117)));
        assert!(world.is_grounded(EntityId::PLAYER));

        // No tiles: the world floor (160) stops the fall
        let open = LevelData::builder(20, 10, 16, 16)
            .player_spawn(FixedVec2::from_ints(40, 40))
            .patrol_path(vec![FixedVec2::from_ints(0, 0), FixedVec2::from_ints(10, 0)])
            .build()
            .unwrap();
        let mut world = HeadlessWorld::new(GRAVITY);
        world.load(&open);
        world.register_collider(BodyGroup::Player, BodyGroup::Platform);
        world.spawn_body(BodySpec::player(FixedVec2::from_ints(40, 40)));
        world.step(Duration::from_secs(90));
        assert_eq!(world.position(EntityId::PLAYER), Some(FixedVec2::from_ints(40, 149)));
        assert!(world.is_grounded(EntityId::PLAYER));
    }

    #[test]
    fn test_jump_leaves_ground() {
        let mut world = world();
        world.spawn_body(BodySpec::player(FixedVec2::from_ints(40, 117)));
        run(&mut world, 1);
        assert!(world.is_grounded(EntityId::PLAYER));

        world.set_velocity_y(EntityId::PLAYER, from_int(-330));
        run(&mut world, 1);
        assert!(!world.is_grounded(EntityId::PLAYER));
        assert!(world.position(EntityId::PLAYER).unwrap().y < from_int(117));
    }

    #[test]
    fn test_wall_blocks() {
        let mut world = world();
        world.spawn_body(BodySpec::player(FixedVec2::from_ints(100, 117)));
        world.set_velocity_x(EntityId::PLAYER, from_int(160));

        run(&mut world, 120);

        // Wall left edge is 160
        assert_eq!(world.position(EntityId::PLAYER).unwrap().x, from_int(149));
    }

    #[test]
    fn test_world_bounds() {
        let mut world = world();
        world.spawn_body(BodySpec::player(FixedVec2::from_ints(20, 117)));
        world.set_velocity_x(EntityId::PLAYER, from_int(-160));

        run(&mut world, 60);
        assert_eq!(world.position(EntityId::PLAYER).unwrap().x, from_int(11));
    }

    #[test]
    fn test_contacts_only_for_registered_pairs() {
        let mut world = world();
        world.spawn_body(BodySpec::player(FixedVec2::from_ints(40, 117)));
        world.spawn_body(BodySpec::crate_body(
            EntityId::collectible(0),
            FixedVec2::from_ints(50, 120),
            FixedVec2::from_ints(16, 16),
        ));
        world.spawn_body(BodySpec::enemy(EntityId::enemy(0), FixedVec2::from_ints(45, 117)));

        let contacts = world.step(TICK);
        assert_eq!(contacts, vec![Contact::new(EntityId::PLAYER, EntityId::collectible(0))]);

        world.remove_body(EntityId::collectible(0));
        assert!(world.step(TICK).is_empty());
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_kinematic_bodies_do_not_fall() {
        let mut world = world();
        world.spawn_body(BodySpec::enemy(EntityId::enemy(0), FixedVec2::from_ints(45, 40)));
        run(&mut world, 30);
        assert_eq!(world.position(EntityId::enemy(0)), Some(FixedVec2::from_ints(45, 40)));
    }

    #[test]
    fn test_pause_freezes() {
        let mut world = world();
        world.spawn_body(BodySpec::player(FixedVec2::from_ints(40, 40)));
        world.pause();

        assert!(run(&mut world, 10).is_empty());
        assert_eq!(world.position(EntityId::PLAYER), Some(FixedVec2::from_ints(40, 40)));
        assert_eq!(world.step_count(), 0);
        assert!(world.is_paused());
    }
}
