//! Continuous simulation of the active piece: sub-stepped integration, collision
//! resolution against the grid and the well, and the grounded/magnet/lock policy.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Vec2, axis_aligned_extent, centroid, rotated_block_positions, world_grab_offset};
use crate::grid::{GRID_HEIGHT, GRID_WIDTH, Grid};
use crate::piece::{LockedPiece, Piece, SPAWN_POSITION};

/// Tuning constants for the piece simulation. Every field has a serde default so partial
/// settings files keep working.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in cells/s^2.
    pub gravity: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
    pub spring_strength: f32,
    pub spring_force_scale: f32,
    pub torque_scale: f32,
    pub substeps: u32,
    /// Upper bound on a single frame's delta, in seconds.
    pub max_frame_delta: f32,
    pub collision_iterations: u32,
    /// Sample offset from each block center used by the collision probe.
    pub collision_probe: f32,
    pub horizontal_hit_damping: f32,
    pub wall_restitution: f32,
    pub floor_friction: f32,
    pub lock_linear_threshold: f32,
    pub lock_angular_threshold: f32,
    /// Seconds a settled, grounded piece waits before it locks.
    pub lock_delay: f32,
    pub magnet_gain: f32,
    pub grounded_epsilon: f32,
    pub void_floor: f32,
    pub void_floor_reset_y: f32,
    pub void_ceiling: f32,
    pub void_ceiling_reset_y: f32,
    /// Rows above the well a snapped piece may be pushed before the lock gives up.
    pub spawn_panic_rows: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 25.0,
            linear_drag: 0.999,
            angular_drag: 0.96,
            spring_strength: 8.0,
            spring_force_scale: 5.0,
            torque_scale: 2.0,
            substeps: 4,
            max_frame_delta: 0.05,
            collision_iterations: 10,
            collision_probe: 0.45,
            horizontal_hit_damping: 0.5,
            wall_restitution: 0.3,
            floor_friction: 0.8,
            lock_linear_threshold: 2.0,
            lock_angular_threshold: 3.0,
            lock_delay: 0.5,
            magnet_gain: 2.0,
            grounded_epsilon: 0.1,
            void_floor: 22.0,
            void_floor_reset_y: 10.0,
            void_ceiling: -10.0,
            void_ceiling_reset_y: 0.0,
            spawn_panic_rows: 5,
        }
    }
}

impl PhysicsConfig {
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.substeps = self.substeps.max(1);
        self.collision_iterations = self.collision_iterations.max(1);
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            self.max_frame_delta = defaults.max_frame_delta;
        }
        if !(self.lock_delay.is_finite() && self.lock_delay >= 0.0) {
            self.lock_delay = defaults.lock_delay;
        }
        self
    }

    /// Clamps a raw frame delta into `0..=max_frame_delta`.
    pub fn clamp_delta(&self, delta: f32) -> f32 {
        if !delta.is_finite() {
            return 0.0;
        }
        delta.clamp(0.0, self.max_frame_delta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PiecePhase {
    Flying,
    Grabbed,
    /// Touching ground while not held; the lock timer runs only in this phase.
    Grounded,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockDecision {
    Continue,
    Lock,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Frame delta after clamping.
    pub delta: f32,
    /// Spring tension sampled before the first sub-step, when the piece is held.
    pub tension: Option<f32>,
    pub phase: PiecePhase,
    pub decision: LockDecision,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SnapError {
    #[error("snapped piece still collides after rising to row {y} (column {x})")]
    Unresolvable { x: i32, y: i32 },
}

/// Rounds halves toward positive infinity (`-0.5` becomes `0`).
fn round_half_up(v: f32) -> f32 {
    (v + 0.5).floor()
}

fn nearest_quarter_turn(rotation: f32) -> f32 {
    round_half_up(rotation / FRAC_PI_2)
}

pub fn phase_of(piece: &Piece, grid: &Grid, config: &PhysicsConfig) -> PiecePhase {
    if piece.is_grabbed {
        PiecePhase::Grabbed
    } else if is_touching_ground(piece, grid, config) {
        PiecePhase::Grounded
    } else {
        PiecePhase::Flying
    }
}

/// Displacement from the grab anchor to the pointer, when the piece is held.
fn spring_displacement(piece: &Piece, target: Option<Vec2>) -> Option<(Vec2, Vec2)> {
    if !piece.is_grabbed {
        return None;
    }
    let target = target?;
    let lever = world_grab_offset(piece);
    let anchor = centroid(piece) + lever;
    Some((target - anchor, lever))
}

/// Scalar fed to the spring sound while the piece is held.
pub fn spring_tension(piece: &Piece, target: Option<Vec2>, config: &PhysicsConfig) -> Option<f32> {
    spring_displacement(piece, target).map(|(d, _)| d.length() * config.spring_strength)
}

/// One fixed integration step of length `dt`: forces, velocity, drag, position.
pub fn integrate_substep(piece: &mut Piece, target: Option<Vec2>, config: &PhysicsConfig, dt: f32) {
    let mut force = Vec2::new(0.0, config.gravity * piece.mass);
    let mut torque = 0.0;

    if let Some((displacement, lever)) = spring_displacement(piece, target) {
        let spring = displacement * (config.spring_strength * config.spring_force_scale);
        force += spring;
        torque += lever.cross(spring) * config.torque_scale;
    }

    piece.velocity += force * (dt / piece.mass);
    piece.angular_velocity += torque / piece.mass * dt;

    piece.velocity = piece.velocity * config.linear_drag;
    piece.angular_velocity *= config.angular_drag;

    if !piece.velocity.x.is_finite() {
        log::trace!("reset non-finite vx");
        piece.velocity.x = 0.0;
    }
    if !piece.velocity.y.is_finite() {
        log::trace!("reset non-finite vy");
        piece.velocity.y = 0.0;
    }
    if !piece.angular_velocity.is_finite() {
        log::trace!("reset non-finite angular velocity");
        piece.angular_velocity = 0.0;
    }

    piece.position += piece.velocity * dt;
    piece.rotation += piece.angular_velocity * dt;

    if !piece.position.x.is_finite() {
        log::trace!("reset non-finite x");
        piece.position.x = SPAWN_POSITION.x;
    }
    if !piece.position.y.is_finite() {
        log::trace!("reset non-finite y");
        piece.position.y = 0.0;
    }
    if !piece.rotation.is_finite() {
        log::trace!("reset non-finite rotation");
        piece.rotation = 0.0;
    }
}

/// Pushes the piece out of occupied grid cells, one contact per iteration, until clean or
/// out of iterations. Returns the number of contacts resolved.
pub fn resolve_grid_collisions(piece: &mut Piece, grid: &Grid, config: &PhysicsConfig) -> u32 {
    let p = config.collision_probe;
    let probes = [
        Vec2::ZERO,
        Vec2::new(0.0, p),
        Vec2::new(0.0, -p),
        Vec2::new(p, 0.0),
        Vec2::new(-p, 0.0),
    ];

    let mut resolved = 0;
    for _ in 0..config.collision_iterations {
        let contact = rotated_block_positions(piece).into_iter().find_map(|b| {
            probes.iter().find_map(|&off| {
                let probe = b + off;
                let gx = probe.x.floor() as i32;
                let gy = probe.y.floor() as i32;
                if !grid.is_occupied(gx, gy) {
                    return None;
                }
                let d = b - Vec2::new(gx as f32 + 0.5, gy as f32 + 0.5);
                let overlap = Vec2::new(1.0 - d.x.abs(), 1.0 - d.y.abs());
                (overlap.x > 0.0 && overlap.y > 0.0).then_some((d, overlap))
            })
        });
        let Some((d, overlap)) = contact else {
            break;
        };

        if overlap.x < overlap.y {
            // Side bump.
            piece.position.x += push_direction(d.x) * overlap.x;
            piece.velocity.x *= config.horizontal_hit_damping;
        } else {
            // Landing.
            piece.position.y += push_direction(d.y) * overlap.y;
            piece.velocity = Vec2::ZERO;
            piece.angular_velocity = 0.0;
        }
        resolved += 1;
    }
    resolved
}

/// `+1` for strictly positive offsets, `-1` otherwise.
fn push_direction(d: f32) -> f32 {
    if d > 0.0 { 1.0 } else { -1.0 }
}

/// Keeps the piece inside the well walls and above the floor. There is no ceiling.
pub fn resolve_world_bounds(piece: &mut Piece, config: &PhysicsConfig) {
    let extent = axis_aligned_extent(piece);
    let width = GRID_WIDTH as f32;
    let floor = GRID_HEIGHT as f32;

    if extent.min_x < 0.0 {
        piece.position.x -= extent.min_x;
        piece.velocity.x *= -config.wall_restitution;
    }
    if extent.max_x > width {
        piece.position.x -= extent.max_x - width;
        piece.velocity.x *= -config.wall_restitution;
    }
    if extent.max_y > floor {
        piece.position.y -= extent.max_y - floor;
        piece.velocity.y = 0.0;
        piece.velocity.x *= config.floor_friction;
    }
}

/// Teleports a piece that escaped far below the floor or far above the well.
pub fn apply_void_safety(piece: &mut Piece, config: &PhysicsConfig) {
    if piece.position.y > config.void_floor {
        log::trace!("piece fell through the floor at y={}", piece.position.y);
        piece.position.y = config.void_floor_reset_y;
        piece.velocity.y = 0.0;
    }
    if piece.position.y < config.void_ceiling {
        log::trace!("piece escaped above the well at y={}", piece.position.y);
        piece.position.y = config.void_ceiling_reset_y;
        piece.velocity.y = 0.0;
    }
}

/// True when any block reaches the floor line or rests on an occupied cell.
pub fn is_touching_ground(piece: &Piece, grid: &Grid, config: &PhysicsConfig) -> bool {
    let floor_line = GRID_HEIGHT as f32 - config.grounded_epsilon;
    rotated_block_positions(piece).into_iter().any(|b| {
        let bottom = b.y + 0.5;
        bottom >= floor_line
            || grid.is_occupied(b.x.floor() as i32, (bottom + config.grounded_epsilon).floor() as i32)
    })
}

fn is_settled(piece: &Piece, config: &PhysicsConfig) -> bool {
    piece.velocity.x.abs() < config.lock_linear_threshold
        && piece.velocity.y.abs() < config.lock_linear_threshold
        && piece.angular_velocity.abs() < config.lock_angular_threshold
}

/// Nudges a resting piece toward the nearest column and quarter turn. The column pull is
/// skipped when the aligned pose would overlap the grid.
fn apply_magnet(piece: &mut Piece, grid: &Grid, config: &PhysicsConfig) {
    let target_x = round_half_up(piece.position.x);
    let target_rotation = nearest_quarter_turn(piece.rotation) * FRAC_PI_2;

    let aligned = Vec2::new(target_x, piece.position.y);
    if !grid.check_collision_at(piece.shape(), aligned, piece.rotation) {
        piece.velocity.x += (target_x - piece.position.x) * config.magnet_gain;
    }
    piece.angular_velocity += (target_rotation - piece.rotation) * config.magnet_gain;
}

/// Advances the piece by one frame: sub-stepped integration and collision, then the
/// grounded/magnet/lock-timer policy.
pub fn step_frame(
    piece: &mut Piece,
    grid: &Grid,
    target: Option<Vec2>,
    config: &PhysicsConfig,
    delta: f32,
) -> FrameStep {
    let delta = config.clamp_delta(delta);
    let tension = spring_tension(piece, target, config);

    let substeps = config.substeps.max(1);
    let dt = delta / substeps as f32;
    for _ in 0..substeps {
        integrate_substep(piece, target, config, dt);
        resolve_grid_collisions(piece, grid, config);
        resolve_world_bounds(piece, config);
        apply_void_safety(piece, config);
    }

    let grounded = !piece.is_grabbed && is_touching_ground(piece, grid, config);
    let mut decision = LockDecision::Continue;
    if grounded && is_settled(piece, config) {
        apply_magnet(piece, grid, config);
        piece.lock_timer += delta;
        if piece.lock_timer > config.lock_delay {
            decision = LockDecision::Lock;
        }
    } else {
        piece.lock_timer = 0.0;
    }

    let phase = match decision {
        LockDecision::Lock => PiecePhase::Locked,
        LockDecision::Continue if piece.is_grabbed => PiecePhase::Grabbed,
        LockDecision::Continue if grounded => PiecePhase::Grounded,
        LockDecision::Continue => PiecePhase::Flying,
    };

    FrameStep {
        delta,
        tension,
        phase,
        decision,
    }
}

/// Lock transition: snaps rotation to the nearest quarter turn (rotating the matrix to
/// match), rounds the position to whole cells and lifts the piece until it fits.
pub fn snap_to_grid(piece: Piece, grid: &Grid, config: &PhysicsConfig) -> Result<LockedPiece, SnapError> {
    let quarter_turns = nearest_quarter_turn(piece.rotation) as i64;
    let turns = quarter_turns.rem_euclid(4) as usize;
    let x = round_half_up(piece.position.x);
    let mut y = round_half_up(piece.position.y);

    let (kind, shape, color) = piece.into_parts();
    let shape = shape.rotated_right_times(turns);

    let panic_line = -(config.spawn_panic_rows as f32);
    while grid.check_collision_at(&shape, Vec2::new(x, y), 0.0) {
        y -= 1.0;
        if y < panic_line {
            return Err(SnapError::Unresolvable {
                x: x as i32,
                y: y as i32,
            });
        }
    }

    Ok(LockedPiece {
        kind,
        shape,
        color,
        x: x as i32,
        y: y as i32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Tetromino;

    #[test]
    fn round_half_up_matches_grid_convention() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(-0.51), -1.0);
    }

    #[test]
    fn clamp_delta_bounds_slow_and_bogus_frames() {
        let config = PhysicsConfig::default();
        assert_eq!(config.clamp_delta(0.2), 0.05);
        assert_eq!(config.clamp_delta(-1.0), 0.0);
        assert_eq!(config.clamp_delta(f32::NAN), 0.0);
        assert_eq!(config.clamp_delta(0.016), 0.016);
    }

    #[test]
    fn free_fall_accelerates_downward_only() {
        let config = PhysicsConfig::default();
        let mut piece = Piece::new(Tetromino::T).with_position(Vec2::new(4.0, 2.0));
        integrate_substep(&mut piece, None, &config, 0.01);
        assert!(piece.velocity.y > 0.0);
        assert_eq!(piece.velocity.x, 0.0);
        assert_eq!(piece.angular_velocity, 0.0);
        assert!(piece.position.y > 2.0);
    }

    #[test]
    fn spring_without_pointer_target_is_inert() {
        let config = PhysicsConfig::default();
        let mut piece = Piece::new(Tetromino::T);
        piece.is_grabbed = true;
        assert_eq!(spring_tension(&piece, None, &config), None);
    }

    #[test]
    fn sanitized_config_repairs_degenerate_values() {
        let config = PhysicsConfig {
            substeps: 0,
            max_frame_delta: -1.0,
            lock_delay: f32::NAN,
            collision_iterations: 0,
            ..PhysicsConfig::default()
        }
        .sanitized();
        assert_eq!(config.substeps, 1);
        assert_eq!(config.collision_iterations, 1);
        assert_eq!(config.max_frame_delta, 0.05);
        assert_eq!(config.lock_delay, 0.5);
    }

    fn tilted_o() -> Piece {
        let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(4.4, 10.0));
        piece.rotation = 0.3;
        piece
    }

    #[test]
    fn magnet_pulls_column_and_rotation_in_open_space() {
        let config = PhysicsConfig::default();
        let mut piece = tilted_o();
        apply_magnet(&mut piece, &Grid::new(), &config);
        assert!((piece.velocity.x - -0.8).abs() < 1e-4);
        assert!((piece.angular_velocity - -0.6).abs() < 1e-4);
    }

    #[test]
    fn magnet_skips_column_pull_into_a_filled_cell() {
        let config = PhysicsConfig::default();
        let mut grid = Grid::new();
        grid.set_cell(4, 10, Some([128, 128, 128, 255]));
        let mut piece = tilted_o();
        assert!(!grid.check_collision_at(piece.shape(), piece.position, piece.rotation));
        assert!(grid.check_collision_at(piece.shape(), Vec2::new(4.0, 10.0), piece.rotation));

        apply_magnet(&mut piece, &grid, &config);
        assert_eq!(piece.velocity.x, 0.0);
        assert!((piece.angular_velocity - -0.6).abs() < 1e-4);
    }
}
