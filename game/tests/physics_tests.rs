use std::f32::consts::FRAC_PI_2;

use game::catalog::Tetromino;
use game::geometry::{Vec2, axis_aligned_extent, centroid, grab_anchor};
use game::grid::Grid;
use game::physics::{
    LockDecision, PhysicsConfig, PiecePhase, SnapError, apply_void_safety, integrate_substep,
    is_touching_ground, resolve_grid_collisions, resolve_world_bounds, snap_to_grid, spring_tension,
    step_frame,
};
use game::piece::{Piece, SPAWN_POSITION};

const GRAY: [u8; 4] = [128, 128, 128, 255];
const FRAME: f32 = 0.05;

fn resting_o(x: f32) -> Piece {
    Piece::new(Tetromino::O).with_position(Vec2::new(x, 18.0))
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn resolution_is_idempotent_for_a_resting_piece() {
    let config = PhysicsConfig::default();
    let mut grid = Grid::new();
    grid.fill_row(19, GRAY, &[]);
    let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(4.0, 17.0));

    for _ in 0..3 {
        assert_eq!(resolve_grid_collisions(&mut piece, &grid, &config), 0);
        resolve_world_bounds(&mut piece, &config);
        assert_eq!(piece.position, Vec2::new(4.0, 17.0));
        assert_eq!(piece.velocity, Vec2::ZERO);
    }
    assert!(is_touching_ground(&piece, &grid, &config));
}

#[test]
fn spring_is_slack_when_pointer_sits_on_the_anchor() {
    let config = PhysicsConfig {
        gravity: 0.0,
        ..PhysicsConfig::default()
    };
    let mut piece = Piece::new(Tetromino::T).with_position(Vec2::new(3.0, 6.0));
    piece.is_grabbed = true;
    piece.grab_offset = Vec2::new(0.5, -0.25);
    let target = Some(grab_anchor(&piece));

    assert_eq!(spring_tension(&piece, target, &config), Some(0.0));
    integrate_substep(&mut piece, target, &config, 0.01);
    assert_eq!(piece.velocity, Vec2::ZERO);
    assert_eq!(piece.angular_velocity, 0.0);
}

#[test]
fn spring_tension_scales_with_stretch() {
    let config = PhysicsConfig::default();
    let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(3.0, 6.0));
    piece.is_grabbed = true;
    let target = centroid(&piece) + Vec2::new(3.0, 4.0);
    let tension = spring_tension(&piece, Some(target), &config).expect("held piece");
    assert!(approx(tension, 5.0 * config.spring_strength));
}

#[test]
fn off_center_pull_spins_the_piece() {
    let config = PhysicsConfig {
        gravity: 0.0,
        ..PhysicsConfig::default()
    };
    let mut piece = Piece::new(Tetromino::I).with_position(Vec2::new(3.0, 6.0));
    piece.is_grabbed = true;
    piece.grab_offset = Vec2::new(1.5, 0.0);
    let target = grab_anchor(&piece) + Vec2::new(0.0, 2.0);

    integrate_substep(&mut piece, Some(target), &config, 0.01);
    assert!(piece.angular_velocity > 0.0, "downward pull on the right arm turns clockwise");
    assert!(piece.velocity.y > 0.0);
}

#[test]
fn grounded_settled_piece_locks_after_the_delay() {
    let config = PhysicsConfig::default();
    let grid = Grid::new();
    let mut piece = resting_o(4.0);

    for _ in 0..9 {
        let step = step_frame(&mut piece, &grid, None, &config, FRAME);
        assert_eq!(step.decision, LockDecision::Continue);
        assert_eq!(step.phase, PiecePhase::Grounded);
    }
    assert!(piece.lock_timer > 0.4);

    let locked = (0..3).any(|_| step_frame(&mut piece, &grid, None, &config, FRAME).decision == LockDecision::Lock);
    assert!(locked);
}

#[test]
fn grabbing_resets_the_lock_timer() {
    let config = PhysicsConfig::default();
    let grid = Grid::new();
    let mut piece = resting_o(4.0);
    for _ in 0..4 {
        step_frame(&mut piece, &grid, None, &config, FRAME);
    }
    assert!(piece.lock_timer > 0.0);

    piece.is_grabbed = true;
    let step = step_frame(&mut piece, &grid, None, &config, FRAME);
    assert_eq!(step.phase, PiecePhase::Grabbed);
    assert_eq!(piece.lock_timer, 0.0);
}

#[test]
fn spinning_piece_never_starts_the_lock_timer() {
    let config = PhysicsConfig::default();
    let grid = Grid::new();
    let mut piece = resting_o(4.0);
    piece.lock_timer = 0.3;
    piece.angular_velocity = 6.0;

    let step = step_frame(&mut piece, &grid, None, &config, FRAME);
    assert_eq!(step.decision, LockDecision::Continue);
    assert_eq!(piece.lock_timer, 0.0);
}

#[test]
fn sliding_piece_never_starts_the_lock_timer() {
    let config = PhysicsConfig::default();
    let grid = Grid::new();
    let mut piece = resting_o(4.0);
    piece.lock_timer = 0.3;
    piece.velocity.x = 5.0;

    let step = step_frame(&mut piece, &grid, None, &config, FRAME);
    assert_eq!(step.phase, PiecePhase::Grounded);
    assert!(piece.velocity.x > config.lock_linear_threshold);
    assert_eq!(piece.lock_timer, 0.0);
}

#[test]
fn rising_piece_never_starts_the_lock_timer() {
    let config = PhysicsConfig::default();
    let grid = Grid::new();
    let mut piece = resting_o(4.0);
    piece.lock_timer = 0.3;
    // Floor contact zeroes downward speed, so only an upward kick survives the frame.
    // A short frame keeps the piece within the grounded band.
    piece.velocity.y = -5.0;

    let step = step_frame(&mut piece, &grid, None, &config, 0.004);
    assert_eq!(step.phase, PiecePhase::Grounded);
    assert!(piece.velocity.y.abs() > config.lock_linear_threshold);
    assert_eq!(piece.lock_timer, 0.0);
}

#[test]
fn magnet_pulls_a_resting_piece_toward_its_column() {
    let config = PhysicsConfig::default();
    let grid = Grid::new();
    let mut piece = resting_o(4.3);
    step_frame(&mut piece, &grid, None, &config, FRAME);
    assert!(piece.velocity.x < 0.0);
}

#[test]
fn oversized_frame_is_clamped() {
    let config = PhysicsConfig::default();
    let mut piece = Piece::new(Tetromino::T).with_position(Vec2::new(4.0, 2.0));
    let step = step_frame(&mut piece, &Grid::new(), None, &config, 1.0);
    assert_eq!(step.delta, config.max_frame_delta);
    assert_eq!(step.tension, None);
    assert_eq!(step.phase, PiecePhase::Flying);
}

#[test]
fn near_quarter_turn_snaps_to_one_rotation() {
    let config = PhysicsConfig::default();
    let grid = Grid::new();
    let piece = Piece::new(Tetromino::I)
        .with_position(Vec2::new(3.2, 5.4))
        .with_rotation(89f32.to_radians());

    let locked = snap_to_grid(piece, &grid, &config).expect("empty well");
    assert_eq!(locked.shape, Tetromino::I.shape().rotated_right());
    assert_eq!((locked.x, locked.y), (3, 5));
    let cells: Vec<_> = locked.cells().collect();
    assert_eq!(cells, vec![(5, 5), (5, 6), (5, 7), (5, 8)]);
}

#[test]
fn negative_quarter_turn_wraps_to_three_right_turns() {
    let config = PhysicsConfig::default();
    let piece = Piece::new(Tetromino::T)
        .with_position(Vec2::new(4.0, 10.0))
        .with_rotation(-FRAC_PI_2 + 0.1);
    let locked = snap_to_grid(piece, &Grid::new(), &config).expect("empty well");
    assert_eq!(locked.shape, Tetromino::T.shape().rotated_right_times(3));
}

#[test]
fn snap_lifts_an_overlapping_piece() {
    let config = PhysicsConfig::default();
    let mut grid = Grid::new();
    grid.fill_row(19, GRAY, &[0]);
    let piece = Piece::new(Tetromino::O).with_position(Vec2::new(4.0, 18.4));
    let locked = snap_to_grid(piece, &grid, &config).expect("room above");
    assert_eq!((locked.x, locked.y), (4, 17));
}

#[test]
fn snap_gives_up_when_no_row_fits() {
    let config = PhysicsConfig::default();
    // Column 9 plus the O's width overhangs the right wall at every height.
    let piece = Piece::new(Tetromino::O).with_position(Vec2::new(9.2, 10.0));
    assert!(matches!(
        snap_to_grid(piece, &Grid::new(), &config),
        Err(SnapError::Unresolvable { x: 9, .. })
    ));
}

#[test]
fn wall_contact_bounces_with_restitution() {
    let config = PhysicsConfig::default();
    let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(-0.5, 5.0));
    piece.velocity = Vec2::new(-4.0, 0.0);
    resolve_world_bounds(&mut piece, &config);
    assert!(approx(piece.position.x, 0.0));
    assert!(approx(axis_aligned_extent(&piece).min_x, 0.0));
    assert!(approx(piece.velocity.x, 4.0 * config.wall_restitution));

    let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(8.75, 5.0));
    piece.velocity = Vec2::new(2.0, 0.0);
    resolve_world_bounds(&mut piece, &config);
    assert!(approx(piece.position.x, 8.0));
    assert!(piece.velocity.x < 0.0);
}

#[test]
fn floor_contact_stops_fall_and_applies_friction() {
    let config = PhysicsConfig::default();
    let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(4.0, 18.5));
    piece.velocity = Vec2::new(2.0, 3.0);
    resolve_world_bounds(&mut piece, &config);
    assert!(approx(piece.position.y, 18.0));
    assert_eq!(piece.velocity.y, 0.0);
    assert!(approx(piece.velocity.x, 2.0 * config.floor_friction));
}

#[test]
fn no_ceiling_above_the_well() {
    let config = PhysicsConfig::default();
    let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(4.0, -4.0));
    piece.velocity = Vec2::new(0.0, -3.0);
    resolve_world_bounds(&mut piece, &config);
    assert_eq!(piece.position, Vec2::new(4.0, -4.0));
    assert_eq!(piece.velocity.y, -3.0);
}

#[test]
fn landing_on_the_stack_kills_motion() {
    let config = PhysicsConfig::default();
    let mut grid = Grid::new();
    grid.fill_row(10, GRAY, &[]);
    let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(4.0, 8.3));
    piece.velocity = Vec2::new(1.0, 6.0);
    piece.angular_velocity = 0.5;

    assert_eq!(resolve_grid_collisions(&mut piece, &grid, &config), 1);
    assert!(approx(piece.position.y, 8.0));
    assert_eq!(piece.velocity, Vec2::ZERO);
    assert_eq!(piece.angular_velocity, 0.0);
}

#[test]
fn side_bump_pushes_out_and_damps() {
    let config = PhysicsConfig::default();
    let mut grid = Grid::new();
    grid.set_cell(3, 5, Some(GRAY));
    let mut piece = Piece::new(Tetromino::O).with_position(Vec2::new(3.7, 4.5));
    piece.velocity = Vec2::new(-2.0, 0.0);

    assert_eq!(resolve_grid_collisions(&mut piece, &grid, &config), 1);
    assert!(approx(piece.position.x, 4.0));
    assert!(approx(piece.velocity.x, -1.0));
}

#[test]
fn void_safety_recovers_escaped_pieces() {
    let config = PhysicsConfig::default();
    let mut piece = Piece::new(Tetromino::S).with_position(Vec2::new(4.0, 30.0));
    piece.velocity = Vec2::new(1.0, 9.0);
    apply_void_safety(&mut piece, &config);
    assert_eq!(piece.position.y, config.void_floor_reset_y);
    assert_eq!(piece.velocity, Vec2::new(1.0, 0.0));

    piece.position.y = -25.0;
    piece.velocity.y = -9.0;
    apply_void_safety(&mut piece, &config);
    assert_eq!(piece.position.y, config.void_ceiling_reset_y);
    assert_eq!(piece.velocity.y, 0.0);
}

#[test]
fn non_finite_state_is_reset() {
    let config = PhysicsConfig::default();
    let mut piece = Piece::new(Tetromino::Z).with_position(Vec2::new(f32::NAN, 3.0));
    piece.velocity = Vec2::new(f32::NAN, f32::INFINITY);
    piece.angular_velocity = f32::NAN;
    piece.rotation = f32::NAN;

    integrate_substep(&mut piece, None, &config, 0.01);
    assert_eq!(piece.velocity, Vec2::ZERO);
    assert_eq!(piece.angular_velocity, 0.0);
    assert_eq!(piece.position.x, SPAWN_POSITION.x);
    assert_eq!(piece.rotation, 0.0);
    assert!(piece.position.is_finite());
}
