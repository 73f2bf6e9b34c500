/// Steering toolkit for moving entities.
///
/// Steering only decides the per-tick velocity (`Motion::x_speed/y_speed`).
/// The actual displacement always goes through `physics::move_by`, so every
/// moving entity is tile-collision gated the same way.
///
/// Angles are radians with 0 pointing east and y growing downward, so
/// `PI / 2` points south.

use std::f64::consts::TAU;

use fastrand::Rng;

use super::entity::{Body, Motion, Steering};

/// Heading from `(fx, fy)` toward `(tx, ty)`.
pub fn angle_toward(fx: i32, fy: i32, tx: i32, ty: i32) -> f64 {
    ((ty - fy) as f64).atan2((tx - fx) as f64)
}

/// Heading from one body's centre toward another's.
pub fn angle_between(from: &Body, to: &Body) -> f64 {
    angle_toward(from.center_x(), from.center_y(), to.center_x(), to.center_y())
}

/// Integer per-tick velocity for `speed` along `angle`. Truncates toward zero.
pub fn velocity(speed: i32, angle: f64) -> (i32, i32) {
    let s = speed as f64;
    ((s * angle.cos()) as i32, (s * angle.sin()) as i32)
}

/// Recompute `motion`'s velocity for this tick.
///
/// `player` is the current player body, if there is a live player.
pub fn steer(
    motion: &mut Motion,
    steering: Steering,
    body: &Body,
    tick_count: u32,
    player: Option<&Body>,
    rng: &mut Rng,
) {
    let (vx, vy) = match steering {
        Steering::TowardPoint { x, y } => {
            if body.center_x() == x && body.center_y() == y {
                (0, 0)
            } else {
                velocity(motion.speed, angle_toward(body.center_x(), body.center_y(), x, y))
            }
        }
        Steering::PursuePlayer => match player {
            Some(target) => velocity(motion.speed, angle_between(body, target)),
            None => (0, 0),
        },
        Steering::Heading(angle) => velocity(motion.speed, angle),
        Steering::Wander { period } => {
            if tick_count % period.max(1) == 0 {
                velocity(motion.speed, rng.f64() * TAU)
            } else {
                (motion.x_speed, motion.y_speed)
            }
        }
    };
    motion.x_speed = vx;
    motion.y_speed = vy;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn angles_follow_screen_axes() {
        assert!((angle_toward(0, 0, 10, 0) - 0.0).abs() < 1e-9);
        assert!((angle_toward(0, 0, 0, 10) - FRAC_PI_2).abs() < 1e-9);
        assert!((angle_toward(0, 0, -10, 0).abs() - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn velocity_truncates() {
        assert_eq!(velocity(10, 0.0), (10, 0));
        assert_eq!(velocity(10, FRAC_PI_2), (0, 10));
        // 5 * cos(45°) = 3.53…
        assert_eq!(velocity(5, FRAC_PI_2 / 2.0), (3, 3));
    }

    #[test]
    fn pursuit_aims_at_player_centre() {
        let mut m = Motion::new(5);
        let me = Body::new(0, 0, 10, 10);
        let player = Body::new(100, 0, 10, 10);
        let mut rng = Rng::with_seed(1);
        steer(&mut m, Steering::PursuePlayer, &me, 0, Some(&player), &mut rng);
        assert_eq!((m.x_speed, m.y_speed), (5, 0));
    }

    #[test]
    fn pursuit_without_player_stops() {
        let mut m = Motion { speed: 5, x_speed: 3, y_speed: 3 };
        let me = Body::new(0, 0, 10, 10);
        let mut rng = Rng::with_seed(1);
        steer(&mut m, Steering::PursuePlayer, &me, 0, None, &mut rng);
        assert_eq!((m.x_speed, m.y_speed), (0, 0));
    }

    #[test]
    fn toward_point_stops_on_arrival() {
        let mut m = Motion::new(4);
        let me = Body::new(0, 0, 10, 10);
        let mut rng = Rng::with_seed(1);
        steer(&mut m, Steering::TowardPoint { x: 5, y: 50 }, &me, 0, None, &mut rng);
        assert_eq!((m.x_speed, m.y_speed), (0, 4));
        steer(&mut m, Steering::TowardPoint { x: 5, y: 5 }, &me, 1, None, &mut rng);
        assert_eq!((m.x_speed, m.y_speed), (0, 0));
    }

    #[test]
    fn wander_rerolls_only_on_period() {
        let me = Body::new(0, 0, 10, 10);
        let mut rng = Rng::with_seed(42);
        let mut m = Motion::new(6);
        steer(&mut m, Steering::Wander { period: 60 }, &me, 0, None, &mut rng);
        let first = (m.x_speed, m.y_speed);
        for t in 1..60 {
            steer(&mut m, Steering::Wander { period: 60 }, &me, t, None, &mut rng);
            assert_eq!((m.x_speed, m.y_speed), first);
        }

        // Same seed, same headings.
        let mut rng2 = Rng::with_seed(42);
        let mut m2 = Motion::new(6);
        steer(&mut m2, Steering::Wander { period: 60 }, &me, 0, None, &mut rng2);
        assert_eq!((m2.x_speed, m2.y_speed), first);
    }
}
