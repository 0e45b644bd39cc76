use glam::{DQuat, DVec3, EulerRot};

/// Euler angles in degrees, decomposed as yaw (Y) then pitch (X) then roll (Z)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EulerAngles {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl EulerAngles {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn from_quat(orientation: DQuat) -> Self {
        let (yaw, pitch, roll) = orientation.to_euler(EulerRot::YXZ);
        Self {
            pitch: pitch.to_degrees(),
            yaw: yaw.to_degrees(),
            roll: roll.to_degrees(),
        }
    }

    /// Components in pitch, yaw, roll order
    pub fn to_array(&self) -> [f64; 3] {
        [self.pitch, self.yaw, self.roll]
    }
}

/// Tilt from the horizontal: yaw does not contribute
pub fn compute_tilt(angles: &EulerAngles) -> f64 {
    (angles.pitch * angles.pitch + angles.roll * angles.roll).sqrt()
}

/// Speed between two positions; zero when dt is not positive
pub fn compute_velocity(current: DVec3, previous: DVec3, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    (current - previous).length() / dt
}

/// Change in speed magnitude over the current interval
pub fn compute_acceleration(
    current: DVec3,
    previous: DVec3,
    second_previous: DVec3,
    current_dt: f64,
    previous_dt: f64,
) -> f64 {
    if current_dt <= 0.0 {
        return 0.0;
    }
    let current_speed = compute_velocity(current, previous, current_dt);
    let previous_speed = compute_velocity(previous, second_previous, previous_dt);
    (current_speed - previous_speed) / current_dt
}

/// Rotation angle in degrees from the first orientation to the second
pub fn compute_joint_angle(first: DQuat, second: DQuat) -> f64 {
    let relative = first.conjugate() * second;
    let length = relative.length();
    if length == 0.0 || !length.is_finite() {
        return 0.0;
    }
    let scalar = (relative.w / length).clamp(-1.0, 1.0);
    (2.0 * scalar.acos()).to_degrees()
}

/// Distance between two points in the X-Z plane, in centimeters
pub fn compute_horizontal_distance(first: DVec3, second: DVec3) -> f64 {
    let dx = second.x - first.x;
    let dz = second.z - first.z;
    (dx * dx + dz * dz).sqrt() * 100.0
}
