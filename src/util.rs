use cgmath::{InnerSpace, Matrix};
use enum_map::Enum;

pub type Vec3 = cgmath::Vector3<f64>;
pub type Mat3 = cgmath::Matrix3<f64>;

pub fn enum_iter<E>() -> impl Iterator<Item = E>
where
    E: Enum,
{
    (0..E::LENGTH).map(|i| E::from_usize(i))
}

/// Rotation taking the direction of `p` to the +z axis.
/// The x axis of the new frame is chosen away from whichever of y or z is closer to `p`,
/// so the frame never degenerates.
pub fn rotate_to_z(p: Vec3) -> Mat3 {
    let new_z = p.normalize();
    let q = if new_z.z.abs() < new_z.y.abs() {
        Vec3::unit_z()
    } else {
        Vec3::unit_y()
    };
    let new_x = new_z.cross(q).normalize();
    let new_y = new_z.cross(new_x).normalize();
    Mat3::from_cols(new_x, new_y, new_z).transpose()
}

/// Angle of `w` around the axis `p`, measured in the frame of [`rotate_to_z`].
pub fn angle_around(p: Vec3, w: Vec3) -> f64 {
    let local = rotate_to_z(p) * w;
    local.y.atan2(local.x)
}

/// Matrix with the three points as columns.
pub fn from_points(points: [Vec3; 3]) -> Mat3 {
    Mat3::from_cols(points[0], points[1], points[2])
}
