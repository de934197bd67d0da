//! The five-user, seven-item ratings matrix used by the demo binary.

/// Rows are users, columns are items; `0` means "not rated".
pub const DEMO_MATRIX: [[f32; 7]; 5] = [
    [3.0, 1.0, 4.0, 4.0, 1.0, 0.0, 0.0],
    [0.0, 5.0, 1.0, 0.0, 0.0, 4.0, 0.0],
    [1.0, 0.0, 5.0, 4.0, 3.0, 5.0, 2.0],
    [3.0, 1.0, 4.0, 3.0, 5.0, 0.0, 0.0],
    [5.0, 2.0, 0.0, 1.0, 0.0, 5.0, 5.0],
];

pub const NEIGHBORHOOD_NUM: usize = 2;
pub const RECOMMENDER_NUM: usize = 3;

pub fn demo_matrix() -> Vec<Vec<f32>> {
    DEMO_MATRIX.iter().map(|row| row.to_vec()).collect()
}
