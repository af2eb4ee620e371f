//! Tessellated flat quad in the XZ plane.

use crate::mesh::{MeshData, MeshVertex};

/// Cells per side of the water surface.
pub const DEFAULT_GRID_SIZE: u32 = 40;
/// Half-extent of the water surface in world units.
pub const DEFAULT_GRID_SCALE: f32 = 50.0;
/// Largest accepted grid. Its index buffer (`6 * n * n` u32s, ~100 MB) stays
/// under the 256 MiB buffer limit and `(n + 1)^2` fits a u32 index.
pub const MAX_GRID_SIZE: u32 = 2048;

/// Byte size of the index buffer for an `n` x `n` grid.
pub fn grid_index_bytes(n: u32) -> u64 {
    6 * u64::from(n) * u64::from(n) * std::mem::size_of::<u32>() as u64
}

/// Build an `n` x `n` cell grid spanning `[-scale, scale]` on X and Z.
///
/// Vertices are row-major (`row * (n + 1) + col`), with `y = 0` and uv
/// running from `(0, 0)` to `(1, 1)`. Each cell emits `(bl, tr, br)` and
/// `(bl, tl, tr)`, counter-clockwise seen from +Y. `n` is clamped to
/// [`MAX_GRID_SIZE`].
pub fn generate_grid(n: u32, scale: f32) -> MeshData {
    if n > MAX_GRID_SIZE {
        log::warn!("grid size {n} too large, clamping to {MAX_GRID_SIZE}");
    }
    let n = n.min(MAX_GRID_SIZE);
    let side = n + 1;
    let cells_total = n as usize * n as usize;
    let mut vertices = Vec::with_capacity(side as usize * side as usize);
    let mut indices = Vec::with_capacity(6 * cells_total);

    let cells = n.max(1) as f32;
    for row in 0..side {
        for col in 0..side {
            let (u, v) = (col as f32 / cells, row as f32 / cells);
            vertices.push(MeshVertex::new(
                [(u * 2.0 - 1.0) * scale, 0.0, (v * 2.0 - 1.0) * scale],
                [u, v],
            ));
        }
    }

    for row in 0..n {
        for col in 0..n {
            let bl = row * side + col;
            let br = bl + 1;
            let tl = bl + side;
            let tr = tl + 1;
            indices.extend_from_slice(&[bl, tr, br, bl, tl, tr]);
        }
    }

    log::debug!(
        "grid {n}x{n}: {} vertices, {} indices",
        vertices.len(),
        indices.len()
    );

    MeshData::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross_y(mesh: &MeshData, [a, b, c]: [u32; 3]) -> f32 {
        let p = |i: u32| mesh.vertices[i as usize].position;
        let (a, b, c) = (p(a), p(b), p(c));
        let ab = [b[0] - a[0], b[2] - a[2]];
        let ac = [c[0] - a[0], c[2] - a[2]];
        // y component of (b - a) x (c - a) with y = 0 everywhere
        ab[1] * ac[0] - ab[0] * ac[1]
    }

    #[test]
    fn counts_and_bounds() {
        for n in [1u32, 2, 7, 40] {
            let mesh = generate_grid(n, 50.0);
            assert_eq!(mesh.vertices.len() as u32, (n + 1) * (n + 1));
            assert_eq!(mesh.indices.len() as u32, 6 * n * n);
            assert!(mesh.is_valid());
        }
    }

    #[test]
    fn corners_have_exact_uvs_and_positions() {
        let n = 4;
        let mesh = generate_grid(n, 50.0);
        let side = (n + 1) as usize;
        let at = |row: usize, col: usize| mesh.vertices[row * side + col];

        assert_eq!(at(0, 0).uv, [0.0, 0.0]);
        assert_eq!(at(0, n as usize).uv, [1.0, 0.0]);
        assert_eq!(at(n as usize, 0).uv, [0.0, 1.0]);
        assert_eq!(at(n as usize, n as usize).uv, [1.0, 1.0]);

        assert_eq!(at(0, 0).position, [-50.0, 0.0, -50.0]);
        assert_eq!(at(n as usize, n as usize).position, [50.0, 0.0, 50.0]);
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 0.0));
    }

    /// `(bl, br, tl, tr)` of a cell, read back from its two triangles.
    fn cell_corners(mesh: &MeshData, n: u32, row: u32, col: u32) -> [u32; 4] {
        let i = |k: usize| mesh.indices[((row * n + col) * 6) as usize + k];
        [i(0), i(2), i(4), i(1)]
    }

    #[test]
    fn adjacent_cells_share_edges() {
        let n = 3;
        let mesh = generate_grid(n, 10.0);
        let side = n + 1;
        for row in 0..n {
            for col in 0..n {
                let [bl, br, tl, tr] = cell_corners(&mesh, n, row, col);
                assert_eq!(br, row * side + col + 1);
                if col + 1 < n {
                    // right edge (br, tr) is the left edge (bl, tl) of the next column
                    let [nbl, _, ntl, _] = cell_corners(&mesh, n, row, col + 1);
                    assert_eq!((br, tr), (nbl, ntl));
                }
                if row + 1 < n {
                    // top edge (tl, tr) is the bottom edge (bl, br) of the next row
                    let [nbl, nbr, _, _] = cell_corners(&mesh, n, row + 1, col);
                    assert_eq!((tl, tr), (nbl, nbr));
                }
                assert_eq!(tl, bl + side);
            }
        }
    }

    #[test]
    fn oversized_grid_is_clamped() {
        assert!(grid_index_bytes(MAX_GRID_SIZE) <= 256 << 20);
        assert!(u64::from(MAX_GRID_SIZE + 1).pow(2) <= u64::from(u32::MAX));

        let mesh = generate_grid(u32::MAX, 1.0);
        let side = (MAX_GRID_SIZE + 1) as usize;
        assert_eq!(mesh.vertices.len(), side * side);
        assert_eq!(mesh.indices.len() as u64 * 4, grid_index_bytes(MAX_GRID_SIZE));
    }

    #[test]
    fn winding_is_uniform() {
        let mesh = generate_grid(5, 1.0);
        assert!(mesh.triangles().all(|t| cross_y(&mesh, t) > 0.0));
    }

    #[test]
    fn empty_grid() {
        let mesh = generate_grid(0, 50.0);
        assert_eq!(mesh.vertices.len(), 1);
        assert!(mesh.indices.is_empty());
    }
}
