use crate::{error::ModelError, problem::node::NodeIdx};

pub type Distance = f64;
pub type Cost = i64;

/// Square table of travel distances between stops.
///
/// The matrix uses a flat structure: the entry for a pair of stops is found at
/// `from * num_locations + to`. Distances are kept as given and converted to integer
/// arc costs by truncation, which is the unit every dimension and the objective use.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    distances: Vec<Distance>,
    costs: Vec<Cost>,
    num_locations: usize,
    is_symmetric: bool,
}

fn is_flat_matrix_symmetric(matrix: &[Cost], num_locations: usize) -> bool {
    for i in 0..num_locations {
        for j in (i + 1)..num_locations {
            if matrix[i * num_locations + j] != matrix[j * num_locations + i] {
                return false;
            }
        }
    }
    true
}

impl DistanceMatrix {
    pub fn new(rows: Vec<Vec<Distance>>) -> Result<Self, ModelError> {
        let num_locations = rows.len();

        if num_locations == 0 {
            return Err(ModelError::InvalidModel(
                "distance matrix is empty".to_string(),
            ));
        }

        let mut distances = Vec::with_capacity(num_locations * num_locations);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != num_locations {
                return Err(ModelError::InvalidModel(format!(
                    "distance matrix is not square: row {i} has {} entries, expected {num_locations}",
                    row.len()
                )));
            }

            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(ModelError::InvalidModel(format!(
                        "distance from {i} to {j} is not a finite number"
                    )));
                }

                if value < 0.0 {
                    return Err(ModelError::InvalidModel(format!(
                        "distance from {i} to {j} is negative ({value})"
                    )));
                }

                if i == j && value != 0.0 {
                    return Err(ModelError::InvalidModel(format!(
                        "distance from {i} to itself must be zero, got {value}"
                    )));
                }

                distances.push(value);
            }
        }

        Ok(Self::from_flat(distances, num_locations))
    }

    fn from_flat(distances: Vec<Distance>, num_locations: usize) -> Self {
        let costs: Vec<Cost> = distances.iter().map(|&d| d as Cost).collect();
        let is_symmetric = is_flat_matrix_symmetric(&costs, num_locations);

        DistanceMatrix {
            distances,
            costs,
            num_locations,
            is_symmetric,
        }
    }

    /// Euclidean distances between points on a plane.
    pub fn from_euclidean(points: &[(f64, f64)]) -> Self {
        let num_locations = points.len();
        let mut distances = vec![0.0; num_locations * num_locations];

        for (i, &(x1, y1)) in points.iter().enumerate() {
            for (j, &(x2, y2)) in points.iter().enumerate() {
                if i != j {
                    distances[i * num_locations + j] =
                        ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt();
                }
            }
        }

        Self::from_flat(distances, num_locations)
    }

    #[inline(always)]
    fn index(&self, from: NodeIdx, to: NodeIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn distance(&self, from: NodeIdx, to: NodeIdx) -> Distance {
        self.distances[self.index(from, to)]
    }

    #[inline(always)]
    pub fn cost(&self, from: NodeIdx, to: NodeIdx) -> Cost {
        self.costs[self.index(from, to)]
    }

    pub fn max_cost(&self) -> Cost {
        self.costs.iter().copied().max().unwrap_or(0)
    }

    pub fn is_symmetric(&self) -> bool {
        self.is_symmetric
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_euclidean() {
        let matrix = DistanceMatrix::from_euclidean(&[(0.0, 0.0), (3.0, 4.0), (0.0, 8.0)]);

        assert_eq!(matrix.num_locations(), 3);
        assert_eq!(matrix.distance(NodeIdx::new(0), NodeIdx::new(1)), 5.0);
        assert_eq!(matrix.cost(NodeIdx::new(0), NodeIdx::new(2)), 8);
        assert_eq!(matrix.cost(NodeIdx::new(1), NodeIdx::new(1)), 0);
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn test_costs_are_truncated() {
        let matrix = DistanceMatrix::new(vec![vec![0.0, 1.9], vec![2.2, 0.0]]).unwrap();

        assert_eq!(matrix.cost(NodeIdx::new(0), NodeIdx::new(1)), 1);
        assert_eq!(matrix.cost(NodeIdx::new(1), NodeIdx::new(0)), 2);
        assert!(!matrix.is_symmetric());
        assert_eq!(matrix.max_cost(), 2);
    }

    #[test]
    fn test_rejects_non_square() {
        let result = DistanceMatrix::new(vec![vec![0.0, 1.0], vec![1.0]]);
        assert!(matches!(result, Err(ModelError::InvalidModel(_))));
    }

    #[test]
    fn test_rejects_negative_distance() {
        let result = DistanceMatrix::new(vec![vec![0.0, -1.0], vec![1.0, 0.0]]);
        assert!(matches!(result, Err(ModelError::InvalidModel(_))));
    }

    #[test]
    fn test_rejects_empty_and_non_zero_diagonal() {
        assert!(matches!(
            DistanceMatrix::new(vec![]),
            Err(ModelError::InvalidModel(_))
        ));
        assert!(matches!(
            DistanceMatrix::new(vec![vec![1.0]]),
            Err(ModelError::InvalidModel(_))
        ));
    }
}
