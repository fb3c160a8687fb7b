use std::sync::Arc;

use fxhash::FxHashMap;
use tracing::debug;

use crate::{
    error::{ModelError, ModelResult},
    model::{
        dimension::{Dimension, DimensionIdx},
        index_manager::RoutingIndexManager,
        transit::{
            DemandTransit, DistanceTransit, TransitCallbackId, TransitFunction, TransitMatrix,
        },
    },
    problem::{data_model::RoutingDataModel, node::NodeIdx, vehicle::VehicleIdx},
};

/// Part a node plays in the pickup and delivery constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Regular,
    Pickup { delivery: NodeIdx },
    Delivery { pickup: NodeIdx },
}

impl NodeRole {
    pub fn is_paired(&self) -> bool {
        !matches!(self, NodeRole::Regular)
    }

    /// The other node of the pair.
    pub fn sibling(&self) -> Option<NodeIdx> {
        match *self {
            NodeRole::Regular => None,
            NodeRole::Pickup { delivery } => Some(delivery),
            NodeRole::Delivery { pickup } => Some(pickup),
        }
    }
}

struct RegisteredTransit {
    function: Arc<dyn TransitFunction>,
    matrix: Option<Arc<TransitMatrix>>,
}

/// Accumulates callbacks, dimensions and constraints on top of a data model.
///
/// `build` freezes the configuration into a [`RoutingModel`].
pub struct RoutingModelBuilder {
    data: Arc<RoutingDataModel>,
    index_manager: RoutingIndexManager,
    callbacks: Vec<RegisteredTransit>,
    distance_callback: Option<TransitCallbackId>,
    arc_cost_evaluator: Option<TransitCallbackId>,
    dimensions: Vec<Dimension>,
    dimension_names: FxHashMap<String, DimensionIdx>,
    pickup_delivery_dimension: Option<DimensionIdx>,
}

impl RoutingModelBuilder {
    pub fn new(data: Arc<RoutingDataModel>) -> Self {
        let index_manager =
            RoutingIndexManager::new(data.num_nodes(), data.num_vehicles(), data.depot());

        RoutingModelBuilder {
            data,
            index_manager,
            callbacks: Vec::new(),
            distance_callback: None,
            arc_cost_evaluator: None,
            dimensions: Vec::new(),
            dimension_names: FxHashMap::default(),
            pickup_delivery_dimension: None,
        }
    }

    pub fn data(&self) -> &RoutingDataModel {
        &self.data
    }

    pub fn index_manager(&self) -> &RoutingIndexManager {
        &self.index_manager
    }

    /// Registering the same function twice returns the same id.
    pub fn register_transit_callback(
        &mut self,
        function: Arc<dyn TransitFunction>,
    ) -> TransitCallbackId {
        if let Some(index) = self
            .callbacks
            .iter()
            .position(|registered| Arc::ptr_eq(&registered.function, &function))
        {
            return TransitCallbackId::new(index);
        }

        self.callbacks.push(RegisteredTransit {
            function,
            matrix: None,
        });

        TransitCallbackId::new(self.callbacks.len() - 1)
    }

    /// Registers the distance matrix as a transit and uses it as the arc cost of every vehicle.
    pub fn register_distance_callback(&mut self) -> TransitCallbackId {
        if let Some(id) = self.distance_callback {
            return id;
        }

        let id =
            self.register_transit_callback(Arc::new(DistanceTransit::new(Arc::clone(&self.data))));
        self.distance_callback = Some(id);
        self.arc_cost_evaluator = Some(id);

        id
    }

    pub fn register_demand_callback(
        &mut self,
        demands: Vec<i64>,
    ) -> ModelResult<TransitCallbackId> {
        if demands.len() != self.data.num_nodes() {
            return Err(ModelError::InconsistentCapacityConfig(format!(
                "expected {} demands, got {}",
                self.data.num_nodes(),
                demands.len()
            )));
        }

        Ok(self.register_transit_callback(Arc::new(DemandTransit::new(demands))))
    }

    pub fn set_arc_cost_evaluator(
        &mut self,
        callback: TransitCallbackId,
    ) -> ModelResult<&mut Self> {
        self.ensure_callback(callback)?;
        self.arc_cost_evaluator = Some(callback);
        Ok(self)
    }

    pub fn add_dimension(
        &mut self,
        callback: TransitCallbackId,
        slack_max: i64,
        capacity: i64,
        start_at_zero: bool,
        name: &str,
    ) -> ModelResult<DimensionIdx> {
        let capacities = vec![capacity; self.data.num_vehicles()];
        self.add_dimension_with_capacities(callback, slack_max, capacities, start_at_zero, name)
    }

    /// Adds a dimension bounded by the vehicle capacities of the data model.
    pub fn add_dimension_with_vehicle_capacity(
        &mut self,
        callback: TransitCallbackId,
        slack_max: i64,
        start_at_zero: bool,
        name: &str,
    ) -> ModelResult<DimensionIdx> {
        let capacities = self.data.vehicle_capacities().ok_or_else(|| {
            ModelError::InconsistentCapacityConfig(
                "no vehicle capacities were given to the data model".to_string(),
            )
        })?;

        self.add_dimension_with_capacities(callback, slack_max, capacities, start_at_zero, name)
    }

    fn add_dimension_with_capacities(
        &mut self,
        callback: TransitCallbackId,
        slack_max: i64,
        capacities: Vec<i64>,
        start_at_zero: bool,
        name: &str,
    ) -> ModelResult<DimensionIdx> {
        if self.dimension_names.contains_key(name) {
            return Err(ModelError::DuplicateDimensionName(name.to_string()));
        }

        if slack_max < 0 {
            return Err(ModelError::InvalidModel(format!(
                "dimension '{name}' has a negative slack"
            )));
        }

        let transits = self.transit_matrix(callback)?;

        for &capacity in &capacities {
            if capacity < 0 || capacity < transits.max_value() {
                return Err(ModelError::InvalidCapacity {
                    dimension: name.to_string(),
                    capacity,
                    max_transit: transits.max_value(),
                });
            }
        }

        let index = DimensionIdx::new(self.dimensions.len());
        self.dimensions.push(Dimension::new(
            name.to_string(),
            callback,
            transits,
            slack_max,
            capacities,
            start_at_zero,
        ));
        self.dimension_names.insert(name.to_string(), index);

        debug!(dimension = name, "Added dimension");

        Ok(index)
    }

    pub fn set_global_span_cost_coefficient(
        &mut self,
        name: &str,
        coefficient: i64,
    ) -> ModelResult<&mut Self> {
        if coefficient < 0 {
            return Err(ModelError::InvalidModel(format!(
                "global span cost coefficient of '{name}' is negative"
            )));
        }

        let index = self.dimension_index(name)?;
        self.dimensions[index].set_global_span_cost_coefficient(coefficient);

        Ok(self)
    }

    /// Requires each pickup and its delivery to be served by one vehicle, pickup first.
    /// The ordering is also anchored on the cumuls of the named dimension.
    pub fn add_pickup_and_delivery_constraint(&mut self, name: &str) -> ModelResult<&mut Self> {
        let index = self.dimension_index(name)?;

        if !self.data.has_pickups_deliveries() {
            return Err(ModelError::InvalidPickupDelivery(
                "no pickup and delivery pairs were given to the data model".to_string(),
            ));
        }

        self.pickup_delivery_dimension = Some(index);
        Ok(self)
    }

    pub fn build(mut self) -> ModelResult<RoutingModel> {
        let arc_costs = match self.arc_cost_evaluator {
            Some(callback) => self.transit_matrix(callback)?,
            None => Arc::new(TransitMatrix::compute(
                &DistanceTransit::new(Arc::clone(&self.data)),
                self.data.num_nodes(),
            )?),
        };

        let mut node_roles = vec![NodeRole::Regular; self.data.num_nodes()];
        if self.pickup_delivery_dimension.is_some() {
            for pair in self.data.pickups_deliveries() {
                node_roles[pair.pickup().get()] = NodeRole::Pickup {
                    delivery: pair.delivery(),
                };
                node_roles[pair.delivery().get()] = NodeRole::Delivery {
                    pickup: pair.pickup(),
                };
            }
        }

        debug!(
            dimensions = self.dimensions.len(),
            pickup_delivery = self.pickup_delivery_dimension.is_some(),
            "Built routing model"
        );

        Ok(RoutingModel {
            data: self.data,
            index_manager: self.index_manager,
            arc_costs,
            dimensions: self.dimensions,
            dimension_names: self.dimension_names,
            pickup_delivery_dimension: self.pickup_delivery_dimension,
            node_roles,
        })
    }

    fn ensure_callback(&self, callback: TransitCallbackId) -> ModelResult<()> {
        if callback.get() >= self.callbacks.len() {
            return Err(ModelError::UnknownTransitCallback(callback.get()));
        }
        Ok(())
    }

    fn transit_matrix(&mut self, callback: TransitCallbackId) -> ModelResult<Arc<TransitMatrix>> {
        self.ensure_callback(callback)?;

        let num_nodes = self.data.num_nodes();
        let registered = &mut self.callbacks[callback.get()];
        if let Some(matrix) = &registered.matrix {
            return Ok(Arc::clone(matrix));
        }

        let matrix = Arc::new(TransitMatrix::compute(
            registered.function.as_ref(),
            num_nodes,
        )?);
        registered.matrix = Some(Arc::clone(&matrix));

        Ok(matrix)
    }

    fn dimension_index(&self, name: &str) -> ModelResult<DimensionIdx> {
        self.dimension_names
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownDimension(name.to_string()))
    }
}

/// Immutable routing model: data, arc costs, dimensions and the pickup and delivery constraint.
///
/// Route evaluation works on "metrics": metric `0` is the arc cost, metric `d + 1` is the
/// transit of dimension `d`.
pub struct RoutingModel {
    data: Arc<RoutingDataModel>,
    index_manager: RoutingIndexManager,
    arc_costs: Arc<TransitMatrix>,
    dimensions: Vec<Dimension>,
    dimension_names: FxHashMap<String, DimensionIdx>,
    pickup_delivery_dimension: Option<DimensionIdx>,
    node_roles: Vec<NodeRole>,
}

impl RoutingModel {
    pub fn data(&self) -> &RoutingDataModel {
        &self.data
    }

    pub fn index_manager(&self) -> &RoutingIndexManager {
        &self.index_manager
    }

    pub fn num_nodes(&self) -> usize {
        self.data.num_nodes()
    }

    pub fn num_vehicles(&self) -> usize {
        self.data.num_vehicles()
    }

    pub fn depot(&self) -> NodeIdx {
        self.data.depot()
    }

    pub fn vehicles(&self) -> impl Iterator<Item = VehicleIdx> + use<> {
        (0..self.data.num_vehicles()).map(VehicleIdx::new)
    }

    #[inline(always)]
    pub fn arc_cost(&self, from: NodeIdx, to: NodeIdx) -> i64 {
        self.arc_costs.get(from, to)
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, index: DimensionIdx) -> &Dimension {
        &self.dimensions[index]
    }

    pub fn dimension_by_name(&self, name: &str) -> Option<&Dimension> {
        self.dimension_names
            .get(name)
            .map(|&index| &self.dimensions[index])
    }

    pub fn dimension_index(&self, name: &str) -> Option<DimensionIdx> {
        self.dimension_names.get(name).copied()
    }

    pub fn has_global_span_costs(&self) -> bool {
        self.dimensions
            .iter()
            .any(|dimension| dimension.global_span_cost_coefficient() > 0)
    }

    pub fn has_pickup_delivery_constraint(&self) -> bool {
        self.pickup_delivery_dimension.is_some()
    }

    pub fn pickup_delivery_dimension(&self) -> Option<DimensionIdx> {
        self.pickup_delivery_dimension
    }

    #[inline]
    pub fn node_role(&self, node: NodeIdx) -> NodeRole {
        self.node_roles[node.get()]
    }

    pub fn num_metrics(&self) -> usize {
        self.dimensions.len() + 1
    }

    #[inline(always)]
    pub fn metric(&self, metric: usize, from: NodeIdx, to: NodeIdx) -> i64 {
        if metric == 0 {
            self.arc_costs.get(from, to)
        } else {
            self.dimensions[metric - 1].transit(from, to)
        }
    }
}
