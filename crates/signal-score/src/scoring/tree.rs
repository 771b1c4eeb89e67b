use std::collections::HashMap;
use std::mem;
use std::slice;

use tracing::debug;

use super::evaluate::{resolve, Resolution};
use super::kind::AggregationKind;
use super::signal::{Signal, SignalId, DEFAULT_WEIGHT};

const NEW_SIGNAL_VALUE: f64 = 0.5;
const SEED_SUB_SIGNALS: [&str; 2] = ["Sub-Signal 1", "Sub-Signal 2"];

/// Bounds checked when a tree is edited. Evaluation never checks them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditPolicy {
    pub max_weight: f64,
    /// Restrict leaf values to `[0, 1]`.
    pub unit_values: bool,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            max_weight: 5.0,
            unit_values: true,
        }
    }
}

impl EditPolicy {
    pub fn check_weight(&self, weight: f64) -> Result<(), TreeError> {
        if weight.is_finite() && weight >= 0.0 && weight <= self.max_weight {
            Ok(())
        } else {
            Err(TreeError::InvalidWeight {
                weight,
                max: self.max_weight,
            })
        }
    }

    pub fn check_value(&self, value: f64) -> Result<(), TreeError> {
        let in_range = !self.unit_values || (0.0..=1.0).contains(&value);
        if value.is_finite() && in_range {
            Ok(())
        } else {
            Err(TreeError::InvalidValue(value))
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("signal '{0}' does not exist")]
    UnknownSignal(SignalId),
    #[error("signal '{0}' is not a formula")]
    NotAFormula(SignalId),
    #[error("signal '{0}' is not a leaf")]
    NotALeaf(SignalId),
    #[error("weight {weight} must be between 0 and {max}")]
    InvalidWeight { weight: f64, max: f64 },
    #[error("value {0} is outside the permitted range")]
    InvalidValue(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    weight: f64,
    parent: Option<SignalId>,
    body: NodeBody,
}

#[derive(Debug, Clone)]
enum NodeBody {
    Leaf {
        value: f64,
    },
    Formula {
        kind: AggregationKind,
        children: Vec<SignalId>,
    },
}

/// Read-only view of one node in a [`SignalTree`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeView<'a> {
    pub id: &'a SignalId,
    pub name: &'a str,
    pub weight: f64,
    pub value: Option<f64>,
    pub kind: Option<AggregationKind>,
    pub children: &'a [SignalId],
    pub parent: Option<&'a SignalId>,
}

/// Editable signal tree.
///
/// Nodes live in a single map keyed by id; formula nodes own an ordered list of
/// child ids and every node records its parent, so edits touch one entry and one
/// sibling list instead of rebuilding the path from the root. Call
/// [`SignalTree::recompute`] after a mutation to get the fresh score.
#[derive(Debug, Clone)]
pub struct SignalTree {
    kind: AggregationKind,
    roots: Vec<SignalId>,
    nodes: HashMap<SignalId, Node>,
    next_id: u64,
    policy: EditPolicy,
}

impl SignalTree {
    pub fn new(kind: AggregationKind, policy: EditPolicy) -> Self {
        Self {
            kind,
            roots: Vec::new(),
            nodes: HashMap::new(),
            next_id: 0,
            policy,
        }
    }

    /// Two leaves under an arithmetic mean, the state a fresh editor opens with.
    pub fn starter(policy: EditPolicy) -> Self {
        let mut tree = Self::new(AggregationKind::ArithmeticMean, policy);
        for (name, value) in [("Signal 1", 0.7), ("Signal 2", 0.5)] {
            let id = tree.allocate_id();
            tree.insert_leaf(None, id, name.to_string(), value, DEFAULT_WEIGHT);
        }
        tree
    }

    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    pub fn policy(&self) -> EditPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of the top-level signals, in display order.
    pub fn root_signals(&self) -> &[SignalId] {
        &self.roots
    }

    pub fn node(&self, id: &SignalId) -> Option<NodeView<'_>> {
        let (id, node) = self.nodes.get_key_value(id)?;
        let (value, kind, children) = match &node.body {
            NodeBody::Leaf { value } => (Some(*value), None, &[][..]),
            NodeBody::Formula { kind, children } => (None, Some(*kind), children.as_slice()),
        };
        Some(NodeView {
            id,
            name: &node.name,
            weight: node.weight,
            value,
            kind,
            children,
            parent: node.parent.as_ref(),
        })
    }

    /// Append a default leaf under `parent`, or at the top level when `None`.
    pub fn add_signal(&mut self, parent: Option<&SignalId>) -> Result<SignalId, TreeError> {
        let siblings = self.siblings_of(parent)?.len();
        let id = self.allocate_id();
        let name = format!("Signal {}", siblings + 1);
        self.insert_leaf(parent, id.clone(), name, NEW_SIGNAL_VALUE, DEFAULT_WEIGHT);
        debug!(signal = %id, parent = ?parent.map(|p| p.0.as_str()), "signal added");
        Ok(id)
    }

    pub fn rename(&mut self, id: &SignalId, name: impl Into<String>) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        node.name = name.into();
        Ok(())
    }

    pub fn set_value(&mut self, id: &SignalId, value: f64) -> Result<(), TreeError> {
        self.policy.check_value(value)?;
        match &mut self.node_mut(id)?.body {
            NodeBody::Leaf { value: stored } => *stored = value,
            NodeBody::Formula { .. } => return Err(TreeError::NotALeaf(id.clone())),
        }
        debug!(signal = %id, value, "signal value updated");
        Ok(())
    }

    pub fn set_weight(&mut self, id: &SignalId, weight: f64) -> Result<(), TreeError> {
        self.policy.check_weight(weight)?;
        self.node_mut(id)?.weight = weight;
        debug!(signal = %id, weight, "signal reweighted");
        Ok(())
    }

    pub fn set_kind(&mut self, id: &SignalId, kind: AggregationKind) -> Result<(), TreeError> {
        match &mut self.node_mut(id)?.body {
            NodeBody::Formula { kind: stored, .. } => *stored = kind,
            NodeBody::Leaf { .. } => return Err(TreeError::NotAFormula(id.clone())),
        }
        debug!(signal = %id, formula = %kind, "formula kind changed");
        Ok(())
    }

    pub fn set_root_kind(&mut self, kind: AggregationKind) {
        self.kind = kind;
        debug!(formula = %kind, "root formula kind changed");
    }

    /// Turn a leaf into an arithmetic-mean formula seeded with two sub-signals
    /// that carry the leaf's value. Formulas are left untouched.
    pub fn convert_to_formula(&mut self, id: &SignalId) -> Result<(), TreeError> {
        let node = self.node_ref(id)?;
        let value = match node.body {
            NodeBody::Leaf { value } => value,
            NodeBody::Formula { .. } => return Ok(()),
        };
        let seed = if value == 0.0 { NEW_SIGNAL_VALUE } else { value };

        let node = self.node_mut(id)?;
        node.weight = non_zero_weight(node.weight);
        node.body = NodeBody::Formula {
            kind: AggregationKind::ArithmeticMean,
            children: Vec::new(),
        };

        for name in SEED_SUB_SIGNALS {
            let child = self.allocate_id();
            self.insert_leaf(Some(id), child, name.to_string(), seed, DEFAULT_WEIGHT);
        }
        debug!(signal = %id, "leaf converted to formula");
        Ok(())
    }

    /// Collapse a formula into a leaf holding its current score. The subtree is
    /// dropped. Leaves are left untouched.
    pub fn convert_to_leaf(&mut self, id: &SignalId) -> Result<(), TreeError> {
        let (kind, children) = match &self.node_ref(id)?.body {
            NodeBody::Formula { kind, children } => (*kind, children.clone()),
            NodeBody::Leaf { .. } => return Ok(()),
        };

        let score = resolve(kind, &self.materialize(&children)).score;
        for child in &children {
            self.drop_subtree(child);
        }

        let node = self.node_mut(id)?;
        node.weight = non_zero_weight(node.weight);
        node.body = NodeBody::Leaf { value: score };
        debug!(signal = %id, value = score, "formula converted to leaf");
        Ok(())
    }

    /// Remove a signal together with all of its descendants.
    pub fn remove(&mut self, id: &SignalId) -> Result<(), TreeError> {
        let parent = self.node_ref(id)?.parent.clone();
        self.siblings_of_mut(parent.as_ref())?
            .retain(|sibling| sibling != id);
        let removed = self.drop_subtree(id);
        debug!(signal = %id, removed, "signal removed");
        Ok(())
    }

    /// Swap a signal with its neighbour. Moving past either end does nothing.
    pub fn move_signal(&mut self, id: &SignalId, direction: Direction) -> Result<(), TreeError> {
        let parent = self.node_ref(id)?.parent.clone();
        let siblings = self.siblings_of_mut(parent.as_ref())?;
        let Some(index) = siblings.iter().position(|sibling| sibling == id) else {
            return Err(TreeError::UnknownSignal(id.clone()));
        };

        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < siblings.len() => index + 1,
            _ => return Ok(()),
        };
        siblings.swap(index, target);
        debug!(signal = %id, from = index, to = target, "signal moved");
        Ok(())
    }

    /// Ordered snapshot of the top-level signals.
    pub fn signals(&self) -> Vec<Signal> {
        self.materialize(&self.roots)
    }

    /// Snapshot of a single signal and its subtree.
    pub fn subtree(&self, id: &SignalId) -> Result<Signal, TreeError> {
        self.materialize(slice::from_ref(id))
            .pop()
            .ok_or_else(|| TreeError::UnknownSignal(id.clone()))
    }

    /// Full recomputation from the root over the current snapshot.
    pub fn recompute(&self) -> Resolution {
        resolve(self.kind, &self.signals())
    }

    fn allocate_id(&mut self) -> SignalId {
        self.next_id += 1;
        SignalId(format!("sig-{:04}", self.next_id))
    }

    fn insert_leaf(
        &mut self,
        parent: Option<&SignalId>,
        id: SignalId,
        name: String,
        value: f64,
        weight: f64,
    ) {
        self.nodes.insert(
            id.clone(),
            Node {
                name,
                weight,
                parent: parent.cloned(),
                body: NodeBody::Leaf { value },
            },
        );
        if let Ok(siblings) = self.siblings_of_mut(parent) {
            siblings.push(id);
        }
    }

    fn node_ref(&self, id: &SignalId) -> Result<&Node, TreeError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::UnknownSignal(id.clone()))
    }

    fn node_mut(&mut self, id: &SignalId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownSignal(id.clone()))
    }

    fn siblings_of(&self, parent: Option<&SignalId>) -> Result<&Vec<SignalId>, TreeError> {
        let Some(parent) = parent else {
            return Ok(&self.roots);
        };
        match &self.node_ref(parent)?.body {
            NodeBody::Formula { children, .. } => Ok(children),
            NodeBody::Leaf { .. } => Err(TreeError::NotAFormula(parent.clone())),
        }
    }

    fn siblings_of_mut(
        &mut self,
        parent: Option<&SignalId>,
    ) -> Result<&mut Vec<SignalId>, TreeError> {
        let Some(parent) = parent else {
            return Ok(&mut self.roots);
        };
        match &mut self.node_mut(parent)?.body {
            NodeBody::Formula { children, .. } => Ok(children),
            NodeBody::Leaf { .. } => Err(TreeError::NotAFormula(parent.clone())),
        }
    }

    /// Removes `id` and its descendants from the map, returning how many nodes went.
    fn drop_subtree(&mut self, id: &SignalId) -> usize {
        let mut pending = vec![id.clone()];
        let mut removed = 0;
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                removed += 1;
                if let NodeBody::Formula { children, .. } = node.body {
                    pending.extend(children);
                }
            }
        }
        removed
    }

    /// Builds owned signals for `ids`, post-order over an explicit stack.
    fn materialize(&self, ids: &[SignalId]) -> Vec<Signal> {
        struct Level<'t> {
            pending: slice::Iter<'t, SignalId>,
            built: Vec<Signal>,
        }

        impl<'t> Level<'t> {
            fn new(ids: &'t [SignalId]) -> Self {
                Self {
                    pending: ids.iter(),
                    built: Vec::with_capacity(ids.len()),
                }
            }
        }

        let mut parents: Vec<(Level<'_>, &SignalId, &Node, AggregationKind)> = Vec::new();
        let mut current = Level::new(ids);

        loop {
            match current.pending.next() {
                Some(id) => {
                    let Some(node) = self.nodes.get(id) else {
                        continue;
                    };
                    match &node.body {
                        NodeBody::Leaf { value } => current.built.push(Signal::leaf(
                            id.clone(),
                            node.name.clone(),
                            *value,
                            node.weight,
                        )),
                        NodeBody::Formula { kind, children } => {
                            let level = mem::replace(&mut current, Level::new(children));
                            parents.push((level, id, node, *kind));
                        }
                    }
                }
                None => {
                    let built = current.built;
                    match parents.pop() {
                        Some((parent, id, node, kind)) => {
                            current = parent;
                            current.built.push(Signal::formula(
                                id.clone(),
                                node.name.clone(),
                                node.weight,
                                kind,
                                built,
                            ));
                        }
                        None => return built,
                    }
                }
            }
        }
    }
}

fn non_zero_weight(weight: f64) -> f64 {
    if weight == 0.0 {
        DEFAULT_WEIGHT
    } else {
        weight
    }
}

impl Default for SignalTree {
    fn default() -> Self {
        Self::starter(EditPolicy::default())
    }
}
