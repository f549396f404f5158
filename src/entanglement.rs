//! Logical-Entanglement Engine (§4.1).
//!
//! A content-addressed dependency DAG whose root digest is a cryptographic
//! fingerprint of a structured document. Grounded on
//! `examples/original_source/c/src/logical_entanglement.c`: each node's
//! digest absorbs its payload and its dependencies' digests in insertion
//! order, and the graph's root digest absorbs every node's digest in
//! declared order.
//!
//! The C original represents a node as a heap-allocated struct holding raw
//! pointers to its dependency nodes. Per the "Graphs and cycles" design
//! note, the Rust version instead stores nodes in a caller-owned
//! [`EntanglementStore`] and references dependencies and graph members by
//! index (`NodeId`) — the graph borrows the store's lifetime rather than
//! owning node payloads, and a cycle is rejected at edge-insertion time
//! instead of silently permitted (the C code recurses into a cycle and
//! diverges; see §9).

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{CoreError, CoreResult, VerifyOutcome};

pub const DIGEST_LEN: usize = 32;

/// Opaque handle to a node inside an [`EntanglementStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One component of a structured document (§3 "Entanglement Node").
#[derive(Debug, Clone)]
pub struct EntanglementNode {
    payload: Vec<u8>,
    deps: Vec<NodeId>,
    digest: Option<[u8; DIGEST_LEN]>,
}

impl EntanglementNode {
    fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            deps: Vec::new(),
            digest: None,
        }
    }

    /// A node is frozen — no further dependencies may be added — once its
    /// digest has been computed at least once.
    pub fn is_frozen(&self) -> bool {
        self.digest.is_some()
    }

    pub fn digest(&self) -> Option<[u8; DIGEST_LEN]> {
        self.digest
    }

    pub fn dependencies(&self) -> &[NodeId] {
        &self.deps
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Owning arena of entanglement nodes. Graphs built from it hold only
/// [`NodeId`] references and must not outlive it.
#[derive(Debug, Default)]
pub struct EntanglementStore {
    nodes: Vec<EntanglementNode>,
}

impl EntanglementStore {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// `create_node`: a fresh node owning a copy of `payload`, no
    /// dependencies, no cached digest. Empty payloads are permitted.
    pub fn create_node(&mut self, payload: impl Into<Vec<u8>>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(EntanglementNode::new(payload.into()));
        tracing::debug!(node = id.0, "entanglement node created");
        id
    }

    fn node(&self, id: NodeId) -> &EntanglementNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut EntanglementNode {
        &mut self.nodes[id.0]
    }

    /// `add_dependency`: appends `dep` to `node`'s ordered dependency list.
    /// Fails with [`CoreError::Cycle`] if `node` is already frozen, or if
    /// the new edge would create a cycle (i.e. `node` is already
    /// reachable from `dep`).
    pub fn add_dependency(&mut self, node: NodeId, dep: NodeId) -> CoreResult<()> {
        if self.node(node).is_frozen() {
            return Err(CoreError::InvalidArgument(
                "cannot add a dependency after digest computation",
            ));
        }
        if node == dep || self.is_reachable(dep, node) {
            return Err(CoreError::Cycle);
        }
        self.node_mut(node).deps.push(dep);
        Ok(())
    }

    /// Depth-first search: is `target` reachable from `from` via dependency
    /// edges?
    fn is_reachable(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if seen[current.0] {
                continue;
            }
            seen[current.0] = true;
            stack.extend(self.node(current).deps.iter().copied());
        }
        false
    }

    /// `compute_node_digest`: recursively computes digests for all
    /// transitive dependencies (memoized), then sets
    /// `digest = H(payload ‖ dep₁.digest ‖ … ‖ depₙ.digest)`. Idempotent.
    pub fn compute_node_digest(&mut self, node: NodeId) -> CoreResult<[u8; DIGEST_LEN]> {
        if let Some(digest) = self.node(node).digest {
            return Ok(digest);
        }
        let deps = self.node(node).deps.clone();
        let mut hasher = Sha256::new();
        hasher.update(&self.node(node).payload);
        for dep in deps {
            let dep_digest = self.compute_node_digest(dep)?;
            hasher.update(dep_digest);
        }
        let digest: [u8; DIGEST_LEN] = hasher.finalize().into();
        self.node_mut(node).digest = Some(digest);
        Ok(digest)
    }

    /// Recomputes a node's digest from payload and current dependency
    /// digests *without* reading or mutating the memoized cache — used by
    /// [`verify_graph`] and [`verify_node`] so that a tampered cache can
    /// never mask tampering.
    fn fresh_digest(&self, node: NodeId) -> [u8; DIGEST_LEN] {
        let mut hasher = Sha256::new();
        hasher.update(&self.node(node).payload);
        for dep in self.node(node).deps.iter().copied() {
            hasher.update(self.fresh_digest(dep));
        }
        hasher.finalize().into()
    }

    /// `verify_node`: recomputes the node's digest from payload and
    /// current dependency digests and compares to the cached digest.
    pub fn verify_node(&self, node: NodeId) -> CoreResult<VerifyOutcome> {
        let cached = self
            .node(node)
            .digest
            .ok_or(CoreError::InvalidArgument("node digest not yet computed"))?;
        let fresh = self.fresh_digest(node);
        Ok(VerifyOutcome::from(bool::from(cached.ct_eq(&fresh))))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// `create_graph`: an ordered sequence of node references plus a root
/// digest. Does not take ownership of node payloads.
#[derive(Debug, Clone)]
pub struct EntanglementGraph {
    members: Vec<NodeId>,
    root: Option<[u8; DIGEST_LEN]>,
}

impl EntanglementGraph {
    /// Fails if `members` is empty — a graph with zero nodes is invalid.
    pub fn new(members: Vec<NodeId>) -> CoreResult<Self> {
        if members.is_empty() {
            return Err(CoreError::InvalidArgument("graph must reference at least one node"));
        }
        Ok(Self { members, root: None })
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn root(&self) -> Option<[u8; DIGEST_LEN]> {
        self.root
    }

    /// `compute_root_digest`: ensures every member node has a digest, then
    /// sets `root = H(node₁.digest ‖ … ‖ nodeₘ.digest)` in declared order.
    pub fn compute_root_digest(&mut self, store: &mut EntanglementStore) -> CoreResult<[u8; DIGEST_LEN]> {
        let mut hasher = Sha256::new();
        for &member in &self.members {
            let digest = store.compute_node_digest(member)?;
            hasher.update(digest);
        }
        let root: [u8; DIGEST_LEN] = hasher.finalize().into();
        self.root = Some(root);
        tracing::debug!(nodes = self.members.len(), "root digest computed");
        Ok(root)
    }

    /// `verify_graph`: recomputes a trial root using fresh (non-cached)
    /// digests and returns the result of a constant-time comparison
    /// against the stored root.
    pub fn verify_graph(&self, store: &EntanglementStore) -> CoreResult<VerifyOutcome> {
        let stored_root = self
            .root
            .ok_or(CoreError::InvalidArgument("root digest not yet computed"))?;
        let mut hasher = Sha256::new();
        for &member in &self.members {
            hasher.update(store.fresh_digest(member));
        }
        let trial_root: [u8; DIGEST_LEN] = hasher.finalize().into();
        let accepted = bool::from(stored_root.ct_eq(&trial_root));
        if !accepted {
            tracing::warn!("entanglement root verification failed");
        }
        Ok(VerifyOutcome::from(accepted))
    }
}

/// Entanglement commitment over a geolocation (§6, §11 supplement):
/// payload = 8-byte big-endian-free IEEE-754 double lat ‖ double lon ‖
/// country bytes ‖ region bytes, hashed as a single node.
pub fn geolocation_commitment(lat: f64, lon: f64, country: &str, region: &str) -> [u8; DIGEST_LEN] {
    let mut store = EntanglementStore::new();
    let mut payload = Vec::with_capacity(16 + country.len() + region.len());
    payload.extend_from_slice(&lat.to_le_bytes());
    payload.extend_from_slice(&lon.to_le_bytes());
    payload.extend_from_slice(country.as_bytes());
    payload.extend_from_slice(region.as_bytes());
    let node = store.create_node(payload);
    store
        .compute_node_digest(node)
        .expect("single-node digest computation cannot fail")
}
