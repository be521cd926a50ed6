use super::record::*;
use crate::core::error::*;
use crate::core::primitive::*;

/// What the builder needs from whoever owns the tree representation.
///
/// One `Alloc` is created per parallel task and threaded through the
/// sequential recursion below it. `update_node` stores child `i` of `node`;
/// different `i` never alias, and calls for one node may come from
/// different threads.
pub trait MBlurBuildCallbacks: Sync {
    type Node: Send + Sync;
    type Alloc;

    fn create_alloc(&self) -> Self::Alloc;

    fn create_node(&self, has_time_splits: bool, alloc: &mut Self::Alloc) -> Self::Node;

    fn update_node(&self, node: &Self::Node, i: usize, child: &NodeRecordMB<Self::Node>);

    /// `prims` are the references of `record`, in deterministic order.
    fn create_leaf(
        &self,
        record: &BuildRecordMB,
        prims: &[PrimRefMB],
        alloc: &mut Self::Alloc,
    ) -> Self::Node;

    /// Called with the primitive count of every top level subtree that is
    /// about to be built on one thread. An error aborts the build.
    fn progress_monitor(&self, _num_prims: usize) -> Result<(), BuildError> {
        return Ok(());
    }
}
