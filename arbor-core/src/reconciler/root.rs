//! Roots and Scheduling
//!
//! A [`Root`] owns one mounted tree. Its shared state is split so that
//! scheduling decisions never wait on a render in progress: the scheduling
//! bookkeeping and the sync queue have their own locks, and only rendering
//! and committing hold the `work` lock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::commit::commit_root;
use super::work_loop::{render_root, RenderSession, RootExitStatus};
use crate::config::ReconcilerConfig;
use crate::element::VNode;
use crate::error::ReconcileError;
use crate::fiber::{Arena, LocalState, Node, NodeId, NodeProps, WorkTag};
use crate::hooks::{Action, PendingPassiveEffects, SharedQueue, StateHook, Update, UpdateTarget};
use crate::host::{HostConfig, HostHandle};
use crate::scheduler::{CallbackId, Lanes, TaskScheduler, TaskStatus};

/// The callback a root is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallbackNode {
    /// Queued in the root's sync queue.
    Sync,
    /// Scheduled with the external scheduler.
    Task { id: CallbackId, generation: u64 },
}

/// Pending lanes and callback bookkeeping, updated atomically together.
#[derive(Debug, Default)]
pub(crate) struct ScheduleState {
    pub(crate) pending_lanes: Lanes,
    /// Lanes updated since the current render attempt started.
    pub(crate) interleaved_lanes: Lanes,
    pub(crate) callback_node: Option<CallbackNode>,
    /// Lane the callback was scheduled for.
    pub(crate) callback_priority: Lanes,
    next_generation: u64,
}

impl ScheduleState {
    /// Forget the current callback without cancelling it.
    pub(crate) fn clear_callback(&mut self) {
        self.callback_node = None;
        self.callback_priority = Lanes::NONE;
    }
}

type SyncCallback = fn(&RootInner) -> Result<(), ReconcileError>;

#[derive(Default)]
struct SyncQueue {
    callbacks: VecDeque<SyncCallback>,
    microtask_scheduled: bool,
}

/// State owned by the render and commit phases.
pub(crate) struct FiberRoot {
    pub(crate) arena: Arena,
    pub(crate) host: Box<dyn HostConfig>,
    pub(crate) container: HostHandle,
    /// Host root node of the committed tree.
    pub(crate) current: NodeId,
    pub(crate) finished_work: Option<NodeId>,
    pub(crate) finished_lanes: Lanes,
    /// Lanes the finished render skipped and left pending.
    pub(crate) remaining_lanes: Lanes,
    pub(crate) pending_passive: PendingPassiveEffects,
    pub(crate) has_scheduled_passive: bool,
    pub(crate) session: Option<RenderSession>,
}

impl FiberRoot {
    /// Record lanes skipped by the render in progress.
    pub(crate) fn mark_skipped(&mut self, lanes: Lanes) {
        if let Some(session) = &mut self.session {
            session.skipped_lanes |= lanes;
        }
    }
}

pub(crate) struct RootInner {
    pub(crate) scheduler: Arc<dyn TaskScheduler>,
    pub(crate) config: ReconcilerConfig,
    pub(crate) schedule: Mutex<ScheduleState>,
    sync_queue: Mutex<SyncQueue>,
    transition_depth: AtomicUsize,
    root_queue: SharedQueue,
    pub(crate) work: Mutex<FiberRoot>,
    this: Weak<RootInner>,
}

impl RootInner {
    /// Weak handle given to binding setters.
    pub(crate) fn update_target(&self) -> Weak<dyn UpdateTarget> {
        self.this.clone()
    }

    pub(crate) fn schedule_update_on_root(&self, lane: Lanes) {
        {
            let mut schedule = self.schedule.lock();
            schedule.pending_lanes |= lane;
            schedule.interleaved_lanes |= lane;
        }
        trace!(lane = ?lane, "update scheduled on root");
        self.ensure_root_is_scheduled();
    }

    /// Make sure exactly one callback is waiting for the root's highest
    /// pending lane, or none if nothing is pending.
    pub(crate) fn ensure_root_is_scheduled(&self) {
        let mut schedule = self.schedule.lock();
        let next = schedule.pending_lanes.highest_priority();

        if next.is_empty() {
            if let Some(CallbackNode::Task { id, .. }) = schedule.callback_node {
                self.scheduler.cancel_callback(id);
            }
            schedule.clear_callback();
            return;
        }

        if schedule.callback_node.is_some() && schedule.callback_priority == next {
            return;
        }

        if let Some(CallbackNode::Task { id, .. }) = schedule.callback_node {
            self.scheduler.cancel_callback(id);
        }

        if next == Lanes::SYNC {
            schedule.callback_node = Some(CallbackNode::Sync);
            self.schedule_sync_callback(RootInner::perform_sync_work_on_root);
        } else {
            let generation = schedule.next_generation;
            schedule.next_generation += 1;
            let root = self.this.clone();
            let priority = next.to_scheduler_priority();
            let id = self.scheduler.schedule_callback(
                priority,
                Box::new(move || match root.upgrade() {
                    Some(root) => root.perform_concurrent_work(generation),
                    None => Ok(TaskStatus::Done),
                }),
            );
            schedule.callback_node = Some(CallbackNode::Task { id, generation });
        }
        schedule.callback_priority = next;
        debug!(lanes = ?next, "root scheduled");
    }

    fn is_current_task(&self, generation: u64) -> bool {
        matches!(
            self.schedule.lock().callback_node,
            Some(CallbackNode::Task { generation: g, .. }) if g == generation
        )
    }

    fn schedule_sync_callback(&self, callback: SyncCallback) {
        let mut queue = self.sync_queue.lock();
        queue.callbacks.push_back(callback);
        if queue.microtask_scheduled {
            return;
        }
        queue.microtask_scheduled = true;
        let root = self.this.clone();
        self.scheduler.schedule_microtask(Box::new(move || match root.upgrade() {
            Some(root) => {
                root.sync_queue.lock().microtask_scheduled = false;
                root.flush_sync_callbacks()
            }
            None => Ok(()),
        }));
    }

    /// Run every queued sync callback, including ones queued meanwhile.
    pub(crate) fn flush_sync_callbacks(&self) -> Result<(), ReconcileError> {
        loop {
            let next = self.sync_queue.lock().callbacks.pop_front();
            match next {
                Some(callback) => callback(self)?,
                None => return Ok(()),
            }
        }
    }

    fn perform_sync_work_on_root(&self) -> Result<(), ReconcileError> {
        self.flush_passive_effects()?;

        let mut work = self.work.lock();
        let lanes = self.schedule.lock().pending_lanes.highest_priority();
        if lanes != Lanes::SYNC {
            drop(work);
            self.ensure_root_is_scheduled();
            return Ok(());
        }

        render_root(self, &mut work, lanes, false)?;
        commit_root(self, &mut work);
        drop(work);

        self.ensure_root_is_scheduled();
        Ok(())
    }

    fn perform_concurrent_work(&self, generation: u64) -> Result<TaskStatus, ReconcileError> {
        if !self.is_current_task(generation) {
            return Ok(TaskStatus::Done);
        }
        if self.flush_passive_effects()? && !self.is_current_task(generation) {
            return Ok(TaskStatus::Done);
        }

        let mut work = self.work.lock();
        let lanes = self.schedule.lock().pending_lanes.highest_priority();
        if lanes.is_empty() {
            drop(work);
            self.ensure_root_is_scheduled();
            return Ok(TaskStatus::Done);
        }

        let time_slice = !lanes.includes(Lanes::SYNC);
        let status = render_root(self, &mut work, lanes, time_slice)?;
        if status == RootExitStatus::Completed {
            commit_root(self, &mut work);
        }
        drop(work);

        self.ensure_root_is_scheduled();
        if self.is_current_task(generation) {
            Ok(TaskStatus::Continue)
        } else {
            Ok(TaskStatus::Done)
        }
    }

    /// Run passive effects left by earlier commits. Returns whether any ran.
    pub(crate) fn flush_passive_effects(&self) -> Result<bool, ReconcileError> {
        let pending = std::mem::take(&mut self.work.lock().pending_passive);
        if pending.is_empty() {
            return Ok(false);
        }
        pending.run();
        self.flush_sync_callbacks()?;
        Ok(true)
    }

    /// Request the deferred flush of effects queued by a commit.
    pub(crate) fn schedule_passive_flush(&self, work: &mut FiberRoot) {
        if work.pending_passive.is_empty() || work.has_scheduled_passive {
            return;
        }
        work.has_scheduled_passive = true;
        let root = self.this.clone();
        self.scheduler.schedule_callback(
            self.config.passive_effect_priority,
            Box::new(move || {
                if let Some(root) = root.upgrade() {
                    root.work.lock().has_scheduled_passive = false;
                    root.flush_passive_effects()?;
                }
                Ok(TaskStatus::Done)
            }),
        );
    }
}

impl UpdateTarget for RootInner {
    fn request_update_lane(&self) -> Lanes {
        if self.transition_depth.load(Ordering::SeqCst) > 0 {
            Lanes::TRANSITION
        } else {
            Lanes::from_scheduler_priority(self.scheduler.current_priority())
        }
    }

    fn schedule_update(&self, lane: Lanes) {
        self.schedule_update_on_root(lane);
    }

    fn enter_transition(&self) {
        self.transition_depth.fetch_add(1, Ordering::SeqCst);
    }

    fn exit_transition(&self) {
        self.transition_depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A mounted tree rendering into one host container.
#[derive(Clone)]
pub struct Root {
    inner: Arc<RootInner>,
}

impl Root {
    /// Create a root for `container` with the default configuration.
    pub fn new<H>(container: HostHandle, host: H, scheduler: Arc<dyn TaskScheduler>) -> Self
    where
        H: HostConfig + 'static,
    {
        Self::with_config(container, host, scheduler, ReconcilerConfig::default())
    }

    pub fn with_config<H>(
        container: HostHandle,
        host: H,
        scheduler: Arc<dyn TaskScheduler>,
        config: ReconcilerConfig,
    ) -> Self
    where
        H: HostConfig + 'static,
    {
        let root_queue = SharedQueue::default();
        let empty: Arc<VNode> = Arc::new(VNode::Empty);

        let mut arena = Arena::new();
        let mut host_root = Node::new(WorkTag::HostRoot, None, NodeProps::Root);
        host_root.memoized_props = Some(NodeProps::Root);
        host_root.memoized_state = LocalState::Root(StateHook::with_queue(empty, root_queue.clone()));
        let current = arena.alloc(host_root);

        let inner = Arc::new_cyclic(|this| RootInner {
            scheduler,
            config,
            schedule: Mutex::new(ScheduleState::default()),
            sync_queue: Mutex::new(SyncQueue::default()),
            transition_depth: AtomicUsize::new(0),
            root_queue,
            work: Mutex::new(FiberRoot {
                arena,
                host: Box::new(host),
                container,
                current,
                finished_work: None,
                finished_lanes: Lanes::NONE,
                remaining_lanes: Lanes::NONE,
                pending_passive: PendingPassiveEffects::default(),
                has_scheduled_passive: false,
                session: None,
            }),
            this: this.clone(),
        });
        debug!(container = container.raw(), "created root");
        Self { inner }
    }

    /// Replace the tree rendered into the container. The update is synchronous:
    /// it is rendered and committed from the next microtask.
    pub fn render(&self, tree: impl Into<VNode>) {
        let tree: Arc<VNode> = Arc::new(tree.into());
        self.inner.root_queue.lock().enqueue(Update {
            action: Action::Replace(tree),
            lane: Lanes::SYNC,
        });
        self.inner.schedule_update_on_root(Lanes::SYNC);
    }

    /// Render nothing, removing the whole tree from the container.
    pub fn unmount(&self) {
        self.render(VNode::Empty);
    }

    /// Lanes with updates that have not been committed yet.
    pub fn pending_lanes(&self) -> Lanes {
        self.inner.schedule.lock().pending_lanes
    }

    /// Whether a callback is waiting to render this root.
    pub fn has_scheduled_callback(&self) -> bool {
        self.inner.schedule.lock().callback_node.is_some()
    }

    /// Perform queued synchronous work now instead of at the next microtask.
    pub fn flush_sync_work(&self) -> Result<(), ReconcileError> {
        self.inner.flush_sync_callbacks()
    }

    /// Run pending passive effects now. Returns whether any ran.
    pub fn flush_passive_effects(&self) -> Result<bool, ReconcileError> {
        self.inner.flush_passive_effects()
    }

    pub fn container(&self) -> HostHandle {
        self.inner.work.lock().container
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.inner.config
    }

    /// Number of work nodes alive for this root, across both generations.
    pub fn node_count(&self) -> usize {
        self.inner.work.lock().arena.len()
    }
}

impl std::fmt::Debug for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root")
            .field("pending_lanes", &self.pending_lanes())
            .finish_non_exhaustive()
    }
}
