//! Work Loop
//!
//! One render attempt is a [`RenderSession`]: the lanes being rendered, the
//! work-in-progress root and the cursor of the next unit of work. The session
//! lives on the root between task invocations, so a concurrent render that
//! yielded resumes exactly where it stopped. A render for different lanes
//! throws the session away and starts over from the committed tree.

use tracing::{debug, error, trace, warn};

use super::begin::begin_work;
use super::complete::complete_work;
use super::root::{FiberRoot, RootInner};
use crate::error::{ReconcileError, RenderError};
use crate::fiber::{NodeId, NodeProps};
use crate::scheduler::Lanes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RootExitStatus {
    /// Yielded before the whole tree was processed.
    Incomplete,
    /// A finished tree is ready to commit.
    Completed,
}

#[derive(Debug)]
pub(crate) struct RenderSession {
    pub(crate) lanes: Lanes,
    /// Work-in-progress host root.
    pub(crate) root: NodeId,
    /// Next node to begin, or `None` once the root has completed.
    pub(crate) work_in_progress: Option<NodeId>,
    /// The attempt already failed once and was restarted.
    pub(crate) restarted: bool,
    pub(crate) skipped_lanes: Lanes,
}

/// Render `lanes`, resuming the root's session if it is for the same lanes.
///
/// A failure discards the attempt and restarts once from the root. A second
/// failure clears the root's callback, leaves its pending lanes alone and is
/// returned.
pub(crate) fn render_root(
    root: &RootInner,
    work: &mut FiberRoot,
    lanes: Lanes,
    time_slice: bool,
) -> Result<RootExitStatus, ReconcileError> {
    let resumable = matches!(&work.session, Some(session) if session.lanes == lanes);
    if !resumable {
        prepare_fresh_stack(root, work, lanes);
    }

    loop {
        let result = if time_slice {
            work_loop_concurrent(root, work)
        } else {
            work_loop_sync(root, work).map(|()| RootExitStatus::Completed)
        };

        match result {
            Ok(RootExitStatus::Incomplete) => {
                trace!(lanes = ?lanes, "render yielded");
                return Ok(RootExitStatus::Incomplete);
            }
            Ok(RootExitStatus::Completed) => {
                finish_render(work);
                return Ok(RootExitStatus::Completed);
            }
            Err(source) => {
                let restarted = work.session.as_ref().is_some_and(|s| s.restarted);
                if !restarted {
                    warn!(lanes = ?lanes, error = %source, "render failed; restarting from the root");
                    prepare_fresh_stack(root, work, lanes);
                    if let Some(session) = &mut work.session {
                        session.restarted = true;
                    }
                    continue;
                }
                error!(lanes = ?lanes, error = %source, "render failed after restarting");
                abandon_render(root, work);
                return Err(ReconcileError::RenderFailed { lane: lanes, source });
            }
        }
    }
}

/// Throw away any in-flight attempt and start a new one from the committed tree.
fn prepare_fresh_stack(root: &RootInner, work: &mut FiberRoot, lanes: Lanes) {
    if work.session.take().is_some() {
        debug!("discarding in-flight render");
    }
    work.arena.discard_fresh();
    work.finished_work = None;
    root.schedule.lock().interleaved_lanes = Lanes::NONE;

    let wip_root = work.arena.clone_for_work(work.current, NodeProps::Root);
    work.arena[wip_root].parent = None;
    work.arena[wip_root].sibling = None;
    work.session = Some(RenderSession {
        lanes,
        root: wip_root,
        work_in_progress: Some(wip_root),
        restarted: false,
        skipped_lanes: Lanes::NONE,
    });
    debug!(lanes = ?lanes, "render started");
}

fn abandon_render(root: &RootInner, work: &mut FiberRoot) {
    work.session = None;
    work.finished_work = None;
    work.arena.discard_fresh();
    root.schedule.lock().clear_callback();
}

fn finish_render(work: &mut FiberRoot) {
    if let Some(session) = work.session.take() {
        work.finished_work = Some(session.root);
        work.finished_lanes = session.lanes;
        work.remaining_lanes = session.skipped_lanes;
        debug!(lanes = ?session.lanes, "render completed");
    }
}

fn next_unit(work: &FiberRoot) -> Option<NodeId> {
    work.session.as_ref().and_then(|s| s.work_in_progress)
}

fn work_loop_sync(root: &RootInner, work: &mut FiberRoot) -> Result<(), RenderError> {
    while let Some(unit) = next_unit(work) {
        perform_unit_of_work(root, work, unit)?;
    }
    Ok(())
}

fn work_loop_concurrent(root: &RootInner, work: &mut FiberRoot) -> Result<RootExitStatus, RenderError> {
    while let Some(unit) = next_unit(work) {
        if root.scheduler.should_yield() {
            return Ok(RootExitStatus::Incomplete);
        }
        perform_unit_of_work(root, work, unit)?;
    }
    Ok(RootExitStatus::Completed)
}

fn perform_unit_of_work(root: &RootInner, work: &mut FiberRoot, unit: NodeId) -> Result<(), RenderError> {
    let lanes = work.session.as_ref().map_or(Lanes::NONE, |s| s.lanes);
    trace!(node = unit.index(), tag = ?work.arena[unit].tag, "begin work");

    let next = begin_work(root, work, unit, lanes)?;
    let node = &mut work.arena[unit];
    node.memoized_props = Some(node.pending_props.clone());

    match next {
        Some(child) => set_work_in_progress(work, Some(child)),
        None => complete_unit_of_work(root, work, unit),
    }
    Ok(())
}

/// Complete `unit` and its ancestors until one has an unvisited sibling.
fn complete_unit_of_work(root: &RootInner, work: &mut FiberRoot, unit: NodeId) {
    let mut completed = unit;
    loop {
        complete_work(root, work, completed);
        let node = &work.arena[completed];
        if let Some(sibling) = node.sibling {
            set_work_in_progress(work, Some(sibling));
            return;
        }
        match node.parent {
            Some(parent) => completed = parent,
            None => {
                set_work_in_progress(work, None);
                return;
            }
        }
    }
}

fn set_work_in_progress(work: &mut FiberRoot, next: Option<NodeId>) {
    if let Some(session) = &mut work.session {
        session.work_in_progress = next;
    }
}
